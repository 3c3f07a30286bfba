// Path: crates/storage/src/identity.rs

//! An `IdentityProvider` that keeps users and bearer tokens inside a `DocumentStore`.

use argon2::Argon2;
use async_trait::async_trait;
use flora_api::prelude::*;
use flora_types::error::{IdentityError, StoreError};
use flora_types::identity::{CustomClaims, NewUser, UserRecord};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// Collection holding one `UserRecord` per uid.
pub const USERS_COLLECTION: &str = "users";
/// Collection holding issued bearer tokens, keyed by the token itself.
pub const TOKENS_COLLECTION: &str = "tokens";

const MIN_PASSWORD_LEN: usize = 6;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    uid: String,
    issued_at: u64,
    expires_at: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value).map_err(|e| StoreError::Encode(e.to_string()))? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(StoreError::Encode(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

fn from_document<T: for<'de> Deserialize<'de>>(doc: Document) -> Result<T, StoreError> {
    serde_json::from_value(serde_json::Value::Object(doc))
        .map_err(|e| StoreError::Decode(e.to_string()))
}

fn validate_email(email: &str) -> Result<(), IdentityError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(IdentityError::InvalidArgument(format!(
            "The email address is improperly formatted: {email}"
        )))
    }
}

fn derive(password: &str, salt: &[u8]) -> Result<[u8; HASH_LEN], IdentityError> {
    let mut out = [0u8; HASH_LEN];
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut out)
        .map_err(|e| IdentityError::Backend(format!("password hashing failed: {e}")))?;
    Ok(out)
}

/// Runs the memory-hard hash on the blocking pool.
async fn derive_off_runtime(
    password: String,
    salt: Vec<u8>,
) -> Result<[u8; HASH_LEN], IdentityError> {
    tokio::task::spawn_blocking(move || derive(&password, &salt))
        .await
        .map_err(|e| IdentityError::Backend(format!("password hashing task failed: {e}")))?
}

/// Users and tokens persisted through the configured `DocumentStore`.
///
/// Passwords are stored as a hex argon2 digest with a per-user random salt.
/// Tokens are opaque random strings with a fixed time-to-live; expired ones
/// are swept whenever a new token is minted.
#[derive(Debug, Clone)]
pub struct StoreIdentityProvider {
    store: Arc<dyn DocumentStore>,
    token_ttl: Duration,
    // Serializes the email check and the user write of `create_user`.
    registration: Arc<Mutex<()>>,
}

impl StoreIdentityProvider {
    pub fn new(store: Arc<dyn DocumentStore>, token_ttl: Duration) -> Self {
        Self {
            store,
            token_ttl,
            registration: Arc::new(Mutex::new(())),
        }
    }

    async fn put_user(&self, user: &UserRecord) -> Result<(), IdentityError> {
        self.store
            .set(USERS_COLLECTION, &user.uid, to_document(user)?)
            .await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, IdentityError> {
        Ok(self
            .list_users()
            .await?
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    /// Deletes every token whose expiry has passed. Returns how many went.
    async fn purge_expired_tokens(&self) -> Result<usize, IdentityError> {
        let now = now_secs();
        let mut purged = 0;
        for (token, doc) in self.store.list(TOKENS_COLLECTION).await? {
            let expired = match from_document::<TokenRecord>(doc) {
                Ok(record) => record.expires_at <= now,
                // Unreadable records can never verify.
                Err(_) => true,
            };
            if expired {
                self.store.delete(TOKENS_COLLECTION, &token).await?;
                purged += 1;
            }
        }
        if purged > 0 {
            tracing::debug!(target: "identity", purged, "swept expired tokens");
        }
        Ok(purged)
    }
}

#[async_trait]
impl IdentityProvider for StoreIdentityProvider {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, IdentityError> {
        validate_email(&user.email)?;
        if user.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::InvalidArgument(format!(
                "The password must be a string with at least {MIN_PASSWORD_LEN} characters."
            )));
        }

        let mut salt = [0u8; SALT_LEN];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        let hash = derive_off_runtime(user.password, salt.to_vec()).await?;

        let _guard = self.registration.lock().await;
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(IdentityError::EmailExists(user.email));
        }

        let record = UserRecord {
            uid: uuid::Uuid::new_v4().simple().to_string(),
            email: user.email,
            disabled: false,
            password_salt: hex::encode(salt),
            password_hash: hex::encode(hash),
            created_at: now_secs(),
            custom_claims: None,
        };
        self.put_user(&record).await?;
        tracing::info!(target: "identity", uid = %record.uid, "created user");
        Ok(record)
    }

    async fn get_user(&self, uid: &str) -> Result<UserRecord, IdentityError> {
        match self.store.get(USERS_COLLECTION, uid).await? {
            Some(doc) => Ok(from_document(doc)?),
            None => Err(IdentityError::UserNotFound(uid.to_string())),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<UserRecord, IdentityError> {
        self.find_by_email(email)
            .await?
            .ok_or_else(|| IdentityError::UserNotFound(email.to_string()))
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, IdentityError> {
        self.store
            .list(USERS_COLLECTION)
            .await?
            .into_iter()
            .map(|(_, doc)| from_document(doc).map_err(IdentityError::from))
            .collect()
    }

    async fn set_custom_user_claims(
        &self,
        uid: &str,
        claims: CustomClaims,
    ) -> Result<(), IdentityError> {
        let mut user = self.get_user(uid).await?;
        user.custom_claims = Some(claims);
        self.put_user(&user).await
    }

    async fn create_custom_token(&self, uid: &str) -> Result<String, IdentityError> {
        // Tokens can only be minted for users that exist.
        self.get_user(uid).await?;
        self.purge_expired_tokens().await?;
        let token = format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        );
        let issued_at = now_secs();
        let record = TokenRecord {
            uid: uid.to_string(),
            issued_at,
            expires_at: issued_at.saturating_add(self.token_ttl.as_secs()),
        };
        self.store
            .set(TOKENS_COLLECTION, &token, to_document(&record)?)
            .await?;
        Ok(token)
    }

    async fn verify_token(&self, token: &str) -> Result<String, IdentityError> {
        if token.is_empty() {
            return Err(IdentityError::InvalidToken("empty token".into()));
        }
        let Some(doc) = self.store.get(TOKENS_COLLECTION, token).await? else {
            return Err(IdentityError::InvalidToken("unknown token".into()));
        };
        let record: TokenRecord = from_document(doc)?;
        if record.expires_at <= now_secs() {
            self.store.delete(TOKENS_COLLECTION, token).await?;
            return Err(IdentityError::InvalidToken("token has expired".into()));
        }
        Ok(record.uid)
    }

    async fn verify_password(&self, uid: &str, password: &str) -> Result<bool, IdentityError> {
        let user = self.get_user(uid).await?;
        let salt = hex::decode(&user.password_salt)
            .map_err(|e| IdentityError::Backend(format!("corrupt password salt: {e}")))?;
        let expected = hex::decode(&user.password_hash)
            .map_err(|e| IdentityError::Backend(format!("corrupt password hash: {e}")))?;
        let actual = derive_off_runtime(password.to_string(), salt).await?;
        Ok(actual.as_slice() == expected.as_slice())
    }
}
