// Path: crates/services/src/auth.rs

//! Registration, login and admin gating over an `IdentityProvider`.

use flora_api::identity::IdentityProvider;
use flora_telemetry::auth_metrics;
use flora_types::config::AuthConfig;
use flora_types::error::ServiceError;
use flora_types::identity::{admin_claims, NewUser, UserRecord};
use flora_types::Result;
use serde::Serialize;
use std::sync::Arc;

pub const FIRST_USER_MESSAGE: &str = "First user created successfully as admin";
pub const USER_CREATED_MESSAGE: &str = "User created successfully";
pub const BAD_HEADER_DETAIL: &str = "Invalid authorization header. Use format: Bearer <token>";
pub const ADMIN_REQUIRED_DETAIL: &str = "Admin privileges required";

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registered {
    pub message: &'static str,
    pub uid: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedIn {
    pub token: String,
    pub uid: String,
}

/// The public view of a user returned by the admin listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub uid: String,
    pub email: String,
    pub disabled: bool,
    pub admin: bool,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            disabled: user.disabled,
            admin: user.is_admin(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthGateway {
    identity: Arc<dyn IdentityProvider>,
    verify_password: bool,
}

impl AuthGateway {
    pub fn new(identity: Arc<dyn IdentityProvider>, config: &AuthConfig) -> Self {
        Self {
            identity,
            verify_password: config.verify_password,
        }
    }

    /// Counts users, stopping as soon as a second one is seen.
    async fn is_first_user(&self) -> Result<bool> {
        let users = self
            .identity
            .list_users()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(users.iter().take(2).count() <= 1)
    }

    async fn mark(&self, uid: &str, admin: bool) -> Result<()> {
        self.identity
            .set_custom_user_claims(uid, admin_claims(admin))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }

    /// Creates a user. The very first user becomes an admin; if counting or
    /// marking fails the user is still created, as a non-admin.
    pub async fn register(&self, user: NewUser) -> Result<Registered> {
        let created = match self.identity.create_user(user).await {
            Ok(u) => u,
            Err(e) => {
                auth_metrics().inc_auth_event("register", "rejected");
                return Err(ServiceError::BadRequest(e.to_string()));
            }
        };
        let uid = created.uid;

        let promoted = match self.is_first_user().await {
            Ok(true) => self.mark(&uid, true).await.map(|_| true),
            Ok(false) => self.mark(&uid, false).await.map(|_| false),
            Err(e) => Err(e),
        };
        let is_admin = match promoted {
            Ok(is_admin) => is_admin,
            Err(e) => {
                tracing::warn!(target: "auth", %uid, error = %e, "admin check failed, registering as non-admin");
                if let Err(e) = self.mark(&uid, false).await {
                    tracing::warn!(target: "auth", %uid, error = %e, "could not clear admin claim");
                }
                false
            }
        };

        auth_metrics().inc_auth_event("register", "ok");
        tracing::info!(target: "auth", %uid, is_admin, "user registered");
        Ok(Registered {
            message: if is_admin {
                FIRST_USER_MESSAGE
            } else {
                USER_CREATED_MESSAGE
            },
            uid,
            is_admin,
        })
    }

    /// Mints a token for the user with this email. The password is only
    /// checked when `auth.verify_password` is enabled.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoggedIn> {
        let result = self.login_inner(email, password).await;
        auth_metrics().inc_auth_event("login", if result.is_ok() { "ok" } else { "rejected" });
        result
    }

    async fn login_inner(&self, email: &str, password: &str) -> Result<LoggedIn> {
        let user = self
            .identity
            .get_user_by_email(email)
            .await
            .map_err(|e| ServiceError::Unauthorized(e.to_string()))?;
        if self.verify_password {
            let ok = self
                .identity
                .verify_password(&user.uid, password)
                .await
                .map_err(|e| ServiceError::Unauthorized(e.to_string()))?;
            if !ok {
                return Err(ServiceError::Unauthorized(
                    "Invalid email or password".into(),
                ));
            }
        }
        let token = self
            .identity
            .create_custom_token(&user.uid)
            .await
            .map_err(|e| ServiceError::Unauthorized(e.to_string()))?;
        Ok(LoggedIn {
            token,
            uid: user.uid,
        })
    }

    /// Resolves an `Authorization` header value to an admin user.
    pub async fn authorize_admin(&self, header: Option<&str>) -> Result<UserRecord> {
        let result = self.authorize_admin_inner(header).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(ServiceError::Forbidden(_)) => "forbidden",
            Err(_) => "unauthorized",
        };
        auth_metrics().inc_auth_event("admin_check", outcome);
        result
    }

    async fn authorize_admin_inner(&self, header: Option<&str>) -> Result<UserRecord> {
        let token = header
            .and_then(|h| h.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServiceError::Unauthorized(BAD_HEADER_DETAIL.into()))?;
        let uid = self
            .identity
            .verify_token(token)
            .await
            .map_err(|e| ServiceError::Unauthorized(e.to_string()))?;
        let user = self
            .identity
            .get_user(&uid)
            .await
            .map_err(|e| ServiceError::Unauthorized(e.to_string()))?;
        if !user.is_admin() {
            return Err(ServiceError::Forbidden(ADMIN_REQUIRED_DETAIL.into()));
        }
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let users = self
            .identity
            .list_users()
            .await
            .map_err(|e| ServiceError::BadRequest(e.to_string()))?;
        Ok(users.iter().map(UserSummary::from).collect())
    }

    pub async fn make_admin(&self, uid: &str) -> Result<String> {
        self.identity
            .set_custom_user_claims(uid, admin_claims(true))
            .await
            .map_err(|e| ServiceError::BadRequest(e.to_string()))?;
        tracing::info!(target: "auth", %uid, "user promoted to admin");
        Ok(format!("User {uid} is now an admin"))
    }
}
