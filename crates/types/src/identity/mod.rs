// Path: crates/types/src/identity/mod.rs

//! User records owned by the identity provider.

use serde::{Deserialize, Serialize};

/// Custom claims attached to a user record. Only `admin` is read by the service.
pub type CustomClaims = serde_json::Map<String, serde_json::Value>;

/// The claim key checked on admin-gated operations.
pub const ADMIN_CLAIM: &str = "admin";

/// A user as stored by the identity provider.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserRecord {
    /// Unique, provider-assigned identifier.
    pub uid: String,
    /// Login email, unique across users.
    pub email: String,
    /// Disabled users are listed but otherwise untouched by the service.
    #[serde(default)]
    pub disabled: bool,
    /// Hex-encoded argon2 salt.
    pub password_salt: String,
    /// Hex-encoded argon2 output.
    pub password_hash: String,
    /// Unix seconds at creation.
    pub created_at: u64,
    /// Custom claims map; `None` until claims are first set.
    #[serde(default)]
    pub custom_claims: Option<CustomClaims>,
}

impl UserRecord {
    /// Whether the `admin` custom claim is present and `true`.
    pub fn is_admin(&self) -> bool {
        self.custom_claims
            .as_ref()
            .and_then(|c| c.get(ADMIN_CLAIM))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Input for creating a user.
#[derive(Debug, Deserialize, Clone)]
pub struct NewUser {
    /// Login email.
    pub email: String,
    /// Plain-text password; hashed by the provider before storage.
    pub password: String,
}

/// Builds a claims map holding only `admin: <value>`.
pub fn admin_claims(admin: bool) -> CustomClaims {
    let mut claims = CustomClaims::new();
    claims.insert(ADMIN_CLAIM.to_string(), serde_json::Value::Bool(admin));
    claims
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(claims: Option<CustomClaims>) -> UserRecord {
        UserRecord {
            uid: "u1".into(),
            email: "a@b.c".into(),
            disabled: false,
            password_salt: String::new(),
            password_hash: String::new(),
            created_at: 0,
            custom_claims: claims,
        }
    }

    #[test]
    fn admin_claim_must_be_boolean_true() {
        assert!(!record(None).is_admin());
        assert!(!record(Some(admin_claims(false))).is_admin());
        assert!(record(Some(admin_claims(true))).is_admin());

        let mut odd = CustomClaims::new();
        odd.insert(ADMIN_CLAIM.into(), serde_json::Value::String("true".into()));
        assert!(!record(Some(odd)).is_admin());
    }
}
