// Path: crates/api/src/identity/mod.rs

//! Defines the `IdentityProvider` trait for user and token management.

use async_trait::async_trait;
use crate::error::IdentityError;
use flora_types::identity::{CustomClaims, NewUser, UserRecord};

/// An identity service owning user records and bearer tokens.
///
/// The shape mirrors a hosted authentication SDK: users are created with an
/// email and password, carry a free-form custom-claims map, and can be issued
/// opaque tokens that later decode back to their uid.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// Creates a user. Fails with `EmailExists` on a duplicate email and with
    /// `InvalidArgument` on a malformed email or a weak password.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, IdentityError>;

    /// Fetches a user by uid.
    async fn get_user(&self, uid: &str) -> Result<UserRecord, IdentityError>;

    /// Fetches a user by email.
    async fn get_user_by_email(&self, email: &str) -> Result<UserRecord, IdentityError>;

    /// Lists every user, ordered by uid.
    async fn list_users(&self) -> Result<Vec<UserRecord>, IdentityError>;

    /// Replaces the custom claims of a user.
    async fn set_custom_user_claims(
        &self,
        uid: &str,
        claims: CustomClaims,
    ) -> Result<(), IdentityError>;

    /// Mints an opaque bearer token for a uid.
    async fn create_custom_token(&self, uid: &str) -> Result<String, IdentityError>;

    /// Resolves a bearer token back to the uid it was minted for.
    async fn verify_token(&self, token: &str) -> Result<String, IdentityError>;

    /// Checks a plain-text password against the stored hash of a user.
    async fn verify_password(&self, uid: &str, password: &str) -> Result<bool, IdentityError>;
}
