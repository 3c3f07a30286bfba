// Path: crates/types/src/error/mod.rs
//! Core error types for the Flora service.

use std::path::PathBuf;
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised by a `DocumentStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested document was not found.
    #[error("document not found")]
    NotFound,
    /// A generic error originating from the underlying backend (e.g., redb).
    #[error("backend error: {0}")]
    Backend(String),
    /// An error occurred while serializing a document for storage.
    #[error("encode error: {0}")]
    Encode(String),
    /// An error occurred while deserializing a document from storage.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "STORE_NOT_FOUND",
            Self::Backend(_) => "STORE_BACKEND_ERROR",
            Self::Encode(_) => "STORE_ENCODE_ERROR",
            Self::Decode(_) => "STORE_DECODE_ERROR",
        }
    }
}

/// Errors raised by an `IdentityProvider`.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No user matches the given uid or email.
    #[error("No user record found for the provided identifier: {0}")]
    UserNotFound(String),
    /// A user with this email address already exists.
    #[error("The user with the provided email already exists: {0}")]
    EmailExists(String),
    /// A user-supplied argument (email, password, uid) was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The bearer token is unknown, malformed or expired.
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    /// The identity backend failed.
    #[error("Identity backend error: {0}")]
    Backend(String),
}

impl ErrorCode for IdentityError {
    fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "IDENTITY_USER_NOT_FOUND",
            Self::EmailExists(_) => "IDENTITY_EMAIL_EXISTS",
            Self::InvalidArgument(_) => "IDENTITY_INVALID_ARGUMENT",
            Self::InvalidToken(_) => "IDENTITY_INVALID_TOKEN",
            Self::Backend(_) => "IDENTITY_BACKEND_ERROR",
        }
    }
}

impl From<StoreError> for IdentityError {
    fn from(e: StoreError) -> Self {
        Self::Backend(e.to_string())
    }
}

/// Errors raised while bootstrapping the backend client from a service-account key.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The service-account key file does not exist.
    #[error("Service account key file not found: {0}")]
    KeyFileMissing(PathBuf),
    /// The key file could not be parsed or is not a service-account key.
    #[error("Invalid service account key: {0}")]
    InvalidKey(String),
    /// The document backend could not be opened.
    #[error("Failed to open document backend: {0}")]
    Store(#[from] StoreError),
}

impl ErrorCode for CredentialError {
    fn code(&self) -> &'static str {
        match self {
            Self::KeyFileMissing(_) => "CREDENTIAL_KEY_FILE_MISSING",
            Self::InvalidKey(_) => "CREDENTIAL_INVALID_KEY",
            Self::Store(_) => "CREDENTIAL_STORE_ERROR",
        }
    }
}

/// Errors raised by the dataset and model pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The dataset CSV file does not exist.
    #[error("Iris dataset file not found: {0}")]
    DatasetNotFound(PathBuf),
    /// No trained model artifact exists at the configured path.
    #[error("Trained model not found: {0}")]
    ModelNotFound(PathBuf),
    /// The hyperparameter configuration file does not exist.
    #[error("Model parameters file not found: {0}")]
    ConfigNotFound(PathBuf),
    /// Caller-supplied input was rejected (split fraction, feature vector, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A file was found but its contents could not be parsed.
    #[error("Value error while loading the data: {0}")]
    Parse(String),
    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(String),
    /// Fitting or applying the model failed.
    #[error("Training error: {0}")]
    Training(String),
}

impl ErrorCode for PipelineError {
    fn code(&self) -> &'static str {
        match self {
            Self::DatasetNotFound(_) => "PIPELINE_DATASET_NOT_FOUND",
            Self::ModelNotFound(_) => "PIPELINE_MODEL_NOT_FOUND",
            Self::ConfigNotFound(_) => "PIPELINE_CONFIG_NOT_FOUND",
            Self::InvalidInput(_) => "PIPELINE_INVALID_INPUT",
            Self::Parse(_) => "PIPELINE_PARSE_ERROR",
            Self::Io(_) => "PIPELINE_IO_ERROR",
            Self::Training(_) => "PIPELINE_TRAINING_ERROR",
        }
    }
}

/// The error taxonomy surfaced to HTTP callers.
///
/// Every variant carries the human-readable detail that ends up in the
/// response body; the HTTP status is derived from the variant alone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// A document, file or model is missing.
    #[error("{0}")]
    NotFound(String),
    /// Malformed input or a rejected create operation.
    #[error("{0}")]
    BadRequest(String),
    /// Missing, invalid or mismatched credentials.
    #[error("{0}")]
    Unauthorized(String),
    /// Valid credentials, insufficient privilege.
    #[error("{0}")]
    Forbidden(String),
    /// Anything unanticipated.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the variant name, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NotFound",
            Self::BadRequest(_) => "BadRequest",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Forbidden(_) => "Forbidden",
            Self::Internal(_) => "Internal",
        }
    }

    /// Returns the detail message carried by the error.
    pub fn detail(&self) -> &str {
        match self {
            Self::NotFound(s)
            | Self::BadRequest(s)
            | Self::Unauthorized(s)
            | Self::Forbidden(s)
            | Self::Internal(s) => s,
        }
    }
}

impl ErrorCode for ServiceError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "INVALID_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => Self::NotFound(e.to_string()),
            other => Self::Internal(format!("Firestore error: {other}")),
        }
    }
}

impl From<PipelineError> for ServiceError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::DatasetNotFound(_) => {
                Self::NotFound("Iris dataset file not found".into())
            }
            PipelineError::ModelNotFound(_) => Self::NotFound("Trained model not found".into()),
            PipelineError::InvalidInput(_) | PipelineError::Parse(_) => {
                Self::BadRequest(e.to_string())
            }
            PipelineError::ConfigNotFound(_) | PipelineError::Io(_) | PipelineError::Training(_) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_http_taxonomy() {
        let e: ServiceError = PipelineError::DatasetNotFound("data/Iris.csv".into()).into();
        assert_eq!(e, ServiceError::NotFound("Iris dataset file not found".into()));

        let e: ServiceError = PipelineError::InvalidInput("test_size".into()).into();
        assert_eq!(e.code(), "INVALID_REQUEST");

        let e: ServiceError = PipelineError::Training("empty".into()).into();
        assert_eq!(e.kind(), "Internal");
    }

    #[test]
    fn store_not_found_stays_not_found() {
        let e: ServiceError = StoreError::NotFound.into();
        assert!(matches!(e, ServiceError::NotFound(_)));
        let e: ServiceError = StoreError::Backend("disk full".into()).into();
        assert_eq!(e.detail(), "Firestore error: backend error: disk full");
    }
}
