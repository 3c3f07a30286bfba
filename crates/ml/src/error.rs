// Path: crates/ml/src/error.rs
use flora_types::error::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("{0}")]
    InvalidInput(String),
    #[error("csv error: {0}")]
    Csv(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("estimator is not fitted")]
    NotFitted,
    #[error("artifact error: {0}")]
    Artifact(String),
}

impl ErrorCode for MlError {
    fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "ML_FILE_NOT_FOUND",
            Self::InvalidInput(_) => "ML_INVALID_INPUT",
            Self::Csv(_) => "ML_CSV_ERROR",
            Self::Io(_) => "ML_IO_ERROR",
            Self::NotFitted => "ML_NOT_FITTED",
            Self::Artifact(_) => "ML_ARTIFACT_ERROR",
        }
    }
}

impl From<csv::Error> for MlError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

impl From<std::io::Error> for MlError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
