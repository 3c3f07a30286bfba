// Path: crates/ml/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # Flora ML
//!
//! The numeric core behind the Iris endpoints: a typed CSV table, feature
//! standardisation, a seeded train/test split, CART trees, a bagged random
//! forest and the on-disk model artifact. Everything here is synchronous and
//! CPU-bound; callers in async code run it on the blocking pool.

pub mod artifact;
pub mod dataset;
pub mod error;
pub mod forest;
pub mod metrics;
pub mod model_selection;
pub mod preprocessing;
pub mod tree;

/// Row-major feature matrix.
pub type Matrix = Vec<Vec<f64>>;

pub use artifact::{ModelArtifact, ARTIFACT_VERSION};
pub use dataset::{Cell, Table};
pub use error::MlError;
pub use forest::RandomForestClassifier;
pub use metrics::accuracy_score;
pub use model_selection::{train_test_split, train_test_split_indices, SplitIndices};
pub use preprocessing::{LabelEncoder, StandardScaler};
pub use tree::DecisionTreeClassifier;
