// Path: crates/test_utils/src/lib.rs
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

//! # Flora Test Utilities
//!
//! On-disk fixtures (the Iris CSV, a hyperparameter file, a service-account
//! key) and a ready-made in-memory backend client.

pub mod backend;
pub mod fixtures;

pub use backend::memory_backend;
pub use fixtures::{
    write_iris_csv, write_model_parameters, write_service_account_key, Fixtures, IRIS_CSV,
};
