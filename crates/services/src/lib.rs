// Path: crates/services/src/lib.rs
#![forbid(unsafe_code)]
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

//! The three adapters behind the HTTP surface. Each holds only the handles
//! it needs and returns [`flora_types::error::ServiceError`] on failure.

pub mod auth;
pub mod parameters;
pub mod pipeline;

pub use auth::AuthGateway;
pub use parameters::ParametersStore;
pub use pipeline::IrisPipeline;
