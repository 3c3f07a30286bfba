// Path: crates/api/src/lib.rs

//! # Flora API Crate Lints
//!
//! This crate enforces a strict set of lints to ensure panic-free code.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # Flora API
//!
//! Traits at the seams between the service and its external collaborators:
//! a document store holding the parameters document, and an identity
//! provider owning users and bearer tokens. Concrete backends live in
//! `flora-storage`.

/// Re-exports the error types from the central `flora-types` crate.
pub mod error;
/// Defines the `IdentityProvider` trait.
pub mod identity;
/// Defines the `DocumentStore` trait.
pub mod storage;

/// A curated set of the most commonly used traits and types.
pub mod prelude {
    pub use crate::identity::IdentityProvider;
    pub use crate::storage::{Document, DocumentStore};
}
