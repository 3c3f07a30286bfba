// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Flora Types
//!
//! The foundational library for the Flora service, containing the shared data
//! structures, error types and configuration objects.
//!
//! ## Architectural Role
//!
//! As the base crate, `flora-types` has minimal dependencies and is itself a
//! dependency for every other crate in the workspace. This keeps the error
//! taxonomy and the configuration schema in one canonical place.

/// A top-level, crate-wide `Result` type alias with a default error type.
pub type Result<T, E = crate::error::ServiceError> = std::result::Result<T, E>;

/// Shared configuration structures (`NodeConfig`, `ModelParameters`).
pub mod config;
/// A unified set of all error types used across the workspace.
pub mod error;
/// User records and custom claims owned by the identity provider.
pub mod identity;
/// The parameters document and its well-known location.
pub mod parameters;
