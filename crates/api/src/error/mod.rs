// Path: crates/api/src/error/mod.rs
//! Re-exports all core error types from the central `flora-types` crate.
pub use flora_types::error::*;
