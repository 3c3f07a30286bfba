// Path: crates/types/src/parameters/mod.rs

//! The tunable-hyperparameters document.
//!
//! Exactly one instance exists per deployment, stored at
//! [`PARAMETERS_COLLECTION`]/[`PARAMETERS_DOCUMENT`]. Any key and any JSON
//! value shape is accepted.

/// Field map of the parameters document, in insertion order.
pub type ParameterMap = serde_json::Map<String, serde_json::Value>;

/// Collection holding the parameters document.
pub const PARAMETERS_COLLECTION: &str = "parameters";
/// Id of the single parameters document.
pub const PARAMETERS_DOCUMENT: &str = "parameters";
