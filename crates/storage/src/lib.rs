// Path: crates/storage/src/lib.rs
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

//! Backends for the external collaborators of the Flora service.
//!
//! * [`MemoryDocumentStore`] and [`RedbDocumentStore`] implement
//!   `DocumentStore`; the redb store keeps every collection in one table with
//!   `collection/id` keys and JSON-encoded values.
//! * [`StoreIdentityProvider`] implements `IdentityProvider` on top of any
//!   document store.
//! * [`Bootstrap`] turns a service-account key file into a [`BackendClient`]
//!   exactly once per process.

pub mod bootstrap;
pub mod identity;
pub mod memory;
pub mod redb_store;

pub use bootstrap::{BackendClient, Bootstrap, ServiceAccountKey};
pub use identity::StoreIdentityProvider;
pub use memory::MemoryDocumentStore;
pub use redb_store::RedbDocumentStore;
