//! Local persistence layer.
//!
//! This module provides the embedded object store and the per-entity store
//! adapters built on it:
//! - JSON-blob object stores with declared indexes over an embedded SQLite
//!   database
//! - a store adapter trait with log-and-default failure semantics and
//!   per-adapter delete/update policy executors
//! - a reconnect watcher that drives offline reconciliation

mod adapter;
mod batch;
mod object_store;
mod traits;

pub use adapter::{sync_on_reconnect, EntityStore};
pub use batch::join_fold;
pub use object_store::{IndexSpec, ObjectStore, StoreSpec};
pub use traits::Entity;
