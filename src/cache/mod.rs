//! Expiring cache for third-party data.
//!
//! A store adapter specialization for cached remote responses (credentials,
//! rates, provider metadata) that:
//! - validates TTLs on every read and raises a typed stale-data error
//! - soft-expires entries on delete, preserving an audit trail

mod expiring;

pub use expiring::{ExpiringEntity, ExpiringStore, StaleDataError};
