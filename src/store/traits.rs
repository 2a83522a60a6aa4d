//! Core trait and types for entities held in the object store.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Trait for domain records persisted in the local object store.
///
/// Implementors provide a unique id and the name of the object store their
/// records live in. Foreign-key relations (nested object plus a parallel
/// `*_id` scalar) are the caller's responsibility to keep consistent.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Unique identifier for this record (e.g., customer id, provider code)
  fn id(&self) -> String;

  /// Object-store name for this record kind (e.g., "customers", "orders")
  fn store_name() -> &'static str;

  /// Look up a named field as a JSON value.
  ///
  /// Returns `None` when the field is absent. This is what default filter
  /// predicates and sort comparators operate on, so records stay queryable
  /// by field name without per-type plumbing.
  fn field(&self, name: &str) -> Option<Value> {
    match serde_json::to_value(self) {
      Ok(Value::Object(map)) => map.get(name).cloned(),
      _ => None,
    }
  }
}
