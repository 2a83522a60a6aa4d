//! TTL-guarded store wrapper for cached third-party data.

use chrono::Utc;
use color_eyre::Result;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::store::{Entity, EntityStore};

/// Entity with an expiration lifecycle, e.g. a cached provider credential.
///
/// `expired_at` and `deleted_at` are epoch milliseconds; an `expired_at` of 0
/// means the entry never expires.
pub trait ExpiringEntity: Entity {
  /// Stable code identifying the cached source (e.g. a provider code)
  fn code(&self) -> &str;

  fn expired_at(&self) -> i64;

  fn deleted_at(&self) -> i64;

  /// Stamp both `deleted_at` and `expired_at`. Used by the soft-expiry
  /// delete path.
  fn expire(&mut self, at_millis: i64);
}

/// Raised when a read returns an entry whose expiration instant has passed.
///
/// Deliberately propagated instead of defaulted: silently returning expired
/// third-party credentials would be unsafe.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("stale third-party data for {code}: {cause}")]
pub struct StaleDataError {
  pub code: String,
  pub cause: String,
}

/// Store adapter specialization that validates TTLs on every read and turns
/// deletion into soft expiry.
///
/// Reads go through the inner adapter and are then guarded entry by entry.
/// Deletion stamps `deleted_at`/`expired_at` to the current instant and
/// routes through the normal update path. No row is ever physically
/// removed, which preserves an audit trail of expired entries.
pub struct ExpiringStore<S> {
  inner: S,
}

impl<S> ExpiringStore<S> {
  pub fn new(inner: S) -> Self {
    Self { inner }
  }

  /// The wrapped store adapter.
  pub fn inner(&self) -> &S {
    &self.inner
  }

  /// Every cached entry, failing on the first stale one.
  pub async fn get_all<T>(&self) -> Result<Vec<T>, StaleDataError>
  where
    T: ExpiringEntity,
    S: EntityStore<T>,
  {
    let now = Utc::now().timestamp_millis();
    self
      .inner
      .get_all()
      .await
      .into_iter()
      .map(|entry| guard(entry, now))
      .collect()
  }

  /// Single entry by id, failing when the entry is stale.
  pub async fn find_by_id<T>(&self, id: &str) -> Result<Option<T>, StaleDataError>
  where
    T: ExpiringEntity,
    S: EntityStore<T>,
  {
    let now = Utc::now().timestamp_millis();
    self.inner.find_by_id(id).await.map(|e| guard(e, now)).transpose()
  }

  /// Indexed lookup, failing on the first stale entry.
  pub async fn find_entities<T>(&self, index: &str, value: &Value) -> Result<Vec<T>, StaleDataError>
  where
    T: ExpiringEntity,
    S: EntityStore<T>,
  {
    let now = Utc::now().timestamp_millis();
    self
      .inner
      .find_entities(index, value)
      .await
      .into_iter()
      .map(|entry| guard(entry, now))
      .collect()
  }

  pub async fn insert<T>(&self, entity: &T) -> usize
  where
    T: ExpiringEntity,
    S: EntityStore<T>,
  {
    self.inner.insert(entity).await
  }

  pub async fn update<T>(&self, entity: &T) -> Result<()>
  where
    T: ExpiringEntity,
    S: EntityStore<T>,
  {
    self.inner.update(entity).await
  }

  /// Soft-expire an entry: stamp it and route through the update path.
  pub async fn delete<T>(&self, entity: &T) -> Result<()>
  where
    T: ExpiringEntity,
    S: EntityStore<T>,
  {
    let now = Utc::now().timestamp_millis();
    let mut expired = entity.clone();
    expired.expire(now);
    debug!(code = entity.code(), "soft-expiring cached entry");
    self.inner.update(&expired).await
  }
}

/// Check one entry's expiration against `now`.
fn guard<T: ExpiringEntity>(entry: T, now: i64) -> Result<T, StaleDataError> {
  let expires = entry.expired_at();
  if expires != 0 && expires <= now {
    return Err(StaleDataError {
      code: entry.code().to_string(),
      cause: format!("expiration instant {} is not after {}", expires, now),
    });
  }
  Ok(entry)
}
