//! Persistent store adapter: per-entity CRUD over the embedded object store.
//!
//! Read paths never let a storage error escape: they log and resolve to a
//! safe default instead. Delete and update route through per-adapter
//! executors, because "delete" is domain-specific: some entities are
//! soft-deleted (status flips plus an update), others are physically removed.

use async_trait::async_trait;
use color_eyre::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::batch::join_fold;
use super::object_store::ObjectStore;
use super::traits::Entity;

/// Store adapter for one entity kind.
///
/// `delete_executor` and `update_executor` carry the mutation policy and have
/// no default: every concrete adapter must decide between soft and hard
/// deletion when it is written.
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
  /// Underlying object store handle.
  fn objects(&self) -> &ObjectStore;

  /// Every record of this entity kind, empty on store failure.
  async fn get_all(&self) -> Vec<T> {
    match self.objects().get_all::<T>() {
      Ok(records) => records,
      Err(e) => {
        warn!(store = T::store_name(), error = %e, "failed to read records");
        Vec::new()
      }
    }
  }

  /// Single record by id, `None` on miss or store failure.
  async fn find_by_id(&self, id: &str) -> Option<T> {
    match self.objects().get::<T>(id) {
      Ok(record) => record,
      Err(e) => {
        warn!(store = T::store_name(), id, error = %e, "failed to read record");
        None
      }
    }
  }

  /// Records matching an indexed field value, empty on store failure.
  async fn find_entities(&self, index: &str, value: &Value) -> Vec<T> {
    match self.objects().get_by_index::<T>(index, value) {
      Ok(records) => records,
      Err(e) => {
        warn!(store = T::store_name(), index, error = %e, "index lookup failed");
        Vec::new()
      }
    }
  }

  /// Insert one record. Resolves to 1 on success, 0 on failure.
  async fn insert(&self, entity: &T) -> usize {
    match self.objects().add(entity) {
      Ok(()) => 1,
      Err(e) => {
        warn!(store = T::store_name(), id = %entity.id(), error = %e, "insert failed");
        0
      }
    }
  }

  /// Insert records one at a time and resolve to the number that succeeded.
  ///
  /// A failing record resolves to 0 without aborting the rest of the batch.
  async fn insert_entities(&self, entities: &[T]) -> usize {
    let inserts: Vec<_> = entities.iter().map(|e| self.insert(e)).collect();
    join_fold(0, |acc, n| acc + n, inserts).await
  }

  /// Delete policy for this entity kind. No default, see trait docs.
  async fn delete_executor(&self, entity: &T) -> Result<()>;

  /// Update policy for this entity kind. No default, see trait docs.
  async fn update_executor(&self, entity: &T) -> Result<()>;

  async fn delete(&self, entity: &T) -> Result<()> {
    self.delete_executor(entity).await
  }

  async fn update(&self, entity: &T) -> Result<()> {
    self.update_executor(entity).await
  }

  /// Delete records concurrently and resolve to the number that succeeded.
  async fn delete_entities(&self, entities: &[T]) -> usize {
    let deletes: Vec<_> = entities.iter().map(|e| self.delete(e)).collect();
    join_fold(0, |acc, r: Result<()>| acc + r.is_ok() as usize, deletes).await
  }

  /// Total row count in the store, independent of any in-memory filter.
  async fn count(&self) -> usize {
    match self.objects().count(T::store_name()) {
      Ok(count) => count,
      Err(e) => {
        warn!(store = T::store_name(), error = %e, "count failed");
        0
      }
    }
  }

  /// Reconciliation hook, invoked on every offline-to-online transition.
  ///
  /// The base implementation has nothing queued to replay. Adapters that
  /// mutate locally while offline override this to reconcile against the
  /// remote service.
  async fn synchronize(&self) {
    debug!(store = T::store_name(), "synchronize: nothing to reconcile");
  }
}

/// Spawn a task that invokes `synchronize()` whenever the connectivity
/// stream transitions from offline to online.
pub fn sync_on_reconnect<T, S>(adapter: Arc<S>, mut connectivity: watch::Receiver<bool>) -> JoinHandle<()>
where
  T: Entity,
  S: EntityStore<T> + 'static,
{
  tokio::spawn(async move {
    let mut online = *connectivity.borrow();
    while connectivity.changed().await.is_ok() {
      let now_online = *connectivity.borrow();
      if !online && now_online {
        debug!(store = T::store_name(), "connectivity restored, synchronizing");
        adapter.synchronize().await;
      }
      online = now_online;
    }
  })
}
