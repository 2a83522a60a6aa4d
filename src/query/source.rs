//! The data source: filter -> sort -> count -> paginate over a store adapter.

use color_eyre::Result;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use super::filter::{FilterConfig, FilterEntry};
use super::paging::Paging;
use super::sort::{self, SortEntry};
use crate::store::{Entity, EntityStore};

/// Invalid filter/sort configuration. These are programming errors raised
/// synchronously and never recovered internally.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("filter entry requires a field name")]
  EmptyFilterField,
  #[error("sort entry requires a field name")]
  EmptySortField,
}

/// Deterministic in-memory query pipeline over one entity kind.
///
/// Holds the filter/sort/paging configuration, applies it to the collection
/// fetched from the store adapter, and caches the pre-pagination record
/// count for pagers. Configuration mutations are synchronous and visible to
/// the next read; callers serialize configuration and read calls per
/// instance.
pub struct DataSource<T: Entity, S: EntityStore<T>> {
  store: Arc<S>,
  filter: FilterConfig<T>,
  sorts: Vec<SortEntry<T>>,
  paging: Paging,
  /// Whether mutations notify observers
  emit: bool,
  /// Pre-pagination record count of the most recent read
  count: usize,
  changes: watch::Sender<u64>,
}

impl<T: Entity, S: EntityStore<T>> DataSource<T, S> {
  pub fn new(store: Arc<S>) -> Self {
    let (changes, _) = watch::channel(0);
    Self {
      store,
      filter: FilterConfig::default(),
      sorts: Vec::new(),
      paging: Paging::default(),
      emit: true,
      count: 0,
      changes,
    }
  }

  /// The store adapter this source reads from.
  pub fn store(&self) -> &Arc<S> {
    &self.store
  }

  /// Subscribe to refresh signals. Observers re-run `get_all` on every
  /// observed change.
  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.changes.subscribe()
  }

  /// Replace the active filter set (empty list clears it), reset paging to
  /// page 1 and mark whether subsequent mutations notify observers.
  pub fn set_filter(
    &mut self,
    entries: Vec<FilterEntry<T>>,
    and_operator: bool,
    emit: bool,
  ) -> Result<(), ConfigError> {
    if entries.iter().any(|e| e.field.is_empty()) {
      return Err(ConfigError::EmptyFilterField);
    }

    self.filter = FilterConfig { entries, and_operator };
    self.paging.page = 1;
    self.emit = emit;
    if emit {
      self.notify();
    }
    Ok(())
  }

  /// Upsert a single field's filter entry, matched by field name.
  pub fn add_filter(
    &mut self,
    entry: FilterEntry<T>,
    and_operator: bool,
    emit: bool,
  ) -> Result<(), ConfigError> {
    if entry.field.is_empty() {
      return Err(ConfigError::EmptyFilterField);
    }

    match self.filter.entries.iter_mut().find(|e| e.field == entry.field) {
      Some(existing) => *existing = entry,
      None => self.filter.entries.push(entry),
    }
    self.filter.and_operator = and_operator;
    self.emit = emit;
    if emit {
      self.notify();
    }
    Ok(())
  }

  /// Replace the sort list wholesale. The call is rejected as a whole when
  /// any entry is invalid.
  pub fn set_sort(&mut self, entries: Vec<SortEntry<T>>, emit: bool) -> Result<(), ConfigError> {
    if entries.iter().any(|e| e.field.is_empty()) {
      return Err(ConfigError::EmptySortField);
    }

    self.sorts = entries;
    self.emit = emit;
    if emit {
      self.notify();
    }
    Ok(())
  }

  pub fn set_paging(&mut self, page: usize, per_page: usize, emit: bool) {
    self.paging = Paging {
      page: page.max(1),
      per_page,
    };
    self.emit = emit;
    if emit {
      self.notify();
    }
  }

  /// Change the page. Without an explicit `emit`, the change notifies only
  /// when `per_page` is already positive, so an unconfigured pager does not
  /// oscillate observers.
  pub fn set_page(&mut self, page: usize, emit: Option<bool>) {
    self.paging.page = page.max(1);
    if emit.unwrap_or(self.paging.per_page > 0) {
      self.notify();
    }
  }

  /// Clear filter, sort and paging back to their defaults.
  pub fn reset(&mut self, emit: bool) {
    self.filter = FilterConfig::default();
    self.sorts.clear();
    self.paging = Paging::default();
    self.emit = emit;
    if emit {
      self.notify();
    }
  }

  /// Canonical read: fetch the full collection, filter, sort, snapshot the
  /// record count, paginate. Store failures have already degraded to an
  /// empty collection at the adapter boundary.
  pub async fn get_all(&mut self) -> Vec<T> {
    let items = self.store.get_all().await;
    let mut filtered = self.filter.apply(items);
    sort::apply(&mut filtered, &self.sorts);
    self.count = filtered.len();
    debug!(store = T::store_name(), count = self.count, "query pipeline read");
    self.paging.slice(filtered)
  }

  /// Read alias used by collection consumers.
  pub async fn get_elements(&mut self) -> Vec<T> {
    self.get_all().await
  }

  /// Read alias used by view initialization.
  pub async fn load(&mut self) -> Vec<T> {
    self.get_all().await
  }

  /// The pre-pagination record count of the most recent read. This is the
  /// figure a pager must use, not the raw store count.
  pub fn count(&self) -> usize {
    self.count
  }

  /// Replace `old` with `new` in the store, then signal observers.
  pub async fn update(&self, old: &T, new: &T) -> Result<()> {
    if old.id() != new.id() {
      // the record was re-keyed: drop the old row before upserting the new
      self.store.objects().delete(T::store_name(), &old.id())?;
    }
    self.store.update(new).await?;
    self.refresh();
    Ok(())
  }

  /// Remove an entity through the adapter's delete policy, then signal
  /// observers.
  pub async fn remove(&self, entity: &T) -> Result<()> {
    self.store.delete(entity).await?;
    self.refresh();
    Ok(())
  }

  /// Insert an entity, then signal observers. Resolves to 1 on success.
  pub async fn append(&self, entity: &T) -> usize {
    let inserted = self.store.insert(entity).await;
    self.refresh();
    inserted
  }

  /// Alias onto `append`; the store keeps no ordering distinction.
  pub async fn prepend(&self, entity: &T) -> usize {
    self.append(entity).await
  }

  /// Signal observers to re-run `get_all`, honoring the configured emit
  /// mode.
  pub fn refresh(&self) {
    if self.emit {
      self.notify();
    }
  }

  fn notify(&self) {
    self.changes.send_modify(|version| *version += 1);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::{ObjectStore, StoreSpec};
  use async_trait::async_trait;
  use serde::{Deserialize, Serialize};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Item {
    id: i64,
    name: String,
    status: i64,
  }

  impl Entity for Item {
    fn id(&self) -> String {
      self.id.to_string()
    }

    fn store_name() -> &'static str {
      "items"
    }
  }

  const SPECS: &[StoreSpec] = &[StoreSpec {
    name: "items",
    indexes: &[],
  }];

  struct ItemStore {
    objects: ObjectStore,
  }

  #[async_trait]
  impl EntityStore<Item> for ItemStore {
    fn objects(&self) -> &ObjectStore {
      &self.objects
    }

    async fn delete_executor(&self, entity: &Item) -> Result<()> {
      self.objects.delete(Item::store_name(), &entity.id())
    }

    async fn update_executor(&self, entity: &Item) -> Result<()> {
      self.objects.update(entity)
    }
  }

  fn item(id: i64, name: &str, status: i64) -> Item {
    Item {
      id,
      name: name.into(),
      status,
    }
  }

  async fn source_with(items: &[Item]) -> DataSource<Item, ItemStore> {
    let store = Arc::new(ItemStore {
      objects: ObjectStore::open_in_memory(SPECS).unwrap(),
    });
    let source = DataSource::new(store);
    for it in items {
      source.store().insert(it).await;
    }
    source
  }

  #[tokio::test]
  async fn filtered_page_and_count() {
    let mut source = source_with(&[item(1, "A", 0), item(2, "B", 1)]).await;

    source
      .set_filter(vec![FilterEntry::new("status", "1")], true, false)
      .unwrap();
    source.set_paging(1, 10, false);

    let page = source.get_all().await;
    assert_eq!(page, vec![item(2, "B", 1)]);
    assert_eq!(source.count(), 1);
  }

  #[tokio::test]
  async fn count_reflects_filtered_not_store_total() {
    let mut source = source_with(&[item(1, "A", 0), item(2, "B", 1), item(3, "C", 1)]).await;

    source
      .set_filter(vec![FilterEntry::new("status", "1")], true, false)
      .unwrap();
    source.set_paging(1, 1, false);

    let page = source.get_all().await;
    assert_eq!(page.len(), 1);
    assert_eq!(source.count(), 2);
    assert_eq!(source.store().count().await, 3);
  }

  #[tokio::test]
  async fn append_then_read_round_trips() {
    let mut source = source_with(&[]).await;

    assert_eq!(source.append(&item(1, "A", 0)).await, 1);
    assert_eq!(source.prepend(&item(2, "B", 0)).await, 1);

    let all = source.get_all().await;
    assert!(all.contains(&item(1, "A", 0)));
    assert!(all.contains(&item(2, "B", 0)));
  }

  #[tokio::test]
  async fn remove_and_update_mutate_the_store() {
    let mut source = source_with(&[item(1, "A", 0), item(2, "B", 0)]).await;

    source.remove(&item(1, "A", 0)).await.unwrap();
    source
      .update(&item(2, "B", 0), &item(2, "B renamed", 1))
      .await
      .unwrap();

    let all = source.get_all().await;
    assert_eq!(all, vec![item(2, "B renamed", 1)]);
  }

  #[tokio::test]
  async fn update_with_changed_id_drops_the_old_row() {
    let mut source = source_with(&[item(1, "A", 0)]).await;

    source.update(&item(1, "A", 0), &item(9, "A", 0)).await.unwrap();

    let all = source.get_all().await;
    assert_eq!(all, vec![item(9, "A", 0)]);
  }

  #[tokio::test]
  async fn set_filter_resets_paging_to_page_one() {
    let items: Vec<Item> = (0..15).map(|i| item(i, "X", 0)).collect();
    let mut source = source_with(&items).await;

    source.set_paging(2, 10, false);
    assert_eq!(source.get_all().await.len(), 5);

    // replacing the filter list snaps the pager back to the first page
    source.set_filter(Vec::new(), true, false).unwrap();
    assert_eq!(source.get_all().await.len(), 10);
  }

  #[tokio::test]
  async fn invalid_sort_entry_rejects_the_whole_call() {
    let mut source = source_with(&[]).await;

    let result = source.set_sort(
      vec![
        SortEntry::new("name", crate::query::SortDirection::Asc),
        SortEntry::new("", crate::query::SortDirection::Desc),
      ],
      false,
    );

    assert_eq!(result, Err(ConfigError::EmptySortField));
    assert!(source.sorts.is_empty());
  }

  #[tokio::test]
  async fn add_filter_upserts_by_field_name() {
    let mut source = source_with(&[]).await;

    source
      .add_filter(FilterEntry::new("name", "a"), true, false)
      .unwrap();
    source
      .add_filter(FilterEntry::new("name", "b"), true, false)
      .unwrap();
    source
      .add_filter(FilterEntry::new("status", "1"), true, false)
      .unwrap();

    assert_eq!(source.filter.entries.len(), 2);
    assert_eq!(source.filter.entries[0].search, "b");

    let rejected = source.add_filter(FilterEntry::new("", "x"), true, false);
    assert_eq!(rejected, Err(ConfigError::EmptyFilterField));
  }

  #[tokio::test]
  async fn page_changes_emit_only_when_per_page_is_configured() {
    let mut source = source_with(&[]).await;
    let mut observer = source.subscribe();

    // unconfigured pager: page change stays silent
    source.set_page(2, None);
    assert!(!observer.has_changed().unwrap());

    source.set_paging(1, 10, false);
    source.set_page(3, None);
    assert!(observer.has_changed().unwrap());
  }

  #[tokio::test]
  async fn emit_mode_gates_mutation_refreshes() {
    let source = source_with(&[]).await;
    let mut observer = source.subscribe();

    let mut source = source;
    source
      .set_filter(Vec::new(), true, false)
      .unwrap();

    source.append(&item(1, "A", 0)).await;
    assert!(!observer.has_changed().unwrap());

    source.set_filter(Vec::new(), true, true).unwrap();
    observer.borrow_and_update();
    source.append(&item(2, "B", 0)).await;
    assert!(observer.has_changed().unwrap());
  }

  #[tokio::test]
  async fn reset_restores_defaults() {
    let mut source = source_with(&[item(1, "A", 0), item(2, "B", 1)]).await;

    source
      .set_filter(vec![FilterEntry::new("status", "1")], true, false)
      .unwrap();
    source.set_paging(2, 1, false);
    source.reset(false);

    let all = source.get_all().await;
    assert_eq!(all.len(), 2);
    assert_eq!(source.count(), 2);
  }
}
