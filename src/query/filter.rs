//! Filter configuration and matching.

use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use crate::store::Entity;

/// Custom match predicate for one filter entry.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// One field filter.
///
/// An entry with an empty `search` string is inert and excluded from
/// matching. Without a custom predicate, matching is a case-insensitive
/// substring test of `search` against the stringified field value, falling
/// back to the whole record when the field is absent.
#[derive(Clone)]
pub struct FilterEntry<T> {
  pub field: String,
  pub search: String,
  pub predicate: Option<Predicate<T>>,
}

impl<T: Entity> FilterEntry<T> {
  pub fn new(field: impl Into<String>, search: impl Into<String>) -> Self {
    Self {
      field: field.into(),
      search: search.into(),
      predicate: None,
    }
  }

  pub fn with_predicate(mut self, predicate: Predicate<T>) -> Self {
    self.predicate = Some(predicate);
    self
  }

  pub fn is_active(&self) -> bool {
    !self.search.is_empty()
  }

  pub fn matches(&self, entity: &T) -> bool {
    if let Some(predicate) = &self.predicate {
      return predicate(entity);
    }

    let haystack = match entity.field(&self.field) {
      Some(value) => stringify(&value),
      None => serde_json::to_value(entity)
        .map(|v| stringify(&v))
        .unwrap_or_default(),
    };

    haystack.to_lowercase().contains(&self.search.to_lowercase())
  }
}

impl<T> std::fmt::Debug for FilterEntry<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FilterEntry")
      .field("field", &self.field)
      .field("search", &self.search)
      .field("predicate", &self.predicate.as_ref().map(|_| "custom"))
      .finish()
  }
}

/// Active filter set plus the AND/OR combination mode.
#[derive(Clone, Debug)]
pub struct FilterConfig<T> {
  pub entries: Vec<FilterEntry<T>>,
  pub and_operator: bool,
}

impl<T> Default for FilterConfig<T> {
  fn default() -> Self {
    Self {
      entries: Vec::new(),
      and_operator: true,
    }
  }
}

impl<T: Entity> FilterConfig<T> {
  /// Apply the active filters to a collection.
  ///
  /// AND narrows the working set filter by filter. OR runs every active
  /// filter over the original set, concatenates the matches in filter order
  /// and de-duplicates by id, first occurrence winning.
  pub fn apply(&self, items: Vec<T>) -> Vec<T> {
    let active: Vec<&FilterEntry<T>> = self.entries.iter().filter(|e| e.is_active()).collect();
    if active.is_empty() {
      return items;
    }

    if self.and_operator {
      let mut current = items;
      for entry in active {
        current.retain(|item| entry.matches(item));
      }
      current
    } else {
      let mut seen: HashSet<String> = HashSet::new();
      let mut matched = Vec::new();
      for entry in active {
        for item in &items {
          if entry.matches(item) && seen.insert(item.id()) {
            matched.push(item.clone());
          }
        }
      }
      matched
    }
  }
}

/// Render a JSON value the way a user would search for it.
pub(crate) fn stringify(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}
