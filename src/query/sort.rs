//! Sort configuration and multi-pass stable sorting.

use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

use super::filter::stringify;
use crate::store::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
  Asc,
  Desc,
}

/// Custom comparator for one sort entry.
pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// One sort pass over a named field.
///
/// Without a custom comparator, records are compared by the field's JSON
/// value, the whole serialized record standing in when the field is absent.
#[derive(Clone)]
pub struct SortEntry<T> {
  pub field: String,
  pub direction: SortDirection,
  pub compare: Option<Comparator<T>>,
}

impl<T: Entity> SortEntry<T> {
  pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
    Self {
      field: field.into(),
      direction,
      compare: None,
    }
  }

  pub fn with_comparator(mut self, compare: Comparator<T>) -> Self {
    self.compare = Some(compare);
    self
  }

  fn ordering(&self, a: &T, b: &T) -> Ordering {
    let ordering = match &self.compare {
      Some(compare) => compare(a, b),
      None => compare_values(&self.operand(a), &self.operand(b)),
    };

    match self.direction {
      SortDirection::Asc => ordering,
      SortDirection::Desc => ordering.reverse(),
    }
  }

  fn operand(&self, entity: &T) -> Value {
    entity
      .field(&self.field)
      .or_else(|| serde_json::to_value(entity).ok())
      .unwrap_or(Value::Null)
  }
}

impl<T> std::fmt::Debug for SortEntry<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SortEntry")
      .field("field", &self.field)
      .field("direction", &self.direction)
      .field("compare", &self.compare.as_ref().map(|_| "custom"))
      .finish()
  }
}

/// Apply the sort list in order as successive stable passes.
///
/// Each pass overrides the relative order established by earlier passes only
/// where it disagrees, so the last entry is the dominant key.
pub fn apply<T: Entity>(items: &mut [T], sorts: &[SortEntry<T>]) {
  for entry in sorts {
    items.sort_by(|a, b| entry.ordering(a, b));
  }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
  match (a, b) {
    (Value::Number(x), Value::Number(y)) => {
      let x = x.as_f64().unwrap_or(f64::NAN);
      let y = y.as_f64().unwrap_or(f64::NAN);
      x.partial_cmp(&y).unwrap_or(Ordering::Equal)
    }
    (Value::String(x), Value::String(y)) => x.cmp(y),
    (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
    _ => stringify(a).cmp(&stringify(b)),
  }
}
