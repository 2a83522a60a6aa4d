//! Embedded object store over SQLite.
//!
//! Records are stored as JSON blobs in a single generic table, one logical
//! object store per entity kind. Index definitions are declared once at open
//! time and become SQLite expression indexes over the JSON payload.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::traits::Entity;

/// A secondary index over one JSON field of an object store.
#[derive(Debug, Clone, Copy)]
pub struct IndexSpec {
  /// Index name used by `get_by_index` lookups
  pub name: &'static str,
  /// JSON field the index covers
  pub field: &'static str,
  /// Whether values must be unique within the store
  pub unique: bool,
}

/// Declaration of one object store and its indexes.
#[derive(Debug, Clone, Copy)]
pub struct StoreSpec {
  pub name: &'static str,
  pub indexes: &'static [IndexSpec],
}

/// Schema for the generic object table.
const STORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS objects (
    store TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    PRIMARY KEY (store, id)
);
"#;

/// Local embedded object store shared by every store adapter.
pub struct ObjectStore {
  conn: Mutex<Connection>,
  /// (store name, index name) -> indexed JSON field
  indexes: HashMap<(&'static str, &'static str), IndexSpec>,
}

impl ObjectStore {
  /// Open or create the store at the default location.
  pub fn open_default(specs: &[StoreSpec]) -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create store directory: {}", e))?;
    }

    Self::open(&path, specs)
  }

  /// Open or create the store at an explicit path.
  pub fn open(path: &Path, specs: &[StoreSpec]) -> Result<Self> {
    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open object store at {}: {}", path.display(), e))?;

    Self::from_connection(conn, specs)
  }

  /// Open an in-memory store. Used by tests and ephemeral sessions.
  pub fn open_in_memory(specs: &[StoreSpec]) -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory object store: {}", e))?;

    Self::from_connection(conn, specs)
  }

  fn from_connection(conn: Connection, specs: &[StoreSpec]) -> Result<Self> {
    let store = Self {
      conn: Mutex::new(conn),
      indexes: specs
        .iter()
        .flat_map(|s| s.indexes.iter().map(|i| ((s.name, i.name), *i)))
        .collect(),
    };
    store.run_migrations(specs)?;

    Ok(store)
  }

  /// Get the default store path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("stockroom").join("store.db"))
  }

  /// Create the object table and the declared expression indexes.
  fn run_migrations(&self, specs: &[StoreSpec]) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(STORE_SCHEMA)
      .map_err(|e| eyre!("Failed to run store migrations: {}", e))?;

    for spec in specs {
      for index in spec.indexes {
        let unique = if index.unique { "UNIQUE " } else { "" };
        let sql = format!(
          "CREATE {}INDEX IF NOT EXISTS idx_{}_{} ON objects (json_extract(data, '$.{}')) WHERE store = '{}'",
          unique, spec.name, index.name, index.field, spec.name
        );
        conn
          .execute(&sql, [])
          .map_err(|e| eyre!("Failed to create index {}.{}: {}", spec.name, index.name, e))?;
      }
    }

    Ok(())
  }

  /// Get every record in an object store.
  pub fn get_all<T: Entity>(&self) -> Result<Vec<T>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT data FROM objects WHERE store = ?1 ORDER BY rowid")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let records: Vec<T> = stmt
      .query_map(params![T::store_name()], |row| {
        let data: String = row.get(0)?;
        Ok(data)
      })
      .map_err(|e| eyre!("Failed to query store {}: {}", T::store_name(), e))?
      .filter_map(|r| r.ok())
      .filter_map(|data| serde_json::from_str(&data).ok())
      .collect();

    Ok(records)
  }

  /// Get a single record by id.
  pub fn get<T: Entity>(&self, id: &str) -> Result<Option<T>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT data FROM objects WHERE store = ?1 AND id = ?2")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let data: Option<String> = stmt
      .query_row(params![T::store_name(), id], |row| row.get(0))
      .ok();

    match data {
      Some(data) => {
        let record: T = serde_json::from_str(&data)
          .map_err(|e| eyre!("Failed to deserialize record {}: {}", id, e))?;
        Ok(Some(record))
      }
      None => Ok(None),
    }
  }

  /// Add a record. Fails when a record with the same id already exists.
  pub fn add<T: Entity>(&self, entity: &T) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let data =
      serde_json::to_string(entity).map_err(|e| eyre!("Failed to serialize record: {}", e))?;

    conn
      .execute(
        "INSERT INTO objects (store, id, data) VALUES (?1, ?2, ?3)",
        params![T::store_name(), entity.id(), data],
      )
      .map_err(|e| eyre!("Failed to add record to {}: {}", T::store_name(), e))?;

    Ok(())
  }

  /// Insert or replace a record by id.
  pub fn update<T: Entity>(&self, entity: &T) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let data =
      serde_json::to_string(entity).map_err(|e| eyre!("Failed to serialize record: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO objects (store, id, data) VALUES (?1, ?2, ?3)",
        params![T::store_name(), entity.id(), data],
      )
      .map_err(|e| eyre!("Failed to update record in {}: {}", T::store_name(), e))?;

    Ok(())
  }

  /// Physically remove a record by id.
  pub fn delete(&self, store: &str, id: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "DELETE FROM objects WHERE store = ?1 AND id = ?2",
        params![store, id],
      )
      .map_err(|e| eyre!("Failed to delete record from {}: {}", store, e))?;

    Ok(())
  }

  /// Get records matching an indexed field value.
  ///
  /// The index must have been declared in the `StoreSpec` passed at open time.
  pub fn get_by_index<T: Entity>(&self, index: &str, value: &Value) -> Result<Vec<T>> {
    let spec = self
      .indexes
      .iter()
      .find(|((store, name), _)| *store == T::store_name() && *name == index)
      .map(|(_, spec)| *spec)
      .ok_or_else(|| eyre!("Unknown index {} on store {}", index, T::store_name()))?;

    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let sql = format!(
      "SELECT data FROM objects WHERE store = ?1 AND json_extract(data, '$.{}') = ?2 ORDER BY rowid",
      spec.field
    );
    let mut stmt = conn
      .prepare(&sql)
      .map_err(|e| eyre!("Failed to prepare index query: {}", e))?;

    let records: Vec<T> = stmt
      .query_map(params![T::store_name(), bind_value(value)], |row| {
        let data: String = row.get(0)?;
        Ok(data)
      })
      .map_err(|e| eyre!("Failed to query index {}: {}", index, e))?
      .filter_map(|r| r.ok())
      .filter_map(|data| serde_json::from_str(&data).ok())
      .collect();

    Ok(records)
  }

  /// Total row count of an object store, independent of any in-memory filter.
  pub fn count(&self, store: &str) -> Result<usize> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let count: i64 = conn
      .query_row(
        "SELECT COUNT(*) FROM objects WHERE store = ?1",
        params![store],
        |row| row.get(0),
      )
      .map_err(|e| eyre!("Failed to count store {}: {}", store, e))?;

    Ok(count as usize)
  }

  /// Remove every record in an object store.
  pub fn clear(&self, store: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM objects WHERE store = ?1", params![store])
      .map_err(|e| eyre!("Failed to clear store {}: {}", store, e))?;

    Ok(())
  }
}

/// Map a JSON value to the SQL value `json_extract` produces for it, so index
/// lookups compare like for like.
fn bind_value(value: &Value) -> rusqlite::types::Value {
  use rusqlite::types::Value as SqlValue;

  match value {
    Value::Null => SqlValue::Null,
    Value::Bool(b) => SqlValue::Integer(*b as i64),
    Value::Number(n) => {
      if let Some(i) = n.as_i64() {
        SqlValue::Integer(i)
      } else {
        SqlValue::Real(n.as_f64().unwrap_or_default())
      }
    }
    Value::String(s) => SqlValue::Text(s.clone()),
    other => SqlValue::Text(other.to_string()),
  }
}
