//! Local-first data access and query layer for warehouse and inventory apps.
//!
//! Entities live in an embedded object store and stay available offline;
//! reads go through a deterministic in-memory filter/sort/paginate pipeline,
//! cached third-party data is TTL-guarded, and a reconnect hook reconciles
//! local state against the remote service when connectivity returns.

pub mod cache;
pub mod config;
pub mod connectivity;
pub mod query;
pub mod remote;
pub mod store;
pub mod tokens;
pub mod tree;

pub use cache::{ExpiringEntity, ExpiringStore, StaleDataError};
pub use connectivity::ConnectivityMonitor;
pub use query::{ConfigError, DataSource, FilterEntry, Paging, SortDirection, SortEntry};
pub use remote::{ApiResponse, RemoteTransport, RequestOptions};
pub use store::{sync_on_reconnect, Entity, EntityStore, IndexSpec, ObjectStore, StoreSpec};
