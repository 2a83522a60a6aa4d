//! Deterministic in-memory query pipeline.
//!
//! A data source per entity kind holds filter/sort/paging configuration and
//! applies it to the collection read from the persistent store adapter:
//! filter -> sort -> count snapshot -> paginate. Mutations route through the
//! adapter and signal observers to re-read.

mod filter;
mod paging;
mod sort;
mod source;

pub use filter::{FilterConfig, FilterEntry, Predicate};
pub use paging::Paging;
pub use sort::{Comparator, SortDirection, SortEntry};
pub use source::{ConfigError, DataSource};
