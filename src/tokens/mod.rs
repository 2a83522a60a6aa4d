//! Provider token vertical: cached third-party credentials built on the
//! expiring cache adapter, with a soft-delete policy and last-write-wins
//! reconciliation against the remote token endpoint.

mod store;
mod transport;
mod types;

pub use store::{TokenStore, TOKEN_STORE};
pub use transport::TokenTransport;
pub use types::{ProviderToken, STATUS_ACTIVE, STATUS_LOCKED};
