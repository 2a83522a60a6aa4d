//! Remote service access.
//!
//! A transport adapter issues HTTP requests and normalizes every outcome
//! (success, HTTP error, network failure) into a response envelope, so
//! callers never handle raw transport errors.

mod envelope;
mod transport;

pub use envelope::ApiResponse;
pub use transport::{default_error_envelope, RemoteTransport, RequestOptions};
