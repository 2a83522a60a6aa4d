//! Cached third-party provider credentials.

use serde::{Deserialize, Serialize};

use crate::cache::ExpiringEntity;
use crate::store::Entity;

/// Token is usable.
pub const STATUS_ACTIVE: i64 = 0;
/// Token was revoked or soft-deleted and must not be used again.
pub const STATUS_LOCKED: i64 = 1;

/// A provider credential cached from a remote token endpoint.
///
/// `expired_at`/`deleted_at` are epoch milliseconds; an `expired_at` of 0
/// marks a token that never expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderToken {
  /// Provider code, unique per provider (e.g. "shipfast", "palletline")
  pub code: String,
  pub access_token: String,
  pub token_type: String,
  pub status: i64,
  pub expired_at: i64,
  pub deleted_at: i64,
}

impl Entity for ProviderToken {
  fn id(&self) -> String {
    self.code.clone()
  }

  fn store_name() -> &'static str {
    "provider_tokens"
  }
}

impl ExpiringEntity for ProviderToken {
  fn code(&self) -> &str {
    &self.code
  }

  fn expired_at(&self) -> i64 {
    self.expired_at
  }

  fn deleted_at(&self) -> i64 {
    self.deleted_at
  }

  fn expire(&mut self, at_millis: i64) {
    self.expired_at = at_millis;
    self.deleted_at = at_millis;
  }
}
