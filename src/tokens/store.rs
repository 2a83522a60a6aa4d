//! Store adapter for cached provider tokens.

use async_trait::async_trait;
use chrono::Utc;
use color_eyre::Result;
use reqwest::Method;
use std::sync::Arc;
use tracing::{debug, warn};

use super::transport::TokenTransport;
use super::types::{ProviderToken, STATUS_LOCKED};
use crate::cache::{ExpiringEntity, ExpiringStore};
use crate::remote::{RemoteTransport, RequestOptions};
use crate::store::{EntityStore, IndexSpec, ObjectStore, StoreSpec};

/// Object-store declaration for provider tokens.
pub const TOKEN_STORE: StoreSpec = StoreSpec {
  name: "provider_tokens",
  indexes: &[IndexSpec {
    name: "by_code",
    field: "code",
    unique: true,
  }],
};

/// Token adapter with soft-delete policy: a deleted token is locked and
/// stamped, never physically removed, so expired credentials stay auditable.
pub struct TokenStore {
  objects: Arc<ObjectStore>,
  transport: Arc<TokenTransport>,
  tokens_url: String,
}

impl TokenStore {
  pub fn new(objects: Arc<ObjectStore>, transport: Arc<TokenTransport>, base_url: &str) -> Self {
    Self {
      objects,
      transport,
      tokens_url: format!("{}/tokens", base_url.trim_end_matches('/')),
    }
  }

  /// Wrap this adapter in the TTL-guarded cache surface.
  pub fn into_cache(self) -> ExpiringStore<Self> {
    ExpiringStore::new(self)
  }
}

#[async_trait]
impl EntityStore<ProviderToken> for TokenStore {
  fn objects(&self) -> &ObjectStore {
    &self.objects
  }

  async fn delete_executor(&self, token: &ProviderToken) -> Result<()> {
    let mut locked = token.clone();
    locked.status = STATUS_LOCKED;
    locked.expire(Utc::now().timestamp_millis());
    self.update_executor(&locked).await
  }

  async fn update_executor(&self, token: &ProviderToken) -> Result<()> {
    self.objects.update(token)
  }

  /// Last-write-wins reconciliation: the remote token endpoint is the
  /// authority, its entries overwrite the local rows. Failures keep the
  /// local cache untouched.
  async fn synchronize(&self) {
    let response = self
      .transport
      .request(&self.tokens_url, Method::GET, RequestOptions::default())
      .await;

    if !response.success {
      warn!(errors = ?response.errors, "token synchronization failed, keeping local entries");
      return;
    }

    let Some(payload) = response.payload else {
      debug!("token endpoint returned no payload, nothing to reconcile");
      return;
    };

    let tokens: Vec<ProviderToken> = match serde_json::from_value(payload) {
      Ok(tokens) => tokens,
      Err(e) => {
        warn!(error = %e, "token payload did not deserialize, keeping local entries");
        return;
      }
    };

    for token in &tokens {
      if let Err(e) = self.objects.update(token) {
        warn!(code = token.code(), error = %e, "failed to store reconciled token");
      }
    }
    debug!(count = tokens.len(), "token cache reconciled");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tokens::types::STATUS_ACTIVE;

  fn token_store() -> TokenStore {
    TokenStore::new(
      Arc::new(ObjectStore::open_in_memory(&[TOKEN_STORE]).unwrap()),
      Arc::new(TokenTransport::new()),
      "http://127.0.0.1:1",
    )
  }

  fn token(code: &str) -> ProviderToken {
    ProviderToken {
      code: code.into(),
      access_token: "abc".into(),
      token_type: "bearer".into(),
      status: STATUS_ACTIVE,
      expired_at: 0,
      deleted_at: 0,
    }
  }

  #[tokio::test]
  async fn soft_delete_never_reduces_the_store_count() {
    let store = token_store();
    store.insert(&token("shipfast")).await;

    store.delete(&token("shipfast")).await.unwrap();

    assert_eq!(store.count().await, 1);
    let stored = store.find_by_id("shipfast").await.unwrap();
    assert_eq!(stored.status, STATUS_LOCKED);
    assert!(stored.deleted_at > 0);
    assert_eq!(stored.deleted_at, stored.expired_at);
  }

  #[tokio::test]
  async fn failed_synchronization_keeps_local_entries() {
    let store = token_store();
    store.insert(&token("shipfast")).await;

    // nothing listens on the configured endpoint, so the fetch fails
    store.synchronize().await;

    assert_eq!(store.count().await, 1);
    assert_eq!(
      store.find_by_id("shipfast").await.map(|t| t.status),
      Some(STATUS_ACTIVE)
    );
  }

  #[tokio::test]
  async fn cache_surface_raises_after_soft_delete() {
    let cache = token_store().into_cache();
    cache.insert(&token("shipfast")).await;

    cache.inner().delete(&token("shipfast")).await.unwrap();

    let err = cache.find_by_id::<ProviderToken>("shipfast").await.unwrap_err();
    assert_eq!(err.code, "shipfast");
  }
}
