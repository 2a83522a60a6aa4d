//! Transport adapter for provider token endpoints.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::remote::{default_error_envelope, ApiResponse, RemoteTransport, RequestOptions};

/// Talks to provider token endpoints.
///
/// Token payloads arrive either wrapped under a `data` key or as the raw
/// body, depending on the provider. Unauthorized responses redirect the
/// caller to re-authentication instead of surfacing the raw HTTP error.
pub struct TokenTransport {
  http: reqwest::Client,
}

impl TokenTransport {
  pub fn new() -> Self {
    Self {
      http: reqwest::Client::new(),
    }
  }
}

impl Default for TokenTransport {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl RemoteTransport for TokenTransport {
  fn http(&self) -> &reqwest::Client {
    &self.http
  }

  fn parse_response(&self, status: StatusCode, body: Option<&Value>) -> Option<Value> {
    if !status.is_success() {
      return None;
    }
    let body = body?;
    body.get("data").cloned().or_else(|| Some(body.clone()))
  }

  fn handle_error(
    &self,
    status: Option<StatusCode>,
    body: Option<&Value>,
    message: &str,
    options: &RequestOptions,
  ) -> ApiResponse<Value> {
    if status == Some(StatusCode::UNAUTHORIZED) {
      return ApiResponse::fail_with(
        vec!["provider authorization expired, sign in again".to_string()],
        Some(json!("/providers/sign-in")),
      );
    }
    default_error_envelope(status, body, message, options)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_unwraps_data_envelopes() {
    let transport = TokenTransport::new();
    let wrapped = json!({"data": [{"code": "shipfast"}]});

    let payload = transport.parse_response(StatusCode::OK, Some(&wrapped));
    assert_eq!(payload, Some(json!([{"code": "shipfast"}])));

    let bare = json!([{"code": "shipfast"}]);
    let payload = transport.parse_response(StatusCode::OK, Some(&bare));
    assert_eq!(payload, Some(bare));
  }

  #[test]
  fn parse_returns_none_for_error_or_empty_responses() {
    let transport = TokenTransport::new();

    assert_eq!(transport.parse_response(StatusCode::BAD_GATEWAY, Some(&json!({}))), None);
    assert_eq!(transport.parse_response(StatusCode::OK, None), None);
  }

  #[test]
  fn unauthorized_redirects_to_sign_in() {
    let transport = TokenTransport::new();

    let envelope = transport.handle_error(
      Some(StatusCode::UNAUTHORIZED),
      None,
      "Request to /tokens returned 401",
      &RequestOptions::default(),
    );

    assert!(!envelope.success);
    assert_eq!(envelope.redirect, Some(json!("/providers/sign-in")));
  }
}
