//! Remote transport: every outcome normalized into a response envelope.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::warn;
use url::Url;

use super::envelope::ApiResponse;

/// Per-request options carried alongside the URL and method.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
  pub body: Option<Value>,
  pub headers: Vec<(String, String)>,
  pub query: Vec<(String, String)>,
  /// Where to send the caller on success
  pub redirect_to: Option<Value>,
  /// Where to send the caller on failure
  pub error_redirect_to: Option<Value>,
  /// Free-form messages passed through to the success envelope
  pub messages: Vec<String>,
}

/// Transport adapter for one remote service.
///
/// `request` never surfaces a raw transport error: network failures and
/// non-2xx responses are converted into failure envelopes. Payload
/// extraction is entity-specific via `parse_response`; error-to-envelope
/// mapping can be substituted per adapter by overriding `handle_error`
/// (e.g., redirect on 401). Retry and backoff are left to callers.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
  fn http(&self) -> &reqwest::Client;

  /// Extract the entity payload from a response body.
  ///
  /// Must return `None` (never an error) when the response is absent, has
  /// no body, or is not OK.
  fn parse_response(&self, status: StatusCode, body: Option<&Value>) -> Option<Value>;

  /// Map a failed call onto a failure envelope. The default collects a
  /// readable message; overrides can delegate back to
  /// [`default_error_envelope`].
  fn handle_error(
    &self,
    status: Option<StatusCode>,
    body: Option<&Value>,
    message: &str,
    options: &RequestOptions,
  ) -> ApiResponse<Value> {
    default_error_envelope(status, body, message, options)
  }

  /// Issue a request and normalize the outcome.
  async fn request(&self, url: &str, method: Method, options: RequestOptions) -> ApiResponse<Value> {
    let target = if options.query.is_empty() {
      Url::parse(url)
    } else {
      Url::parse_with_params(url, &options.query)
    };
    let target = match target {
      Ok(target) => target,
      Err(e) => {
        return self.handle_error(None, None, &format!("Invalid request URL {}: {}", url, e), &options)
      }
    };

    let mut request = self.http().request(method, target);
    for (name, value) in &options.headers {
      request = request.header(name.as_str(), value.as_str());
    }
    if let Some(body) = &options.body {
      request = request.json(body);
    }

    let response = match request.send().await {
      Ok(response) => response,
      Err(e) => {
        warn!(url, error = %e, "request failed before a response arrived");
        return self.handle_error(None, None, &format!("Request to {} failed: {}", url, e), &options);
      }
    };

    let status = response.status();
    let body: Option<Value> = response.json().await.ok();

    if !status.is_success() {
      return self.handle_error(
        Some(status),
        body.as_ref(),
        &format!("Request to {} returned {}", url, status),
        &options,
      );
    }

    let payload = self.parse_response(status, body.as_ref());
    ApiResponse::ok_with(payload, options.redirect_to.clone(), options.messages.clone())
  }
}

/// Default error-to-envelope mapping.
///
/// HTTP-shaped error bodies surface their `error_description` ahead of the
/// transport-level message.
pub fn default_error_envelope(
  _status: Option<StatusCode>,
  body: Option<&Value>,
  message: &str,
  options: &RequestOptions,
) -> ApiResponse<Value> {
  let mut errors = Vec::new();

  if let Some(description) = body
    .and_then(|b| b.get("error_description"))
    .and_then(Value::as_str)
  {
    errors.push(description.to_string());
  }
  errors.push(message.to_string());

  ApiResponse::fail_with(errors, options.error_redirect_to.clone())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  struct EchoTransport {
    http: reqwest::Client,
  }

  impl EchoTransport {
    fn new() -> Self {
      Self {
        http: reqwest::Client::new(),
      }
    }
  }

  #[async_trait]
  impl RemoteTransport for EchoTransport {
    fn http(&self) -> &reqwest::Client {
      &self.http
    }

    fn parse_response(&self, status: StatusCode, body: Option<&Value>) -> Option<Value> {
      if !status.is_success() {
        return None;
      }
      body.cloned()
    }
  }

  #[test]
  fn error_description_is_surfaced_first() {
    let options = RequestOptions {
      error_redirect_to: Some(json!("/login")),
      ..Default::default()
    };
    let body = json!({"error": "invalid_grant", "error_description": "token revoked"});

    let envelope = default_error_envelope(
      Some(StatusCode::BAD_REQUEST),
      Some(&body),
      "Request to /token returned 400",
      &options,
    );

    assert!(!envelope.success);
    assert_eq!(envelope.errors[0], "token revoked");
    assert_eq!(envelope.redirect, Some(json!("/login")));
  }

  #[test]
  fn plain_failures_keep_the_transport_message() {
    let envelope =
      default_error_envelope(None, None, "Request to x failed: dns error", &RequestOptions::default());

    assert_eq!(envelope.errors, vec!["Request to x failed: dns error".to_string()]);
    assert_eq!(envelope.redirect, None);
  }

  #[tokio::test]
  async fn invalid_url_becomes_a_failure_envelope() {
    let transport = EchoTransport::new();

    let envelope = transport
      .request("not a url", Method::GET, RequestOptions::default())
      .await;

    assert!(!envelope.success);
    assert!(envelope.errors[0].contains("Invalid request URL"));
  }

  #[tokio::test]
  async fn unreachable_host_becomes_a_failure_envelope() {
    let transport = EchoTransport::new();

    // nothing listens on port 1; the connection is refused immediately
    let envelope = transport
      .request("http://127.0.0.1:1/status", Method::GET, RequestOptions::default())
      .await;

    assert!(!envelope.success);
    assert!(!envelope.errors.is_empty());
  }
}
