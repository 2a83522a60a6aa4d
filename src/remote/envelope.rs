//! Uniform success/failure wrapper for remote call outcomes.

use serde_json::Value;

/// Normalized outcome of a remote call.
///
/// Constructed once per call by the transport and consumed by the caller;
/// not mutated after construction.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
  pub success: bool,
  pub payload: Option<T>,
  /// Where the caller should navigate next, if anywhere
  pub redirect: Option<Value>,
  pub errors: Vec<String>,
  pub messages: Vec<String>,
}

impl<T> ApiResponse<T> {
  pub fn ok(payload: Option<T>) -> Self {
    Self::ok_with(payload, None, Vec::new())
  }

  pub fn ok_with(payload: Option<T>, redirect: Option<Value>, messages: Vec<String>) -> Self {
    Self {
      success: true,
      payload,
      redirect,
      errors: Vec::new(),
      messages,
    }
  }

  pub fn fail(errors: Vec<String>) -> Self {
    Self::fail_with(errors, None)
  }

  pub fn fail_with(errors: Vec<String>, redirect: Option<Value>) -> Self {
    Self {
      success: false,
      payload: None,
      redirect,
      errors,
      messages: Vec::new(),
    }
  }

  /// Map the payload type, keeping the envelope intact.
  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
    ApiResponse {
      success: self.success,
      payload: self.payload.map(f),
      redirect: self.redirect,
      errors: self.errors,
      messages: self.messages,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn ok_and_fail_set_the_flag() {
    let ok: ApiResponse<i32> = ApiResponse::ok(Some(5));
    assert!(ok.success);
    assert_eq!(ok.payload, Some(5));
    assert!(ok.errors.is_empty());

    let fail: ApiResponse<i32> = ApiResponse::fail(vec!["boom".into()]);
    assert!(!fail.success);
    assert_eq!(fail.payload, None);
    assert_eq!(fail.errors, vec!["boom".to_string()]);
  }

  #[test]
  fn map_transforms_only_the_payload() {
    let response = ApiResponse::ok_with(Some(2), Some(json!("/next")), vec!["saved".into()]);
    let mapped = response.map(|n| n * 10);

    assert_eq!(mapped.payload, Some(20));
    assert_eq!(mapped.redirect, Some(json!("/next")));
    assert_eq!(mapped.messages, vec!["saved".to_string()]);
  }
}
