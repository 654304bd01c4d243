//! Partner API services
//!
//! Each service turns a typed call into requests on the shared
//! [`HttpExecutor`] and decodes what comes back.

pub mod auth;
pub mod orders;
pub mod packages;
pub mod sims;

use std::sync::Arc;

use airalo_common::Signature;
use airalo_domain::constants::SIGNATURE_HEADER_NAME;
use airalo_domain::{AiraloError, Result, SdkConfig};
use serde::Serialize;
use serde_json::Value;

pub use auth::{AccessTokenProvider, OAuthService};
pub use orders::OrderService;
pub use packages::{PackageListing, PackagesService};
pub use sims::SimService;

use crate::http::{HttpExecutor, RawResponse, RequestSpec};

/// Plumbing shared by every service.
#[derive(Clone)]
pub struct ServiceContext {
    config: Arc<SdkConfig>,
    executor: HttpExecutor,
    tokens: Arc<dyn AccessTokenProvider>,
    signature: Signature,
}

impl ServiceContext {
    pub fn new(
        config: Arc<SdkConfig>,
        executor: HttpExecutor,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        let signature = Signature::new(config.client_secret.clone());
        Self { config, executor, tokens, signature }
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn executor(&self) -> &HttpExecutor {
        &self.executor
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url())
    }

    pub(crate) async fn access_token(&self) -> Result<String> {
        self.tokens.access_token().await
    }

    /// JSON request carrying the bearer token.
    pub(crate) fn authorized(&self, spec: RequestSpec, token: &str) -> RequestSpec {
        spec.header("Content-Type: application/json").header(format!("Authorization: Bearer {token}"))
    }

    /// Authorized JSON POST of `payload` with its `airalo-signature`.
    pub(crate) fn signed_post<T: Serialize>(
        &self,
        url: String,
        payload: &T,
        token: &str,
    ) -> Result<RequestSpec> {
        let body = serde_json::to_value(payload)
            .map_err(|err| AiraloError::Serialization(format!("payload is not encodable: {err}")))?;

        let mut spec = self.authorized(RequestSpec::post(url), token).json(body);
        if let Some(signature) = self.signature.sign(payload) {
            spec = spec.header(format!("{SIGNATURE_HEADER_NAME}: {signature}"));
        }
        Ok(spec)
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("config", &self.config)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

/// Decode a response that must carry `expected` as its status.
///
/// # Errors
/// `AiraloError::Network` when there was no response, `AiraloError::Api`
/// for any other status, `AiraloError::Serialization` for a non-JSON body.
pub(crate) fn expect_status(raw: &RawResponse, expected: u16, what: &str) -> Result<Value> {
    if raw.is_unavailable() {
        return Err(AiraloError::Network(format!("{what} request produced no response")));
    }

    if raw.status() != expected {
        return Err(AiraloError::Api { status: raw.status(), body: raw.text() });
    }

    raw.json()
}

/// `true` when the `data` member is missing, null, or an empty array/object.
pub(crate) fn has_no_data(body: &Value) -> bool {
    match body.get("data") {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn expect_status_maps_failures() {
        assert!(matches!(
            expect_status(&RawResponse::unavailable(), 200, "order"),
            Err(AiraloError::Network(_))
        ));

        let raw = RawResponse::new(422, "", r#"{"meta":{"message":"invalid package"}}"#);
        match expect_status(&raw, 200, "order") {
            Err(AiraloError::Api { status, body }) => {
                assert_eq!(status, 422);
                assert!(body.contains("invalid package"));
            }
            other => panic!("expected api error, got {other:?}"),
        }

        let raw = RawResponse::new(202, "", r#"{"data":{"request_id":"r1"}}"#);
        assert_eq!(expect_status(&raw, 202, "order").unwrap()["data"]["request_id"], "r1");
    }

    #[test]
    fn empty_data_detection() {
        assert!(has_no_data(&json!({})));
        assert!(has_no_data(&json!({ "data": [] })));
        assert!(has_no_data(&json!({ "data": {} })));
        assert!(!has_no_data(&json!({ "data": { "remaining": 100 } })));
    }
}
