#![allow(dead_code)]

use airalo_domain::SdkConfig;
use airalo_infra::AiraloClient;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "integration-token";

/// Config pointed at the mock server's `/v2/` prefix.
pub fn config_for(server: &MockServer) -> SdkConfig {
    SdkConfig::new("partner-id", "partner-secret").with_api_url(format!("{}/v2", server.uri()))
}

/// Token endpoint answering with [`TOKEN`], expected to be hit exactly once.
pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "access_token": TOKEN } })),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Client with a mounted token endpoint.
pub async fn client_for(server: &MockServer) -> AiraloClient {
    mount_token(server).await;
    AiraloClient::new(config_for(server)).await.expect("client should initialise")
}

pub fn bearer() -> String {
    format!("Bearer {TOKEN}")
}
