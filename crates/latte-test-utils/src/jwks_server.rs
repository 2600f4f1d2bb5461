//! Mock identity-provider JWKS endpoint backed by wiremock.

use crate::crypto_fixtures::{jwks_json, TestKeypair};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path Auth0 publishes its key set under.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// A running mock JWKS endpoint.
///
/// Expectations registered through `expect` are verified when the
/// `MockJwks` is dropped.
pub struct MockJwks {
    server: MockServer,
}

impl MockJwks {
    /// Serve the given keys.
    pub async fn serving(keys: &[&TestKeypair]) -> Self {
        Self::serving_json(jwks_json(keys), None).await
    }

    /// Serve the given keys and assert the exact number of fetches.
    pub async fn serving_with_fetches(keys: &[&TestKeypair], fetches: u64) -> Self {
        Self::serving_json(jwks_json(keys), Some(fetches)).await
    }

    /// Serve an arbitrary JSON body with status 200.
    pub async fn serving_json(body: Value, fetches: Option<u64>) -> Self {
        let server = MockServer::start().await;
        let mock = Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(body));
        match fetches {
            Some(count) => mock.expect(count).mount(&server).await,
            None => mock.mount(&server).await,
        }
        Self { server }
    }

    /// Respond to every fetch with the given status and no body.
    pub async fn failing(status: u16) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        Self { server }
    }

    /// Replace whatever is currently served, e.g. to simulate key rotation.
    pub async fn rotate_to(&self, keys: &[&TestKeypair]) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json(keys)))
            .mount(&self.server)
            .await;
    }

    /// Full JWKS URL.
    pub fn url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// Number of requests the endpoint has received so far.
    pub async fn fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}
