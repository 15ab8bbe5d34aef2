//! Microsoft Graph HTTP client and its provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::graph::auth::{ClientCredentials, LOGIN_URL, StaticToken, TokenProvider};
use crate::graph::{ConsistencyLevel, GRAPH_URL, GraphError, GraphResult, GraphTransport};

fn default_base_url() -> String {
    GRAPH_URL.to_string()
}

fn default_login_url() -> String {
    LOGIN_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Connection settings for Microsoft Graph.
///
/// Either `access_token` (issued by the host) or the
/// `tenant_id`/`client_id`/`client_secret` triple must be present.
#[derive(Clone, Debug, Deserialize)]
pub struct GraphSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_url: default_login_url(),
            tenant_id: None,
            client_id: None,
            client_secret: None,
            access_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Bearer-authenticated reqwest client bound to the Graph audience.
pub struct GraphHttpClient {
    http_client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
}

impl GraphHttpClient {
    pub fn new(http_client: reqwest::Client, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http_client,
            tokens,
        }
    }

    /// Builds the client and token provider described by `settings`.
    pub fn from_settings(settings: &GraphSettings) -> GraphResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| GraphError::Config(format!("Failed to create HTTP client: {e}")))?;

        let tokens: Arc<dyn TokenProvider> = match (
            settings.access_token.as_deref(),
            settings.tenant_id.as_deref(),
            settings.client_id.as_deref(),
            settings.client_secret.as_deref(),
        ) {
            (Some(token), _, _, _) => Arc::new(StaticToken::new(token)),
            (None, Some(tenant_id), Some(client_id), Some(client_secret)) => {
                Arc::new(ClientCredentials::new(
                    http_client.clone(),
                    &settings.login_url,
                    tenant_id,
                    client_id,
                    client_secret,
                ))
            }
            _ => {
                return Err(GraphError::Config(
                    "either an access token or tenant/client credentials are required".to_string(),
                ));
            }
        };

        Ok(Self::new(http_client, tokens))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> GraphResult<Value> {
        let token = self.tokens.token().await?;
        let response = request
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(GraphError::from);
        }

        let body = response.text().await.unwrap_or_default();
        Err(GraphError::from_response(status.as_u16(), &body))
    }
}

#[async_trait]
impl GraphTransport for GraphHttpClient {
    async fn get(&self, url: &str, consistency: ConsistencyLevel) -> GraphResult<Value> {
        log::debug!("GET {url}");
        let mut request = self.http_client.get(url);
        if consistency == ConsistencyLevel::Eventual {
            request = request.header("ConsistencyLevel", "eventual");
        }
        self.send(request).await
    }

    async fn post(&self, url: &str, body: Value) -> GraphResult<Value> {
        log::debug!("POST {url}");
        self.send(self.http_client.post(url).json(&body)).await
    }
}

/// Resolves one authenticated Graph client per directory instance.
///
/// The first successful resolution is kept; a failed one is reported to the
/// caller and attempted again on the next call.
pub struct GraphClientProvider {
    settings: GraphSettings,
    client: OnceCell<Arc<dyn GraphTransport>>,
}

impl GraphClientProvider {
    pub fn new(settings: GraphSettings) -> Self {
        Self {
            settings,
            client: OnceCell::new(),
        }
    }

    /// Provider that hands out an already constructed transport.
    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn GraphTransport>) -> Self {
        Self {
            settings: GraphSettings {
                base_url: base_url.into(),
                ..GraphSettings::default()
            },
            client: OnceCell::new_with(Some(transport)),
        }
    }

    /// Versioned Graph endpoint requests are built against.
    pub fn graph_url(&self) -> &str {
        self.settings.base_url.trim_end_matches('/')
    }

    /// Builds the client and acquires a first token to prove the credentials.
    pub async fn resolve(&self) -> GraphResult<Arc<dyn GraphTransport>> {
        let client = self
            .client
            .get_or_try_init(|| async {
                let client = GraphHttpClient::from_settings(&self.settings)?;
                client.tokens.token().await?;
                log::info!("Graph client resolved for {}", self.graph_url());
                Ok::<Arc<dyn GraphTransport>, GraphError>(Arc::new(client))
            })
            .await
            .map_err(|err| {
                log::error!("Failed to resolve Graph client: {err}");
                err
            })?;

        Ok(client.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_client() -> GraphHttpClient {
        GraphHttpClient::new(reqwest::Client::new(), Arc::new(StaticToken::new("secret")))
    }

    #[tokio::test]
    async fn get_sends_bearer_and_consistency_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1.0/users"))
            .and(header("authorization", "Bearer secret"))
            .and(header("consistencylevel", "eventual"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .expect(1)
            .mount(&server)
            .await;

        let value = token_client()
            .get(
                &format!("{}/v1.0/users", server.uri()),
                ConsistencyLevel::Eventual,
            )
            .await
            .expect("request should succeed");

        assert_eq!(value, json!({"value": []}));
    }

    #[tokio::test]
    async fn error_status_is_mapped_to_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": "Authorization_RequestDenied", "message": "Insufficient privileges."}
            })))
            .mount(&server)
            .await;

        let err = token_client()
            .get(&format!("{}/v1.0/users", server.uri()), ConsistencyLevel::Default)
            .await
            .expect_err("request should fail");

        assert!(matches!(
            err,
            GraphError::Api { status: 403, ref code, .. } if code == "Authorization_RequestDenied"
        ));
    }

    #[tokio::test]
    async fn post_sends_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1.0/$batch"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responses": []})))
            .expect(1)
            .mount(&server)
            .await;

        let value = token_client()
            .post(
                &format!("{}/v1.0/$batch", server.uri()),
                json!({"requests": []}),
            )
            .await
            .expect("request should succeed");

        assert_eq!(value, json!({"responses": []}));
    }

    #[test]
    fn settings_without_credentials_are_rejected() {
        let result = GraphHttpClient::from_settings(&GraphSettings::default());
        assert!(matches!(result, Err(GraphError::Config(_))));
    }

    #[tokio::test]
    async fn provider_surfaces_acquisition_failure() {
        let provider = GraphClientProvider::new(GraphSettings {
            access_token: Some("  ".to_string()),
            ..GraphSettings::default()
        });

        assert!(matches!(provider.resolve().await, Err(GraphError::Auth(_))));
        assert!(!provider.client.initialized());
        assert!(matches!(provider.resolve().await, Err(GraphError::Auth(_))));
    }

    #[tokio::test]
    async fn provider_memoises_resolved_client() {
        let provider = GraphClientProvider::new(GraphSettings {
            access_token: Some("token".to_string()),
            ..GraphSettings::default()
        });

        let first = provider.resolve().await.expect("resolves");
        let second = provider.resolve().await.expect("resolves again");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.graph_url(), GRAPH_URL);
    }
}
