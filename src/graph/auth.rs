//! Access tokens for the Graph audience.
//!
//! Interactive sign-in is the host's concern. The directory only needs a
//! bearer token, either handed over by the host or obtained with the OAuth2
//! client credentials flow.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::graph::{GRAPH_RESOURCE, GraphError, GraphResult};

/// Default Azure AD authority.
pub const LOGIN_URL: &str = "https://login.microsoftonline.com";

/// Supplies bearer tokens for Graph requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> GraphResult<String>;
}

/// Token issued by the hosting environment.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> GraphResult<String> {
        if self.0.trim().is_empty() {
            return Err(GraphError::Auth("empty access token".to_string()));
        }
        Ok(self.0.clone())
    }
}

/// OAuth2 token response from Azure AD.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Cached OAuth2 access token.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Returns true if the token is expired or will expire within the grace period.
    fn is_expired(&self, grace_period: Duration) -> bool {
        Utc::now() + grace_period >= self.expires_at
    }
}

/// Client credentials flow with an in-memory token cache.
pub struct ClientCredentials {
    http_client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cached_token: RwLock<Option<CachedToken>>,
    /// Grace period before expiry to trigger refresh.
    grace_period: Duration,
}

impl ClientCredentials {
    pub fn new(
        http_client: reqwest::Client,
        login_url: &str,
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                login_url.trim_end_matches('/'),
                tenant_id
            ),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cached_token: RwLock::new(None),
            grace_period: Duration::minutes(5),
        }
    }

    async fn acquire_token(&self) -> GraphResult<CachedToken> {
        let scope = format!("{GRAPH_RESOURCE}/.default");
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GraphError::Auth(format!("Token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Auth(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GraphError::Auth(format!("Invalid token response: {e}")))?;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl TokenProvider for ClientCredentials {
    async fn token(&self) -> GraphResult<String> {
        {
            let cache = self.cached_token.read().await;
            if let Some(token) = cache.as_ref().filter(|t| !t.is_expired(self.grace_period)) {
                return Ok(token.access_token.clone());
            }
        }

        log::debug!("Refreshing Graph access token");
        let token = self.acquire_token().await?;
        let access_token = token.access_token.clone();
        *self.cached_token.write().await = Some(token);

        Ok(access_token)
    }
}
