//! Error types for the Microsoft Graph client.

use serde::Deserialize;
use thiserror::Error;

/// Result type alias using `GraphError`.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur when talking to Microsoft Graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Client could not be configured.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Access token could not be acquired.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Graph answered with a non-success status.
    #[error("Graph API error {status}: {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL could not be built.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// `OData` error response from Microsoft Graph.
#[derive(Debug, Deserialize)]
pub struct ODataError {
    pub error: ODataErrorBody,
}

/// `OData` error body.
#[derive(Debug, Deserialize)]
pub struct ODataErrorBody {
    pub code: String,
    pub message: String,
}

impl GraphError {
    /// Builds an API error from a status code and the raw response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ODataError>(body) {
            Ok(odata) => GraphError::Api {
                status,
                code: odata.error.code,
                message: odata.error.message,
            },
            Err(_) => GraphError::Api {
                status,
                code: status.to_string(),
                message: body.to_string(),
            },
        }
    }
}
