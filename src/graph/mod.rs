//! Microsoft Graph access: authentication, transport, query building and
//! `$batch` execution.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub mod auth;
pub mod batch;
pub mod client;
pub mod error;
pub mod query;

pub use error::{GraphError, GraphResult};

/// Audience the access token must be issued for.
pub const GRAPH_RESOURCE: &str = "https://graph.microsoft.com";
/// Versioned Graph endpoint used for every request.
pub const GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";

/// Value of the `ConsistencyLevel` request header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConsistencyLevel {
    /// Header omitted.
    #[default]
    Default,
    /// `ConsistencyLevel: eventual`, required for `$search` and `$count`.
    Eventual,
}

/// Authenticated request/response seam used by the directory layer.
#[cfg_attr(any(test, feature = "test-mocks"), mockall::automock)]
#[async_trait]
pub trait GraphTransport: Send + Sync {
    /// Issues a GET against a fully qualified Graph URL.
    async fn get(&self, url: &str, consistency: ConsistencyLevel) -> GraphResult<Value>;

    /// Issues a POST with a JSON body against a fully qualified Graph URL.
    async fn post(&self, url: &str, body: Value) -> GraphResult<Value>;
}

/// One page of an `OData` collection response.
#[derive(Debug, Deserialize)]
pub struct ODataPage<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
    #[serde(rename = "@odata.count", default)]
    pub count: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_odata_page() {
        let json = r#"{
            "@odata.count": 42,
            "value": [{"id": "1"}, {"id": "2"}],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/users?$skiptoken=xxx"
        }"#;

        #[derive(Debug, Deserialize)]
        struct Item {
            id: String,
        }

        let page: ODataPage<Item> = serde_json::from_str(json).expect("valid page");
        assert_eq!(page.value.len(), 2);
        assert_eq!(page.value[1].id, "2");
        assert_eq!(page.count, Some(42));
        assert!(page.next_link.is_some());
    }

    #[test]
    fn last_page_has_no_cursor() {
        let page: ODataPage<Value> =
            serde_json::from_str(r#"{"value": []}"#).expect("valid page");
        assert!(page.value.is_empty());
        assert!(page.next_link.is_none());
        assert!(page.count.is_none());
    }
}
