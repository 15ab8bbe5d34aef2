//! Group selector options.

use uuid::Uuid;

use crate::dto::api::GroupOption;
use crate::services::directory::session_controller;
use crate::services::{ServiceError, ServiceResult};
use crate::sessions::DirectorySessions;

/// Lists every group, sorted by label, preceded by the "All users" entry.
pub async fn list_group_options(
    sessions: &DirectorySessions,
    session_id: Uuid,
) -> ServiceResult<Vec<GroupOption>> {
    let controller = session_controller(sessions, session_id).await?;

    let mut groups = controller.engine().list_groups().await.map_err(|err| {
        log::error!("Failed to list groups: {err}");
        ServiceError::from(err)
    })?;
    groups.sort_by(|a, b| a.label().to_lowercase().cmp(&b.label().to_lowercase()));

    let mut options = vec![GroupOption {
        key: String::new(),
        text: "All users".to_string(),
    }];
    options.extend(groups.iter().map(GroupOption::from));
    Ok(options)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeDelta;
    use serde_json::json;

    use super::*;
    use crate::directory::DirectoryScope;
    use crate::graph::client::GraphClientProvider;
    use crate::graph::{GRAPH_URL, GraphError, MockGraphTransport};

    fn sessions(transport: MockGraphTransport) -> DirectorySessions {
        let provider = GraphClientProvider::with_transport(GRAPH_URL, Arc::new(transport));
        DirectorySessions::new(provider, DirectoryScope::default(), TimeDelta::minutes(30))
    }

    #[tokio::test]
    async fn options_are_sorted_after_all_users() {
        let mut transport = MockGraphTransport::new();
        transport.expect_get().times(1).returning(|_, _| {
            Ok(json!({"value": [
                {"id": "g2", "displayName": "sales"},
                {"id": "g1", "displayName": "Engineering"}
            ]}))
        });

        let options = list_group_options(&sessions(transport), Uuid::new_v4())
            .await
            .expect("groups load");

        let labels: Vec<&str> = options.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(labels, vec!["All users", "Engineering", "sales"]);
        assert_eq!(options[1].key, "g1");
    }

    #[tokio::test]
    async fn graph_failure_is_reported() {
        let mut transport = MockGraphTransport::new();
        transport
            .expect_get()
            .returning(|_, _| Err(GraphError::Auth("expired".to_string())));

        let result = list_group_options(&sessions(transport), Uuid::new_v4()).await;

        assert!(matches!(result, Err(ServiceError::Graph(GraphError::Auth(_)))));
    }
}
