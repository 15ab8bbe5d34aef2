use serde_json::{Value, json};
use wiremock::matchers::{
    body_partial_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

use staff_directory::directory::{DirectoryController, DirectoryScope, SearchEngine};
use staff_directory::domain::types::PageSize;
use staff_directory::graph::client::{GraphClientProvider, GraphSettings};

fn users(range: std::ops::Range<usize>) -> Vec<Value> {
    range
        .map(|i| {
            json!({
                "id": format!("u{i}"),
                "displayName": format!("User {i}"),
                "department": "Engineering",
                "businessPhones": []
            })
        })
        .collect()
}

async fn controller(server: &MockServer) -> DirectoryController {
    let provider = GraphClientProvider::new(GraphSettings {
        base_url: format!("{}/v1.0", server.uri()),
        access_token: Some("test-token".to_string()),
        ..GraphSettings::default()
    });
    let transport = provider.resolve().await.expect("client resolves");
    let engine = SearchEngine::new(
        transport,
        provider.graph_url(),
        DirectoryScope {
            group: None,
            page_size: PageSize::new(10).expect("valid page size"),
        },
    );
    DirectoryController::new(engine)
}

#[tokio::test]
async fn first_page_is_listed_with_photos() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .and(query_param("$top", "10"))
        .and(query_param("$count", "true"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("consistencylevel", "eventual"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.count": 42,
            "@odata.nextLink": format!("{}/v1.0/users?$skiptoken=p2", server.uri()),
            "value": users(0..10)
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1.0/$batch"))
        .and(body_partial_json(json!({
            "requests": [{"id": "u0", "method": "GET", "url": "/users/u0/photo/$value"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [
                {"id": "u1", "status": 404, "body": {"error": {"code": "ImageNotFound"}}},
                {"id": "u0", "status": 200, "body": "/9j/"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller(&server).await;
    controller.initial_load().await.expect("directory loads");

    let view = controller.view();
    assert_eq!(view.total, 42);
    assert_eq!(view.people.len(), 10);
    assert!(!view.loading);
    assert_eq!(view.pager.total_pages, 5);
    assert_eq!(view.pager.pages, vec![1, 2, 3, 4, 5]);
    assert_eq!(view.people[0].picture.as_deref(), Some("/9j/"));
    assert_eq!(view.people[1].picture, None);
}

#[tokio::test]
async fn next_page_follows_next_link() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .and(query_param("$count", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.count": 15,
            "@odata.nextLink": format!("{}/v1.0/users?$skiptoken=p2", server.uri()),
            "value": users(0..10)
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .and(query_param("$skiptoken", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": users(10..15)
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1.0/$batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responses": []})))
        .expect(2)
        .mount(&server)
        .await;

    let controller = controller(&server).await;
    controller.initial_load().await.expect("directory loads");
    controller.go_to_page(2).await.expect("second page loads");

    let view = controller.view();
    assert_eq!(view.pager.page, 2);
    assert_eq!(view.total, 15);
    assert_eq!(view.people.len(), 5);
    assert_eq!(view.people[0].id.as_str(), "u10");
    assert!(!controller.engine().has_cursor());
}

#[tokio::test]
async fn search_and_department_are_sent_escaped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .and(query_param(
            "$search",
            "\"displayName:o'brien\" OR \"department:o'brien\" OR \"jobTitle:o'brien\"",
        ))
        .and(query_param("$filter", "department eq 'R''D'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.count": 0,
            "value": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .and(query_param_is_missing("$search"))
        .and(query_param("$filter", "department eq 'R''D'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.count": 0,
            "value": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller(&server).await;
    controller
        .select_department("R'D")
        .await
        .expect("department filter succeeds");
    assert_eq!(controller.view().selected_department, "R'D");
    controller.submit_search("o'brien").await.expect("search succeeds");

    let view = controller.view();
    assert_eq!(view.query_text, "o'brien");
    assert_eq!(view.summary, "No results");
}

#[tokio::test]
async fn failed_batch_still_lists_people() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.count": 2,
            "value": users(0..2)
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1.0/$batch"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let controller = controller(&server).await;
    controller.initial_load().await.expect("directory loads");

    let view = controller.view();
    assert_eq!(view.people.len(), 2);
    assert!(view.people.iter().all(|person| person.picture.is_none()));
    assert!(view.error.is_none());
}

#[tokio::test]
async fn listing_error_is_reported_in_view() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": "Request_UnsupportedQuery", "message": "Unsupported query."}
        })))
        .mount(&server)
        .await;

    let controller = controller(&server).await;
    assert!(controller.initial_load().await.is_err());

    let view = controller.view();
    assert!(!view.loading);
    assert!(
        view.error
            .as_deref()
            .is_some_and(|message| message.contains("Unsupported query."))
    );
}
