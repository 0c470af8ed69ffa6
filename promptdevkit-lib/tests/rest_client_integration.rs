//! Integration tests for the REST client against a mock service.

use core::time::Duration;
use promptdevkit_lib::activity::{ActivityRange, fetch_prompt_activity};
use promptdevkit_lib::remote::{ApiError, Direction, MULTIPLE_ROWS_CODE, QueryError, ReadRequest, RemoteSource, RestClient};
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq, Eq)]
struct Workspace {
    id: String,
    slug: String,
}

fn expect_api_error(err: QueryError) -> ApiError {
    match err {
        QueryError::Api(api) => api,
        other => panic!("expected an API error, got {other:?}"),
    }
}

fn client(server: &MockServer, access_token: Option<&str>) -> RestClient {
    RestClient::new(&server.uri(), "anon-key", access_token, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn select_sends_keys_and_query_pairs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/workspaces"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer user-token"))
        .and(query_param("select", "id,slug"))
        .and(query_param("slug", "eq.acme"))
        .and(query_param("order", "name.asc"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "ws-1", "slug": "acme"}])))
        .expect(1)
        .mount(&server)
        .await;

    let request = ReadRequest::new("workspaces")
        .select(["id", "slug"])
        .eq("slug", "acme")
        .order("name", Direction::Asc)
        .limit(10);

    let rows: Vec<Workspace> = client(&server, Some("user-token")).select(&request).await.unwrap();
    assert_eq!(
        rows,
        [Workspace {
            id: "ws-1".to_string(),
            slug: "acme".to_string()
        }]
    );
}

#[tokio::test]
async fn anonymous_key_is_the_default_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/workspaces"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let rows: Vec<Workspace> = client(&server, None).select(&ReadRequest::new("workspaces")).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn error_bodies_become_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/workspaces"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "42501",
            "message": "permission denied for table workspaces",
            "details": null,
            "hint": null
        })))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .select::<Workspace>(&ReadRequest::new("workspaces"))
        .await
        .unwrap_err();

    let api = expect_api_error(err);
    assert_eq!(api.status, 403);
    assert_eq!(api.code.as_deref(), Some("42501"));
    assert_eq!(api.message, "permission denied for table workspaces");
}

#[tokio::test]
async fn plain_text_errors_keep_their_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway\n"))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .select::<Workspace>(&ReadRequest::new("workspaces"))
        .await
        .unwrap_err();

    let api = expect_api_error(err);
    assert_eq!(api.status, 502);
    assert_eq!(api.message, "bad gateway");
    assert_eq!(api.code, None);
}

#[tokio::test]
async fn undecodable_rows_are_transport_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"unexpected": true}])))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .select::<Workspace>(&ReadRequest::new("workspaces"))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn maybe_single_reports_multiple_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/workspaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "ws-1", "slug": "acme"},
            {"id": "ws-2", "slug": "acme"}
        ])))
        .mount(&server)
        .await;

    let request = ReadRequest::new("workspaces").eq("slug", "acme");
    let err = client(&server, None).select_maybe_single::<Workspace>(&request).await.unwrap_err();

    let api = expect_api_error(err);
    assert_eq!(api.code.as_deref(), Some(MULTIPLE_ROWS_CODE));
}

#[tokio::test]
async fn rpc_posts_json_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/mark_notifications_read"))
        .and(header("apikey", "anon-key"))
        .and(body_json(json!({"p_notification_ids": ["n-1", "n-2"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(2)))
        .expect(1)
        .mount(&server)
        .await;

    let count: i64 = client(&server, Some("user-token"))
        .rpc("mark_notifications_read", &json!({"p_notification_ids": ["n-1", "n-2"]}))
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn unknown_procedure_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "PGRST202",
            "message": "Could not find the function public.missing without parameters"
        })))
        .mount(&server)
        .await;

    let err = client(&server, None).rpc::<_, i64>("missing", &json!({})).await.unwrap_err();
    let api = expect_api_error(err);
    assert_eq!(api.status, 404);
    assert_eq!(api.code.as_deref(), Some("PGRST202"));
}

#[tokio::test]
async fn prompt_activity_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/workspace_prompt_activity_summary"))
        .and(query_param("workspace_id", "eq.ws-1"))
        .and(query_param("range", "eq.30d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"workspace_id": "ws-1", "range": "30d", "total_count": 21}])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/workspace_prompt_activity_daily"))
        .and(query_param("workspace_id", "eq.ws-1"))
        .and(query_param("activity_date", "gte.2024-02-10"))
        .and(query_param("order", "activity_date.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"activity_date": "2024-02-12", "prompt_update_count": 20},
            {"activity_date": "2024-03-01", "prompt_update_count": null}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let now = "2024-03-10T08:00:00Z".parse().unwrap();
    let report = fetch_prompt_activity(&client(&server, Some("user-token")), "ws-1", ActivityRange::Month, now)
        .await
        .unwrap();

    assert_eq!(report.summary.total_count, 21);
    assert_eq!(report.window.start.to_string(), "2024-02-10");
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[1].prompt_update_count, 0);
}
