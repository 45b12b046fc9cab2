use std::collections::HashMap;

use axum::Router;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::api_config::ApiConfig;
use crate::api_services::build_app_state;
use crate::middleware::SUBJECT_HEADER;
use crate::state::AppState;

use super::build_router;

async fn seeded_app() -> (Router, AppState) {
    let variables = HashMap::from([
        ("SUPER_ADMIN_SUBJECTS", "admin"),
        ("READER_SUBJECTS", "alice"),
        ("DEV_SEED", "true"),
    ]);
    let config = ApiConfig::from_lookup(false, |name| {
        variables.get(name).map(|value| (*value).to_owned())
    })
    .unwrap_or_else(|_| unreachable!());

    let state = build_app_state(&config, None)
        .await
        .unwrap_or_else(|_| unreachable!());
    let router =
        build_router(state.clone(), &config.frontend_origin).unwrap_or_else(|_| unreachable!());
    (router, state)
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    subject: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(subject) = subject {
        builder = builder.header(SUBJECT_HEADER, subject);
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap_or_else(|_| unreachable!());

    let response = router
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|_| unreachable!());
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|_| unreachable!());
    if bytes.is_empty() {
        return (status, Value::Null);
    }

    (
        status,
        serde_json::from_slice(&bytes).unwrap_or_else(|_| unreachable!()),
    )
}

fn item_fields(payload: &Value, field: &str) -> Vec<Value> {
    payload["items"]
        .as_array()
        .map(|items| items.iter().map(|item| item["data"][field].clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn health_reports_audit_counters() {
    let (router, _) = seeded_app().await;

    let (status, payload) = send(&router, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["audit"], json!({"written": 0, "failed": 0, "dropped": 0}));
}

#[tokio::test]
async fn resource_routes_require_an_actor() {
    let (router, _) = seeded_app().await;

    let (status, _) = send(&router, Method::GET, "/api/resources/customer", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&router, Method::GET, "/api/audit-logs", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_applies_default_sort_and_page_keys() {
    let (router, _) = seeded_app().await;

    let (status, payload) = send(
        &router,
        Method::GET,
        "/api/resources/customer",
        Some("admin"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        item_fields(&payload, "name"),
        vec![
            json!("Contoso Pharmaceuticals"),
            json!("Fabrikam Logistics"),
            json!("Northwind Traders"),
        ]
    );
    assert_eq!(payload["page"], 1);
    assert_eq!(payload["count"], 10);
    assert_eq!(payload["total"], 3);
    assert_eq!(payload["total_pages"], 1);
}

#[tokio::test]
async fn dotted_filter_matches_orders_through_their_customer() {
    let (router, _) = seeded_app().await;

    let (status, payload) = send(
        &router,
        Method::GET,
        "/api/resources/order?customer=Northwind%20Traders",
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        item_fields(&payload, "reference"),
        vec![json!("SO-1004"), json!("SO-1001")]
    );

    let (status, payload) = send(
        &router,
        Method::GET,
        "/api/resources/order?customer=Nobody",
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["total"], 0);
    assert_eq!(payload["total_pages"], 0);
}

#[tokio::test]
async fn search_combines_with_paging() {
    let (router, _) = seeded_app().await;

    let (status, payload) = send(
        &router,
        Method::GET,
        "/api/resources/order?q=OPEN&count=1&page=2",
        Some("admin"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["total"], 2);
    assert_eq!(payload["total_pages"], 2);
    assert_eq!(item_fields(&payload, "reference"), vec![json!("SO-1001")]);
}

#[tokio::test]
async fn invalid_paging_parameter_is_reported_by_name() {
    let (router, _) = seeded_app().await;

    let (status, payload) = send(
        &router,
        Method::GET,
        "/api/resources/order?page=0",
        Some("admin"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["parameter"], "page");
}

#[tokio::test]
async fn readers_see_owned_records_and_cannot_write() {
    let (router, _) = seeded_app().await;

    let (status, payload) = send(
        &router,
        Method::GET,
        "/api/resources/customer",
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        item_fields(&payload, "name"),
        vec![json!("Fabrikam Logistics"), json!("Northwind Traders")]
    );

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/resources/customer",
        Some("alice"),
        Some(json!({"data": {"name": "Tailspin Toys"}})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &router,
        Method::GET,
        "/api/resources/customer",
        Some("mallory"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn mutations_are_audited_and_listed_newest_first() {
    let (router, state) = seeded_app().await;

    let (status, created) = send(
        &router,
        Method::POST,
        "/api/resources/customer",
        Some("admin"),
        Some(json!({"data": {"name": "Tailspin Toys", "owner": "alice"}})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let Some(record_id) = created["id"].as_str() else {
        panic!("created record has no id: {created}");
    };

    let (status, _) = send(
        &router,
        Method::DELETE,
        &format!("/api/resources/customer/{record_id}"),
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(state.audit_writer.flush().await.is_ok());

    let (status, payload) =
        send(&router, Method::GET, "/api/audit-logs", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["total"], 2);
    assert_eq!(payload["items"][0]["action"], "record.deleted");
    assert_eq!(payload["items"][1]["action"], "record.created");
    assert_eq!(payload["items"][0]["user"], "admin");
    assert_eq!(payload["items"][0]["details"]["record_id"], record_id);

    let (status, payload) = send(
        &router,
        Method::GET,
        "/api/audit-logs?action=record.created",
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["total"], 1);

    let (status, _) = send(&router, Method::GET, "/api/audit-logs", Some("alice"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn audit_log_has_no_single_entry_or_write_routes() {
    let (router, _) = seeded_app().await;

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/audit-logs",
        Some("admin"),
        Some(json!({"action": "forged"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let (status, _) = send(
            &router,
            method,
            "/api/audit-logs/00000000-0000-0000-0000-000000000000",
            Some("admin"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (status, _) = send(
        &router,
        Method::DELETE,
        "/api/resources/audit_log/00000000-0000-0000-0000-000000000000",
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_resource_and_missing_record_are_not_found() {
    let (router, _) = seeded_app().await;

    let (status, _) = send(
        &router,
        Method::GET,
        "/api/resources/invoice",
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &router,
        Method::GET,
        "/api/resources/customer/does-not-exist",
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
