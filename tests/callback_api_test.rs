//! Integration tests for the gateway callback trampoline.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use checkout_gateway::api::callback::{handle_callback_get, handle_callback_post};
use std::collections::HashMap;
use tower::ServiceExt;

fn app() -> Router {
    Router::new().route(
        "/callback",
        post(handle_callback_post).get(handle_callback_get),
    )
}

fn location_of(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect location")
        .to_str()
        .unwrap()
        .to_string()
}

fn query_params(location: &str) -> HashMap<String, String> {
    let query = location.split_once('?').map(|(_, q)| q).unwrap_or("");
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .unwrap()
        .into_iter()
        .collect()
}

#[tokio::test]
async fn form_encoded_body_becomes_query_params() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/callback")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("a=1&b=2"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = location_of(&response);
    assert!(location.starts_with("/?"));
    let params = query_params(&location);
    assert_eq!(params.get("a").map(String::as_str), Some("1"));
    assert_eq!(params.get("b").map(String::as_str), Some("2"));
    assert_eq!(params.len(), 2);
}

#[tokio::test]
async fn json_body_becomes_query_params() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/callback")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"TransactionReference":"ref_1","amount":100}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let params = query_params(&location_of(&response));
    assert_eq!(
        params.get("TransactionReference").map(String::as_str),
        Some("ref_1")
    );
    assert_eq!(params.get("amount").map(String::as_str), Some("100"));
}

#[tokio::test]
async fn unparseable_body_still_redirects_with_error_marker() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/callback")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{this is not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    // never a 5xx, always a redirect
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = location_of(&response);
    assert!(location.contains("error=redirect_failed"));
}

#[tokio::test]
async fn empty_body_redirects_to_root() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/callback")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/");
}

#[tokio::test]
async fn existing_query_params_are_preserved() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/callback?source=gateway&a=url")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("a=body"))
                .unwrap(),
        )
        .await
        .unwrap();

    let params = query_params(&location_of(&response));
    // the body wins on conflicts, other URL params ride along
    assert_eq!(params.get("a").map(String::as_str), Some("body"));
    assert_eq!(params.get("source").map(String::as_str), Some("gateway"));
}

#[tokio::test]
async fn get_callback_forwards_query_with_302() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/callback?TransactionReference=ref_1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location_of(&response), "/?TransactionReference=ref_1");
}
