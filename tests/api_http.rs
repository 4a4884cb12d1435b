// tests/api_http.rs
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use article_credibility::api::{router, AppState};
use article_credibility::config::AppConfig;
use article_credibility::fetch::{ContentFetcher, ContentResult};
use article_credibility::signals::credibility::FixedClassifier;
use article_credibility::Evaluator;

struct StaticPage;

#[async_trait]
impl ContentFetcher for StaticPage {
    async fn fetch(&self, _url: &str) -> ContentResult {
        ContentResult::ok("Vaccine safety monitoring shows vaccine safety is high.")
    }
}

fn app() -> Router {
    let ev = Evaluator::builder(AppConfig::default())
        .fetcher(Arc::new(StaticPage))
        .standard_providers(Arc::new(FixedClassifier { probability: 0.9 }))
        .build()
        .unwrap();
    router(AppState::new(Arc::new(ev)))
}

async fn json_body(resp: axum::response::Response) -> Value {
    // axum::body::to_bytes requires an explicit limit
    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_ok() {
    let resp = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn post_evaluate_returns_full_result() {
    let req = Request::post("/evaluate")
        .header("content-type", "application/json")
        .body(Body::from(
            r#"{"url":"https://www.cdc.gov/some-article","query":"vaccine safety"}"#,
        ))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    assert_eq!(v["url"], "https://www.cdc.gov/some-article");
    assert_eq!(v["domain_trust"]["value"].as_f64(), Some(1.0));
    assert_eq!(v["rating"], 5);
    assert_eq!(v["stars"], "★★★★★");
    assert_eq!(v["contributions"].as_array().map(|a| a.len()), Some(4));
    assert!(v["explanation"].as_array().is_some_and(|a| !a.is_empty()));
    assert!(v["evaluated_at"].is_string());
}

#[tokio::test]
async fn get_evaluate_with_invalid_url_is_lowest_tier() {
    let resp = app()
        .oneshot(
            Request::get("/evaluate?url=not%20a%20url&query=anything")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    assert_eq!(v["rating"], 1);
    assert_eq!(v["final_score"].as_f64(), Some(0.0));
    assert!(v["explanation"][0]
        .as_str()
        .unwrap()
        .starts_with("Invalid or suspicious URL"));
}

#[tokio::test]
async fn malformed_body_is_client_error() {
    let req = Request::post("/evaluate")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"query":"missing url"}"#))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert!(resp.status().is_client_error());
}
