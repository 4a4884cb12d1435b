// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serial_test::serial;
use tower::ServiceExt;

/// Value of an unlabeled series in Prometheus text exposition.
fn sample(text: &str, series: &str) -> Option<f64> {
    text.lines()
        .filter(|l| !l.starts_with('#'))
        .find_map(|l| {
            let (name, value) = l.split_once(' ')?;
            (name == series).then(|| value.trim().parse().ok())?
        })
}

// Full in-process app, including /metrics. Invalid URLs never touch the network.
async fn build_app() -> Router {
    std::env::set_var("CREDIBILITY_TEST_MODE", "mock");
    std::env::remove_var("CREDIBILITY_METRICS");
    article_credibility::app()
        .await
        .expect("app() should build Router in tests")
}

#[tokio::test]
#[serial]
async fn metrics_endpoint_contains_evaluator_series() {
    let app = build_app().await;

    let resp = app
        .clone()
        .oneshot(
            Request::get("/evaluate?url=not%20a%20url&query=x")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "credibility_evaluations_total",
        "credibility_invalid_url_total",
        "credibility_evaluation_ms",
    ] {
        assert!(text.contains(needle), "missing {needle} in:\n{text}");
    }
    // Counters must reach the exporter, not just be described.
    for series in ["credibility_evaluations_total", "credibility_invalid_url_total"] {
        let v = sample(&text, series)
            .unwrap_or_else(|| panic!("no sample for {series}:\n{text}"));
        assert!(v >= 1.0, "{series} = {v}");
    }
    assert!(text.contains("credibility_evaluation_ms_count"), "{text}");
}

#[tokio::test]
#[serial]
async fn app_can_be_built_twice() {
    // The recorder is global; a second app reuses it.
    let _ = build_app().await;
    let app = build_app().await;
    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
