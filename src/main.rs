//! Article credibility service: binary entrypoint.
//! Boots the Axum HTTP server with the evaluator routes and `/metrics`.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - CREDIBILITY_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("CREDIBILITY_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("credibility=info,article_credibility=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev (API tokens, CREDIBILITY_CONFIG_PATH); no-op in prod.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    if let Err(e) = article_credibility::run_classifier_probe().await {
        tracing::warn!(error = ?e, "classifier quick probe didn't run");
    }

    let router = article_credibility::app().await?;

    Ok(router.into())
}
