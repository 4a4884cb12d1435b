// src/lib.rs
// Public library surface for the server binary, the demo CLI and integration tests.

pub mod aggregate;
pub mod api;
pub mod bootstrap;
pub mod config;
pub mod fetch;
pub mod metrics;
pub mod pipeline;
pub mod rating;
pub mod result;
pub mod signals;
pub mod url_check;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::AppConfig;
pub use crate::pipeline::{Evaluator, EvaluatorBuilder};
pub use crate::result::{EvaluationRequest, EvaluationResult};

use axum::Router;
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::bootstrap::Runtime;

// The Prometheus recorder is process-global; install it at most once.
static METRICS: OnceCell<Option<crate::metrics::Metrics>> = OnceCell::new();

fn metrics_enabled() -> bool {
    std::env::var("CREDIBILITY_METRICS")
        .map(|v| v != "0")
        .unwrap_or(true)
}

/// Build the full in-process app: evaluator routes plus `/metrics` (unless
/// `CREDIBILITY_METRICS=0`).
pub async fn app() -> anyhow::Result<Router> {
    let rt = Runtime::from_default_path()?;
    let mut router = api::router(api::AppState::new(rt.evaluator.clone()));

    if metrics_enabled() {
        let m = METRICS.get_or_init(|| match crate::metrics::Metrics::init() {
            Ok(m) => Some(m),
            Err(e) => {
                warn!(error = %e, "metrics disabled");
                None
            }
        });
        if let Some(m) = m {
            router = router.merge(m.router());
        }
    }
    info!("router ready");
    Ok(router)
}

/// Call once after tracing init to smoke-test the configured classifier.
/// Never panics; failures are only logged.
pub async fn run_classifier_probe() -> anyhow::Result<()> {
    let rt = Runtime::from_default_path()?;
    rt.quick_probe().await;
    info!("classifier quick probe finished");
    Ok(())
}
