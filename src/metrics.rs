use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and describe the evaluator series.
    /// Fails if a recorder is already installed.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("credibility_evaluations_total", "Evaluation requests received");
    describe_counter!(
        "credibility_invalid_url_total",
        "Requests rejected by URL validation"
    );
    describe_counter!(
        "credibility_fetch_failures_total",
        "Evaluations whose article content could not be fetched"
    );
    describe_counter!(
        "credibility_signal_unavailable_total",
        "Signals replaced by their neutral default, by signal"
    );
    describe_histogram!(
        "credibility_evaluation_ms",
        Unit::Milliseconds,
        "End-to-end evaluation latency"
    );
}
