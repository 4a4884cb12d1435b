// src/pipeline.rs
//! The evaluation pipeline:
//! validate URL → fetch once → measure all signals concurrently → aggregate →
//! rate → assemble.
//!
//! `evaluate` is total: every input yields a complete `EvaluationResult`.

use futures::future::join_all;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::aggregate::aggregate;
use crate::config::AppConfig;
use crate::fetch::{ContentFetcher, ContentResult, HttpFetcher};
use crate::result::{self, EvaluationRequest, EvaluationResult};
use crate::signals::{
    CredibilityProvider, DomainTrustProvider, DynClassifier, ReadabilityProvider,
    RelevanceProvider, Signal, SignalError, SignalInput, SignalProvider,
};
use crate::url_check;

pub type DynProvider = Arc<dyn SignalProvider>;

// Dev logging gate: CREDIBILITY_DEV_LOG=1 AND dev env (debug or SHUTTLE_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("CREDIBILITY_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Short, stable, non-reversible id for a query.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn dev_log_signals(host: &str, query: &str, signals: &[Signal], score: f32) {
    if !dev_logging_enabled() {
        return;
    }
    // Never log the raw query.
    let id = anon_hash(query);
    let values: Vec<String> = signals
        .iter()
        .map(|s| match s.value {
            Some(v) => format!("{}={v:.2}", s.name),
            None => format!("{}=n/a", s.name),
        })
        .collect();
    info!(target: "credibility", %id, host, %score, signals = ?values, "signals measured");
}

pub struct Evaluator {
    config: Arc<AppConfig>,
    fetcher: Arc<dyn ContentFetcher>,
    providers: Vec<DynProvider>,
}

impl Evaluator {
    pub fn builder(config: AppConfig) -> EvaluatorBuilder {
        EvaluatorBuilder::new(config)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// `validate(url) -> bool` under this evaluator's URL policy.
    pub fn validate(&self, url: &str) -> bool {
        url_check::validate(url, &self.config.url)
    }

    pub async fn evaluate(&self, request: &EvaluationRequest) -> EvaluationResult {
        let started = Instant::now();
        counter!("credibility_evaluations_total").increment(1);

        let facts = match url_check::check(&request.url, &self.config.url) {
            Ok(f) => f,
            Err(reason) => {
                counter!("credibility_invalid_url_total").increment(1);
                warn!(url = %request.url, %reason, "url rejected");
                let out = result::invalid_url(request, &reason, self.config.rating.lowest());
                histogram!("credibility_evaluation_ms").record(started.elapsed().as_secs_f64() * 1000.0);
                return out;
            }
        };

        let content = self.fetch(&request.url).await;
        if !content.is_available() {
            counter!("credibility_fetch_failures_total").increment(1);
        }

        let input = SignalInput {
            content: &content,
            query: &request.query,
            url: &request.url,
            url_facts: &facts,
        };
        let signals = self.measure_all(&input).await;
        for s in signals.iter().filter(|s| !s.is_available()) {
            counter!("credibility_signal_unavailable_total", "signal" => s.name.as_str()).increment(1);
        }

        let agg = aggregate(&signals, &self.config.weights, &self.config.neutral);
        let max_score = self.config.rating.max_score;
        let final_score = agg.score * max_score;
        let rating = self.config.rating.to_rating(final_score);

        dev_log_signals(&facts.host, &request.query, &signals, final_score);
        info!(
            url = %request.url,
            score = final_score,
            tier = rating.tier,
            "evaluation complete"
        );

        let out = result::assemble(
            request,
            &facts,
            &content,
            &signals,
            agg,
            final_score,
            max_score,
            rating,
        );
        histogram!("credibility_evaluation_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        out
    }

    async fn fetch(&self, url: &str) -> ContentResult {
        let limit = self.config.timeouts.fetch();
        match timeout(limit, self.fetcher.fetch(url)).await {
            Ok(content) => content,
            Err(_) => {
                warn!(url, timeout_ms = limit.as_millis() as u64, "fetch timed out");
                ContentResult::failed(format!("fetch timed out after {} ms", limit.as_millis()))
            }
        }
    }

    async fn measure_all(&self, input: &SignalInput<'_>) -> Vec<Signal> {
        join_all(
            self.providers
                .iter()
                .map(|p| self.measure_one(p.as_ref(), input)),
        )
        .await
    }

    async fn measure_one(&self, provider: &dyn SignalProvider, input: &SignalInput<'_>) -> Signal {
        let name = provider.name();
        if provider.requires_text() && !input.content.is_available() {
            let reason = input
                .content
                .error
                .clone()
                .unwrap_or_else(|| "no content".to_string());
            debug!(signal = %name, %reason, "skipped: no content");
            return Signal::from_outcome(name, Err(SignalError::ContentUnavailable(reason)));
        }

        let limit = self.config.timeouts.provider();
        let outcome = match timeout(limit, provider.measure(input)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(SignalError::Timeout(limit.as_millis() as u64)),
        };
        if let Err(e) = &outcome {
            warn!(signal = %name, error = %e, "signal unavailable; neutral default applies");
        }
        Signal::from_outcome(name, outcome)
    }
}

/// Wires collaborators into an [`Evaluator`]. Tests swap in fakes here.
pub struct EvaluatorBuilder {
    config: AppConfig,
    fetcher: Option<Arc<dyn ContentFetcher>>,
    providers: Vec<DynProvider>,
}

impl EvaluatorBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            fetcher: None,
            providers: Vec::new(),
        }
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn ContentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Add a provider; one already registered under the same signal is replaced.
    pub fn provider(mut self, provider: DynProvider) -> Self {
        let name = provider.name();
        self.providers.retain(|p| p.name() != name);
        self.providers.push(provider);
        self
    }

    /// Domain trust (static tables), lexical relevance, the given classifier
    /// and readability.
    pub fn standard_providers(self, classifier: DynClassifier) -> Self {
        let domain = DomainTrustProvider::new(
            self.config.trust.clone(),
            self.config.topics.clone(),
            self.config.penalties,
        );
        self.provider(Arc::new(domain))
            .provider(Arc::new(RelevanceProvider::lexical()))
            .provider(Arc::new(CredibilityProvider::new(classifier)))
            .provider(Arc::new(ReadabilityProvider))
    }

    /// Falls back to [`HttpFetcher`] when no fetcher was supplied.
    pub fn build(self) -> anyhow::Result<Evaluator> {
        let fetcher = match self.fetcher {
            Some(f) => f,
            None => Arc::new(HttpFetcher::new(
                self.config.fetch.clone(),
                self.config.timeouts.fetch(),
            )?),
        };
        Ok(Evaluator {
            config: Arc::new(self.config),
            fetcher,
            providers: self.providers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{Measurement, SignalName};
    use async_trait::async_trait;

    struct Constant(SignalName, f32);

    #[async_trait]
    impl SignalProvider for Constant {
        fn name(&self) -> SignalName {
            self.0
        }
        fn requires_text(&self) -> bool {
            false
        }
        async fn measure(&self, _input: &SignalInput<'_>) -> Result<Measurement, SignalError> {
            Ok(Measurement::new(self.1))
        }
    }

    struct NoFetch;

    #[async_trait]
    impl ContentFetcher for NoFetch {
        async fn fetch(&self, _url: &str) -> ContentResult {
            ContentResult::failed("offline")
        }
    }

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("vaccine safety");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("vaccine safety"));
        assert_ne!(a, anon_hash("vaccine"));
    }

    #[test]
    fn provider_with_same_name_is_replaced() {
        let b = EvaluatorBuilder::new(AppConfig::default())
            .provider(Arc::new(Constant(SignalName::Relevance, 0.1)))
            .provider(Arc::new(Constant(SignalName::Relevance, 0.9)));
        assert_eq!(b.providers.len(), 1);
    }

    #[tokio::test]
    async fn text_free_providers_still_run_without_content() {
        let ev = EvaluatorBuilder::new(AppConfig::default())
            .fetcher(Arc::new(NoFetch))
            .provider(Arc::new(Constant(SignalName::DomainTrust, 1.0)))
            .provider(Arc::new(ReadabilityProvider))
            .build()
            .unwrap();
        let r = ev
            .evaluate(&EvaluationRequest::new("https://example.com/x", "q"))
            .await;
        assert_eq!(r.domain_trust.value, Some(1.0));
        assert!(r
            .readability
            .unavailable_reason
            .as_deref()
            .unwrap()
            .contains("offline"));
        // 0.4*1.0 + 0.6*0.5
        assert!((r.final_score - 70.0).abs() < 1e-3, "got {}", r.final_score);
    }
}
