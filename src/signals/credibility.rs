//! Credibility classifier: provider abstraction + lazy, once-only loading.
//!
//! The classifier is an opaque scoring function `text -> P(credible)`. Load
//! failures, missing tokens and empty text never propagate: the provider
//! reports the signal unavailable and the aggregator substitutes the neutral
//! default (0.5).

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{Measurement, SignalError, SignalInput, SignalName, SignalProvider};
use crate::config::classifier::ClassifierConfig;
use crate::fetch::truncate_chars;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[async_trait]
pub trait CredibilityClassifier: Send + Sync {
    /// Probability in [0,1] that `text` is credible (non-fake).
    async fn credible_probability(&self, text: &str) -> anyhow::Result<f32>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynClassifier = Arc<dyn CredibilityClassifier>;

/// Factory: build a classifier according to config and environment variables.
///
/// * If `CREDIBILITY_TEST_MODE=mock`, returns a deterministic fixed classifier.
/// * Else if `config.enabled == false`, returns a disabled classifier.
/// * Else builds the configured provider; remote providers load lazily.
pub fn build_classifier(config: &ClassifierConfig) -> DynClassifier {
    if std::env::var("CREDIBILITY_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(FixedClassifier {
            probability: config.fixed_probability.unwrap_or(0.5),
        });
    }

    if !config.enabled {
        return Arc::new(DisabledClassifier);
    }

    match config.provider.as_str() {
        "huggingface" | "hf" => Arc::new(LazyClassifier::new(config.clone())),
        "fixed" => Arc::new(FixedClassifier {
            probability: config.fixed_probability.unwrap_or(0.5),
        }),
        other => {
            warn!(provider = other, "unknown classifier provider; credibility disabled");
            Arc::new(DisabledClassifier)
        }
    }
}

// ------------------------------------------------------------
// Concrete classifiers
// ------------------------------------------------------------

/// Always fails; used when classification is disabled.
pub struct DisabledClassifier;

#[async_trait]
impl CredibilityClassifier for DisabledClassifier {
    async fn credible_probability(&self, _text: &str) -> anyhow::Result<f32> {
        bail!("classifier disabled")
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic classifier for tests/local runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClassifier {
    pub probability: f32,
}

#[async_trait]
impl CredibilityClassifier for FixedClassifier {
    async fn credible_probability(&self, _text: &str) -> anyhow::Result<f32> {
        Ok(self.probability)
    }
    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Hugging Face inference API (sequence classification). Requires a token.
pub struct HfClassifier {
    http: reqwest::Client,
    url: String,
    token: String,
    credible_label: String,
    max_chars: usize,
}

impl HfClassifier {
    pub fn new(cfg: &ClassifierConfig) -> anyhow::Result<Self> {
        let token = cfg
            .resolve_api_token()
            .ok_or_else(|| anyhow!("missing HF_API_TOKEN for classifier {}", cfg.model))?;
        let http = reqwest::Client::builder()
            .user_agent("article-credibility/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .context("building classifier http client")?;
        Ok(Self {
            http,
            url: cfg.model_url(),
            token,
            credible_label: cfg.credible_label.clone(),
            max_chars: cfg.max_chars,
        })
    }
}

#[async_trait]
impl CredibilityClassifier for HfClassifier {
    async fn credible_probability(&self, text: &str) -> anyhow::Result<f32> {
        let input = truncate_chars(text, self.max_chars);
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "inputs": input }))
            .send()
            .await
            .context("classifier request")?;
        if !resp.status().is_success() {
            bail!("classifier returned http {}", resp.status().as_u16());
        }
        let body: Value = resp.json().await.context("classifier response body")?;
        label_probability(&body, &self.credible_label)
            .ok_or_else(|| anyhow!("label {} missing from classifier output", self.credible_label))
    }
    fn name(&self) -> &'static str {
        "huggingface"
    }
}

/// Find `label`'s score in `[{label, score}]` or `[[{label, score}]]`.
pub fn label_probability(body: &Value, label: &str) -> Option<f32> {
    let rows = body.as_array()?;
    let entries: Vec<&Value> = match rows.first() {
        Some(Value::Array(inner)) => inner.iter().collect(),
        _ => rows.iter().collect(),
    };
    entries.into_iter().find_map(|e| {
        let l = e.get("label")?.as_str()?;
        if !l.eq_ignore_ascii_case(label) {
            return None;
        }
        let s = e.get("score")?.as_f64()? as f32;
        s.is_finite().then_some(s.clamp(0.0, 1.0))
    })
}

// ------------------------------------------------------------
// Lazy loading wrapper
// ------------------------------------------------------------

/// Builds the remote classifier on first use, exactly once, even under
/// concurrent first calls. A failed load is remembered; later calls fail fast.
pub struct LazyClassifier {
    label: String,
    name: &'static str,
    loader: ClassifierLoader,
    cell: OnceCell<Result<DynClassifier, String>>,
}

/// Builds the real classifier on first use.
pub type ClassifierLoader = Box<dyn Fn() -> anyhow::Result<DynClassifier> + Send + Sync>;

impl LazyClassifier {
    /// Hugging Face classifier built from `cfg` on first use.
    pub fn new(cfg: ClassifierConfig) -> Self {
        let label = cfg.model.clone();
        Self::with_loader(
            label,
            "huggingface",
            Box::new(move || Ok(Arc::new(HfClassifier::new(&cfg)?) as DynClassifier)),
        )
    }

    pub fn with_loader(
        label: impl Into<String>,
        name: &'static str,
        loader: ClassifierLoader,
    ) -> Self {
        Self {
            label: label.into(),
            name,
            loader,
            cell: OnceCell::new(),
        }
    }

    async fn loaded(&self) -> anyhow::Result<&DynClassifier> {
        let slot = self
            .cell
            .get_or_init(|| async {
                match (self.loader)() {
                    Ok(c) => {
                        info!(model = %self.label, "credibility classifier loaded");
                        Ok(c)
                    }
                    Err(e) => {
                        warn!(model = %self.label, error = %e, "credibility classifier failed to load");
                        Err(e.to_string())
                    }
                }
            })
            .await;
        slot.as_ref().map_err(|e| anyhow!("classifier unavailable: {e}"))
    }
}

#[async_trait]
impl CredibilityClassifier for LazyClassifier {
    async fn credible_probability(&self, text: &str) -> anyhow::Result<f32> {
        self.loaded().await?.credible_probability(text).await
    }
    fn name(&self) -> &'static str {
        self.name
    }
}

// ------------------------------------------------------------
// Signal provider
// ------------------------------------------------------------

pub struct CredibilityProvider {
    classifier: DynClassifier,
}

impl CredibilityProvider {
    pub fn new(classifier: DynClassifier) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl SignalProvider for CredibilityProvider {
    fn name(&self) -> SignalName {
        SignalName::Credibility
    }

    async fn measure(&self, input: &SignalInput<'_>) -> Result<Measurement, SignalError> {
        let text = input.text()?;
        if text.trim().is_empty() {
            return Err(SignalError::ContentUnavailable("empty text".into()));
        }
        let p = self
            .classifier
            .credible_probability(text)
            .await
            .map_err(|e| SignalError::Provider(format!("{}: {e}", self.classifier.name())))?;
        Ok(Measurement::new(p).with_note(format!(
            "{} classifier: {:.0}% probability of credible content",
            self.classifier.name(),
            p.clamp(0.0, 1.0) * 100.0
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_and_flat_outputs() {
        let nested = json!([[{"label": "LABEL_0", "score": 0.2}, {"label": "LABEL_1", "score": 0.8}]]);
        assert_eq!(label_probability(&nested, "LABEL_1"), Some(0.8));
        let flat = json!([{"label": "label_1", "score": 0.6}]);
        assert_eq!(label_probability(&flat, "LABEL_1"), Some(0.6));
        assert_eq!(label_probability(&json!({"error": "loading"}), "LABEL_1"), None);
    }

    #[tokio::test]
    async fn disabled_config_yields_failing_classifier() {
        let cfg = ClassifierConfig {
            enabled: false,
            ..ClassifierConfig::default()
        };
        let c = build_classifier(&cfg);
        assert_eq!(c.name(), "disabled");
        assert!(c.credible_probability("text").await.is_err());
    }

    #[tokio::test]
    async fn lazy_load_failure_is_cached() {
        let cfg = ClassifierConfig {
            api_token: String::new(),
            ..ClassifierConfig::default()
        };
        let lazy = LazyClassifier::new(cfg);
        let first = lazy.credible_probability("text").await.unwrap_err();
        let second = lazy.credible_probability("text").await.unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
        assert!(first.to_string().contains("classifier unavailable"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_calls_load_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let lazy = Arc::new(LazyClassifier::with_loader(
            "counting",
            "fixed",
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                // Keep the first initializer busy while the others arrive.
                std::thread::sleep(Duration::from_millis(50));
                Ok(Arc::new(FixedClassifier { probability: 0.7 }) as DynClassifier)
            }),
        ));

        let calls = (0..16).map(|_| {
            let lazy = lazy.clone();
            tokio::spawn(async move { lazy.credible_probability("text").await })
        });
        for joined in futures::future::join_all(calls).await {
            assert_eq!(joined.unwrap().unwrap(), 0.7);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
