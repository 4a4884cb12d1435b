// src/bootstrap.rs
//! Production wiring: config → HTTP fetcher, reputation source, embedder,
//! classifier → `Evaluator`.

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::fetch::HttpFetcher;
use crate::pipeline::Evaluator;
use crate::signals::credibility::build_classifier;
use crate::signals::relevance::{HttpEmbedder, RelevanceStrategy};
use crate::signals::reputation::build_reputation_source;
use crate::signals::{DomainTrustProvider, DynClassifier, RelevanceProvider};

pub struct Runtime {
    pub evaluator: Arc<Evaluator>,
    pub classifier: DynClassifier,
}

impl Runtime {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        Self::from_config(AppConfig::load_from(path)?)
    }

    /// `$CREDIBILITY_CONFIG_PATH`, then `config/credibility.toml`, then defaults.
    pub fn from_default_path() -> anyhow::Result<Self> {
        Self::from_config(AppConfig::load_default()?)
    }

    pub fn from_config(cfg: AppConfig) -> anyhow::Result<Self> {
        // Safe diagnostics only: never log credentials.
        info!(
            classifier = %cfg.classifier.provider,
            classifier_enabled = cfg.classifier.enabled,
            reputation_enabled = cfg.reputation.enabled,
            relevance = ?cfg.relevance.strategy,
            tiers = cfg.rating.tiers,
            "credibility config loaded"
        );

        let fetcher = HttpFetcher::new(cfg.fetch.clone(), cfg.timeouts.fetch())
            .context("building content fetcher")?;
        let classifier = build_classifier(&cfg.classifier);

        let mut domain =
            DomainTrustProvider::new(cfg.trust.clone(), cfg.topics.clone(), cfg.penalties);
        match build_reputation_source(&cfg.reputation) {
            Ok(Some(source)) => domain = domain.with_reputation(source),
            Ok(None) => {}
            // A broken reputation setup degrades to the static table.
            Err(e) => warn!(error = %e, "reputation source unavailable; static trust table only"),
        }

        let mut builder = Evaluator::builder(cfg.clone())
            .fetcher(Arc::new(fetcher))
            .standard_providers(classifier.clone())
            .provider(Arc::new(domain));

        if cfg.relevance.strategy == RelevanceStrategy::Semantic {
            let embedder =
                HttpEmbedder::new(&cfg.relevance.embeddings).context("building embedder")?;
            builder = builder.provider(Arc::new(RelevanceProvider::semantic(
                Arc::new(embedder),
                cfg.relevance.embeddings.max_chars,
            )));
        }

        Ok(Self {
            evaluator: Arc::new(builder.build()?),
            classifier,
        })
    }

    /// One-off classifier smoke test. Never fails; only logs.
    pub async fn quick_probe(&self) {
        let sample = "Health officials published updated vaccine safety data after a \
                      months-long review of clinical trial results.";
        match self.classifier.credible_probability(sample).await {
            Ok(p) => info!(classifier = self.classifier.name(), probability = p, "classifier probe ok"),
            Err(e) => warn!(classifier = self.classifier.name(), error = %e, "classifier probe failed"),
        }
    }
}
