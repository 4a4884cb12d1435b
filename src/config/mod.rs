// src/config/mod.rs
//! Process-wide configuration, loaded once at startup and read-only afterwards.
//!
//! Source order:
//! 1) `$CREDIBILITY_CONFIG_PATH` (must exist when set)
//! 2) `config/credibility.toml`
//! 3) built-in defaults
//!
//! Every section is optional; missing sections use their defaults.

pub mod classifier;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregate::{NeutralDefaults, WeightTable};
use crate::fetch::FetchConfig;
use crate::rating::RatingScale;
use crate::signals::domain_trust::{TrustPenalties, TrustTable};
use crate::signals::relevance::RelevanceConfig;
use crate::signals::reputation::ReputationConfig;
use crate::signals::topics::TopicTable;
use crate::url_check::UrlPolicy;

use self::classifier::ClassifierConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/credibility.toml";
pub const ENV_CONFIG_PATH: &str = "CREDIBILITY_CONFIG_PATH";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Upper bound for one content fetch.
    pub fetch_ms: u64,
    /// Upper bound for each signal provider.
    pub provider_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            fetch_ms: 10_000,
            provider_ms: 15_000,
        }
    }
}

impl Timeouts {
    pub fn fetch(&self) -> Duration {
        Duration::from_millis(self.fetch_ms.max(1))
    }

    pub fn provider(&self) -> Duration {
        Duration::from_millis(self.provider_ms.max(1))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub weights: WeightTable,
    pub neutral: NeutralDefaults,
    pub url: UrlPolicy,
    pub trust: TrustTable,
    pub penalties: TrustPenalties,
    pub topics: TopicTable,
    pub timeouts: Timeouts,
    pub rating: RatingScale,
    pub relevance: RelevanceConfig,
    pub classifier: ClassifierConfig,
    pub reputation: ReputationConfig,
    pub fetch: FetchConfig,
}

impl AppConfig {
    /// Parse from a TOML string and sanitize.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parsing credibility config")?;
        Ok(cfg.sanitized())
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading credibility config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks (see module docs).
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!(
                "{ENV_CONFIG_PATH} points to non-existent path {}",
                pb.display()
            ));
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from(&default_path);
        }
        Ok(Self::default().sanitized())
    }

    /// Clamp and normalize every section.
    pub fn sanitized(mut self) -> Self {
        self.weights = self.weights.sanitized();
        self.neutral = self.neutral.sanitized();
        self.url = self.url.sanitized();
        self.trust = self.trust.sanitized();
        self.penalties = self.penalties.sanitized();
        self.rating = self.rating.sanitized();
        self.classifier = self.classifier.sanitized();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url_check::ShortenerPolicy;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert!((cfg.weights.total() - 1.0).abs() < 1e-6);
        assert_eq!(cfg.rating.tiers, 5);
        assert_eq!(cfg.url.shortener_policy, ShortenerPolicy::Penalize);
        assert_eq!(cfg.trust.lookup("cdc.gov").0, 1.0);
    }

    #[test]
    fn classifier_section_with_one_key_keeps_other_defaults() {
        let cfg = AppConfig::from_toml_str("[classifier]\nenabled = false\n").unwrap();
        assert!(!cfg.classifier.enabled);
        assert_eq!(cfg.classifier.provider, "huggingface");
        assert_eq!(cfg.classifier.api_token, "ENV");
        assert_eq!(cfg.classifier.max_chars, 2_000);
    }

    #[test]
    fn sections_override_and_are_sanitized() {
        let cfg = AppConfig::from_toml_str(
            r#"
[weights]
domain_trust = 2.0
relevance = -1.0

[url]
shortener_policy = "reject"
suspicious_tlds = [" .XYZ ", ""]

[rating]
tiers = 4
"#,
        )
        .unwrap();
        assert_eq!(cfg.weights.domain_trust, 2.0);
        assert_eq!(cfg.weights.relevance, 0.0);
        // Unspecified weights keep their defaults.
        assert_eq!(cfg.weights.credibility, 0.2);
        assert_eq!(cfg.url.shortener_policy, ShortenerPolicy::Reject);
        assert_eq!(cfg.url.suspicious_tlds, vec!["xyz".to_string()]);
        assert_eq!(cfg.rating.tiers, 4);
    }

    #[test]
    fn trust_table_keys_are_normalized() {
        let cfg = AppConfig::from_toml_str(
            r#"
[trust]
default_trust = 0.4
[trust.domains]
"WWW.Example.COM" = 0.9
"#,
        )
        .unwrap();
        assert_eq!(cfg.trust.lookup("example.com").0, 0.9);
        assert_eq!(cfg.trust.lookup("unknown.net").0, 0.4);
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(AppConfig::from_toml_str("[weights\nx=").is_err());
    }
}
