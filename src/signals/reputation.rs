//! Live domain reputation lookups (optional).
//!
//! When configured, a reputation source answers first; any failure falls back
//! to the static trust table. Scores are normalized to [0,1].

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait ReputationSource: Send + Sync {
    /// Trust score in [0,1] for a registrable domain.
    async fn domain_score(&self, domain: &str) -> anyhow::Result<f32>;
    fn name(&self) -> &'static str;
}

pub type DynReputation = Arc<dyn ReputationSource>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationConfig {
    pub enabled: bool,
    /// "ENV" means: read from MOZ_ACCESS_ID.
    pub access_id: String,
    /// "ENV" means: read from MOZ_SECRET_KEY.
    pub secret_key: String,
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            access_id: "ENV".to_string(),
            secret_key: "ENV".to_string(),
            endpoint: "https://lsapi.seomoz.com/v2/url_metrics".to_string(),
            timeout_ms: 5_000,
        }
    }
}

/// Resolve a credential that may be the literal "ENV".
pub(crate) fn resolve_secret(value: &str, env_var: &str) -> Option<String> {
    let v = value.trim();
    let resolved = if v.eq_ignore_ascii_case("env") {
        std::env::var(env_var).ok()?
    } else {
        v.to_string()
    };
    let resolved = resolved.trim().to_string();
    (!resolved.is_empty()).then_some(resolved)
}

/// Build the configured source, or `None` (static table only).
pub fn build_reputation_source(cfg: &ReputationConfig) -> anyhow::Result<Option<DynReputation>> {
    if !cfg.enabled {
        return Ok(None);
    }
    let access_id = resolve_secret(&cfg.access_id, "MOZ_ACCESS_ID")
        .ok_or_else(|| anyhow!("reputation enabled but MOZ_ACCESS_ID is missing"))?;
    let secret_key = resolve_secret(&cfg.secret_key, "MOZ_SECRET_KEY")
        .ok_or_else(|| anyhow!("reputation enabled but MOZ_SECRET_KEY is missing"))?;
    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(4))
        .timeout(Duration::from_millis(cfg.timeout_ms.max(1)))
        .build()
        .context("building reputation http client")?;
    Ok(Some(Arc::new(MozReputation {
        http,
        endpoint: cfg.endpoint.clone(),
        access_id,
        secret_key,
    })))
}

/// Moz Links API: `domain_authority` (0–100) scaled to [0,1].
pub struct MozReputation {
    http: reqwest::Client,
    endpoint: String,
    access_id: String,
    secret_key: String,
}

#[async_trait]
impl ReputationSource for MozReputation {
    async fn domain_score(&self, domain: &str) -> anyhow::Result<f32> {
        #[derive(Serialize)]
        struct Req<'a> {
            targets: [&'a str; 1],
        }
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            results: Vec<Metrics>,
        }
        #[derive(Deserialize)]
        struct Metrics {
            domain_authority: Option<f32>,
        }

        let resp = self
            .http
            .post(&self.endpoint)
            .basic_auth(&self.access_id, Some(&self.secret_key))
            .json(&Req { targets: [domain] })
            .send()
            .await
            .context("moz request")?;
        if !resp.status().is_success() {
            return Err(anyhow!("moz returned http {}", resp.status().as_u16()));
        }
        let body: Resp = resp.json().await.context("moz response body")?;
        let da = body
            .results
            .first()
            .and_then(|m| m.domain_authority)
            .ok_or_else(|| anyhow!("moz returned no domain_authority for {domain}"))?;
        Ok((da / 100.0).clamp(0.0, 1.0))
    }

    fn name(&self) -> &'static str {
        "moz"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_secret_is_used_as_is() {
        assert_eq!(resolve_secret(" abc ", "UNUSED_VAR"), Some("abc".into()));
        assert_eq!(resolve_secret("", "UNUSED_VAR"), None);
    }

    #[test]
    fn disabled_config_builds_nothing() {
        let cfg = ReputationConfig::default();
        assert!(build_reputation_source(&cfg).unwrap().is_none());
    }
}
