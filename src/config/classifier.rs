// src/config/classifier.rs
use serde::{Deserialize, Serialize};

const DEFAULT_MAX_CHARS: usize = 2_000;
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Every field is optional in TOML; missing ones take [`Default`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub enabled: bool,
    /// "huggingface" | "fixed" (case-insensitive)
    pub provider: String,
    pub model: String,
    /// Base URL; the model id is appended.
    pub endpoint: String,
    /// "ENV" means: read from HF_API_TOKEN.
    pub api_token: String,
    /// Label whose probability means "credible".
    pub credible_label: String,
    /// Input is truncated to this many characters before classification.
    pub max_chars: usize,
    pub timeout_ms: u64,
    /// Probability returned by the "fixed" provider.
    pub fixed_probability: Option<f32>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "huggingface".to_string(),
            model: "jy46604790/Fake-News-Bert-Detect".to_string(),
            endpoint: "https://api-inference.huggingface.co/models".to_string(),
            api_token: "ENV".to_string(),
            credible_label: "LABEL_1".to_string(),
            max_chars: DEFAULT_MAX_CHARS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            fixed_probability: None,
        }
    }
}

impl ClassifierConfig {
    pub(crate) fn sanitized(mut self) -> Self {
        // Normalize provider
        self.provider = self.provider.trim().to_lowercase();
        if self.max_chars == 0 {
            self.max_chars = DEFAULT_MAX_CHARS;
        }
        if self.timeout_ms == 0 {
            self.timeout_ms = DEFAULT_TIMEOUT_MS;
        }
        self.fixed_probability = self
            .fixed_probability
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 1.0));
        self
    }

    /// Resolve the API token; "ENV" reads HF_API_TOKEN. `None` when missing.
    pub fn resolve_api_token(&self) -> Option<String> {
        crate::signals::reputation::resolve_secret(&self.api_token, "HF_API_TOKEN")
    }

    /// Full inference URL for the configured model.
    pub fn model_url(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.model.trim_start_matches('/')
        )
    }
}
