// src/signals/relevance.rs
//! Query ↔ article relevance.
//!
//! Two interchangeable strategies:
//! - `lexical`: TF-IDF weighted cosine similarity over the two-document corpus
//!   `[query, text]`, English stop words removed, smoothed idf, L2 norm.
//! - `semantic`: cosine similarity of dense embeddings from an [`Embedder`].
//!
//! Empty query or empty text scores 0 rather than failing.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use super::reputation::resolve_secret;
use super::{Measurement, SignalError, SignalInput, SignalName, SignalProvider};
use crate::fetch::truncate_chars;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("token regex"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
        "both", "but", "by", "can", "cannot", "could", "did", "do", "does", "doing", "down",
        "during", "each", "either", "else", "etc", "even", "ever", "every", "few", "for", "from",
        "further", "get", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
        "him", "himself", "his", "how", "however", "if", "in", "into", "is", "it", "its",
        "itself", "just", "least", "less", "may", "me", "might", "more", "most", "much", "must",
        "my", "myself", "neither", "no", "nor", "not", "now", "of", "off", "often", "on", "once",
        "only", "or", "other", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
        "per", "perhaps", "rather", "same", "she", "should", "since", "so", "some", "still",
        "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
        "therefore", "these", "they", "this", "those", "though", "through", "thus", "to", "too",
        "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what",
        "whatever", "when", "where", "whether", "which", "while", "who", "whoever", "whole",
        "whom", "whose", "why", "will", "with", "within", "without", "would", "yet", "you",
        "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

fn term_counts(text: &str) -> HashMap<String, f64> {
    let lowered = text.to_lowercase();
    let mut out = HashMap::new();
    for m in TOKEN_RE.find_iter(&lowered) {
        let term = m.as_str();
        if STOP_WORDS.contains(term) {
            continue;
        }
        *out.entry(term.to_string()).or_insert(0.0) += 1.0;
    }
    out
}

/// TF-IDF cosine similarity between `query` and `text`, in [0,1].
pub fn tfidf_cosine(query: &str, text: &str) -> f32 {
    let q = term_counts(query);
    let d = term_counts(text);
    if q.is_empty() || d.is_empty() {
        return 0.0;
    }

    // Smoothed idf over a two-document corpus: ln((1 + n) / (1 + df)) + 1.
    let idf = |term: &str| {
        let df = q.contains_key(term) as u8 + d.contains_key(term) as u8;
        (3.0f64 / (1.0 + df as f64)).ln() + 1.0
    };
    let weigh = |counts: &HashMap<String, f64>| -> HashMap<String, f64> {
        counts
            .iter()
            .map(|(t, c)| (t.clone(), c * idf(t)))
            .collect()
    };
    let qv = weigh(&q);
    let dv = weigh(&d);

    let dot: f64 = qv
        .iter()
        .filter_map(|(t, w)| dv.get(t).map(|v| w * v))
        .sum();
    let norm = |v: &HashMap<String, f64>| v.values().map(|x| x * x).sum::<f64>().sqrt();
    let denom = norm(&qv) * norm(&dv);
    if denom <= 0.0 {
        return 0.0;
    }
    ((dot / denom) as f32).clamp(0.0, 1.0)
}

/// Dense cosine similarity; negative similarity is treated as unrelated (0).
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na * nb)).clamp(0.0, 1.0)
}

// ------------------------------------------------------------
// Embeddings collaborator
// ------------------------------------------------------------

#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    /// OpenAI-compatible `/v1/embeddings` endpoint.
    pub endpoint: String,
    pub model: String,
    /// "ENV" means: read from EMBEDDINGS_API_KEY.
    pub api_key: String,
    pub timeout_ms: u64,
    pub max_chars: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/embeddings".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: "ENV".to_string(),
            timeout_ms: 10_000,
            max_chars: 8_000,
        }
    }
}

/// Embedding client for OpenAI-compatible endpoints.
pub struct HttpEmbedder {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(cfg: &EmbeddingsConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_millis(cfg.timeout_ms.max(1)))
            .build()
            .context("building embeddings http client")?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: resolve_secret(&cfg.api_key, "EMBEDDINGS_API_KEY"),
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            input: &'a [String],
        }
        #[derive(Deserialize)]
        struct Resp {
            data: Vec<Item>,
        }
        #[derive(Deserialize)]
        struct Item {
            index: usize,
            embedding: Vec<f32>,
        }

        let mut req = self.http.post(&self.endpoint).json(&Req {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.context("embeddings request")?;
        if !resp.status().is_success() {
            return Err(anyhow!("embeddings returned http {}", resp.status().as_u16()));
        }
        let mut body: Resp = resp.json().await.context("embeddings response body")?;
        if body.data.len() != texts.len() {
            return Err(anyhow!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            ));
        }
        body.data.sort_by_key(|i| i.index);
        Ok(body.data.into_iter().map(|i| i.embedding).collect())
    }

    fn name(&self) -> &'static str {
        "http-embeddings"
    }
}

// ------------------------------------------------------------
// Provider
// ------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceStrategy {
    #[default]
    Lexical,
    Semantic,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    pub strategy: RelevanceStrategy,
    pub embeddings: EmbeddingsConfig,
}

enum Strategy {
    Lexical,
    Semantic {
        embedder: Arc<dyn Embedder>,
        max_chars: usize,
    },
}

pub struct RelevanceProvider {
    strategy: Strategy,
}

impl RelevanceProvider {
    pub fn lexical() -> Self {
        Self {
            strategy: Strategy::Lexical,
        }
    }

    pub fn semantic(embedder: Arc<dyn Embedder>, max_chars: usize) -> Self {
        Self {
            strategy: Strategy::Semantic {
                embedder,
                max_chars: max_chars.max(1),
            },
        }
    }
}

#[async_trait]
impl SignalProvider for RelevanceProvider {
    fn name(&self) -> SignalName {
        SignalName::Relevance
    }

    async fn measure(&self, input: &SignalInput<'_>) -> Result<Measurement, SignalError> {
        let text = input.text()?;
        let query = input.query.trim();
        if query.is_empty() || text.trim().is_empty() {
            return Ok(Measurement::new(0.0).with_note("empty query or text"));
        }

        match &self.strategy {
            Strategy::Lexical => {
                let s = tfidf_cosine(query, text);
                Ok(Measurement::new(s).with_note(format!("lexical tf-idf cosine {s:.2}")))
            }
            Strategy::Semantic {
                embedder,
                max_chars,
            } => {
                let inputs = vec![query.to_string(), truncate_chars(text, *max_chars)];
                let vecs = embedder
                    .embed(&inputs)
                    .await
                    .map_err(SignalError::provider)?;
                let [q, d] = vecs.as_slice() else {
                    return Err(SignalError::Provider(format!(
                        "{} returned {} vectors for 2 inputs",
                        embedder.name(),
                        vecs.len()
                    )));
                };
                let s = cosine(q, d);
                Ok(Measurement::new(s)
                    .with_note(format!("semantic cosine {s:.2} via {}", embedder.name())))
            }
        }
    }
}
