//! Content fetching: URL → extracted article text.
//!
//! The pipeline only depends on the [`ContentFetcher`] result contract. A failed
//! fetch is a value (`ContentResult` with `text == None`), never an error.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::url_check::internal_host;

/// Outcome of one fetch. Exactly one of `text` / `error` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentResult {
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContentResult {
    /// Successful fetch. Blank text is downgraded to a failure.
    pub fn ok(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            return Self::failed("empty body");
        }
        Self {
            text: Some(text),
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            text: None,
            error: Some(reason.into()),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_available(&self) -> bool {
        self.text.is_some()
    }
}

/// Fetch error types, flattened into `ContentResult::error` at the boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("timeout fetching {0}")]
    Timeout(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("http {0} for {1}")]
    HttpStatus(u16, String),
    #[error("no readable content at {0}")]
    NoContent(String),
    #[error("blocked internal address {0}")]
    Blocked(String),
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> ContentResult;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Extracted text is truncated to this many characters.
    pub max_chars: usize,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_chars: 20_000,
            user_agent: "article-credibility/0.1 (+credibility evaluator)".to_string(),
            max_redirects: 5,
        }
    }
}

/// Whether to follow redirect hop number `hops + 1` to `target`.
pub(crate) fn redirect_verdict(target: &Url, hops: usize, max: usize) -> Result<(), String> {
    if hops >= max {
        return Err(format!("too many redirects ({hops})"));
    }
    if let Some(h) = internal_host(target) {
        return Err(format!("redirect to internal host {h} blocked"));
    }
    Ok(())
}

/// reqwest + scraper implementation.
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// `timeout` bounds the whole request; the pipeline applies the same bound.
    pub fn new(config: FetchConfig, timeout: Duration) -> anyhow::Result<Self> {
        let max_redirects = config.max_redirects;
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .redirect(Policy::custom(move |attempt| {
                match redirect_verdict(attempt.url(), attempt.previous().len(), max_redirects) {
                    Ok(()) => attempt.follow(),
                    Err(reason) => attempt.error(reason),
                }
            }))
            .build()?;
        Ok(Self { client, config })
    }

    async fn try_fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::Http(e.to_string()))?;
        if let Some(h) = internal_host(&parsed) {
            return Err(FetchError::Blocked(h));
        }
        debug!(url, "fetching article");
        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Http(e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16(), url.to_string()));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        let text = extract_article_text(&html, self.config.max_chars);
        if text.is_empty() {
            return Err(FetchError::NoContent(url.to_string()));
        }
        debug!(url, chars = text.len(), "article text extracted");
        Ok(text)
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> ContentResult {
        match self.try_fetch(url).await {
            Ok(text) => ContentResult::ok(text),
            Err(e) => {
                warn!(url, error = %e, "fetch failed");
                ContentResult::failed(e.to_string())
            }
        }
    }
}

/// Extract readable text from an HTML page.
///
/// Order: article-like containers, then all `<p>` paragraphs, then `<body>`.
pub fn extract_article_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    for selector_str in [
        "article",
        "main",
        "[role='main']",
        ".article-body",
        ".article-content",
        ".post-content",
        ".entry-content",
        "#content",
    ] {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let cleaned = collapse_ws(&element.text().collect::<Vec<_>>().join(" "));
                if cleaned.chars().count() > 200 {
                    return truncate_chars(&cleaned, max_chars);
                }
            }
        }
    }

    if let Ok(p) = Selector::parse("p") {
        let joined = document
            .select(&p)
            .map(|el| el.text().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join(" ");
        let cleaned = collapse_ws(&joined);
        if !cleaned.is_empty() {
            return truncate_chars(&cleaned, max_chars);
        }
    }

    if let Ok(body) = Selector::parse("body") {
        if let Some(el) = document.select(&body).next() {
            let cleaned = collapse_ws(&el.text().collect::<Vec<_>>().join(" "));
            return truncate_chars(&cleaned, max_chars);
        }
    }
    String::new()
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate on a char boundary, preferring the last word break.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    match cut.rfind(' ') {
        Some(idx) if idx > 0 => cut[..idx].to_string(),
        _ => cut,
    }
}
