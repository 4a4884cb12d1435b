// src/signals/mod.rs
//! Signal providers: independent measurements that each turn
//! `(content, query, url)` into one bounded value in `[0.0, 1.0]`.
//!
//! Every provider shares one failure contract: `Result<Measurement, SignalError>`.
//! The pipeline converts that into a [`Signal`], so a failing provider only marks
//! its own slot unavailable and never touches its neighbours.

pub mod credibility;
pub mod domain_trust;
pub mod readability;
pub mod relevance;
pub mod reputation;
pub mod topics;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::fetch::ContentResult;
use crate::url_check::UrlFacts;

pub use credibility::{CredibilityClassifier, CredibilityProvider, DynClassifier};
pub use domain_trust::{DomainTrustProvider, TrustPenalties, TrustTable};
pub use readability::ReadabilityProvider;
pub use relevance::{Embedder, RelevanceProvider};
pub use reputation::ReputationSource;
pub use topics::TopicTable;

/// Names of the signals the aggregator knows how to weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalName {
    DomainTrust,
    Relevance,
    Credibility,
    Readability,
}

impl SignalName {
    /// Fixed presentation order.
    pub const ALL: [SignalName; 4] = [
        SignalName::DomainTrust,
        SignalName::Relevance,
        SignalName::Credibility,
        SignalName::Readability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalName::DomainTrust => "domain_trust",
            SignalName::Relevance => "relevance",
            SignalName::Credibility => "credibility",
            SignalName::Readability => "readability",
        }
    }

    /// Human-readable label used in explanations.
    pub fn label(&self) -> &'static str {
        match self {
            SignalName::DomainTrust => "Domain trust",
            SignalName::Relevance => "Relevance",
            SignalName::Credibility => "Credibility",
            SignalName::Readability => "Readability",
        }
    }
}

impl std::fmt::Display for SignalName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One measurement slot in an evaluation. `value` is `None` when the provider
/// could not produce a number; `unavailable_reason` then says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: SignalName,
    pub value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
    /// Optional provider commentary (e.g. which trust-table entry matched).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Signal {
    /// Available signal. Values are clamped to [0,1]; a non-finite value is
    /// reported as unavailable instead of being smuggled into the aggregate.
    pub fn available(name: SignalName, value: f32) -> Self {
        if !value.is_finite() {
            return Self::unavailable(name, "provider returned a non-finite value");
        }
        Self {
            name,
            value: Some(value.clamp(0.0, 1.0)),
            unavailable_reason: None,
            note: None,
        }
    }

    pub fn unavailable(name: SignalName, reason: impl Into<String>) -> Self {
        Self {
            name,
            value: None,
            unavailable_reason: Some(reason.into()),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }

    /// Convert a provider outcome into a signal slot.
    pub fn from_outcome(name: SignalName, outcome: Result<Measurement, SignalError>) -> Self {
        match outcome {
            Ok(m) => {
                let sig = Self::available(name, m.value);
                match m.note {
                    Some(note) if sig.is_available() => sig.with_note(note),
                    _ => sig,
                }
            }
            Err(e) => Self::unavailable(name, e.to_string()),
        }
    }
}

/// Successful provider output.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub value: f32,
    pub note: Option<String>,
}

impl Measurement {
    pub fn new(value: f32) -> Self {
        Self { value, note: None }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Why a provider could not produce a value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error("content unavailable: {0}")]
    ContentUnavailable(String),
    #[error("{0} disabled")]
    Disabled(String),
    #[error("provider failed: {0}")]
    Provider(String),
    #[error("timed out after {0} ms")]
    Timeout(u64),
}

impl SignalError {
    pub fn provider(err: impl std::fmt::Display) -> Self {
        SignalError::Provider(err.to_string())
    }
}

/// Read-only view handed to every provider in one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct SignalInput<'a> {
    pub content: &'a ContentResult,
    pub query: &'a str,
    pub url: &'a str,
    pub url_facts: &'a UrlFacts,
}

impl<'a> SignalInput<'a> {
    /// Fetched text, or `ContentUnavailable` carrying the fetcher's reason.
    pub fn text(&self) -> Result<&'a str, SignalError> {
        self.content.text().ok_or_else(|| {
            SignalError::ContentUnavailable(
                self.content
                    .error
                    .clone()
                    .unwrap_or_else(|| "no content".to_string()),
            )
        })
    }
}

/// A single independent scoring function.
#[async_trait]
pub trait SignalProvider: Send + Sync {
    fn name(&self) -> SignalName;

    /// Providers that need fetched text are skipped (and marked unavailable)
    /// when the fetch failed.
    fn requires_text(&self) -> bool {
        true
    }

    async fn measure(&self, input: &SignalInput<'_>) -> Result<Measurement, SignalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_clamps_into_unit_range() {
        let s = Signal::available(SignalName::Relevance, 1.7);
        assert_eq!(s.value, Some(1.0));
        let s = Signal::available(SignalName::Relevance, -0.2);
        assert_eq!(s.value, Some(0.0));
    }

    #[test]
    fn nan_becomes_unavailable() {
        let s = Signal::available(SignalName::Readability, f32::NAN);
        assert!(!s.is_available());
        assert!(s.unavailable_reason.is_some());
    }

    #[test]
    fn error_outcome_keeps_reason() {
        let s = Signal::from_outcome(
            SignalName::Credibility,
            Err(SignalError::Disabled("classifier".into())),
        );
        assert_eq!(s.value, None);
        assert_eq!(s.unavailable_reason.as_deref(), Some("classifier disabled"));
    }

    #[test]
    fn signal_names_serialize_snake_case() {
        let v = serde_json::to_value(SignalName::DomainTrust).unwrap();
        assert_eq!(v, serde_json::json!("domain_trust"));
    }
}
