// src/result.rs
//! Evaluation request/result types and the assembler that turns signals,
//! aggregate and rating into one immutable result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, Contribution};
use crate::fetch::ContentResult;
use crate::rating::Rating;
use crate::signals::{Signal, SignalName};
use crate::url_check::{UrlFacts, UrlRejection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub url: String,
    #[serde(default)]
    pub query: String,
}

impl EvaluationRequest {
    pub fn new(url: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: query.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub url: String,
    pub query: String,
    pub domain_trust: Signal,
    pub relevance: Signal,
    pub credibility: Signal,
    pub readability: Signal,
    pub contributions: Vec<Contribution>,
    /// Final score on [0, max_score] (100 by default).
    pub final_score: f32,
    pub rating: u8,
    pub tiers: u8,
    pub label: String,
    pub stars: String,
    /// Ordered: URL notes, content note, per-signal lines, final score, tier text.
    pub explanation: Vec<String>,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationResult {
    pub fn signal(&self, name: SignalName) -> &Signal {
        match name {
            SignalName::DomainTrust => &self.domain_trust,
            SignalName::Relevance => &self.relevance,
            SignalName::Credibility => &self.credibility,
            SignalName::Readability => &self.readability,
        }
    }

    pub fn signals(&self) -> [&Signal; 4] {
        SignalName::ALL.map(|n| self.signal(n))
    }
}

fn take_signal(signals: &[Signal], name: SignalName) -> Signal {
    signals
        .iter()
        .find(|s| s.name == name)
        .cloned()
        .unwrap_or_else(|| Signal::unavailable(name, "no provider configured"))
}

fn signal_line(signal: &Signal, contribution: Option<&Contribution>) -> String {
    match (signal.value, contribution) {
        (Some(v), _) => match &signal.note {
            Some(note) => format!("{}: {:.2} ({note})", signal.name.label(), v),
            None => format!("{}: {:.2}", signal.name.label(), v),
        },
        (None, c) => {
            let reason = signal
                .unavailable_reason
                .as_deref()
                .unwrap_or("unavailable");
            match c {
                Some(c) => format!(
                    "{}: unavailable ({reason}); neutral {:.2} used",
                    signal.name.label(),
                    c.value_used
                ),
                None => format!("{}: unavailable ({reason})", signal.name.label()),
            }
        }
    }
}

/// Assemble the result of a full evaluation.
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    request: &EvaluationRequest,
    facts: &UrlFacts,
    content: &ContentResult,
    signals: &[Signal],
    aggregate: Aggregate,
    final_score: f32,
    max_score: f32,
    rating: Rating,
) -> EvaluationResult {
    let mut explanation = facts.notes();
    if let Some(reason) = content.error.as_deref().filter(|_| !content.is_available()) {
        explanation.push(format!(
            "Article content unavailable ({reason}); text-based signals use neutral defaults."
        ));
    }
    for name in SignalName::ALL {
        let s = take_signal(signals, name);
        let c = aggregate.contributions.iter().find(|c| c.signal == name);
        explanation.push(signal_line(&s, c));
    }
    explanation.push(format!("Final score: {final_score:.1}/{max_score:.0}"));
    explanation.push(format!("{}: {}", rating.label, rating.explanation));

    EvaluationResult {
        url: request.url.clone(),
        query: request.query.clone(),
        domain_trust: take_signal(signals, SignalName::DomainTrust),
        relevance: take_signal(signals, SignalName::Relevance),
        credibility: take_signal(signals, SignalName::Credibility),
        readability: take_signal(signals, SignalName::Readability),
        contributions: aggregate.contributions,
        final_score,
        rating: rating.tier,
        tiers: rating.tiers,
        label: rating.label,
        stars: rating.stars,
        explanation,
        evaluated_at: Utc::now(),
    }
}

/// Result for a rejected URL: nothing measured, score 0, lowest tier.
pub fn invalid_url(request: &EvaluationRequest, reason: &UrlRejection, rating: Rating) -> EvaluationResult {
    let why = format!("invalid URL: {reason}");
    let unavailable = |name| Signal::unavailable(name, why.clone());
    EvaluationResult {
        url: request.url.clone(),
        query: request.query.clone(),
        domain_trust: unavailable(SignalName::DomainTrust),
        relevance: unavailable(SignalName::Relevance),
        credibility: unavailable(SignalName::Credibility),
        readability: unavailable(SignalName::Readability),
        contributions: Vec::new(),
        final_score: 0.0,
        rating: rating.tier,
        tiers: rating.tiers,
        explanation: vec![
            format!("Invalid or suspicious URL: {reason}"),
            format!("{}: {}", rating.label, rating.explanation),
        ],
        label: rating.label,
        stars: rating.stars,
        evaluated_at: Utc::now(),
    }
}
