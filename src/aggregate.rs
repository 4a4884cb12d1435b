//! Weighted aggregation of independently measured signals.
//!
//! score = Σ wᵢ·vᵢ / Σ wᵢ on the canonical [0,1] scale, where `vᵢ` is the
//! signal value or, when the signal is unavailable, its neutral default.
//! A missing provider therefore moves the score by at most `wᵢ / Σw`.

use serde::{Deserialize, Serialize};

use crate::signals::{Signal, SignalName};

/// Per-signal weights. Non-negative; the total need not be 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightTable {
    pub domain_trust: f32,
    pub relevance: f32,
    pub credibility: f32,
    pub readability: f32,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            domain_trust: 0.4,
            relevance: 0.3,
            credibility: 0.2,
            readability: 0.1,
        }
    }
}

impl WeightTable {
    pub fn get(&self, name: SignalName) -> f32 {
        match name {
            SignalName::DomainTrust => self.domain_trust,
            SignalName::Relevance => self.relevance,
            SignalName::Credibility => self.credibility,
            SignalName::Readability => self.readability,
        }
    }

    pub fn total(&self) -> f32 {
        SignalName::ALL.iter().map(|n| self.get(*n)).sum()
    }

    /// Share of the final score a single signal controls.
    pub fn share(&self, name: SignalName) -> f32 {
        let total = self.total();
        if total <= 0.0 {
            0.0
        } else {
            self.get(name) / total
        }
    }

    /// Negative or non-finite weights become 0.
    pub(crate) fn sanitized(self) -> Self {
        fn c(w: f32) -> f32 {
            if w.is_finite() && w > 0.0 {
                w
            } else {
                0.0
            }
        }
        Self {
            domain_trust: c(self.domain_trust),
            relevance: c(self.relevance),
            credibility: c(self.credibility),
            readability: c(self.readability),
        }
    }
}

/// Substitute values for unavailable signals.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeutralDefaults {
    pub domain_trust: f32,
    pub relevance: f32,
    pub credibility: f32,
    pub readability: f32,
}

impl Default for NeutralDefaults {
    fn default() -> Self {
        Self {
            domain_trust: 0.5,
            relevance: 0.5,
            credibility: 0.5,
            readability: 0.5,
        }
    }
}

impl NeutralDefaults {
    pub fn get(&self, name: SignalName) -> f32 {
        match name {
            SignalName::DomainTrust => self.domain_trust,
            SignalName::Relevance => self.relevance,
            SignalName::Credibility => self.credibility,
            SignalName::Readability => self.readability,
        }
    }

    pub(crate) fn sanitized(self) -> Self {
        fn c(x: f32) -> f32 {
            if x.is_finite() {
                x.clamp(0.0, 1.0)
            } else {
                0.5
            }
        }
        Self {
            domain_trust: c(self.domain_trust),
            relevance: c(self.relevance),
            credibility: c(self.credibility),
            readability: c(self.readability),
        }
    }
}

/// How one signal fed into the final score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub signal: SignalName,
    pub value_used: f32,
    pub weight: f32,
    /// `weight * value_used / total_weight`, on the [0,1] scale.
    pub contribution: f32,
    pub neutral_substituted: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Final score on [0,1].
    pub score: f32,
    pub contributions: Vec<Contribution>,
}

/// Combine signals. Signals absent from the slice count as unavailable.
pub fn aggregate(signals: &[Signal], weights: &WeightTable, neutral: &NeutralDefaults) -> Aggregate {
    let total = weights.total();
    let mut contributions = Vec::with_capacity(SignalName::ALL.len());
    let mut raw = 0.0f32;

    for name in SignalName::ALL {
        let measured = signals
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.value);
        let (value_used, neutral_substituted) = match measured {
            Some(v) => (v.clamp(0.0, 1.0), false),
            None => (neutral.get(name), true),
        };
        let w = weights.get(name);
        raw += w * value_used;
        contributions.push(Contribution {
            signal: name,
            value_used,
            weight: w,
            contribution: if total > 0.0 { w * value_used / total } else { 0.0 },
            neutral_substituted,
        });
    }

    let score = if total > 0.0 {
        (raw / total).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Aggregate {
        score,
        contributions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all(d: f32, r: f32, c: f32, rd: f32) -> Vec<Signal> {
        vec![
            Signal::available(SignalName::DomainTrust, d),
            Signal::available(SignalName::Relevance, r),
            Signal::available(SignalName::Credibility, c),
            Signal::available(SignalName::Readability, rd),
        ]
    }

    #[test]
    fn weighted_sum_with_default_weights() {
        let a = aggregate(
            &all(1.0, 0.5, 0.5, 0.5),
            &WeightTable::default(),
            &NeutralDefaults::default(),
        );
        // 0.4 + 0.15 + 0.10 + 0.05
        assert!((a.score - 0.70).abs() < 1e-5, "got {}", a.score);
        assert_eq!(a.contributions.len(), 4);
        assert!(a.contributions.iter().all(|c| !c.neutral_substituted));
    }

    #[test]
    fn weights_need_not_sum_to_one() {
        let w = WeightTable {
            domain_trust: 4.0,
            relevance: 3.0,
            credibility: 2.0,
            readability: 1.0,
        };
        let a = aggregate(&all(1.0, 0.5, 0.5, 0.5), &w, &NeutralDefaults::default());
        assert!((a.score - 0.70).abs() < 1e-5);
    }

    #[test]
    fn missing_signal_uses_neutral_default() {
        let mut sigs = all(1.0, 1.0, 1.0, 1.0);
        sigs[2] = Signal::unavailable(SignalName::Credibility, "classifier disabled");
        let a = aggregate(&sigs, &WeightTable::default(), &NeutralDefaults::default());
        // 0.4 + 0.3 + 0.2*0.5 + 0.1
        assert!((a.score - 0.90).abs() < 1e-5);
        let c = a
            .contributions
            .iter()
            .find(|c| c.signal == SignalName::Credibility)
            .unwrap();
        assert!(c.neutral_substituted);
        assert_eq!(c.value_used, 0.5);
    }

    #[test]
    fn absent_from_slice_counts_as_unavailable() {
        let a = aggregate(&[], &WeightTable::default(), &NeutralDefaults::default());
        assert!((a.score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_total_weight_scores_zero() {
        let w = WeightTable {
            domain_trust: 0.0,
            relevance: 0.0,
            credibility: 0.0,
            readability: 0.0,
        };
        let a = aggregate(&all(1.0, 1.0, 1.0, 1.0), &w, &NeutralDefaults::default());
        assert_eq!(a.score, 0.0);
    }

    #[test]
    fn sanitize_drops_negative_weights() {
        let w = WeightTable {
            domain_trust: -1.0,
            relevance: f32::NAN,
            credibility: 0.2,
            readability: 0.1,
        }
        .sanitized();
        assert_eq!(w.domain_trust, 0.0);
        assert_eq!(w.relevance, 0.0);
        assert!((w.total() - 0.3).abs() < 1e-6);
    }
}
