//! Final score → discrete star tier with a fixed explanation.
//!
//! Tiers divide `[0, max_score]` evenly; the top boundary belongs to the
//! highest tier. Out-of-range scores are clamped, NaN counts as 0.

use serde::{Deserialize, Serialize};

/// Fixed (label, explanation) per relative position, lowest first.
const TIER_TEXT: [(&str, &str); 5] = [
    (
        "Unreliable",
        "The source is unreliable and likely misleading.",
    ),
    (
        "Questionable",
        "The source has some credibility but contains potential misinformation.",
    ),
    (
        "Moderate",
        "The source is moderately reliable but may have biases.",
    ),
    (
        "Trustworthy",
        "The source is generally trustworthy with good readability.",
    ),
    (
        "Highly credible",
        "The source is highly credible, relevant, and well-structured.",
    ),
];

const MIN_TIERS: u8 = 2;
const MAX_TIERS: u8 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingScale {
    pub tiers: u8,
    pub max_score: f32,
}

impl Default for RatingScale {
    fn default() -> Self {
        Self {
            tiers: 5,
            max_score: 100.0,
        }
    }
}

/// Discrete rating for one evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub tier: u8,
    pub tiers: u8,
    pub label: String,
    pub stars: String,
    pub explanation: String,
}

impl RatingScale {
    pub(crate) fn sanitized(mut self) -> Self {
        self.tiers = self.tiers.clamp(MIN_TIERS, MAX_TIERS);
        if !self.max_score.is_finite() || self.max_score <= 0.0 {
            self.max_score = 100.0;
        }
        self
    }

    /// Tier in `1..=tiers`. Total and monotonic in `score`.
    pub fn tier_for(&self, score: f32) -> u8 {
        let tiers = self.tiers.max(1);
        let s = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, self.max_score)
        };
        let bucket = (s * tiers as f32 / self.max_score).floor() as u8;
        bucket.saturating_add(1).min(tiers)
    }

    pub fn to_rating(&self, score: f32) -> Rating {
        self.rating_for_tier(self.tier_for(score))
    }

    /// The rating used for rejected inputs.
    pub fn lowest(&self) -> Rating {
        self.rating_for_tier(1)
    }

    fn rating_for_tier(&self, tier: u8) -> Rating {
        let tiers = self.tiers.max(1);
        let (label, explanation) = TIER_TEXT[text_index(tier, tiers)];
        Rating {
            tier,
            tiers,
            label: label.to_string(),
            stars: stars(tier, tiers),
            explanation: explanation.to_string(),
        }
    }
}

/// Relative position of `tier` within `tiers`, mapped onto the five texts.
fn text_index(tier: u8, tiers: u8) -> usize {
    let n = TIER_TEXT.len();
    let (tier, tiers) = (tier.max(1) as usize, tiers.max(1) as usize);
    let idx = (tier * n).div_ceil(tiers);
    idx.clamp(1, n) - 1
}

fn stars(tier: u8, tiers: u8) -> String {
    let filled = tier.min(tiers) as usize;
    let mut s = "★".repeat(filled);
    s.push_str(&"☆".repeat(tiers as usize - filled));
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evenly_divided_boundaries() {
        let r = RatingScale::default();
        assert_eq!(r.tier_for(0.0), 1);
        assert_eq!(r.tier_for(19.99), 1);
        assert_eq!(r.tier_for(20.0), 2);
        assert_eq!(r.tier_for(79.99), 4);
        assert_eq!(r.tier_for(80.0), 5);
        assert_eq!(r.tier_for(100.0), 5);
    }

    #[test]
    fn out_of_range_is_clamped() {
        let r = RatingScale::default();
        assert_eq!(r.tier_for(-5.0), 1);
        assert_eq!(r.tier_for(250.0), 5);
        assert_eq!(r.tier_for(f32::NAN), 1);
        assert_eq!(r.tier_for(f32::INFINITY), 5);
    }

    #[test]
    fn five_tier_texts_are_fixed() {
        let r = RatingScale::default();
        let top = r.to_rating(95.0);
        assert_eq!(top.label, "Highly credible");
        assert_eq!(top.stars, "★★★★★");
        assert!(top.explanation.contains("highly credible"));
        let low = r.lowest();
        assert_eq!(low.tier, 1);
        assert_eq!(low.stars, "★☆☆☆☆");
        assert_eq!(low.explanation, "The source is unreliable and likely misleading.");
    }

    #[test]
    fn other_tier_counts_use_relative_texts() {
        let r = RatingScale {
            tiers: 3,
            max_score: 100.0,
        };
        assert_eq!(r.to_rating(10.0).label, "Questionable");
        assert_eq!(r.to_rating(50.0).label, "Trustworthy");
        assert_eq!(r.to_rating(99.0).label, "Highly credible");
        assert_eq!(r.to_rating(99.0).stars, "★★★");
    }

    #[test]
    fn sanitize_bounds_tier_count() {
        let r = RatingScale {
            tiers: 0,
            max_score: -1.0,
        }
        .sanitized();
        assert_eq!(r.tiers, 2);
        assert_eq!(r.max_score, 100.0);
    }
}
