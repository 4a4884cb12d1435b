//! Query topic lookup: keyword table → topic, with an explicit `general`
//! fallback, plus the domains considered authoritative per topic.
//!
//! Matching is token-based (whole words), so short keywords cannot fire
//! inside unrelated words. Topics are scanned in name order for determinism.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const GENERAL_TOPIC: &str = "general";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicTable {
    /// topic → keywords that select it.
    pub keywords: BTreeMap<String, Vec<String>>,
    /// topic → registrable domains that are authoritative for it.
    pub authorities: BTreeMap<String, Vec<String>>,
}

impl Default for TopicTable {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl TopicTable {
    /// Pick the topic for a query; `general` when nothing matches.
    pub fn classify(&self, query: &str) -> &str {
        let tokens: Vec<String> = query
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();
        if tokens.is_empty() {
            return GENERAL_TOPIC;
        }
        for (topic, kws) in &self.keywords {
            if kws
                .iter()
                .any(|kw| tokens.iter().any(|t| t.eq_ignore_ascii_case(kw)))
            {
                return topic.as_str();
            }
        }
        GENERAL_TOPIC
    }

    pub fn is_authoritative(&self, topic: &str, domain: &str) -> bool {
        self.authorities
            .get(topic)
            .map(|ds| ds.iter().any(|d| d.eq_ignore_ascii_case(domain)))
            .unwrap_or(false)
    }

    pub(crate) fn default_seed() -> Self {
        let mut keywords = BTreeMap::new();
        let mut authorities = BTreeMap::new();

        for (topic, kws) in [
            (
                "finance",
                &[
                    "stock", "stocks", "market", "inflation", "tax", "taxes", "interest",
                    "bank", "economy", "investment",
                ][..],
            ),
            (
                "health",
                &[
                    "disease", "covid", "medicine", "symptoms", "treatment", "vaccine",
                    "vaccines", "virus", "health", "outbreak",
                ][..],
            ),
            (
                "science",
                &[
                    "nasa", "technology", "physics", "climate", "space", "research",
                    "astronomy",
                ][..],
            ),
            (
                "travel",
                &["airport", "flight", "airline", "visa", "trip", "passport"][..],
            ),
        ] {
            keywords.insert(
                topic.to_string(),
                kws.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            );
        }

        for (topic, ds) in [
            ("finance", &["federalreserve.gov", "sec.gov", "imf.org"][..]),
            ("health", &["cdc.gov", "who.int", "nih.gov", "fda.gov"][..]),
            ("science", &["nasa.gov", "mit.edu", "nature.com"][..]),
            (
                "travel",
                &["tsa.gov", "faa.gov", "iata.org", "transportation.gov"][..],
            ),
        ] {
            authorities.insert(
                topic.to_string(),
                ds.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            );
        }

        Self {
            keywords,
            authorities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_keyword() {
        let t = TopicTable::default();
        assert_eq!(t.classify("vaccine safety"), "health");
        assert_eq!(t.classify("Best airport for a flight into NYC?"), "travel");
    }

    #[test]
    fn falls_back_to_general() {
        let t = TopicTable::default();
        assert_eq!(t.classify("who won the match yesterday"), GENERAL_TOPIC);
        assert_eq!(t.classify(""), GENERAL_TOPIC);
    }

    #[test]
    fn whole_word_matching_only() {
        let t = TopicTable::default();
        // "taxi" must not match "tax".
        assert_eq!(t.classify("taxi fares downtown"), GENERAL_TOPIC);
    }

    #[test]
    fn authorities_are_per_topic() {
        let t = TopicTable::default();
        assert!(t.is_authoritative("health", "cdc.gov"));
        assert!(!t.is_authoritative("travel", "cdc.gov"));
        assert!(!t.is_authoritative(GENERAL_TOPIC, "cdc.gov"));
    }
}
