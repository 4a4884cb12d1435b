//! # Domain Trust
//!
//! Maps a URL's registrable domain to a trust score in `[0.0, 1.0]`.
//!
//! - Static table with exact-domain entries and suffix categories
//!   (`.gov`, `.edu`, `.org`, ...).
//! - Lookup order: full host → registrable domain → suffix → default.
//! - Query topic boost: a domain listed as authoritative for the query's
//!   topic scores 1.0.
//! - Optional live reputation source overrides the static value when it answers.
//! - Penalties for plain HTTP, shorteners and suspicious keywords are
//!   subtracted last, then the score is clamped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use super::reputation::DynReputation;
use super::topics::TopicTable;
use super::{Measurement, SignalError, SignalInput, SignalName, SignalProvider};
use crate::url_check::UrlFacts;

/// Public suffixes made of two labels that we need to keep together.
const TWO_LABEL_SUFFIXES: &[&str] = &[
    "co.uk", "ac.uk", "gov.uk", "org.uk", "nhs.uk", "com.au", "gov.au", "edu.au", "org.au",
    "co.nz", "govt.nz", "co.jp", "ac.jp", "go.jp", "com.br", "gov.br", "co.in", "gov.in",
    "ac.in", "gc.ca",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustTable {
    /// Score when no entry matches.
    pub default_trust: f32,
    /// Exact registrable domains (or hosts), e.g. "cdc.gov".
    pub domains: HashMap<String, f32>,
    /// Suffix categories, e.g. "gov", "gov.uk".
    pub suffixes: HashMap<String, f32>,
}

impl Default for TrustTable {
    fn default() -> Self {
        Self::default_seed()
    }
}

/// Which table entry produced a score.
#[derive(Debug, Clone, PartialEq)]
pub enum TrustMatch {
    Domain(String),
    Suffix(String),
    Default,
}

impl TrustTable {
    /// Static lookup for a (normalized) host.
    pub fn lookup(&self, host: &str) -> (f32, TrustMatch) {
        let host = normalize_host(host);
        let domain = registrable_domain(&host);

        for key in [host.as_str(), domain.as_str()] {
            if let Some(&w) = self.domains.get(key) {
                return (clamp01(w), TrustMatch::Domain(key.to_string()));
            }
        }

        // Longest suffix first: "gov.uk" before "uk".
        let labels: Vec<&str> = domain.split('.').collect();
        for take in (1..=labels.len()).rev() {
            let suffix = labels[labels.len() - take..].join(".");
            if let Some(&w) = self.suffixes.get(&suffix) {
                return (clamp01(w), TrustMatch::Suffix(suffix));
            }
        }

        (clamp01(self.default_trust), TrustMatch::Default)
    }

    pub(crate) fn sanitized(mut self) -> Self {
        self.default_trust = if self.default_trust.is_finite() {
            clamp01(self.default_trust)
        } else {
            0.5
        };
        self.domains = self
            .domains
            .into_iter()
            .map(|(k, v)| (normalize_host(&k), v))
            .collect();
        self.suffixes = self
            .suffixes
            .into_iter()
            .map(|(k, v)| (k.trim().trim_start_matches('.').to_ascii_lowercase(), v))
            .collect();
        self
    }

    /// Built-in seed: government/education categories plus a few reputable
    /// outlets and agencies. Used when no config overrides it.
    pub(crate) fn default_seed() -> Self {
        let mut domains = HashMap::new();
        let mut suffixes = HashMap::new();

        for (k, v) in [
            ("cdc.gov", 1.0),
            ("nih.gov", 1.0),
            ("fda.gov", 1.0),
            ("who.int", 1.0),
            ("nasa.gov", 1.0),
            ("nature.com", 0.95),
            ("science.org", 0.95),
            ("thelancet.com", 0.95),
            ("nejm.org", 0.95),
            ("reuters.com", 0.9),
            ("apnews.com", 0.9),
            ("bbc.co.uk", 0.85),
            ("bbc.com", 0.85),
            ("nytimes.com", 0.85),
            ("wsj.com", 0.85),
            ("ft.com", 0.85),
            ("economist.com", 0.85),
            ("theguardian.com", 0.8),
            ("washingtonpost.com", 0.8),
            ("npr.org", 0.85),
            ("britannica.com", 0.8),
            ("wikipedia.org", 0.7),
            ("medium.com", 0.4),
            ("blogspot.com", 0.3),
            ("wordpress.com", 0.3),
        ] {
            domains.insert(k.to_string(), v);
        }

        for (k, v) in [
            ("gov", 1.0),
            ("edu", 1.0),
            ("mil", 1.0),
            ("int", 0.9),
            ("gov.uk", 1.0),
            ("ac.uk", 0.9),
            ("nhs.uk", 1.0),
            ("gov.au", 1.0),
            ("edu.au", 0.9),
            ("gc.ca", 1.0),
            ("org", 0.7),
        ] {
            suffixes.insert(k.to_string(), v);
        }

        Self {
            default_trust: 0.5,
            domains,
            suffixes,
        }
    }
}

/// Fixed subtractions applied after the base score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustPenalties {
    pub non_https: f32,
    pub shortener: f32,
    /// Applied once per matched keyword.
    pub suspicious_keyword: f32,
}

impl Default for TrustPenalties {
    fn default() -> Self {
        Self {
            non_https: 0.1,
            shortener: 0.3,
            suspicious_keyword: 0.2,
        }
    }
}

impl TrustPenalties {
    pub(crate) fn sanitized(self) -> Self {
        fn c(x: f32) -> f32 {
            if x.is_finite() {
                x.clamp(0.0, 1.0)
            } else {
                0.0
            }
        }
        Self {
            non_https: c(self.non_https),
            shortener: c(self.shortener),
            suspicious_keyword: c(self.suspicious_keyword),
        }
    }

    /// Total penalty and a short description of each applied item.
    pub fn assess(&self, facts: &UrlFacts) -> (f32, Vec<String>) {
        let mut total = 0.0;
        let mut applied = Vec::new();
        if !facts.https && self.non_https > 0.0 {
            total += self.non_https;
            applied.push(format!("no HTTPS -{:.2}", self.non_https));
        }
        if let Some(s) = &facts.shortener {
            if self.shortener > 0.0 {
                total += self.shortener;
                applied.push(format!("shortener {s} -{:.2}", self.shortener));
            }
        }
        if self.suspicious_keyword > 0.0 {
            for kw in &facts.suspicious_keywords {
                total += self.suspicious_keyword;
                applied.push(format!("keyword '{kw}' -{:.2}", self.suspicious_keyword));
            }
        }
        (total, applied)
    }
}

/// Domain-trust signal. Needs no fetched text.
pub struct DomainTrustProvider {
    table: TrustTable,
    topics: TopicTable,
    penalties: TrustPenalties,
    reputation: Option<DynReputation>,
}

impl DomainTrustProvider {
    pub fn new(table: TrustTable, topics: TopicTable, penalties: TrustPenalties) -> Self {
        Self {
            table,
            topics,
            penalties,
            reputation: None,
        }
    }

    pub fn with_reputation(mut self, source: DynReputation) -> Self {
        self.reputation = Some(source);
        self
    }

    async fn base_score(&self, host: &str, domain: &str) -> (f32, TrustMatch, Option<&'static str>) {
        if let Some(rep) = &self.reputation {
            match rep.domain_score(domain).await {
                Ok(s) if s.is_finite() => {
                    return (clamp01(s), TrustMatch::Domain(domain.to_string()), Some(rep.name()))
                }
                Ok(_) => warn!(source = rep.name(), domain, "reputation returned non-finite score"),
                Err(e) => {
                    warn!(source = rep.name(), domain, error = %e, "reputation lookup failed; using static table")
                }
            }
        }
        let (s, m) = self.table.lookup(host);
        (s, m, None)
    }
}

#[async_trait]
impl SignalProvider for DomainTrustProvider {
    fn name(&self) -> SignalName {
        SignalName::DomainTrust
    }

    fn requires_text(&self) -> bool {
        false
    }

    async fn measure(&self, input: &SignalInput<'_>) -> Result<Measurement, SignalError> {
        let facts = input.url_facts;
        let host = normalize_host(&facts.host);
        let domain = registrable_domain(&host);

        let (mut score, matched, live) = self.base_score(&host, &domain).await;

        let topic = self.topics.classify(input.query);
        let authoritative = self.topics.is_authoritative(topic, &domain);
        if authoritative {
            score = 1.0;
        }

        let (penalty, applied) = self.penalties.assess(facts);
        let score = clamp01(score - penalty);

        let mut note = describe(score, &domain, &matched, authoritative.then_some(topic));
        if let Some(src) = live {
            note.push_str(&format!(" [reputation: {src}]"));
        }
        if !applied.is_empty() {
            note.push_str(&format!(" (penalties: {})", applied.join(", ")));
        }
        Ok(Measurement::new(score).with_note(note))
    }
}

fn describe(score: f32, domain: &str, matched: &TrustMatch, topic: Option<&str>) -> String {
    if let Some(t) = topic {
        return format!("Highly credible source for {t}: {domain}");
    }
    if score >= 0.9 {
        format!("Highly credible source: {domain}")
    } else if score >= 0.6 {
        format!("Generally reputable source: {domain}")
    } else if *matched == TrustMatch::Default {
        format!("Unverified source: {domain}, cross-check with official sources.")
    } else {
        format!("Low-trust source: {domain}")
    }
}

/// Lowercase, drop trailing dot and leading `www.`.
pub fn normalize_host(host: &str) -> String {
    let h = host.trim().trim_end_matches('.').to_ascii_lowercase();
    h.strip_prefix("www.").map(str::to_string).unwrap_or(h)
}

/// Last two labels, or three when the suffix is a known two-label suffix.
pub fn registrable_domain(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() <= 2 {
        return labels.join(".");
    }
    let last_two = labels[labels.len() - 2..].join(".");
    let keep = if TWO_LABEL_SUFFIXES.contains(&last_two.as_str()) {
        3
    } else {
        2
    };
    labels[labels.len() - keep..].join(".")
}

fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ContentResult;
    use crate::url_check::{check, UrlPolicy};

    fn provider() -> DomainTrustProvider {
        DomainTrustProvider::new(
            TrustTable::default(),
            TopicTable::default(),
            TrustPenalties::default(),
        )
    }

    async fn score_for(url: &str, query: &str) -> Measurement {
        let facts = check(url, &UrlPolicy::default()).unwrap();
        let content = ContentResult::failed("not fetched");
        let input = SignalInput {
            content: &content,
            query,
            url,
            url_facts: &facts,
        };
        provider().measure(&input).await.unwrap()
    }

    #[test]
    fn registrable_domain_handles_two_label_suffixes() {
        assert_eq!(registrable_domain("news.bbc.co.uk"), "bbc.co.uk");
        assert_eq!(registrable_domain("blogs.cdc.gov"), "cdc.gov");
        assert_eq!(registrable_domain("localhost"), "localhost");
    }

    #[test]
    fn lookup_order_exact_then_suffix_then_default() {
        let t = TrustTable::default();
        assert_eq!(t.lookup("www.reuters.com").0, 0.9);
        assert_eq!(t.lookup("data.census.gov").1, TrustMatch::Suffix("gov".into()));
        assert_eq!(t.lookup("www.gov.uk").1, TrustMatch::Suffix("gov.uk".into()));
        assert_eq!(t.lookup("charity.org").0, 0.7);
        let (s, m) = t.lookup("random-blog.com");
        assert_eq!(s, 0.5);
        assert_eq!(m, TrustMatch::Default);
    }

    #[tokio::test]
    async fn gov_domain_is_highly_credible() {
        let m = score_for("https://www.cdc.gov/some-article", "vaccine safety").await;
        assert_eq!(m.value, 1.0);
        assert!(m.note.unwrap().starts_with("Highly credible source"));
    }

    #[tokio::test]
    async fn topic_authority_boosts_to_one() {
        // imf.org is 0.7 by suffix, but authoritative for finance queries.
        let m = score_for("https://www.imf.org/en/outlook", "inflation outlook").await;
        assert_eq!(m.value, 1.0);
        assert_eq!(
            m.note.as_deref(),
            Some("Highly credible source for finance: imf.org")
        );
        let m = score_for("https://www.imf.org/en/outlook", "football scores").await;
        assert!((m.value - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn penalties_are_subtracted_and_clamped() {
        let m = score_for("http://example.com/article", "anything").await;
        assert!((m.value - 0.4).abs() < 1e-6);
        let m = score_for("https://bit.ly/abc123", "anything").await;
        assert!((m.value - 0.2).abs() < 1e-6);
        let m = score_for("http://bit.ly/free-money-hoax", "anything").await;
        assert_eq!(m.value, 0.0);
        assert!(m.note.unwrap().contains("penalties"));
    }

    #[tokio::test]
    async fn live_reputation_overrides_static_table() {
        struct Fixed;
        #[async_trait]
        impl super::super::ReputationSource for Fixed {
            async fn domain_score(&self, _domain: &str) -> anyhow::Result<f32> {
                Ok(0.33)
            }
            fn name(&self) -> &'static str {
                "fixed"
            }
        }
        struct Broken;
        #[async_trait]
        impl super::super::ReputationSource for Broken {
            async fn domain_score(&self, _domain: &str) -> anyhow::Result<f32> {
                anyhow::bail!("service down")
            }
            fn name(&self) -> &'static str {
                "broken"
            }
        }

        let facts = check("https://www.reuters.com/world", &UrlPolicy::default()).unwrap();
        let content = ContentResult::failed("not fetched");
        let input = SignalInput {
            content: &content,
            query: "world news",
            url: "https://www.reuters.com/world",
            url_facts: &facts,
        };

        let live = provider().with_reputation(std::sync::Arc::new(Fixed));
        let m = live.measure(&input).await.unwrap();
        assert!((m.value - 0.33).abs() < 1e-6);

        let broken = provider().with_reputation(std::sync::Arc::new(Broken));
        let m = broken.measure(&input).await.unwrap();
        assert!((m.value - 0.9).abs() < 1e-6);
    }
}
