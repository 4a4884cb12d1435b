//! # URL Validator
//!
//! Pure checks on the URL string, run before any network call:
//! - shape must match `http(s)://host...` and parse with a host,
//! - the host must not be loopback, private, link-local or unspecified,
//! - the top-level domain must not be in the suspicious-TLD set,
//! - URL shorteners are either rejected or flagged for a trust penalty,
//!   depending on [`ShortenerPolicy`],
//! - suspicious keywords are only ever flagged (soft penalty), never rejected.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

static URL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:\[[0-9a-fA-F:.]+\]|(?:[-\w.]|(?:%[0-9a-fA-F]{2}))+)")
        .expect("url shape regex")
});

/// What to do with known URL shorteners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortenerPolicy {
    /// Treat the URL as invalid.
    Reject,
    /// Accept it, but subtract the shortener penalty from domain trust.
    #[default]
    Penalize,
}

/// Static URL policy, loaded once with the rest of the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlPolicy {
    pub suspicious_tlds: Vec<String>,
    pub shorteners: Vec<String>,
    pub shortener_policy: ShortenerPolicy,
    pub suspicious_keywords: Vec<String>,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self {
            suspicious_tlds: ["xyz", "ru", "tk", "cn", "top"]
                .map(String::from)
                .to_vec(),
            shorteners: [
                "bit.ly",
                "tinyurl.com",
                "goo.gl",
                "t.co",
                "shorte.st",
                "ow.ly",
                "is.gd",
                "buff.ly",
            ]
            .map(String::from)
            .to_vec(),
            shortener_policy: ShortenerPolicy::default(),
            suspicious_keywords: [
                "free-money",
                "click-here",
                "you-won",
                "miracle",
                "clickbait",
                "giveaway",
                "hoax",
                "shocking",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl UrlPolicy {
    /// Lowercase and trim every list entry; drop empties and leading dots.
    pub(crate) fn sanitized(mut self) -> Self {
        fn clean(items: Vec<String>) -> Vec<String> {
            let mut out: Vec<String> = items
                .into_iter()
                .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            out.sort();
            out.dedup();
            out
        }
        self.suspicious_tlds = clean(self.suspicious_tlds);
        self.shorteners = clean(self.shorteners);
        self.suspicious_keywords = clean(self.suspicious_keywords);
        self
    }
}

/// Facts about an accepted URL that downstream providers may penalize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlFacts {
    /// Lowercased host without a leading `www.`.
    pub host: String,
    pub https: bool,
    /// The shortener domain, when the host is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortener: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suspicious_keywords: Vec<String>,
}

impl UrlFacts {
    pub fn is_shortened(&self) -> bool {
        self.shortener.is_some()
    }

    /// Human-readable notes for the explanation list.
    pub fn notes(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.https {
            out.push("URL is not served over HTTPS.".to_string());
        }
        if let Some(s) = &self.shortener {
            out.push(format!(
                "URL uses the shortener {s}; the final destination is unverified."
            ));
        }
        for kw in &self.suspicious_keywords {
            out.push(format!("URL contains the suspicious keyword '{kw}'."));
        }
        out
    }
}

/// Reason a URL was rejected outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UrlRejection {
    #[error("malformed URL")]
    Malformed,
    #[error("suspicious top-level domain .{0}")]
    SuspiciousTld(String),
    #[error("URL shortener {0} is not accepted")]
    Shortener(String),
    #[error("internal host {0} is not allowed")]
    InternalHost(String),
}

fn internal_v4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        // 100.64.0.0/10 carrier-grade NAT
        || (ip.octets()[0] == 100 && (ip.octets()[1] & 0xc0) == 64)
}

fn internal_v6(ip: &Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return internal_v4(&v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link-local
        || (first & 0xffc0) == 0xfe80
}

/// `Some(host)` when the URL points at this machine or a private network.
pub fn internal_host(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(d) => {
            let d = d.trim_end_matches('.').to_ascii_lowercase();
            (d == "localhost" || d.ends_with(".localhost")).then_some(d)
        }
        Host::Ipv4(ip) => internal_v4(&ip).then(|| ip.to_string()),
        Host::Ipv6(ip) => internal_v6(&ip).then(|| ip.to_string()),
    }
}

/// Full check with reasons.
pub fn check(url: &str, policy: &UrlPolicy) -> Result<UrlFacts, UrlRejection> {
    let raw = url.trim();
    if !URL_SHAPE.is_match(raw) {
        return Err(UrlRejection::Malformed);
    }
    let parsed = Url::parse(raw).map_err(|_| UrlRejection::Malformed)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UrlRejection::Malformed);
    }
    if let Some(h) = internal_host(&parsed) {
        return Err(UrlRejection::InternalHost(h));
    }
    let host = parsed
        .host_str()
        .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .ok_or(UrlRejection::Malformed)?;
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    let tld = host.rsplit('.').next().unwrap_or_default();
    if policy.suspicious_tlds.iter().any(|t| t == tld) {
        return Err(UrlRejection::SuspiciousTld(tld.to_string()));
    }

    let shortener = policy
        .shorteners
        .iter()
        .find(|s| host == **s || host.ends_with(&format!(".{s}")))
        .cloned();
    if let (Some(s), ShortenerPolicy::Reject) = (&shortener, policy.shortener_policy) {
        return Err(UrlRejection::Shortener(s.clone()));
    }

    let lowered = raw.to_ascii_lowercase();
    let suspicious_keywords = policy
        .suspicious_keywords
        .iter()
        .filter(|kw| lowered.contains(kw.as_str()))
        .cloned()
        .collect();

    Ok(UrlFacts {
        host,
        https: parsed.scheme() == "https",
        shortener,
        suspicious_keywords,
    })
}

/// `validate(url) -> bool` view of [`check`].
pub fn validate(url: &str, policy: &UrlPolicy) -> bool {
    check(url, policy).is_ok()
}
