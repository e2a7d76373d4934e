use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::collector::CollectorKind;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const STATUS_ALIVE: i32 = 200;
pub const STATUS_PING_FAILED: i32 = 0;
pub const STATUS_DNS_FAILED: i32 = -1;
pub const STATUS_VALIDATION_ERROR: i32 = -2;

/// Canonical form used for every comparison between hostnames.
pub fn normalize_subdomain(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Normalize, drop empties and keep the first occurrence of each name.
pub fn dedup_subdomains<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(items.len());
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let n = normalize_subdomain(item.as_ref());
        if n.is_empty() {
            continue;
        }
        if seen.insert(n.clone()) {
            out.push(n);
        }
    }
    out
}

/// A hostname as reported by one collector, stamped when that collector
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub subdomain: String,
    pub source: CollectorKind,
    pub collector: String,
    pub discovered_at: DateTime<Local>,
}

impl Candidate {
    pub fn new(subdomain: &str, source: CollectorKind, collector: &str, discovered_at: DateTime<Local>) -> Self {
        Self { subdomain: normalize_subdomain(subdomain), source, collector: collector.to_string(), discovered_at }
    }
}

/// Liveness verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub subdomain: String,
    pub ips: Vec<String>,
    pub dns_resolved: bool,
    pub ping_alive: bool,
    pub alive: bool,
    pub status_code: i32,
    pub status_text: String,
    pub provider: String,
    pub timestamp: DateTime<Local>,
}

impl ValidationResult {
    pub fn new(subdomain: &str) -> Self {
        Self {
            subdomain: subdomain.to_string(),
            ips: Vec::new(),
            dns_resolved: false,
            ping_alive: false,
            alive: false,
            status_code: STATUS_DNS_FAILED,
            status_text: String::new(),
            provider: String::new(),
            timestamp: Local::now(),
        }
    }

    pub fn first_ip(&self) -> &str {
        self.ips.first().map(String::as_str).unwrap_or("")
    }
}

/// Flat record handed to exporters and library callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubdomainResult {
    pub subdomain: String,
    pub source: String,
    pub time: String,
    pub alive: bool,
    pub ip: String,
    pub dns_resolved: bool,
    pub ping_alive: bool,
    pub status_code: i32,
    pub status_text: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl SubdomainResult {
    /// Record for a host that was discovered but never validated.
    pub fn unvalidated(subdomain: &str, source: &str) -> Self {
        Self {
            subdomain: normalize_subdomain(subdomain),
            source: source.to_string(),
            time: Local::now().format(TIME_FORMAT).to_string(),
            alive: false,
            ip: String::new(),
            dns_resolved: false,
            ping_alive: false,
            status_code: STATUS_PING_FAILED,
            status_text: String::new(),
            provider: String::new(),
            title: None,
            port: None,
        }
    }

    pub fn from_validation(v: &ValidationResult, source: &str) -> Self {
        Self {
            subdomain: normalize_subdomain(&v.subdomain),
            source: source.to_string(),
            time: v.timestamp.format(TIME_FORMAT).to_string(),
            alive: v.alive,
            ip: v.first_ip().to_string(),
            dns_resolved: v.dns_resolved,
            ping_alive: v.ping_alive,
            status_code: v.status_code,
            status_text: v.status_text.clone(),
            provider: v.provider.clone(),
            title: None,
            port: None,
        }
    }
}

/// Everything known about one target after a dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedDomainResult {
    pub domain: String,
    pub per_stage: BTreeMap<CollectorKind, Vec<String>>,
    pub candidates: Vec<Candidate>,
    pub validation: Vec<ValidationResult>,
}

impl AggregatedDomainResult {
    pub fn total(&self) -> usize {
        self.candidates.len()
    }

    pub fn alive(&self) -> impl Iterator<Item = &ValidationResult> {
        self.validation.iter().filter(|v| v.alive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_is_idempotent() {
        let raw = vec![" WWW.Example.com", "www.example.com", "", "api.example.com ", "  "];
        let once = dedup_subdomains(&raw);
        assert_eq!(once, vec!["www.example.com", "api.example.com"]);
        assert_eq!(dedup_subdomains(&once), once);
    }

    #[test]
    fn result_from_validation_uses_first_ip() {
        let mut v = ValidationResult::new("Mail.Example.com");
        v.ips = vec!["1.2.3.4".into(), "5.6.7.8".into()];
        v.alive = true;
        v.status_code = STATUS_ALIVE;
        let r = SubdomainResult::from_validation(&v, "dataset");
        assert_eq!(r.subdomain, "mail.example.com");
        assert_eq!(r.ip, "1.2.3.4");
        assert_eq!(r.time.len(), 19);
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("title").is_none());
        assert_eq!(json["status_code"], 200);
    }
}
