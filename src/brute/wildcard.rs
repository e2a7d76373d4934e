use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{query_subdomain, BruteForceResult};
use crate::concurrent::{catch_panic, ConcurrencyGate};
use crate::config::WildcardConfig;
use crate::dns::DnsResolver;

/// Outcome of probing a zone with labels that should not exist.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WildcardDetectionResult {
    pub test_count: usize,
    pub success_count: usize,
    pub success_rate: f64,
    pub unique_ips: usize,
    pub total_ips: usize,
    pub ip_repeat_rate: f64,
    pub is_wildcard: bool,
    pub test_subdomains: Vec<String>,
    pub test_results: BTreeMap<String, BruteForceResult>,
}

impl WildcardDetectionResult {
    /// Fill in the rates from the counters and the per-IP histogram, then
    /// apply the thresholds.
    pub fn calculate(&mut self, ip_counts: &HashMap<String, usize>, cfg: &WildcardConfig) {
        self.success_rate = if self.test_count > 0 {
            self.success_count as f64 / self.test_count as f64 * 100.0
        } else {
            0.0
        };
        self.unique_ips = ip_counts.len();
        self.total_ips = ip_counts.values().sum();
        self.ip_repeat_rate = if self.total_ips > 0 {
            (self.total_ips - self.unique_ips) as f64 / self.total_ips as f64 * 100.0
        } else {
            0.0
        };
        self.is_wildcard =
            self.success_rate > cfg.success_rate_threshold && self.ip_repeat_rate > cfg.ip_repeat_rate_threshold;
    }
}

fn random_token<R: Rng>(rng: &mut R) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    (0..10).map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char).collect()
}

/// `count` probe labels drawn from `pool` without replacement (with
/// replacement once the pool is exhausted), each salted with a random token.
pub fn probe_labels<R: Rng>(pool: &[String], count: usize, rng: &mut R) -> Vec<String> {
    if pool.is_empty() {
        return (0..count).map(|_| random_token(rng)).collect();
    }
    let mut picked: Vec<&String> = pool.choose_multiple(rng, count.min(pool.len())).collect();
    while picked.len() < count {
        if let Some(w) = pool.choose(rng) {
            picked.push(w);
        }
    }
    picked.into_iter().map(|w| format!("{}{}", random_token(rng), w)).collect()
}

/// Resolve every probe name concurrently and decide whether the zone answers
/// everything.
pub async fn detect_wildcard(
    resolver: Arc<dyn DnsResolver>,
    test_subdomains: Vec<String>,
    cfg: &WildcardConfig,
    gate: &ConcurrencyGate,
) -> WildcardDetectionResult {
    let mut result = WildcardDetectionResult {
        test_count: test_subdomains.len(),
        test_subdomains: test_subdomains.clone(),
        ..Default::default()
    };

    let mut handles = Vec::with_capacity(test_subdomains.len());
    for sub in test_subdomains {
        let resolver = resolver.clone();
        let gate = gate.clone();
        handles.push(tokio::spawn(async move {
            let _permit = gate.acquire().await;
            let outcome = catch_panic(query_subdomain(resolver.as_ref(), &sub, false)).await;
            (sub, outcome)
        }));
    }

    let mut ip_counts: HashMap<String, usize> = HashMap::new();
    for h in handles {
        match h.await {
            Ok((sub, Ok(r))) => {
                tracing::debug!(subdomain = %sub, valid = r.valid, ips = ?r.ips, "wildcard probe");
                if r.valid {
                    result.success_count += 1;
                    for ip in &r.ips {
                        *ip_counts.entry(ip.clone()).or_default() += 1;
                    }
                }
                result.test_results.insert(sub, r);
            }
            Ok((sub, Err(msg))) => tracing::error!(subdomain = %sub, panic = %msg, "wildcard probe panicked"),
            Err(e) => tracing::error!(error = %e, "wildcard probe task failed"),
        }
    }

    result.calculate(&ip_counts, cfg);
    tracing::info!(
        test_count = result.test_count,
        success_count = result.success_count,
        success_rate = format!("{:.2}%", result.success_rate),
        total_ips = result.total_ips,
        unique_ips = result.unique_ips,
        ip_repeat_rate = format!("{:.2}%", result.ip_repeat_rate),
        is_wildcard = result.is_wildcard,
        "wildcard detection completed"
    );
    result
}
