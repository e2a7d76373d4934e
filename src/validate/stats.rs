use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::model::ValidationResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationStats {
    pub total_domains: usize,
    pub alive_domains: usize,
    pub dead_domains: usize,
    pub dns_resolved: usize,
    pub ping_alive: usize,
    pub unique_ips: usize,
    pub providers: BTreeMap<String, usize>,
    pub alive_percentage: f64,
    pub dns_percentage: f64,
    pub ping_percentage: f64,
}

impl ValidationStats {
    pub fn from_results(results: &[ValidationResult]) -> Self {
        let mut s = ValidationStats { total_domains: results.len(), ..Default::default() };
        let mut ips = HashSet::new();
        for r in results {
            if r.alive {
                s.alive_domains += 1;
            } else {
                s.dead_domains += 1;
            }
            if r.dns_resolved {
                s.dns_resolved += 1;
            }
            if r.ping_alive {
                s.ping_alive += 1;
            }
            ips.extend(r.ips.iter().map(String::as_str));
            if !r.provider.is_empty() {
                *s.providers.entry(r.provider.clone()).or_default() += 1;
            }
        }
        s.unique_ips = ips.len();
        if s.total_domains > 0 {
            let total = s.total_domains as f64;
            s.alive_percentage = s.alive_domains as f64 / total * 100.0;
            s.dns_percentage = s.dns_resolved as f64 / total * 100.0;
            s.ping_percentage = s.ping_alive as f64 / total * 100.0;
        }
        s
    }
}

pub fn filter_alive(results: &[ValidationResult]) -> Vec<ValidationResult> {
    results.iter().filter(|r| r.alive).cloned().collect()
}
