//! Liveness certification for discovered hosts.
//!
//! Each candidate is resolved, then its first address is probed over TCP.
//! The outcome is encoded in the status fields of [`ValidationResult`]:
//! `-1` no usable A record, `0` resolved but unreachable, `200` reachable.

pub mod probe;
pub mod provider;
pub mod stats;

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use crate::concurrent::{catch_panic, ConcurrencyGate};
use crate::config::ValidationConfig;
use crate::dns::{is_private_ip, DnsResolver};
use crate::model::{
    dedup_subdomains, ValidationResult, STATUS_ALIVE, STATUS_DNS_FAILED, STATUS_PING_FAILED,
    STATUS_VALIDATION_ERROR,
};

pub use probe::{first_open_port, TcpProber, TokioTcpProber};
pub use provider::lookup_provider;
pub use stats::{filter_alive, ValidationStats};

#[derive(Clone)]
pub struct Validator {
    config: Arc<ValidationConfig>,
    resolver: Arc<dyn DnsResolver>,
    prober: Arc<dyn TcpProber>,
}

impl Validator {
    pub fn new(config: ValidationConfig, resolver: Arc<dyn DnsResolver>, prober: Arc<dyn TcpProber>) -> Self {
        Self { config: Arc::new(config), resolver, prober }
    }

    /// Validate every distinct candidate; one result per normalized name, in
    /// first-seen order.
    pub async fn validate(&self, candidates: &[String], concurrency: usize) -> Vec<ValidationResult> {
        let unique = dedup_subdomains(candidates);
        if unique.is_empty() {
            return Vec::new();
        }
        tracing::info!(count = unique.len(), concurrency, "validating subdomains");
        let gate = ConcurrencyGate::new(concurrency);

        let mut handles = Vec::with_capacity(unique.len());
        for sub in unique.iter().cloned() {
            let this = self.clone();
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                let _permit = gate.acquire().await;
                match catch_panic(this.check(&sub)).await {
                    Ok(r) => r,
                    Err(msg) => {
                        tracing::error!(subdomain = %sub, panic = %msg, "validation worker panicked");
                        error_result(&sub)
                    }
                }
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (h, sub) in handles.into_iter().zip(unique.iter()) {
            match h.await {
                Ok(r) => results.push(r),
                Err(e) => {
                    tracing::error!(subdomain = %sub, error = %e, "validation task failed");
                    results.push(error_result(sub));
                }
            }
        }

        let alive = results.iter().filter(|r| r.alive).count();
        tracing::info!(total = results.len(), alive, "validation completed");
        results
    }

    async fn resolve(&self, subdomain: &str) -> Vec<Ipv4Addr> {
        match self.resolver.lookup_a(subdomain).await {
            Ok(ips) => ips
                .into_iter()
                .filter(|ip| !self.config.exclude_private_ip || !is_private_ip(ip))
                .collect(),
            Err(e) => {
                tracing::debug!(subdomain, error = %e, "resolution failed");
                Vec::new()
            }
        }
    }

    /// Validate a single host.
    pub async fn check(&self, subdomain: &str) -> ValidationResult {
        let mut result = ValidationResult::new(subdomain);
        let ips = self.resolve(subdomain).await;
        let Some(first) = ips.first().copied() else {
            result.status_code = STATUS_DNS_FAILED;
            result.status_text = "DNS Resolution Failed".to_string();
            return result;
        };
        result.dns_resolved = true;
        result.ips = ips.iter().map(|ip| ip.to_string()).collect();

        let timeout = Duration::from_secs(self.config.connect_timeout_secs);
        let open =
            first_open_port(self.prober.as_ref(), IpAddr::V4(first), &self.config.probe_ports, timeout).await;
        match open {
            Some(port) => {
                result.ping_alive = true;
                result.alive = true;
                result.status_code = STATUS_ALIVE;
                result.status_text = "Alive".to_string();
                result.provider = lookup_provider(&first);
                tracing::debug!(subdomain, ip = %first, port, "host is alive");
            }
            None => {
                result.status_code = STATUS_PING_FAILED;
                result.status_text = "Ping Failed".to_string();
            }
        }
        result
    }
}

fn error_result(subdomain: &str) -> ValidationResult {
    let mut r = ValidationResult::new(subdomain);
    r.status_code = STATUS_VALIDATION_ERROR;
    r.status_text = "Validation Error".to_string();
    r
}
