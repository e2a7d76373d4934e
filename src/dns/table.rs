use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{DnsResolver, RecordKind};
use crate::model::normalize_subdomain;

/// In-memory resolver answering from a fixed table, with an optional
/// catch-all address for every name under a zone. Used to pin results for
/// offline runs and tests.
#[derive(Clone, Default)]
pub struct StaticResolver {
    inner: Arc<TableInner>,
}

#[derive(Default)]
struct TableInner {
    a: RwLock<HashMap<String, Vec<Ipv4Addr>>>,
    records: RwLock<HashMap<(String, RecordKind), Vec<String>>>,
    wildcard: RwLock<Option<(String, Ipv4Addr)>>,
    queries: AtomicUsize,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_a(self, host: &str, ips: &[Ipv4Addr]) -> Self {
        self.inner.a.write().insert(normalize_subdomain(host), ips.to_vec());
        self
    }

    pub fn with_record(self, host: &str, kind: RecordKind, values: &[&str]) -> Self {
        let values = values.iter().map(|v| v.to_string()).collect();
        self.inner.records.write().insert((normalize_subdomain(host), kind), values);
        self
    }

    /// Answer `ip` for any name ending in `.zone`.
    pub fn with_wildcard(self, zone: &str, ip: Ipv4Addr) -> Self {
        *self.inner.wildcard.write() = Some((normalize_subdomain(zone), ip));
        self
    }

    /// Number of lookups served so far.
    pub fn queries(&self) -> usize {
        self.inner.queries.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DnsResolver for StaticResolver {
    async fn lookup_a(&self, host: &str) -> Result<Vec<Ipv4Addr>> {
        self.inner.queries.fetch_add(1, Ordering::Relaxed);
        let host = normalize_subdomain(host);
        if let Some(ips) = self.inner.a.read().get(&host) {
            if !ips.is_empty() {
                return Ok(ips.clone());
            }
        }
        if let Some((zone, ip)) = self.inner.wildcard.read().as_ref() {
            if host.ends_with(&format!(".{}", zone)) {
                return Ok(vec![*ip]);
            }
        }
        Err(anyhow!("no A record for {}", host))
    }

    async fn lookup_records(&self, host: &str, kind: RecordKind) -> Result<Vec<String>> {
        self.inner.queries.fetch_add(1, Ordering::Relaxed);
        let key = (normalize_subdomain(host), kind);
        self.inner
            .records
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow!("no {:?} record for {}", kind, key.0))
    }

    fn with_nameservers(&self, _servers: &[IpAddr]) -> Arc<dyn DnsResolver> {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn table_then_wildcard() {
        let r = StaticResolver::new()
            .with_a("www.example.com", &[Ipv4Addr::new(1, 1, 1, 1)])
            .with_wildcard("wild.test", Ipv4Addr::new(2, 2, 2, 2));
        assert_eq!(r.lookup_a("WWW.example.com").await.unwrap(), vec![Ipv4Addr::new(1, 1, 1, 1)]);
        assert_eq!(r.lookup_a("zz.wild.test").await.unwrap(), vec![Ipv4Addr::new(2, 2, 2, 2)]);
        assert!(r.lookup_a("wild.test").await.is_err());
        assert!(r.lookup_cname("www.example.com").await.is_err());
        assert_eq!(r.queries(), 4);
    }
}
