use anyhow::{Context, Result};
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::TokioAsyncResolver;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use super::{DnsResolver, RecordKind};

/// hickory-backed resolver over plain UDP/TCP port 53.
#[derive(Clone)]
pub struct HickoryResolver {
    inner: TokioAsyncResolver,
    opts: ResolverOpts,
}

impl HickoryResolver {
    pub fn new(nameservers: &[IpAddr], timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 2;
        Self::with_opts(nameservers, opts)
    }

    fn with_opts(nameservers: &[IpAddr], opts: ResolverOpts) -> Self {
        let config = ResolverConfig::from_parts(
            None,
            vec![],
            NameServerConfigGroup::from_ips_clear(nameservers, 53, true),
        );
        Self { inner: TokioAsyncResolver::tokio(config, opts.clone()), opts }
    }

    /// Resolver using the host's own configuration.
    pub fn system() -> Result<Self> {
        let inner = TokioAsyncResolver::tokio_from_system_conf()
            .context("failed to create DNS resolver from system configuration")?;
        Ok(Self { inner, opts: ResolverOpts::default() })
    }
}

fn record_type(kind: RecordKind) -> RecordType {
    match kind {
        RecordKind::Ns => RecordType::NS,
        RecordKind::Mx => RecordType::MX,
        RecordKind::Soa => RecordType::SOA,
        RecordKind::Txt => RecordType::TXT,
        RecordKind::Cname => RecordType::CNAME,
    }
}

#[async_trait]
impl DnsResolver for HickoryResolver {
    async fn lookup_a(&self, host: &str) -> Result<Vec<Ipv4Addr>> {
        let lookup = self.inner.ipv4_lookup(host).await?;
        Ok(lookup.iter().map(|a| a.0).collect())
    }

    async fn lookup_records(&self, host: &str, kind: RecordKind) -> Result<Vec<String>> {
        let rtype = record_type(kind);
        let lookup = self.inner.lookup(host, rtype).await?;
        // the answer may carry the chain that led there; keep the asked type only
        Ok(lookup
            .record_iter()
            .filter(|r| r.record_type() == rtype)
            .filter_map(|r| r.data())
            .map(|d| d.to_string().trim_end_matches('.').to_string())
            .collect())
    }

    fn with_nameservers(&self, servers: &[IpAddr]) -> Arc<dyn DnsResolver> {
        Arc::new(Self::with_opts(servers, self.opts.clone()))
    }
}
