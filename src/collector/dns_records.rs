use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::{extract_subdomains, Collector, CollectorKind};
use crate::dns::{DnsResolver, RecordKind};

/// Harvest names that appear in the zone's own NS, MX, SOA and TXT data.
pub struct DnsRecordCollector {
    resolver: Arc<dyn DnsResolver>,
}

impl DnsRecordCollector {
    pub fn new(resolver: Arc<dyn DnsResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Collector for DnsRecordCollector {
    fn name(&self) -> &str {
        "dns_records"
    }

    fn kind(&self) -> CollectorKind {
        CollectorKind::DnsLookup
    }

    async fn run(&self, domain: &str) -> Result<Vec<String>> {
        let mut text = String::new();
        for kind in RecordKind::NAME_BEARING {
            match self.resolver.lookup_records(domain, kind).await {
                Ok(values) => {
                    for v in values {
                        text.push_str(&v);
                        text.push('\n');
                    }
                }
                Err(e) => tracing::debug!(?kind, error = %e, "record lookup returned nothing"),
            }
        }
        Ok(extract_subdomains(&text, domain))
    }
}
