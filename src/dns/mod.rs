//! DNS resolution seam.
//!
//! Everything that resolves names goes through [`DnsResolver`] so the brute
//! engine and the validator can be pointed at a different nameserver set per
//! run, or at an in-memory table in tests.

pub mod nameservers;
pub mod resolver;
pub mod table;

use anyhow::Result;
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

pub use nameservers::{load_nameservers, DEFAULT_NAMESERVERS};
pub use resolver::HickoryResolver;
pub use table::StaticResolver;

/// Record types the collectors ask for besides A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Ns,
    Mx,
    Soa,
    Txt,
    Cname,
}

impl RecordKind {
    pub const NAME_BEARING: [RecordKind; 4] = [RecordKind::Ns, RecordKind::Mx, RecordKind::Soa, RecordKind::Txt];
}

#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// A records for `host`. No answer is an error.
    async fn lookup_a(&self, host: &str) -> Result<Vec<Ipv4Addr>>;

    async fn lookup_cname(&self, host: &str) -> Result<Vec<String>> {
        self.lookup_records(host, RecordKind::Cname).await
    }

    /// Record data rendered as text, trailing root dot removed.
    async fn lookup_records(&self, host: &str, kind: RecordKind) -> Result<Vec<String>>;

    /// A resolver with the same options that queries `servers` instead.
    fn with_nameservers(&self, servers: &[IpAddr]) -> Arc<dyn DnsResolver>;
}

/// Addresses that never count as a public answer.
pub fn is_private_ip(ip: &Ipv4Addr) -> bool {
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.octets()[0] == 0
        // carrier-grade NAT 100.64.0.0/10
        || (ip.octets()[0] == 100 && (ip.octets()[1] & 0xc0) == 64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_ranges() {
        for s in ["10.1.2.3", "192.168.0.1", "172.16.5.5", "127.0.0.1", "169.254.1.1", "100.64.0.1", "0.0.0.0"] {
            assert!(is_private_ip(&s.parse().unwrap()), "{}", s);
        }
        for s in ["8.8.8.8", "93.184.216.34", "100.128.0.1"] {
            assert!(!is_private_ip(&s.parse().unwrap()), "{}", s);
        }
    }
}
