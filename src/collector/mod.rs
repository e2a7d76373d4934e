//! Pluggable subdomain sources.
//!
//! A collector receives the target domain and returns whatever hostnames it
//! could find. The dispatcher groups collectors into stages by their
//! [`CollectorKind`] and runs each stage under its own concurrency limit.

pub mod crtsh;
pub mod dns_records;
pub mod extract;
pub mod hackertarget;
pub mod wayback;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use crtsh::CrtshCollector;
pub use dns_records::DnsRecordCollector;
pub use extract::{extract_subdomains, is_valid_subdomain};
pub use hackertarget::HackerTargetCollector;
pub use wayback::WaybackCollector;

/// Stage tag declared by every collector at registration time.
///
/// Variant order is the stage execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorKind {
    Search,
    Dataset,
    Certificate,
    Crawl,
    DnsLookup,
    Intelligence,
    Brute,
    FileCheck,
    Enrich,
}

impl CollectorKind {
    pub const ALL: [CollectorKind; 9] = [
        CollectorKind::Search,
        CollectorKind::Dataset,
        CollectorKind::Certificate,
        CollectorKind::Crawl,
        CollectorKind::DnsLookup,
        CollectorKind::Intelligence,
        CollectorKind::Brute,
        CollectorKind::FileCheck,
        CollectorKind::Enrich,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorKind::Search => "search",
            CollectorKind::Dataset => "dataset",
            CollectorKind::Certificate => "certificate",
            CollectorKind::Crawl => "crawl",
            CollectorKind::DnsLookup => "dns_lookup",
            CollectorKind::Intelligence => "intelligence",
            CollectorKind::Brute => "brute",
            CollectorKind::FileCheck => "file_check",
            CollectorKind::Enrich => "enrich",
        }
    }

    pub fn stage_name(&self) -> &'static str {
        match self {
            CollectorKind::Search => "Fast Search",
            CollectorKind::Dataset => "Dataset",
            CollectorKind::Certificate => "Certificate",
            CollectorKind::Crawl => "Crawl",
            CollectorKind::DnsLookup => "DNS Lookup",
            CollectorKind::Intelligence => "Intelligence",
            CollectorKind::Brute => "Brute Force",
            CollectorKind::FileCheck => "File Check",
            CollectorKind::Enrich => "Enrich",
        }
    }
}

impl fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract every subdomain source implements.
///
/// Implementations may block on network I/O and are invoked concurrently with
/// other collectors, so they must not share mutable state with each other.
/// Errors are logged and counted by the caller, never fatal to a run.
#[async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> CollectorKind;

    fn is_enabled(&self) -> bool {
        true
    }

    async fn run(&self, domain: &str) -> anyhow::Result<Vec<String>>;
}
