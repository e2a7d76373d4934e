#![allow(dead_code)]

use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sub_hunter::collector::{Collector, CollectorKind};
use sub_hunter::dns::{DnsResolver, RecordKind};
use sub_hunter::validate::TcpProber;

/// Collector returning a fixed list after an optional delay, counting calls
/// and the number of overlapping runs.
pub struct Scripted {
    pub name: &'static str,
    pub kind: CollectorKind,
    pub output: Vec<String>,
    pub delay: Duration,
    pub calls: Arc<AtomicUsize>,
    pub running: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
}

impl Scripted {
    pub fn new(name: &'static str, kind: CollectorKind, output: &[&str]) -> Self {
        Self {
            name,
            kind,
            output: output.iter().map(|s| s.to_string()).collect(),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            running: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn sharing(mut self, running: &Arc<AtomicUsize>, peak: &Arc<AtomicUsize>) -> Self {
        self.running = running.clone();
        self.peak = peak.clone();
        self
    }
}

#[async_trait]
impl Collector for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> CollectorKind {
        self.kind
    }

    async fn run(&self, _domain: &str) -> anyhow::Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

pub struct Panicking(pub CollectorKind);

#[async_trait]
impl Collector for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn kind(&self) -> CollectorKind {
        self.0
    }

    async fn run(&self, _domain: &str) -> anyhow::Result<Vec<String>> {
        panic!("collector blew up")
    }
}

/// Every port in the list accepts connections.
pub struct OpenPorts(pub Vec<u16>);

#[async_trait]
impl TcpProber for OpenPorts {
    async fn probe(&self, _ip: IpAddr, port: u16, _timeout: Duration) -> bool {
        self.0.contains(&port)
    }
}

/// Tracks how many calls overlap; `enter` returns a guard that leaves on drop.
#[derive(Clone, Default)]
pub struct Overlap {
    pub running: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
}

pub struct OverlapGuard(Arc<AtomicUsize>);

impl Drop for OverlapGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Overlap {
    pub fn enter(&self) -> OverlapGuard {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        OverlapGuard(self.running.clone())
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Answers A queries with one public address after `delay`: every name when
/// `known` is empty, otherwise only the listed ones.
#[derive(Clone)]
pub struct SlowResolver {
    pub delay: Duration,
    pub overlap: Overlap,
    pub known: Vec<String>,
}

impl SlowResolver {
    pub fn new(delay: Duration, overlap: &Overlap) -> Self {
        Self { delay, overlap: overlap.clone(), known: Vec::new() }
    }

    pub fn knowing(mut self, hosts: &[&str]) -> Self {
        self.known = hosts.iter().map(|h| h.to_string()).collect();
        self
    }
}

#[async_trait]
impl DnsResolver for SlowResolver {
    async fn lookup_a(&self, host: &str) -> anyhow::Result<Vec<Ipv4Addr>> {
        let _in = self.overlap.enter();
        tokio::time::sleep(self.delay).await;
        if self.known.is_empty() || self.known.iter().any(|k| k == host) {
            Ok(vec![Ipv4Addr::new(93, 184, 216, 34)])
        } else {
            anyhow::bail!("NXDOMAIN {}", host)
        }
    }

    async fn lookup_records(&self, host: &str, kind: RecordKind) -> anyhow::Result<Vec<String>> {
        anyhow::bail!("no {:?} record for {}", kind, host)
    }

    fn with_nameservers(&self, _servers: &[IpAddr]) -> Arc<dyn DnsResolver> {
        Arc::new(self.clone())
    }
}

/// Port 80 answers after `delay`.
pub struct SlowPorts {
    pub delay: Duration,
    pub overlap: Overlap,
}

#[async_trait]
impl TcpProber for SlowPorts {
    async fn probe(&self, _ip: IpAddr, port: u16, _timeout: Duration) -> bool {
        let _in = self.overlap.enter();
        tokio::time::sleep(self.delay).await;
        port == 80
    }
}
