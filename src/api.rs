//! Embeddable entry point.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use sub_hunter::api::{ScanOptions, SubHunter};
//!
//! let hunter = SubHunter::new(Default::default())?;
//! let report = hunter.run(&ScanOptions::for_target("example.com")).await?;
//! println!("{} of {} alive", report.alive_subdomains, report.total_subdomains);
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::brute::BruteForceEngine;
use crate::collector::{
    Collector, CollectorKind, CrtshCollector, DnsRecordCollector, HackerTargetCollector, WaybackCollector,
};
use crate::config::Config;
use crate::dispatcher::options::{DEFAULT_LIB_CONCURRENCY, DEFAULT_LIB_TIMEOUT};
use crate::dispatcher::Dispatcher;
use crate::dns::{DnsResolver, HickoryResolver};
use crate::error::ScanError;
use crate::http_client::{build_client, build_probe_client};
use crate::model::SubdomainResult;
use crate::postprocess::{HttpsThenHttp, PageFetcher, PostProcessor};
use crate::validate::{TcpProber, TokioTcpProber};

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    pub target: String,
    pub enable_validation: bool,
    pub enable_brute_force: bool,
    pub concurrency: usize,
    pub timeout: Duration,
    /// Stages to leave out of this run.
    pub disabled_stages: Vec<CollectorKind>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            target: String::new(),
            enable_validation: true,
            enable_brute_force: true,
            concurrency: DEFAULT_LIB_CONCURRENCY,
            timeout: DEFAULT_LIB_TIMEOUT,
            disabled_stages: Vec::new(),
        }
    }
}

impl ScanOptions {
    pub fn for_target(target: impl Into<String>) -> Self {
        Self { target: target.into(), ..Default::default() }
    }

    fn as_lib_options(&self) -> HashMap<String, Value> {
        let concurrency = if self.concurrency == 0 { DEFAULT_LIB_CONCURRENCY } else { self.concurrency };
        let timeout = if self.timeout.is_zero() { DEFAULT_LIB_TIMEOUT } else { self.timeout };
        HashMap::from([
            ("enable_validation".to_string(), json!(self.enable_validation)),
            ("enable_brute_force".to_string(), json!(self.enable_brute_force)),
            ("concurrency".to_string(), json!(concurrency)),
            ("timeout".to_string(), json!(timeout.as_secs_f64())),
        ])
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub domain: String,
    pub total_subdomains: usize,
    pub alive_subdomains: usize,
    pub alive_percentage: f64,
    pub results: Vec<SubdomainResult>,
    pub execution_time: Duration,
}

impl ScanReport {
    pub fn new(domain: &str, results: Vec<SubdomainResult>, execution_time: Duration) -> Self {
        let total = results.len();
        let alive = results.iter().filter(|r| r.alive).count();
        let alive_percentage = if total > 0 { alive as f64 / total as f64 * 100.0 } else { 0.0 };
        Self {
            domain: domain.to_string(),
            total_subdomains: total,
            alive_subdomains: alive,
            alive_percentage,
            results,
            execution_time,
        }
    }
}

/// Owns the configuration and the network seams, and wires the default
/// collector set into a fresh dispatcher for every run.
pub struct SubHunter {
    config: Arc<Config>,
    resolver: Arc<dyn DnsResolver>,
    prober: Arc<dyn TcpProber>,
    extra: Vec<Arc<dyn Collector>>,
    builtin: bool,
}

impl SubHunter {
    /// Network-backed instance: hickory through the bootstrap resolver, TCP
    /// connects for liveness, the built-in collectors.
    pub fn new(config: Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.http.timeout_secs.max(1));
        let resolver = HickoryResolver::new(&[config.brute.bootstrap_resolver], timeout);
        Ok(Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            prober: Arc::new(TokioTcpProber),
            extra: Vec::new(),
            builtin: true,
        })
    }

    /// Instance with caller supplied seams and no built-in network collectors.
    pub fn with_parts(config: Config, resolver: Arc<dyn DnsResolver>, prober: Arc<dyn TcpProber>) -> Self {
        Self { config: Arc::new(config), resolver, prober, extra: Vec::new(), builtin: false }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn add_collector(&mut self, collector: Arc<dyn Collector>) {
        self.extra.push(collector);
    }

    /// The brute engine is always registered; its stage flag decides whether it runs.
    pub fn dispatcher(&self) -> Result<Dispatcher> {
        let mut d = Dispatcher::new(self.config.clone(), self.resolver.clone(), self.prober.clone());
        if self.builtin {
            let client = build_client(&self.config.http)?;
            d.register_module(Arc::new(CrtshCollector::new(client.clone())));
            d.register_module(Arc::new(HackerTargetCollector::new(client.clone())));
            d.register_module(Arc::new(WaybackCollector::new(client)));
            d.register_module(Arc::new(DnsRecordCollector::new(self.resolver.clone())));
        }
        d.register_module(Arc::new(BruteForceEngine::new(self.config.clone(), self.resolver.clone())));
        for c in &self.extra {
            d.register_module(c.clone());
        }
        Ok(d)
    }

    pub async fn run(&self, options: &ScanOptions) -> Result<ScanReport> {
        let started = Instant::now();
        let target = options.target.trim();
        if target.is_empty() {
            return Err(ScanError::MissingTarget.into());
        }
        let mut dispatcher = self.dispatcher()?;
        for kind in &options.disabled_stages {
            dispatcher.set_stage_enabled(*kind, false);
        }
        tracing::info!(domain = target, "starting subdomain enumeration");
        let results = dispatcher.run_lib(target, &options.as_lib_options()).await?;
        Ok(ScanReport::new(target, results, started.elapsed()))
    }

    /// Title/403 reduction over `hosts` with the configured limits.
    pub async fn postprocess(&self, hosts: &[String]) -> Result<Option<Vec<SubdomainResult>>> {
        let pp = &self.config.postprocess;
        let client = build_probe_client(pp.timeout_secs, &self.config.http.user_agent)?;
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpsThenHttp::new(client));
        Ok(PostProcessor::new(pp.clone(), fetcher).process(hosts).await)
    }
}
