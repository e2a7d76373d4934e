//! Staged execution of every registered collector followed by a single
//! validation pass over the union of their findings.

pub mod options;
pub mod stage;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::collector::{is_valid_subdomain, Collector, CollectorKind};
use crate::config::Config;
use crate::dns::DnsResolver;
use crate::error::validate_domain;
use crate::model::{
    dedup_subdomains, normalize_subdomain, AggregatedDomainResult, Candidate, SubdomainResult, ValidationResult,
};
use crate::validate::{TcpProber, ValidationStats, Validator};

pub use options::LibOptions;
pub use stage::{run_stage, Stage, StageReport};

/// Per-stage findings plus the validation verdicts for their union.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    pub per_stage: BTreeMap<CollectorKind, Vec<String>>,
    /// Every in-scope report in stage order, with its collector and time.
    pub candidates: Vec<Candidate>,
    pub validation: Vec<ValidationResult>,
}

impl DispatchOutcome {
    /// Every distinct subdomain, in stage order.
    pub fn all_subdomains(&self) -> Vec<String> {
        let flat: Vec<&String> = self.per_stage.values().flatten().collect();
        dedup_subdomains(&flat)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageInfo {
    pub name: &'static str,
    pub kind: CollectorKind,
    pub collectors: Vec<String>,
    pub enabled: bool,
    pub concurrency: usize,
    pub timeout_secs: u64,
}

/// Overrides applied to one dispatch.
struct RunPlan {
    concurrency: Option<usize>,
    timeout: Option<Duration>,
    validate: bool,
    validation_concurrency: usize,
    include_brute: bool,
}

pub struct Dispatcher {
    config: Arc<Config>,
    stages: Vec<Stage>,
    validator: Validator,
}

impl Dispatcher {
    pub fn new(config: Arc<Config>, resolver: Arc<dyn DnsResolver>, prober: Arc<dyn TcpProber>) -> Self {
        let stages = CollectorKind::ALL
            .iter()
            .map(|&kind| Stage::new(kind, config.stages.for_kind(kind)))
            .collect();
        let validator = Validator::new(config.validation.clone(), resolver, prober);
        Self { config, stages, validator }
    }

    fn stage_mut(&mut self, kind: CollectorKind) -> Option<&mut Stage> {
        self.stages.iter_mut().find(|s| s.kind == kind)
    }

    /// Add `collector` to the stage matching its kind.
    pub fn register_module(&mut self, collector: Arc<dyn Collector>) {
        let kind = collector.kind();
        tracing::debug!(collector = collector.name(), stage = kind.stage_name(), "registering collector");
        if let Some(stage) = self.stage_mut(kind) {
            stage.collectors.push(collector);
        }
    }

    pub fn set_stage_enabled(&mut self, kind: CollectorKind, enabled: bool) {
        if let Some(stage) = self.stage_mut(kind) {
            stage.enabled = enabled;
        }
    }

    /// Zero is ignored.
    pub fn set_stage_concurrency(&mut self, kind: CollectorKind, concurrency: usize) {
        if concurrency == 0 {
            return;
        }
        if let Some(stage) = self.stage_mut(kind) {
            stage.concurrency = concurrency;
        }
    }

    pub fn set_stage_timeout(&mut self, kind: CollectorKind, timeout: Duration) {
        if let Some(stage) = self.stage_mut(kind) {
            stage.timeout = timeout;
        }
    }

    /// Number of registered collectors per kind.
    pub fn module_stats(&self) -> BTreeMap<CollectorKind, usize> {
        self.stages.iter().map(|s| (s.kind, s.collectors.len())).collect()
    }

    pub fn list_modules(&self) -> Vec<StageInfo> {
        let infos: Vec<StageInfo> = self
            .stages
            .iter()
            .map(|s| StageInfo {
                name: s.name,
                kind: s.kind,
                collectors: s.collectors.iter().map(|c| c.name().to_string()).collect(),
                enabled: s.enabled,
                concurrency: s.concurrency,
                timeout_secs: s.timeout.as_secs(),
            })
            .collect();
        for info in &infos {
            tracing::info!(
                stage = info.name,
                enabled = info.enabled,
                concurrency = info.concurrency,
                timeout_secs = info.timeout_secs,
                collectors = ?info.collectors,
                "stage"
            );
        }
        infos
    }

    /// Run every stage with its configured limits, then validate once.
    pub async fn run_all_modules(&self, domain: &str) -> Result<DispatchOutcome> {
        let plan = RunPlan {
            concurrency: None,
            timeout: None,
            validate: self.config.validation.enabled,
            validation_concurrency: self.config.validation.concurrency,
            include_brute: true,
        };
        self.dispatch(domain, &plan).await
    }

    /// Embeddable entry point: same pipeline with one concurrency and timeout
    /// for every stage, flattened into one record per distinct subdomain.
    pub async fn run_lib(&self, domain: &str, options: &HashMap<String, Value>) -> Result<Vec<SubdomainResult>> {
        let opts = LibOptions::from_map(options);
        tracing::info!(domain, ?opts, "library call");
        let plan = RunPlan {
            concurrency: Some(opts.concurrency),
            timeout: Some(opts.timeout),
            validate: opts.enable_validation,
            validation_concurrency: opts.concurrency,
            include_brute: opts.enable_brute_force,
        };
        let outcome = self.dispatch(domain, &plan).await?;
        let results = flatten_outcome(&outcome);
        tracing::info!(domain, count = results.len(), "library call completed");
        Ok(results)
    }

    async fn dispatch(&self, domain: &str, plan: &RunPlan) -> Result<DispatchOutcome> {
        validate_domain(domain)?;
        let domain = normalize_subdomain(domain);
        tracing::info!(domain = %domain, stages = self.stages.len(), "starting subdomain enumeration");

        let mut outcome = DispatchOutcome::default();
        let mut total = 0usize;
        for (i, stage) in self.stages.iter().enumerate() {
            if !stage.enabled {
                tracing::debug!(stage = stage.name, "stage disabled");
                continue;
            }
            if stage.is_brute() && !plan.include_brute {
                tracing::debug!("brute force disabled for this run");
                continue;
            }
            if stage.collectors.is_empty() {
                tracing::debug!(stage = stage.name, "no collectors registered");
                continue;
            }
            let concurrency = plan.concurrency.unwrap_or(stage.concurrency);
            let timeout = plan.timeout.unwrap_or(stage.timeout);
            tracing::info!(
                "Step {}/{}: {} (concurrency: {}, timeout: {:?})",
                i + 1,
                self.stages.len(),
                stage.name,
                concurrency,
                timeout
            );

            let report = run_stage(&stage.collectors, &domain, concurrency, timeout, stage.is_brute()).await;
            total += report.subdomains.len();
            tracing::info!(
                stage = stage.name,
                found = report.subdomains.len(),
                completed = report.completed,
                failed = report.failed,
                panicked = report.panicked,
                skipped = report.skipped,
                total,
                "stage completed"
            );
            let in_scope: Vec<Candidate> =
                report.candidates.into_iter().filter(|c| is_valid_subdomain(&c.subdomain, &domain)).collect();
            outcome.per_stage.insert(stage.kind, in_scope.iter().map(|c| c.subdomain.clone()).collect());
            outcome.candidates.extend(in_scope);
        }

        let all = outcome.all_subdomains();
        tracing::info!(collected = total, unique = all.len(), "all collection stages completed");

        if plan.validate && !all.is_empty() {
            outcome.validation = self.validator.validate(&all, plan.validation_concurrency).await;
            let stats = ValidationStats::from_results(&outcome.validation);
            tracing::info!(
                "Validation completed: {} total, {} alive ({:.1}%), DNS: {} ({:.1}%), Ping: {} ({:.1}%)",
                stats.total_domains,
                stats.alive_domains,
                stats.alive_percentage,
                stats.dns_resolved,
                stats.dns_percentage,
                stats.ping_alive,
                stats.ping_percentage
            );
            let validated: HashSet<&str> = outcome.validation.iter().map(|v| v.subdomain.as_str()).collect();
            for list in outcome.per_stage.values_mut() {
                list.retain(|s| validated.contains(normalize_subdomain(s).as_str()));
            }
            outcome.candidates.retain(|c| validated.contains(c.subdomain.as_str()));
        }
        Ok(outcome)
    }

    pub fn aggregate(&self, domain: &str, outcome: &DispatchOutcome) -> AggregatedDomainResult {
        aggregate(domain, outcome)
    }
}

/// Fold a dispatch into one record per distinct subdomain; the first
/// collector (in stage order) that reported a name is its source.
pub fn aggregate(domain: &str, outcome: &DispatchOutcome) -> AggregatedDomainResult {
    let mut seen = HashSet::new();
    let candidates: Vec<Candidate> = outcome
        .candidates
        .iter()
        .filter(|c| !c.subdomain.is_empty() && seen.insert(c.subdomain.clone()))
        .cloned()
        .collect();
    AggregatedDomainResult {
        domain: normalize_subdomain(domain),
        per_stage: outcome.per_stage.clone(),
        candidates,
        validation: outcome.validation.clone(),
    }
}

/// One record per distinct subdomain, annotated with its validation verdict
/// when there is one.
pub fn flatten_outcome(outcome: &DispatchOutcome) -> Vec<SubdomainResult> {
    let by_name: HashMap<&str, &ValidationResult> =
        outcome.validation.iter().map(|v| (v.subdomain.as_str(), v)).collect();
    let mut seen = HashSet::new();
    let mut results = Vec::new();
    for (kind, subs) in &outcome.per_stage {
        for s in subs {
            let name = normalize_subdomain(s);
            if name.is_empty() || !seen.insert(name.clone()) {
                continue;
            }
            let record = match by_name.get(name.as_str()) {
                Some(v) => SubdomainResult::from_validation(v, kind.as_str()),
                None => SubdomainResult::unvalidated(&name, kind.as_str()),
            };
            results.push(record);
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::StaticResolver;
    use async_trait::async_trait;
    use std::net::{IpAddr, Ipv4Addr};

    struct Fixed(CollectorKind, Vec<&'static str>);

    #[async_trait]
    impl Collector for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn kind(&self) -> CollectorKind {
            self.0
        }
        async fn run(&self, _domain: &str) -> Result<Vec<String>> {
            Ok(self.1.iter().map(|s| s.to_string()).collect())
        }
    }

    struct Open;

    #[async_trait]
    impl TcpProber for Open {
        async fn probe(&self, _ip: IpAddr, _port: u16, _timeout: Duration) -> bool {
            true
        }
    }

    fn dispatcher() -> Dispatcher {
        let resolver = StaticResolver::new().with_a("www.example.com", &[Ipv4Addr::new(93, 184, 216, 34)]);
        Dispatcher::new(Arc::new(Config::default()), Arc::new(resolver), Arc::new(Open))
    }

    #[tokio::test]
    async fn stages_merge_and_validate() {
        let mut d = dispatcher();
        d.register_module(Arc::new(Fixed(CollectorKind::Dataset, vec!["www.example.com", "old.example.com"])));
        d.register_module(Arc::new(Fixed(CollectorKind::Certificate, vec!["WWW.example.com"])));
        let out = d.run_all_modules("example.com").await.unwrap();
        assert_eq!(out.per_stage.len(), 2);
        assert_eq!(out.validation.len(), 2);
        assert_eq!(out.per_stage[&CollectorKind::Dataset].len(), 2);

        let agg = d.aggregate("example.com", &out);
        assert_eq!(agg.total(), 2);
        assert_eq!(agg.alive().count(), 1);
        assert_eq!(agg.candidates[0].source, CollectorKind::Dataset);
    }

    #[tokio::test]
    async fn disabled_stage_is_skipped() {
        let mut d = dispatcher();
        d.register_module(Arc::new(Fixed(CollectorKind::Crawl, vec!["www.example.com"])));
        d.set_stage_enabled(CollectorKind::Crawl, false);
        let out = d.run_all_modules("example.com").await.unwrap();
        assert!(out.per_stage.is_empty());
        assert!(out.validation.is_empty());
    }

    #[tokio::test]
    async fn invalid_target_is_rejected() {
        let d = dispatcher();
        assert!(d.run_all_modules("").await.is_err());
        assert!(d.run_all_modules("not a domain").await.is_err());
    }

    #[test]
    fn stage_knobs() {
        let mut d = dispatcher();
        d.set_stage_concurrency(CollectorKind::Search, 0);
        d.set_stage_concurrency(CollectorKind::Enrich, 7);
        d.set_stage_timeout(CollectorKind::Enrich, Duration::from_secs(9));
        let infos = d.list_modules();
        assert_eq!(infos.len(), 9);
        assert_eq!(infos[0].name, "Fast Search");
        assert_eq!(infos[0].concurrency, 10);
        let enrich = infos.iter().find(|i| i.kind == CollectorKind::Enrich).unwrap();
        assert_eq!((enrich.concurrency, enrich.timeout_secs), (7, 9));
        assert!(d.module_stats().values().all(|&n| n == 0));
    }
}
