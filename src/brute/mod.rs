//! Active DNS brute forcing.
//!
//! A run goes through four phases: find the zone's authoritative servers,
//! probe for wildcard answers, resolve the dictionary, then optionally recurse
//! into what was found. The dictionary phase has no wall-clock limit.

pub mod progress;
pub mod wildcard;
pub mod wordlist;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::collector::{is_valid_subdomain, Collector, CollectorKind};
use crate::concurrent::{catch_panic, ConcurrencyGate, ResultCache};
use crate::config::Config;
use crate::dns::{load_nameservers, DnsResolver, RecordKind};

pub use progress::BruteProgress;
pub use wildcard::{detect_wildcard, probe_labels, WildcardDetectionResult};
pub use wordlist::{builtin_pool, load_wordlist};

/// Resolution outcome for one generated name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BruteForceResult {
    pub subdomain: String,
    pub ips: Vec<String>,
    pub cnames: Vec<String>,
    pub valid: bool,
}

/// A-resolve `subdomain`, falling back to a CNAME query when asked to.
pub async fn query_subdomain(resolver: &dyn DnsResolver, subdomain: &str, check_cname: bool) -> BruteForceResult {
    let mut result = BruteForceResult { subdomain: subdomain.to_string(), ..Default::default() };
    match resolver.lookup_a(subdomain).await {
        Ok(ips) => result.ips = ips.iter().map(|ip| ip.to_string()).collect(),
        Err(e) => tracing::trace!(subdomain, error = %e, "no A record"),
    }
    if result.ips.is_empty() && check_cname {
        if let Ok(cnames) = resolver.lookup_cname(subdomain).await {
            result.cnames = cnames;
        }
    }
    result.valid = !result.ips.is_empty() || !result.cnames.is_empty();
    result
}

pub struct BruteForceEngine {
    config: Arc<Config>,
    resolver: Arc<dyn DnsResolver>,
}

impl BruteForceEngine {
    pub fn new(config: Arc<Config>, resolver: Arc<dyn DnsResolver>) -> Self {
        Self { config, resolver }
    }

    /// IPs of the zone's NS hosts, or the configured public list when the
    /// zone publishes none that resolve.
    pub async fn authoritative_nameservers(&self, domain: &str) -> Vec<IpAddr> {
        let bootstrap = self.resolver.with_nameservers(&[self.config.brute.bootstrap_resolver]);
        let mut ips: Vec<IpAddr> = Vec::new();
        match bootstrap.lookup_records(domain, RecordKind::Ns).await {
            Ok(hosts) => {
                for host in hosts {
                    match bootstrap.lookup_a(&host).await {
                        Ok(addrs) => ips.extend(addrs.into_iter().map(IpAddr::V4)),
                        Err(e) => tracing::debug!(ns = %host, error = %e, "NS host did not resolve"),
                    }
                }
            }
            Err(e) => tracing::debug!(domain, error = %e, "NS lookup failed"),
        }
        ips.sort();
        ips.dedup();
        if ips.is_empty() {
            let fallback = load_nameservers(&self.config.brute.nameservers_file).await;
            tracing::info!(count = fallback.len(), "no authoritative nameservers, using public resolvers");
            return fallback;
        }
        tracing::info!(domain, nameservers = ?ips, "using authoritative nameservers");
        ips
    }

    /// Resolve every name in `names` under `gate`, recording the valid ones.
    async fn brute_names(
        &self,
        resolver: &Arc<dyn DnsResolver>,
        names: Vec<String>,
        gate: &ConcurrencyGate,
        found: &ResultCache<String, BruteForceResult>,
    ) -> Vec<String> {
        tracing::info!(count = names.len(), concurrency = gate.capacity(), "starting brute force");
        let progress = BruteProgress::new(names.len());
        let stop = CancellationToken::new();
        let reporter = progress.spawn_reporter(stop.clone());
        let check_cname = self.config.brute.check_cname;

        let mut handles = Vec::with_capacity(names.len());
        for name in names {
            let resolver = resolver.clone();
            let gate = gate.clone();
            let found = found.clone();
            let progress = progress.clone();
            handles.push(tokio::spawn(async move {
                let _permit = gate.acquire().await;
                match catch_panic(query_subdomain(resolver.as_ref(), &name, check_cname)).await {
                    Ok(r) => {
                        let valid = r.valid;
                        if valid {
                            tracing::info!(subdomain = %name, ips = ?r.ips, cnames = ?r.cnames, "found valid subdomain");
                            found.insert(name.clone(), r);
                        }
                        progress.record(valid);
                        valid.then_some(name)
                    }
                    Err(msg) => {
                        tracing::error!(subdomain = %name, panic = %msg, "brute worker panicked");
                        progress.record(false);
                        None
                    }
                }
            }));
        }

        let mut valid = Vec::new();
        for h in handles {
            match h.await {
                Ok(Some(name)) => valid.push(name),
                Ok(None) => {}
                Err(e) => tracing::error!(error = %e, "brute task failed"),
            }
        }
        stop.cancel();
        let _ = reporter.await;
        progress.report();
        valid
    }

    /// Full run against `domain`; empty when the zone answers everything.
    pub async fn run_domain(&self, domain: &str) -> Result<Vec<String>> {
        let brute = &self.config.brute;
        let servers = self.authoritative_nameservers(domain).await;
        let resolver = self.resolver.with_nameservers(&servers);
        let gate = ConcurrencyGate::new(brute.effective_concurrency());

        let words = load_wordlist(&brute.wordlist).await;
        let pool = match &words {
            Ok(w) if !w.is_empty() => w.clone(),
            _ => builtin_pool(),
        };
        let probes: Vec<String> = {
            let mut rng = rand::thread_rng();
            probe_labels(&pool, self.config.wildcard.test_count, &mut rng)
                .into_iter()
                .map(|label| format!("{}.{}", label, domain))
                .collect()
        };
        let wildcard = detect_wildcard(resolver.clone(), probes, &self.config.wildcard, &gate).await;
        if wildcard.is_wildcard {
            tracing::warn!(domain, "wildcard DNS detected, skipping brute force");
            return Ok(Vec::new());
        }

        let words = words?;
        let names = expand(&words, &[domain.to_string()], domain);
        let found: ResultCache<String, BruteForceResult> = ResultCache::new();
        let mut frontier = self.brute_names(&resolver, names, &gate, &found).await;

        if brute.recursive && brute.depth > 0 {
            let next_words = match load_wordlist(&brute.next_wordlist).await {
                Ok(w) if !w.is_empty() => w,
                _ => words.clone(),
            };
            for level in 1..=brute.depth {
                if frontier.is_empty() {
                    break;
                }
                tracing::info!(level, parents = frontier.len(), "recursive brute force");
                let names = expand(&next_words, &frontier, domain);
                frontier = self.brute_names(&resolver, names, &gate, &found).await;
            }
        }

        let mut out: Vec<String> = found.snapshot().into_iter().map(|(name, _)| name).collect();
        out.sort();
        tracing::info!(domain, found = out.len(), "brute force finished");
        Ok(out)
    }
}

/// `label.parent` for every pair, keeping only names that belong to `domain`.
fn expand(words: &[String], parents: &[String], domain: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(words.len() * parents.len());
    for parent in parents {
        for w in words {
            let name = format!("{}.{}", w, parent);
            if is_valid_subdomain(&name, domain) {
                out.push(name);
            }
        }
    }
    out
}

#[async_trait]
impl Collector for BruteForceEngine {
    fn name(&self) -> &str {
        "Brute"
    }

    fn kind(&self) -> CollectorKind {
        CollectorKind::Brute
    }

    async fn run(&self, domain: &str) -> Result<Vec<String>> {
        self.run_domain(domain).await
    }
}
