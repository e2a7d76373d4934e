//! Optional noise reduction for large result sets.
//!
//! Hosts serving the same page under many names collapse to one entry per
//! distinct title, and a flood of 403 responses collapses to a single entry.

pub mod fetch;
pub mod title;

use chrono::Local;
use std::sync::Arc;

use crate::concurrent::{catch_panic, ConcurrencyGate};
use crate::config::PostProcessConfig;
use crate::model::{dedup_subdomains, SubdomainResult, TIME_FORMAT};

pub use fetch::{FetchedPage, HttpsThenHttp, PageFetcher, Scheme};
pub use title::extract_title;

pub struct PostProcessor {
    config: PostProcessConfig,
    fetcher: Arc<dyn PageFetcher>,
}

impl PostProcessor {
    pub fn new(config: PostProcessConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// `None` when there are too few hosts to bother; otherwise the reduced
    /// list. Hosts answering neither 200 nor 403 are dropped.
    pub async fn process(&self, hosts: &[String]) -> Option<Vec<SubdomainResult>> {
        if hosts.len() <= self.config.result_check_limit {
            return None;
        }
        let unique = dedup_subdomains(hosts);
        let gate = ConcurrencyGate::new(self.config.concurrency);

        let mut handles = Vec::with_capacity(unique.len());
        for host in unique.iter().cloned() {
            let fetcher = self.fetcher.clone();
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                let _permit = gate.acquire().await;
                catch_panic(fetcher.fetch(&host)).await
            }));
        }

        // walk in input order so "first seen" is deterministic
        let mut ok = Vec::new();
        let mut seen_titles = std::collections::HashSet::new();
        let mut forbidden = Vec::new();
        for (host, handle) in unique.iter().zip(handles) {
            let page = match handle.await {
                Ok(Ok(page)) => page,
                Ok(Err(msg)) => {
                    tracing::error!(host = %host, panic = %msg, "page fetch panicked");
                    continue;
                }
                Err(e) => {
                    tracing::error!(host = %host, error = %e, "page fetch task failed");
                    continue;
                }
            };
            match page.status {
                200 => {
                    if seen_titles.insert(page.title.clone()) {
                        ok.push(record(host, &page, true));
                    }
                }
                403 => forbidden.push(record(host, &page, false)),
                _ => {}
            }
        }

        let forbidden_total = forbidden.len();
        if forbidden.len() > self.config.forbidden_limit {
            forbidden.truncate(1);
        }
        tracing::info!(
            "PostProcess: {} -> {} (200-title-dedup {}, 403 kept {} of {})",
            hosts.len(),
            ok.len() + forbidden.len(),
            ok.len(),
            forbidden.len(),
            forbidden_total
        );
        ok.extend(forbidden);
        Some(ok)
    }
}

fn record(host: &str, page: &FetchedPage, alive: bool) -> SubdomainResult {
    let status = reqwest::StatusCode::from_u16(page.status).ok();
    SubdomainResult {
        subdomain: host.to_string(),
        source: "postprocess".to_string(),
        time: Local::now().format(TIME_FORMAT).to_string(),
        alive,
        ip: String::new(),
        dns_resolved: false,
        ping_alive: false,
        status_code: i32::from(page.status),
        status_text: status.and_then(|s| s.canonical_reason()).unwrap_or("").to_string(),
        provider: String::new(),
        title: Some(page.title.clone()),
        port: Some(page.scheme.default_port()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Table;

    #[async_trait]
    impl PageFetcher for Table {
        async fn fetch(&self, host: &str) -> FetchedPage {
            let n: usize = host.trim_start_matches('h').split('.').next().unwrap().parse().unwrap();
            let (status, title) = if n < 40 {
                (200, if n < 35 { "Welcome".to_string() } else { format!("Page {}", n) })
            } else {
                (403, String::new())
            };
            FetchedPage { status, title, scheme: Scheme::Https }
        }
    }

    fn hosts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("h{}.example.com", i)).collect()
    }

    #[tokio::test]
    async fn small_sets_are_untouched() {
        let p = PostProcessor::new(PostProcessConfig::default(), Arc::new(Table));
        assert!(p.process(&hosts(30)).await.is_none());
    }

    #[tokio::test]
    async fn collapses_titles_and_forbidden() {
        let p = PostProcessor::new(PostProcessConfig::default(), Arc::new(Table));
        let out = p.process(&hosts(50)).await.unwrap();
        let ok: Vec<_> = out.iter().filter(|r| r.status_code == 200).collect();
        let forbidden: Vec<_> = out.iter().filter(|r| r.status_code == 403).collect();
        assert_eq!(ok.len(), 6);
        assert_eq!(ok[0].subdomain, "h0.example.com");
        assert_eq!(ok[0].port, Some(443));
        assert_eq!(forbidden.len(), 1);
        assert_eq!(forbidden[0].subdomain, "h40.example.com");
        assert!(!forbidden[0].alive);
        assert_eq!(forbidden[0].status_text, "Forbidden");
    }
}
