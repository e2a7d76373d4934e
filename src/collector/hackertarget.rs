use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::{extract_subdomains, Collector, CollectorKind};

/// Passive DNS dataset from the hackertarget host search. The body is plain
/// `host,ip` lines.
pub struct HackerTargetCollector {
    client: Client,
    base_url: String,
}

impl HackerTargetCollector {
    pub fn new(client: Client) -> Self {
        Self { client, base_url: "https://api.hackertarget.com".to_string() }
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }
}

#[async_trait]
impl Collector for HackerTargetCollector {
    fn name(&self) -> &str {
        "hackertarget"
    }

    fn kind(&self) -> CollectorKind {
        CollectorKind::Dataset
    }

    async fn run(&self, domain: &str) -> Result<Vec<String>> {
        let url = format!("{}/hostsearch/?q={}", self.base_url, urlencoding::encode(domain));
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Ok(vec![]);
        }
        let txt = resp.text().await?;
        if txt.starts_with("error") || txt.contains("API count exceeded") {
            bail!("hackertarget refused query: {}", txt.lines().next().unwrap_or_default());
        }
        Ok(extract_subdomains(&txt, domain))
    }
}
