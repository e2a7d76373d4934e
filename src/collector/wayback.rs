use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use super::{is_valid_subdomain, Collector, CollectorKind};
use crate::model::dedup_subdomains;

/// Archived URL crawl via the Wayback CDX API. Only the host part of each
/// archived URL is kept.
pub struct WaybackCollector {
    client: Client,
    base_url: String,
}

impl WaybackCollector {
    pub fn new(client: Client) -> Self {
        Self { client, base_url: "https://web.archive.org".to_string() }
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }
}

/// The CDX JSON output is an array of rows, the first one being the header.
pub fn parse_cdx(body: &str, domain: &str) -> Result<Vec<String>> {
    let v: serde_json::Value = serde_json::from_str(body)?;
    let mut out = Vec::new();
    if let Some(rows) = v.as_array() {
        for row in rows.iter().skip(1) {
            let original = match row {
                serde_json::Value::Array(cols) => cols.first().and_then(|c| c.as_str()),
                serde_json::Value::String(s) => Some(s.as_str()),
                _ => None,
            };
            let Some(original) = original else { continue };
            if let Some(host) = host_of(original) {
                if is_valid_subdomain(&host, domain) {
                    out.push(host);
                }
            }
        }
    }
    Ok(dedup_subdomains(&out))
}

fn host_of(raw: &str) -> Option<String> {
    let with_scheme = if raw.contains("://") { raw.to_string() } else { format!("http://{}", raw) };
    url::Url::parse(&with_scheme)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

#[async_trait]
impl Collector for WaybackCollector {
    fn name(&self) -> &str {
        "wayback"
    }

    fn kind(&self) -> CollectorKind {
        CollectorKind::Crawl
    }

    async fn run(&self, domain: &str) -> Result<Vec<String>> {
        let url = format!(
            "{}/cdx/search/cdx?url=*.{}&output=json&fl=original&collapse=urlkey",
            self.base_url, domain
        );
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Ok(vec![]);
        }
        let txt = resp.text().await?;
        if txt.trim().is_empty() {
            return Ok(vec![]);
        }
        parse_cdx(&txt, domain)
    }
}
