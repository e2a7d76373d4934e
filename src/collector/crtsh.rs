use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use super::{is_valid_subdomain, Collector, CollectorKind};
use crate::model::dedup_subdomains;

/// Certificate transparency search through crt.sh.
pub struct CrtshCollector {
    client: Client,
    base_url: String,
}

impl CrtshCollector {
    pub fn new(client: Client) -> Self {
        Self { client, base_url: "https://crt.sh".to_string() }
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }
}

/// Pull names out of a crt.sh JSON body. `name_value` may hold several
/// newline separated names, wildcards included.
pub fn parse_crtsh(body: &str, domain: &str) -> Result<Vec<String>> {
    let v: serde_json::Value = serde_json::from_str(body)?;
    let mut out = Vec::new();
    if let Some(arr) = v.as_array() {
        for item in arr {
            for field in ["name_value", "common_name"] {
                let Some(names) = item.get(field).and_then(|n| n.as_str()) else {
                    continue;
                };
                for n in names.split('\n') {
                    let s = n.trim().trim_start_matches("*.").to_lowercase();
                    if is_valid_subdomain(&s, domain) {
                        out.push(s);
                    }
                }
            }
        }
    }
    Ok(dedup_subdomains(&out))
}

#[async_trait]
impl Collector for CrtshCollector {
    fn name(&self) -> &str {
        "crtsh"
    }

    fn kind(&self) -> CollectorKind {
        CollectorKind::Certificate
    }

    async fn run(&self, domain: &str) -> Result<Vec<String>> {
        let q = format!("%.{}", domain);
        let url = format!("{}/?q={}&output=json", self.base_url, urlencoding::encode(&q));
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            tracing::debug!(status = %resp.status(), "crt.sh returned non-success");
            return Ok(vec![]);
        }
        let txt = resp.text().await?;
        // crt.sh answers with an HTML error page when overloaded
        parse_crtsh(&txt, domain)
    }
}
