use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use super::title::extract_title;

const MAX_BODY: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// What a single page fetch produced. `status` is 0 when no response came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub title: String,
    pub scheme: Scheme,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, host: &str) -> FetchedPage;
}

/// HTTPS first with certificate checks off, plain HTTP when that does not
/// answer 200.
pub struct HttpsThenHttp {
    client: Client,
}

impl HttpsThenHttp {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_once(&self, scheme: Scheme, host: &str) -> Result<(u16, String)> {
        let url = format!("{}://{}", scheme.as_str(), host);
        let mut resp = self
            .client
            .get(&url)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .send()
            .await?;
        let status = resp.status().as_u16();
        if status != 200 {
            return Ok((status, String::new()));
        }
        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() >= MAX_BODY {
                body.truncate(MAX_BODY);
                break;
            }
        }
        Ok((status, extract_title(&String::from_utf8_lossy(&body))))
    }
}

#[async_trait]
impl PageFetcher for HttpsThenHttp {
    async fn fetch(&self, host: &str) -> FetchedPage {
        let mut last = FetchedPage { status: 0, title: String::new(), scheme: Scheme::Https };
        for scheme in [Scheme::Https, Scheme::Http] {
            match self.fetch_once(scheme, host).await {
                Ok((status, title)) => {
                    last = FetchedPage { status, title, scheme };
                    if status == 200 {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(host, scheme = scheme.as_str(), error = %e, "fetch failed");
                    last = FetchedPage { status: 0, title: String::new(), scheme };
                }
            }
        }
        last
    }
}
