use anyhow::{Context, Result};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use crate::config::HttpConfig;

/// Client shared by the passive collectors: pooled connections, compression
/// and a bounded redirect chain.
pub fn build_client(cfg: &HttpConfig) -> Result<Client> {
    create_client(cfg.timeout_secs, &cfg.user_agent, 50)
}

/// Client for page fetches against discovered hosts. Many of them serve
/// self-signed or mismatched certificates, so validation is off.
pub fn build_probe_client(timeout_secs: u64, user_agent: &str) -> Result<Client> {
    create_client(timeout_secs, user_agent, 10)
}

fn create_client(timeout_secs: u64, user_agent: &str, max_idle_per_host: usize) -> Result<Client> {
    ClientBuilder::new()
        .pool_max_idle_per_host(max_idle_per_host)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_nodelay(true)
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .connect_timeout(Duration::from_secs(5))
        .gzip(true)
        .brotli(true)
        .use_rustls_tls()
        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent(user_agent)
        .danger_accept_invalid_certs(true)
        .build()
        .context("failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_config() {
        assert!(build_client(&HttpConfig::default()).is_ok());
        assert!(build_probe_client(0, "sub-hunter-test").is_ok());
    }
}
