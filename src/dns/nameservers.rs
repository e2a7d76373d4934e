use std::net::IpAddr;
use std::path::Path;

/// Public resolvers used when neither the target's own nameservers nor the
/// configured list are available.
pub const DEFAULT_NAMESERVERS: [&str; 6] =
    ["8.8.8.8", "8.8.4.4", "1.1.1.1", "1.0.0.1", "114.114.114.114", "114.114.115.115"];

pub fn default_nameservers() -> Vec<IpAddr> {
    DEFAULT_NAMESERVERS.iter().filter_map(|s| s.parse().ok()).collect()
}

/// One IP per line, `#` starts a comment. Unparseable lines are skipped.
pub fn parse_nameservers(text: &str) -> Vec<IpAddr> {
    text.lines()
        .map(|l| l.split('#').next().unwrap_or("").trim())
        .filter(|l| !l.is_empty())
        .filter_map(|l| match l.parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                tracing::debug!(line = l, "ignoring invalid nameserver entry");
                None
            }
        })
        .collect()
}

/// Read the nameserver file, falling back to [`DEFAULT_NAMESERVERS`] when it
/// is missing or yields nothing.
pub async fn load_nameservers(path: &Path) -> Vec<IpAddr> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            let list = parse_nameservers(&text);
            if list.is_empty() {
                default_nameservers()
            } else {
                list
            }
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "nameserver file unavailable, using defaults");
            default_nameservers()
        }
    }
}
