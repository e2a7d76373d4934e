use std::fs;
use std::path::Path;

use crate::model::dedup_subdomains;

pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Reduce a CLI target to a bare host: URLs lose their scheme, path and port.
pub fn normalize_target(target: &str) -> String {
    let t = target.trim();
    if t.starts_with("http://") || t.starts_with("https://") {
        if let Some(host) = url::Url::parse(t).ok().and_then(|u| u.host_str().map(|s| s.to_string())) {
            return host.to_lowercase();
        }
    }
    t.trim_end_matches('.').to_lowercase()
}

/// Newline-delimited targets; blank lines and `#` comments skipped.
pub fn read_domains_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let data = fs::read_to_string(path)?;
    let targets: Vec<String> = data
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(normalize_target)
        .collect();
    Ok(dedup_subdomains(&targets))
}
