use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::model::SubdomainResult;

/// Pretty-printed JSON array.
pub fn write_json(path: &Path, items: &[&SubdomainResult]) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(items)?;
    fs::write(path, body)?;
    Ok(())
}

/// One record per line, appended.
pub fn write_jsonl(path: &Path, items: &[&SubdomainResult]) -> anyhow::Result<()> {
    let mut f = OpenOptions::new().append(true).create(true).open(path)?;
    for it in items {
        let line = serde_json::to_string(it)?;
        f.write_all(line.as_bytes())?;
        f.write_all(b"\n")?;
    }
    Ok(())
}
