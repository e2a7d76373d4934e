pub mod writer_csv;
pub mod writer_json;

pub use writer_csv::write_csv;
pub use writer_json::{write_json, write_jsonl};

use std::path::{Path, PathBuf};

use crate::model::SubdomainResult;

/// Export format picked on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Csv,
    Json,
    Jsonl,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Jsonl => "jsonl",
        }
    }
}

/// Write `items` for `domain` into `dir` and return the file written.
pub fn export(dir: &Path, domain: &str, format: Format, items: &[&SubdomainResult]) -> anyhow::Result<PathBuf> {
    let path = dir.join(format!("{}.{}", domain, format.extension()));
    match format {
        Format::Csv => write_csv(&path, items)?,
        Format::Json => write_json(&path, items)?,
        Format::Jsonl => write_jsonl(&path, items)?,
    }
    Ok(path)
}
