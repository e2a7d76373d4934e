use serde::Deserialize;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::collector::CollectorKind;

/// Configuration loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config {path}: {source}")]
    ParseYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse JSON config {path}: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported config format for {0}: .{1}")]
    UnsupportedFormat(String, String),

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Per-stage scheduling knobs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StageSettings {
    pub enabled: bool,
    pub concurrency: usize,
    pub timeout_secs: u64,
}

impl StageSettings {
    const fn new(concurrency: usize, timeout_secs: u64) -> Self {
        Self { enabled: true, concurrency, timeout_secs }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for StageSettings {
    fn default() -> Self {
        Self::new(10, 60)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StagesConfig {
    pub fast_search: StageSettings,
    pub dataset: StageSettings,
    pub certificate: StageSettings,
    pub crawl: StageSettings,
    pub dns_lookup: StageSettings,
    pub intelligence: StageSettings,
    pub brute_force: StageSettings,
    pub file_check: StageSettings,
    pub enrich: StageSettings,
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            fast_search: StageSettings::new(10, 30),
            dataset: StageSettings::new(20, 60),
            certificate: StageSettings::new(15, 45),
            crawl: StageSettings::new(10, 30),
            dns_lookup: StageSettings::new(50, 30),
            intelligence: StageSettings::new(15, 45),
            // timeout is never applied to the brute stage
            brute_force: StageSettings::new(2000, 300),
            file_check: StageSettings::new(10, 30),
            enrich: StageSettings::new(20, 60),
        }
    }
}

impl StagesConfig {
    pub fn for_kind(&self, kind: CollectorKind) -> &StageSettings {
        match kind {
            CollectorKind::Search => &self.fast_search,
            CollectorKind::Dataset => &self.dataset,
            CollectorKind::Certificate => &self.certificate,
            CollectorKind::Crawl => &self.crawl,
            CollectorKind::DnsLookup => &self.dns_lookup,
            CollectorKind::Intelligence => &self.intelligence,
            CollectorKind::Brute => &self.brute_force,
            CollectorKind::FileCheck => &self.file_check,
            CollectorKind::Enrich => &self.enrich,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BruteConfig {
    pub wordlist: PathBuf,
    pub next_wordlist: PathBuf,
    pub nameservers_file: PathBuf,
    /// In-flight DNS exchanges inside the engine.
    pub concurrency: usize,
    pub recursive: bool,
    pub depth: usize,
    pub check_cname: bool,
    pub bootstrap_resolver: IpAddr,
}

impl Default for BruteConfig {
    fn default() -> Self {
        Self {
            wordlist: PathBuf::from("data/subnames.txt"),
            next_wordlist: PathBuf::from("data/subnames_next.txt"),
            nameservers_file: PathBuf::from("data/nameservers.txt"),
            concurrency: 2000,
            recursive: false,
            depth: 1,
            check_cname: false,
            bootstrap_resolver: IpAddr::from([8, 8, 8, 8]),
        }
    }
}

impl BruteConfig {
    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency == 0 { 20 } else { self.concurrency }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WildcardConfig {
    pub test_count: usize,
    pub success_rate_threshold: f64,
    pub ip_repeat_rate_threshold: f64,
}

impl Default for WildcardConfig {
    fn default() -> Self {
        Self { test_count: 20, success_rate_threshold: 90.0, ip_repeat_rate_threshold: 50.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub enabled: bool,
    pub concurrency: usize,
    pub exclude_private_ip: bool,
    pub probe_ports: Vec<u16>,
    pub connect_timeout_secs: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: 50,
            exclude_private_ip: true,
            probe_ports: vec![80, 443],
            connect_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostProcessConfig {
    pub enabled: bool,
    /// Host lists at or below this size are left untouched.
    pub result_check_limit: usize,
    /// 403 responses beyond this count collapse to the first one seen.
    pub forbidden_limit: usize,
    pub concurrency: usize,
    pub timeout_secs: u64,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self { enabled: false, result_check_limit: 30, forbidden_limit: 1, concurrency: 50, timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        }
    }
}

/// Process-wide settings, built once and shared as `Arc<Config>`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stages: StagesConfig,
    pub brute: BruteConfig,
    pub wildcard: WildcardConfig,
    pub validation: ValidationConfig,
    pub postprocess: PostProcessConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from a YAML or JSON file, picked by extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseYaml {
                path: path.display().to_string(),
                source: e,
            }),
            "json" => serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson {
                path: path.display().to_string(),
                source: e,
            }),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string(), ext)),
        }
    }

    /// File (if given) -> environment overrides -> validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Override selected fields from `SUB_HUNTER_*` environment variables.
    pub fn apply_env(&mut self) {
        if let Some(v) = env_parse::<bool>("SUB_HUNTER_VALIDATION") {
            self.validation.enabled = v;
        }
        if let Some(v) = env_parse::<usize>("SUB_HUNTER_VALIDATION_CONCURRENCY") {
            self.validation.concurrency = v;
        }
        if let Ok(v) = std::env::var("SUB_HUNTER_BRUTE_WORDLIST") {
            if !v.trim().is_empty() {
                self.brute.wordlist = PathBuf::from(v.trim());
            }
        }
        if let Some(v) = env_parse::<usize>("SUB_HUNTER_BRUTE_CONCURRENCY") {
            self.brute.concurrency = v;
        }
        if let Some(v) = env_parse::<usize>("SUB_HUNTER_WILDCARD_TEST_COUNT") {
            self.wildcard.test_count = v;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validation.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "validation.concurrency",
                reason: "must be greater than zero".into(),
            });
        }
        if self.wildcard.test_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "wildcard.test_count",
                reason: "must be greater than zero".into(),
            });
        }
        for (field, v) in [
            ("wildcard.success_rate_threshold", self.wildcard.success_rate_threshold),
            ("wildcard.ip_repeat_rate_threshold", self.wildcard.ip_repeat_rate_threshold),
        ] {
            if !(0.0..=100.0).contains(&v) {
                return Err(ConfigError::InvalidValue { field, reason: format!("{} is outside 0..=100", v) });
            }
        }
        if self.validation.probe_ports.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "validation.probe_ports",
                reason: "at least one port is required".into(),
            });
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
