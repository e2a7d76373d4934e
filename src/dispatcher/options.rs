use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_LIB_CONCURRENCY: usize = 10;
pub const DEFAULT_LIB_TIMEOUT: Duration = Duration::from_secs(60);
/// Smallest stage timeout a caller can ask for; a zero would disable the timer.
pub const MIN_LIB_TIMEOUT: Duration = Duration::from_millis(1);

/// Typed view of the loosely typed option map accepted by `run_lib`.
/// Missing keys and values of the wrong type fall back to the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct LibOptions {
    pub concurrency: usize,
    pub timeout: Duration,
    pub enable_validation: bool,
    pub enable_brute_force: bool,
}

impl Default for LibOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_LIB_CONCURRENCY,
            timeout: DEFAULT_LIB_TIMEOUT,
            enable_validation: true,
            enable_brute_force: true,
        }
    }
}

impl LibOptions {
    pub fn from_map(options: &HashMap<String, Value>) -> Self {
        let defaults = Self::default();
        let concurrency = options
            .get("concurrency")
            .and_then(Value::as_u64)
            .filter(|&c| c > 0)
            .map(|c| usize::try_from(c).unwrap_or(usize::MAX))
            .unwrap_or(defaults.concurrency);
        let timeout = match options.get("timeout") {
            Some(Value::Number(n)) => n
                .as_f64()
                .filter(|s| *s > 0.0)
                .and_then(|s| Duration::try_from_secs_f64(s).ok())
                .map(|d| d.max(MIN_LIB_TIMEOUT))
                .unwrap_or(defaults.timeout),
            _ => defaults.timeout,
        };
        let flag = |key: &str, default: bool| options.get(key).and_then(Value::as_bool).unwrap_or(default);
        Self {
            concurrency,
            timeout,
            enable_validation: flag("enable_validation", defaults.enable_validation),
            enable_brute_force: flag("enable_brute_force", defaults.enable_brute_force),
        }
    }
}
