use std::path::PathBuf;

/// Errors that abort a run before any collector is scheduled.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("target domain is required")]
    MissingTarget,

    #[error("invalid target domain: {0:?}")]
    InvalidDomain(String),

    #[error("failed to read wordlist {path}: {source}")]
    Wordlist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Syntactic hostname check used on targets before dispatch.
pub fn validate_domain(domain: &str) -> Result<(), ScanError> {
    let d = domain.trim();
    if d.is_empty() {
        return Err(ScanError::MissingTarget);
    }
    if d.len() > 253 || !d.contains('.') || d.starts_with('.') || d.ends_with('.') {
        return Err(ScanError::InvalidDomain(domain.to_string()));
    }
    for label in d.split('.') {
        let ok = !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !ok {
            return Err(ScanError::InvalidDomain(domain.to_string()));
        }
    }
    Ok(())
}
