use std::path::Path;

use crate::error::ScanError;

/// Probe pool used when no wordlist can be read.
pub const BUILTIN_POOL: [&str; 20] = [
    "test", "www", "mail", "ftp", "admin", "blog", "api", "dev", "stage", "prod", "app", "web", "cdn", "static",
    "img", "css", "js", "docs", "help", "support",
];

pub fn builtin_pool() -> Vec<String> {
    BUILTIN_POOL.iter().map(|s| s.to_string()).collect()
}

/// One label per line; blank lines and `#` comments skipped, duplicates dropped.
pub fn parse_wordlist(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.trim_matches('.').to_lowercase())
        .filter(|l| !l.is_empty() && seen.insert(l.clone()))
        .collect()
}

pub async fn load_wordlist(path: &Path) -> Result<Vec<String>, ScanError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ScanError::Wordlist { path: path.to_path_buf(), source })?;
    Ok(parse_wordlist(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn skips_comments_and_blanks() {
        let words = parse_wordlist("# header\nwww\n\n  API \nwww\n#dev\nmail.\n");
        assert_eq!(words, vec!["www", "api", "mail"]);
    }

    #[tokio::test]
    async fn missing_file_is_typed_error() {
        let err = load_wordlist(Path::new("/nonexistent/words.txt")).await.unwrap_err();
        assert!(matches!(err, ScanError::Wordlist { .. }));
    }

    #[tokio::test]
    async fn loads_from_disk() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "www\napi").unwrap();
        assert_eq!(load_wordlist(f.path()).await.unwrap(), vec!["www", "api"]);
    }
}
