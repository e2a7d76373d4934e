use regex::Regex;

use crate::model::dedup_subdomains;

const INVALID_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// True if `subdomain` is a proper `"." + domain` suffixed name with no
/// whitespace, control characters or path/shell punctuation.
pub fn is_valid_subdomain(subdomain: &str, domain: &str) -> bool {
    if subdomain == domain || domain.is_empty() {
        return false;
    }
    let suffix = format!(".{}", domain);
    if !subdomain.ends_with(&suffix) || subdomain.len() <= suffix.len() {
        return false;
    }
    if subdomain.starts_with('.') || subdomain.contains("..") {
        return false;
    }
    !subdomain
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || INVALID_CHARS.contains(&c))
}

/// Pull every hostname under `domain` out of free text (HTML, JSON, CSV...).
/// Results are lower-cased, validated and deduplicated.
pub fn extract_subdomains(text: &str, domain: &str) -> Vec<String> {
    let domain = domain.trim().to_lowercase();
    let pattern = format!(r"(?i)([a-z0-9.-]+\.{})", regex::escape(&domain));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(error = %e, domain = %domain, "could not build extraction pattern");
            return Vec::new();
        }
    };

    let mut found = Vec::new();
    for m in re.find_iter(text) {
        // reject matches that continue into a longer label, e.g. example.community
        let continues = text[m.end()..]
            .chars()
            .next()
            .map(|c| c.is_ascii_alphanumeric() || c == '-')
            .unwrap_or(false);
        if continues {
            continue;
        }
        let candidate = m.as_str().trim_start_matches(['.', '-']).to_lowercase();
        if is_valid_subdomain(&candidate, &domain) {
            found.push(candidate);
        }
    }
    dedup_subdomains(&found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_rules() {
        assert!(is_valid_subdomain("www.example.com", "example.com"));
        assert!(is_valid_subdomain("a.b.example.com", "example.com"));
        assert!(!is_valid_subdomain("example.com", "example.com"));
        assert!(!is_valid_subdomain("wwwexample.com", "example.com"));
        assert!(!is_valid_subdomain(".example.com", "example.com"));
        assert!(!is_valid_subdomain("w w.example.com", "example.com"));
        assert!(!is_valid_subdomain("w\tw.example.com", "example.com"));
        assert!(!is_valid_subdomain("*.example.com", "example.com"));
        assert!(!is_valid_subdomain("a..example.com", "example.com"));
    }

    #[test]
    fn extracts_from_mixed_text() {
        let text = r#"<a href="https://API.example.com/x">x</a> mail.example.com,
            *.cdn.example.com other.example.community example.com"#;
        let subs = extract_subdomains(text, "example.com");
        assert!(subs.contains(&"api.example.com".to_string()));
        assert!(subs.contains(&"mail.example.com".to_string()));
        assert!(subs.contains(&"cdn.example.com".to_string()));
        assert!(!subs.iter().any(|s| s.contains("community")));
        assert!(!subs.contains(&"example.com".to_string()));
    }

    #[test]
    fn extraction_is_deduplicated() {
        let subs = extract_subdomains("a.example.com A.EXAMPLE.COM a.example.com", "example.com");
        assert_eq!(subs, vec!["a.example.com".to_string()]);
    }
}
