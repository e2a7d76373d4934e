use once_cell::sync::Lazy;
use regex::Regex;

static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex"));

/// First `<title>` of an HTML document, entities decoded and whitespace runs
/// collapsed to single spaces. Empty when there is none.
pub fn extract_title(html: &str) -> String {
    TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| {
            let decoded = html_escape::decode_html_entities(m.as_str());
            decoded.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .unwrap_or_default()
}
