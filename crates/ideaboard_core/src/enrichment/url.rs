//! URL detection in note text.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"'`]+"#).expect("valid url regex"));

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}'];

/// Returns the first `http(s)://` token in `text`, scanning left to right.
///
/// Trailing sentence punctuation is not part of the URL.
pub fn first_url(text: &str) -> Option<&str> {
    URL_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
        .find(|candidate| url_host(candidate).is_some())
}

/// Host part of a URL, used for metadata-only logging.
pub fn url_host(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map(|(_, rest)| rest)?;
    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

#[cfg(test)]
mod tests {
    use super::{first_url, url_host};

    #[test]
    fn finds_first_url_left_to_right() {
        let text = "see http://a.example/x and https://b.example";
        assert_eq!(first_url(text), Some("http://a.example/x"));
    }

    #[test]
    fn trims_trailing_sentence_punctuation() {
        assert_eq!(
            first_url("check https://example.com now"),
            Some("https://example.com")
        );
        assert_eq!(
            first_url("(read https://example.com/post)."),
            Some("https://example.com/post")
        );
    }

    #[test]
    fn ignores_text_without_url_or_host() {
        assert_eq!(first_url("no links here"), None);
        assert_eq!(first_url("ftp://example.com"), None);
        assert_eq!(first_url("https://."), None);
    }

    #[test]
    fn extracts_host() {
        assert_eq!(url_host("https://example.com/a?b"), Some("example.com"));
        assert_eq!(url_host("example.com"), None);
    }
}
