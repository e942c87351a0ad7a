//! Plain-text sanitizing for submitted settings fields.
//!
//! Mirrors the host's single-line text field cleaner: markup is stripped,
//! whitespace collapsed, control characters and percent-encoded octets
//! removed.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script[^>]*?>.*?</script>").expect("script pattern is a valid regex")
});

static STYLE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<style[^>]*?>.*?</style>").expect("style pattern is a valid regex")
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").expect("tag pattern is a valid regex"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\r\n\t ]+").expect("whitespace pattern is a valid regex"));

static OCTET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%[a-fA-F0-9]{2}").expect("octet pattern is a valid regex"));

static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("space pattern is a valid regex"));

/// Cleans a single-line text field before it is stored.
///
/// ```
/// use safelink_core::sanitize::sanitize_text_field;
///
/// assert_eq!(
///     sanitize_text_field("  <b>https://safe.example</b>\n"),
///     "https://safe.example"
/// );
/// ```
pub fn sanitize_text_field(input: &str) -> String {
    let mut filtered = input.to_string();

    if filtered.contains('<') {
        filtered = strip_all_tags(&filtered);
    }

    filtered = WHITESPACE_RUN.replace_all(&filtered, " ").into_owned();
    filtered.retain(|c| !c.is_control());
    filtered = filtered.trim().to_string();

    let mut found_octet = false;
    while OCTET.is_match(&filtered) {
        filtered = OCTET.replace_all(&filtered, "").into_owned();
        found_octet = true;
    }

    if found_octet {
        filtered = SPACE_RUN.replace_all(&filtered, " ").trim().to_string();
    }

    filtered
}

/// Removes script and style blocks with their contents, then every tag.
///
/// A `<` that never closes into a tag survives as `&lt;`.
fn strip_all_tags(input: &str) -> String {
    let without_blocks = SCRIPT_BLOCK.replace_all(input, "");
    let without_blocks = STYLE_BLOCK.replace_all(&without_blocks, "");
    let without_tags = TAG.replace_all(&without_blocks, "");
    without_tags.replace('<', "&lt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_url_untouched() {
        assert_eq!(
            sanitize_text_field("https://safe.example/check"),
            "https://safe.example/check"
        );
    }

    #[test]
    fn test_strips_tags() {
        assert_eq!(sanitize_text_field("<em>hello</em> world"), "hello world");
    }

    #[test]
    fn test_strips_script_contents() {
        assert_eq!(
            sanitize_text_field("a<script>alert('x')</script>b"),
            "ab"
        );
        assert_eq!(sanitize_text_field("a<STYLE>p{}</STYLE>b"), "ab");
    }

    #[test]
    fn test_lone_less_than_escaped() {
        assert_eq!(sanitize_text_field("1 < 2"), "1 &lt; 2");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(sanitize_text_field("  a \n\t b   c "), "a b c");
    }

    #[test]
    fn test_removes_control_characters() {
        assert_eq!(sanitize_text_field("a\u{0}b\u{7}c"), "abc");
    }

    #[test]
    fn test_removes_percent_octets() {
        assert_eq!(sanitize_text_field("a%20b"), "ab");
        assert_eq!(sanitize_text_field("x %25%41 y"), "x y");
    }

    #[test]
    fn test_comma_list_survives() {
        assert_eq!(
            sanitize_text_field("https://a.test/,https://b.test/"),
            "https://a.test/,https://b.test/"
        );
    }
}
