//! Outbound link rewriting.
//!
//! Scans rendered HTML for opening anchor tags whose `href` is an absolute
//! `http`/`https` URL and routes external ones through the safe check
//! redirector:
//!
//! ```
//! use safelink_core::rewriter::rewrite;
//! use safelink_core::Settings;
//!
//! let settings = Settings::default().with_redirect_url("https://safe.example/check");
//! let html = r#"<a href="https://external.example/page">x</a>"#;
//!
//! assert_eq!(
//!     rewrite(html, &settings, "mysite.test"),
//!     r#"<a href="https://safe.example/check?url=https%3A%2F%2Fexternal.example%2Fpage">x</a>"#
//! );
//! ```
//!
//! Closing tags, inner text and anything that does not match the anchor
//! pattern pass through untouched.

use std::net::Ipv6Addr;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::debug;
use url::{Host, Url};

use crate::settings::Settings;

/// Opening `<a ... href="http(s)://...">` tag. Attributes before and after the
/// href are captured lazily and reproduced verbatim.
static ANCHOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<a(.*?)href=["'](https?://[^"']+)["'](.*?)>"#)
        .expect("anchor pattern is a valid regex")
});

/// How a single matched link is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDecision {
    /// Internal host and listed verbatim in the whitelist.
    ///
    /// Dead logic: every such link is also [`LinkDecision::Internal`], so the
    /// whitelist never changes the outcome. Kept so the stored whitelist
    /// keeps its documented meaning.
    WhitelistedInternal,
    /// Host equals the current site host.
    Internal,
    /// Anything else, including URLs without a parseable host.
    External,
}

impl LinkDecision {
    /// Whether the anchor gets rewritten.
    pub fn is_rewritten(&self) -> bool {
        matches!(self, LinkDecision::External)
    }
}

/// Counts produced by one rewrite pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
    /// The transformed content.
    #[serde(skip)]
    pub content: String,
    /// Anchors routed through the redirector.
    pub rewritten: usize,
    /// Anchors left alone as internal links.
    pub internal: usize,
    /// Anchors left alone through the whitelist branch.
    pub whitelisted: usize,
}

impl RewriteReport {
    /// Total anchors the pattern matched.
    pub fn matched(&self) -> usize {
        self.rewritten + self.internal + self.whitelisted
    }
}

/// Rewrites every external anchor in `content`.
///
/// Never fails: malformed markup is simply not matched.
pub fn rewrite(content: &str, settings: &Settings, site_host: &str) -> String {
    rewrite_with_report(content, settings, site_host).content
}

/// Same as [`rewrite`], also counting what happened to each anchor.
pub fn rewrite_with_report(content: &str, settings: &Settings, site_host: &str) -> RewriteReport {
    let mut report = RewriteReport::default();
    let site_host = normalize_host(site_host);

    let output = ANCHOR_PATTERN.replace_all(content, |caps: &Captures<'_>| {
        let url = &caps[2];

        match classify_normalized(url, settings, &site_host) {
            LinkDecision::WhitelistedInternal => {
                report.whitelisted += 1;
                caps[0].to_string()
            }
            LinkDecision::Internal => {
                report.internal += 1;
                caps[0].to_string()
            }
            LinkDecision::External => {
                report.rewritten += 1;
                format!(
                    "<a{}href=\"{}\"{}>",
                    &caps[1],
                    safe_check_href(&settings.redirect_url, url),
                    &caps[3]
                )
            }
        }
    });

    report.content = output.into_owned();

    debug!(
        matched = report.matched(),
        rewritten = report.rewritten,
        internal = report.internal,
        whitelisted = report.whitelisted,
        "Rewrote content links"
    );

    report
}

/// Decides how a matched URL is handled.
pub fn classify_link(url: &str, settings: &Settings, site_host: &str) -> LinkDecision {
    classify_normalized(url, settings, &normalize_host(site_host))
}

fn classify_normalized(url: &str, settings: &Settings, site_host: &str) -> LinkDecision {
    let is_internal = link_host(url).is_some_and(|host| host.eq_ignore_ascii_case(site_host));

    if is_internal && settings.is_whitelisted(url) {
        LinkDecision::WhitelistedInternal
    } else if is_internal {
        LinkDecision::Internal
    } else {
        LinkDecision::External
    }
}

/// Host component of `url`, without port.
pub fn link_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}

/// Puts a configured site host into the form [`link_host`] reports.
///
/// Internationalized names become punycode and IPv6 addresses get brackets,
/// so `bücher.test` and `::1` compare equal to what a parsed link yields.
/// Anything the URL host parser rejects (such as `host:port`) is only
/// lowercased.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();

    if let Ok(addr) = host.parse::<Ipv6Addr>() {
        return Host::<String>::Ipv6(addr).to_string();
    }

    match Host::parse(host) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => host.to_ascii_lowercase(),
    }
}

/// `<redirect_url>?url=<percent-encoded original>`, escaped for a
/// double-quoted attribute.
pub fn safe_check_href(redirect_url: &str, original: &str) -> String {
    let target = format!("{}?url={}", redirect_url, urlencoding::encode(original));
    html_escape::encode_double_quoted_attribute(&target).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "mysite.test";

    fn settings() -> Settings {
        Settings::default().with_redirect_url("https://safe.example/check")
    }

    #[test]
    fn test_external_link_rewritten() {
        let html = r#"<a href="https://external.example/page">x</a>"#;
        assert_eq!(
            rewrite(html, &settings(), SITE),
            r#"<a href="https://safe.example/check?url=https%3A%2F%2Fexternal.example%2Fpage">x</a>"#
        );
    }

    #[test]
    fn test_internal_link_unchanged() {
        let html = r#"<a href="https://mysite.test/about">x</a>"#;
        assert_eq!(rewrite(html, &settings(), SITE), html);
    }

    #[test]
    fn test_internal_link_with_port_unchanged() {
        let html = r#"<a href="http://mysite.test:8080/about">x</a>"#;
        assert_eq!(rewrite(html, &settings(), SITE), html);
    }

    #[test]
    fn test_host_comparison_ignores_case() {
        let html = r#"<a href="https://MySite.Test/about">x</a>"#;
        assert_eq!(rewrite(html, &settings(), SITE), html);
    }

    #[test]
    fn test_whitelisted_internal_link_unchanged() {
        let settings = settings().with_whitelist(["https://mysite.test/about"]);
        let html = r#"<a href="https://mysite.test/about">x</a>"#;

        let report = rewrite_with_report(html, &settings, SITE);
        assert_eq!(report.content, html);
        assert_eq!(report.whitelisted, 1);
        assert_eq!(report.internal, 0);
    }

    #[test]
    fn test_whitelist_does_not_exempt_external_hosts() {
        let settings = settings().with_whitelist(["https://external.example/page"]);
        let html = r#"<a href="https://external.example/page">x</a>"#;

        let output = rewrite(html, &settings, SITE);
        assert!(output.contains("https://safe.example/check?url="));
    }

    #[test]
    fn test_attributes_preserved() {
        let html = r#"<a class="btn" target="_blank" href="http://other.test/?q=1&r=2" rel="nofollow">go</a>"#;
        assert_eq!(
            rewrite(html, &settings(), SITE),
            r#"<a class="btn" target="_blank" href="https://safe.example/check?url=http%3A%2F%2Fother.test%2F%3Fq%3D1%26r%3D2" rel="nofollow">go</a>"#
        );
    }

    #[test]
    fn test_single_quotes_normalized() {
        let html = "<a href='https://other.test/'>x</a>";
        assert_eq!(
            rewrite(html, &settings(), SITE),
            r#"<a href="https://safe.example/check?url=https%3A%2F%2Fother.test%2F">x</a>"#
        );
    }

    #[test]
    fn test_case_insensitive_tag_and_scheme() {
        let html = r#"<A HREF="HTTPS://other.test/">x</A>"#;
        let output = rewrite(html, &settings(), SITE);
        assert_eq!(
            output,
            r#"<a href="https://safe.example/check?url=HTTPS%3A%2F%2Fother.test%2F">x</A>"#
        );
    }

    #[test]
    fn test_relative_and_other_schemes_untouched() {
        let html = concat!(
            r#"<a href="/about">a</a>"#,
            r#"<a href="mailto:me@other.test">b</a>"#,
            r#"<a href="ftp://other.test/file">c</a>"#,
            r##"<a href="#top">d</a>"##,
        );
        assert_eq!(rewrite(html, &settings(), SITE), html);
    }

    #[test]
    fn test_no_anchors_unchanged() {
        let html = "<p>Plain paragraph with https://other.test/ in text.</p>";
        assert_eq!(rewrite(html, &settings(), SITE), html);
        assert_eq!(rewrite("", &settings(), SITE), "");
    }

    #[test]
    fn test_unparseable_host_treated_as_external() {
        let html = r#"<a href="http://exa mple">x</a>"#;
        let report = rewrite_with_report(html, &settings(), SITE);
        assert_eq!(report.rewritten, 1);
        assert!(report
            .content
            .starts_with(r#"<a href="https://safe.example/check?url=http%3A%2F%2Fexa%20mple""#));
    }

    #[test]
    fn test_mixed_links_left_to_right() {
        let html = concat!(
            r#"<p><a href="https://one.test/">1</a> "#,
            r#"<a href="https://mysite.test/two">2</a> "#,
            r#"<a href="https://three.test/">3</a></p>"#,
        );

        let report = rewrite_with_report(html, &settings(), SITE);
        assert_eq!(report.rewritten, 2);
        assert_eq!(report.internal, 1);
        assert_eq!(report.matched(), 3);
        assert_eq!(
            report.content,
            concat!(
                r#"<p><a href="https://safe.example/check?url=https%3A%2F%2Fone.test%2F">1</a> "#,
                r#"<a href="https://mysite.test/two">2</a> "#,
                r#"<a href="https://safe.example/check?url=https%3A%2F%2Fthree.test%2F">3</a></p>"#,
            )
        );
    }

    #[test]
    fn test_second_pass_rewrites_again() {
        let html = r#"<a href="https://external.example/page">x</a>"#;
        let once = rewrite(html, &settings(), SITE);
        let twice = rewrite(&once, &settings(), SITE);
        assert_ne!(once, twice);
    }

    #[test]
    fn test_redirect_url_escaped_in_attribute() {
        let settings = Settings::default().with_redirect_url(r#"https://safe.example/"x""#);
        let output = rewrite(r#"<a href="https://o.test/">x</a>"#, &settings, SITE);
        assert!(output.contains("https://safe.example/&quot;x&quot;?url="));
    }

    #[test]
    fn test_classify_link() {
        let settings = settings().with_whitelist(["https://mysite.test/a"]);
        assert_eq!(
            classify_link("https://mysite.test/a", &settings, SITE),
            LinkDecision::WhitelistedInternal
        );
        assert_eq!(
            classify_link("https://mysite.test/b", &settings, SITE),
            LinkDecision::Internal
        );
        assert_eq!(
            classify_link("https://elsewhere.test/a", &settings, SITE),
            LinkDecision::External
        );
        assert!(LinkDecision::External.is_rewritten());
        assert!(!LinkDecision::Internal.is_rewritten());
    }

    #[test]
    fn test_link_host() {
        assert_eq!(link_host("https://a.test:443/x").as_deref(), Some("a.test"));
        assert_eq!(link_host("not a url"), None);
    }

    #[test]
    fn test_internationalized_site_host() {
        let html = r#"<a href="https://bücher.test/katalog">x</a>"#;
        assert_eq!(rewrite(html, &settings(), "bücher.test"), html);
        assert_eq!(rewrite(html, &settings(), "xn--bcher-kva.test"), html);
        assert_ne!(rewrite(html, &settings(), SITE), html);
    }

    #[test]
    fn test_ipv6_site_host() {
        let html = r#"<a href="http://[::1]:8080/about">x</a>"#;
        assert_eq!(rewrite(html, &settings(), "::1"), html);
        assert_eq!(rewrite(html, &settings(), "[::1]"), html);
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("MySite.Test"), "mysite.test");
        assert_eq!(normalize_host("bücher.test"), "xn--bcher-kva.test");
        assert_eq!(normalize_host("::1"), "[::1]");
        assert_eq!(normalize_host("127.0.0.1"), "127.0.0.1");
        assert_eq!(normalize_host("MySite.Test:8080"), "mysite.test:8080");
    }
}
