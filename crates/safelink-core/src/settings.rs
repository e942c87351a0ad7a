//! Persisted settings and the admin form that edits them.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::OptionStore;

/// Option holding the safe check redirector URL.
pub const OPTION_URL: &str = "safe_link_checker_url";

/// Option holding the comma-joined whitelist.
pub const OPTION_WHITELIST: &str = "safe_link_checker_whitelist";

/// Option recording that the welcome notice has been shown.
pub const OPTION_NOTICE_SHOWN: &str = "safe_link_checker_notice_shown";

/// Redirector used until an administrator configures one.
pub const DEFAULT_REDIRECT_URL: &str = "https://510208.github.io/safecheck";

/// Current link checker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL every external link is routed through.
    pub redirect_url: String,
    /// Exact URL strings exempted from rewriting, in stored order.
    pub whitelist: Vec<String>,
    /// Whether the one-time welcome notice has already been shown.
    pub notice_shown: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            whitelist: Vec::new(),
            notice_shown: false,
        }
    }
}

impl Settings {
    /// Reads all settings from the store, defaulting anything absent.
    ///
    /// An empty stored redirect URL also falls back to the default so the
    /// rewriter never produces a relative `?url=` link.
    pub fn load<S: OptionStore + ?Sized>(store: &S) -> Result<Self> {
        let redirect_url = match store.get_option(OPTION_URL)? {
            Some(url) if !url.is_empty() => url,
            _ => DEFAULT_REDIRECT_URL.to_string(),
        };

        let whitelist = store
            .get_option(OPTION_WHITELIST)?
            .map(|raw| parse_whitelist(&raw))
            .unwrap_or_default();

        let notice_shown = store
            .get_option(OPTION_NOTICE_SHOWN)?
            .is_some_and(|raw| parse_flag(&raw));

        Ok(Self {
            redirect_url,
            whitelist,
            notice_shown,
        })
    }

    /// Sets the redirect URL.
    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = url.into();
        self
    }

    /// Replaces the whitelist.
    pub fn with_whitelist<I, T>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.whitelist = entries.into_iter().map(Into::into).collect();
        self
    }

    /// Whitelist as the comma-joined string it is stored as.
    pub fn whitelist_string(&self) -> String {
        self.whitelist.join(",")
    }

    /// Exact string membership; no host or path normalization.
    pub fn is_whitelisted(&self, url: &str) -> bool {
        self.whitelist.iter().any(|entry| entry == url)
    }
}

/// Splits a stored whitelist on commas.
///
/// Entries are kept verbatim: no trimming, no dedup.
pub fn parse_whitelist(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(str::to_string).collect()
}

/// Interprets a boolean-like option value.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Fields submitted by the settings form.
///
/// A field left out of the submission keeps its stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsForm {
    #[serde(rename = "safe_link_checker_url", default)]
    pub redirect_url: Option<String>,
    #[serde(rename = "safe_link_checker_whitelist", default)]
    pub whitelist: Option<String>,
}

impl SettingsForm {
    /// Form that only updates the redirect URL.
    pub fn redirect_url(url: impl Into<String>) -> Self {
        Self {
            redirect_url: Some(url.into()),
            whitelist: None,
        }
    }

    /// Form that only updates the whitelist.
    pub fn whitelist(raw: impl Into<String>) -> Self {
        Self {
            redirect_url: None,
            whitelist: Some(raw.into()),
        }
    }
}
