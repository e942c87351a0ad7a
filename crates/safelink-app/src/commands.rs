//! Offline commands run against the option store.

use std::path::Path;

use anyhow::{Context, Result};
use safelink_core::rewriter::{self, RewriteReport};
use safelink_core::sanitize::sanitize_text_field;
use safelink_core::settings::{OPTION_URL, OPTION_WHITELIST};
use safelink_core::{OptionStore, Settings};
use safelink_storage::Database;
use tracing::info;

/// Opens the database at `path`, or the default location.
pub fn open_database(path: Option<&Path>) -> Result<Database> {
    let db = match path {
        Some(path) => Database::with_path(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?,
        None => Database::new().context("failed to open default database")?,
    };
    Ok(db)
}

/// Rewrites one document with the stored settings.
pub fn rewrite_document<S: OptionStore + ?Sized>(
    store: &S,
    input: &str,
    site_host: &str,
) -> Result<RewriteReport> {
    let settings = Settings::load(store).context("failed to load settings")?;
    let report = rewriter::rewrite_with_report(input, &settings, site_host);

    info!(
        rewritten = report.rewritten,
        internal = report.internal,
        whitelisted = report.whitelisted,
        "Rewrote document"
    );

    Ok(report)
}

/// Current settings as pretty JSON.
pub fn show_config<S: OptionStore + ?Sized>(store: &S) -> Result<String> {
    let settings = Settings::load(store).context("failed to load settings")?;
    Ok(serde_json::to_string_pretty(&settings)?)
}

/// Stores a new redirect URL. Returns the value actually stored.
pub fn set_redirect_url<S: OptionStore + ?Sized>(store: &S, url: &str) -> Result<String> {
    let cleaned = sanitize_text_field(url);
    store
        .set_option(OPTION_URL, &cleaned)
        .context("failed to store redirect URL")?;
    info!(url = %cleaned, "Redirect URL updated");
    Ok(cleaned)
}

/// Stores a new comma-separated whitelist. Returns the parsed entries.
pub fn set_whitelist<S: OptionStore + ?Sized>(store: &S, raw: &str) -> Result<Vec<String>> {
    let cleaned = sanitize_text_field(raw);
    store
        .set_option(OPTION_WHITELIST, &cleaned)
        .context("failed to store whitelist")?;
    let entries = safelink_core::settings::parse_whitelist(&cleaned);
    info!(entries = entries.len(), "Whitelist updated");
    Ok(entries)
}
