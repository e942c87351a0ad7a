//! Plugin lifecycle.
//!
//! The host drives everything through [`PluginHooks`]. [`SafeLinkChecker`]
//! implements it over any [`OptionStore`] and never holds a reference back
//! to the host; the only thing it leaves behind in the host is the render
//! filter registered by [`SafeLinkChecker::activate`].

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::hooks::{FilterId, HookRegistry, DEFAULT_PRIORITY, THE_CONTENT};
use crate::nonce::NonceIssuer;
use crate::notice::{self, Notice};
use crate::rewriter;
use crate::sanitize::sanitize_text_field;
use crate::settings::{Settings, SettingsForm, OPTION_URL, OPTION_WHITELIST};
use crate::store::OptionStore;

/// Form action name the settings page posts to.
pub const SAVE_ACTION: &str = "save_safe_link_checker_settings";

/// Nonce action for the admin API calls (activation, deactivation, notices).
pub const ADMIN_API_ACTION: &str = "safe_link_checker_admin_api";

/// What happened to a settings submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    /// Nonce accepted; `fields_written` options were updated.
    Saved { fields_written: usize },
    /// Nonce rejected; nothing was written.
    Rejected,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

/// Entry points the host calls.
pub trait PluginHooks {
    /// Content filter: returns the rendered body with external links rewritten.
    fn on_render(&self, content: &str, site_host: &str) -> String;

    /// Settings form submission.
    ///
    /// A rejected nonce is not an error: the write is skipped and the
    /// outcome says so.
    fn on_save(&self, form: &SettingsForm, nonce: &str) -> Result<SaveOutcome>;

    /// Deactivation: unregisters the render filter. Returns whether one was
    /// registered.
    fn on_deactivate(&self, registry: &mut HookRegistry) -> bool;

    /// Admin notice rendering: the one-shot welcome notice, if still due.
    fn on_admin_notices(&self) -> Result<Option<Notice>>;
}

/// The link checker plugin.
#[derive(Debug)]
pub struct SafeLinkChecker<S> {
    store: Arc<S>,
    nonces: NonceIssuer,
    filter_id: Mutex<Option<FilterId>>,
}

impl<S> SafeLinkChecker<S>
where
    S: OptionStore + Send + Sync + 'static,
{
    /// Creates the plugin with a fresh nonce secret.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_nonce_issuer(store, NonceIssuer::new())
    }

    /// Creates the plugin with a given nonce issuer.
    pub fn with_nonce_issuer(store: Arc<S>, nonces: NonceIssuer) -> Self {
        Self {
            store,
            nonces,
            filter_id: Mutex::new(None),
        }
    }

    /// The backing option store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current settings with defaults applied.
    pub fn settings(&self) -> Result<Settings> {
        Settings::load(self.store.as_ref())
    }

    /// A nonce for the settings form.
    pub fn settings_nonce(&self) -> String {
        self.nonces.create(SAVE_ACTION)
    }

    /// A nonce for the admin API calls.
    pub fn admin_nonce(&self) -> String {
        self.nonces.create(ADMIN_API_ACTION)
    }

    /// Checks a nonce for the admin API calls.
    pub fn verify_admin_nonce(&self, nonce: &str) -> bool {
        let valid = self.nonces.verify(ADMIN_API_ACTION, nonce).is_valid();
        if !valid {
            warn!("Admin API nonce rejected");
        }
        valid
    }

    /// Registers the render filter on [`THE_CONTENT`].
    ///
    /// Activating twice keeps the existing registration.
    pub fn activate(self: &Arc<Self>, registry: &mut HookRegistry) -> FilterId {
        let mut slot = self.filter_id.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = *slot {
            return id;
        }

        let plugin = Arc::clone(self);
        let id = registry.add_filter(THE_CONTENT, DEFAULT_PRIORITY, move |content, ctx| {
            plugin.on_render(content, &ctx.site_host)
        });
        *slot = Some(id);

        info!(?id, "Safe Link Checker activated");
        id
    }

    /// Whether the render filter is currently registered.
    pub fn is_active(&self) -> bool {
        self.filter_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Validates the nonce and stores each submitted field.
    pub fn save_settings(&self, form: &SettingsForm, nonce: &str) -> Result<SaveOutcome> {
        if !self.nonces.verify(SAVE_ACTION, nonce).is_valid() {
            warn!("Settings nonce rejected, discarding submission");
            return Ok(SaveOutcome::Rejected);
        }

        let mut fields_written = 0;

        if let Some(url) = &form.redirect_url {
            self.store.set_option(OPTION_URL, &sanitize_text_field(url))?;
            fields_written += 1;
        }

        if let Some(whitelist) = &form.whitelist {
            self.store
                .set_option(OPTION_WHITELIST, &sanitize_text_field(whitelist))?;
            fields_written += 1;
        }

        info!(fields_written, "Settings saved");
        Ok(SaveOutcome::Saved { fields_written })
    }
}

impl<S> PluginHooks for SafeLinkChecker<S>
where
    S: OptionStore + Send + Sync + 'static,
{
    fn on_render(&self, content: &str, site_host: &str) -> String {
        match self.settings() {
            Ok(settings) => rewriter::rewrite(content, &settings, site_host),
            Err(e) => {
                warn!("Could not load settings, leaving content unchanged: {}", e);
                content.to_string()
            }
        }
    }

    fn on_save(&self, form: &SettingsForm, nonce: &str) -> Result<SaveOutcome> {
        self.save_settings(form, nonce)
    }

    fn on_deactivate(&self, registry: &mut HookRegistry) -> bool {
        let taken = self
            .filter_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match taken {
            Some(id) => {
                let removed = registry.remove_filter(THE_CONTENT, id);
                info!(?id, removed, "Safe Link Checker deactivated");
                removed
            }
            None => false,
        }
    }

    fn on_admin_notices(&self) -> Result<Option<Notice>> {
        notice::maybe_show_welcome_notice(self.store.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::hooks::RenderContext;
    use crate::settings::{DEFAULT_REDIRECT_URL, OPTION_NOTICE_SHOWN};
    use crate::store::MemoryOptionStore;

    fn plugin() -> Arc<SafeLinkChecker<MemoryOptionStore>> {
        Arc::new(SafeLinkChecker::with_nonce_issuer(
            Arc::new(MemoryOptionStore::new()),
            NonceIssuer::with_secret([5; 32]),
        ))
    }

    #[test]
    fn test_render_uses_stored_settings() {
        let plugin = plugin();
        plugin
            .store()
            .set_option(OPTION_URL, "https://safe.example/check")
            .unwrap();

        let output = plugin.on_render(r#"<a href="https://other.test/">x</a>"#, "mysite.test");
        assert_eq!(
            output,
            r#"<a href="https://safe.example/check?url=https%3A%2F%2Fother.test%2F">x</a>"#
        );
    }

    #[test]
    fn test_render_defaults_redirect_url() {
        let plugin = plugin();
        let output = plugin.on_render(r#"<a href="https://other.test/">x</a>"#, "mysite.test");
        assert!(output.contains(&format!("{}?url=", DEFAULT_REDIRECT_URL)));
    }

    #[test]
    fn test_save_with_valid_nonce() {
        let plugin = plugin();
        let nonce = plugin.settings_nonce();

        let form = SettingsForm {
            redirect_url: Some(" <b>https://safe.example/check</b> ".to_string()),
            whitelist: Some("https://mysite.test/a,https://mysite.test/b".to_string()),
        };
        let outcome = plugin.save_settings(&form, &nonce).unwrap();
        assert_eq!(outcome, SaveOutcome::Saved { fields_written: 2 });

        let settings = plugin.settings().unwrap();
        assert_eq!(settings.redirect_url, "https://safe.example/check");
        assert_eq!(
            settings.whitelist,
            vec!["https://mysite.test/a", "https://mysite.test/b"]
        );
    }

    #[test]
    fn test_save_with_invalid_nonce_is_silent() {
        let plugin = plugin();
        plugin
            .store()
            .set_option(OPTION_URL, "https://original.example")
            .unwrap();

        let outcome = plugin
            .on_save(&SettingsForm::redirect_url("https://evil.example"), "bogus")
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Rejected);
        assert!(!outcome.is_saved());

        let settings = plugin.settings().unwrap();
        assert_eq!(settings.redirect_url, "https://original.example");
    }

    #[test]
    fn test_missing_field_left_untouched() {
        let plugin = plugin();
        plugin.store().set_option(OPTION_WHITELIST, "keep").unwrap();

        let nonce = plugin.settings_nonce();
        let outcome = plugin
            .save_settings(&SettingsForm::redirect_url("https://new.example"), &nonce)
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Saved { fields_written: 1 });

        let settings = plugin.settings().unwrap();
        assert_eq!(settings.redirect_url, "https://new.example");
        assert_eq!(settings.whitelist, vec!["keep"]);
    }

    #[test]
    fn test_activate_and_deactivate() {
        let plugin = plugin();
        let mut registry = HookRegistry::new();
        let ctx = RenderContext::new("mysite.test");
        let html = r#"<a href="https://other.test/">x</a>"#;

        let id = plugin.activate(&mut registry);
        assert_eq!(plugin.activate(&mut registry), id);
        assert_eq!(registry.filter_count(THE_CONTENT), 1);
        assert!(plugin.is_active());
        assert_ne!(registry.apply_filters(THE_CONTENT, html, &ctx), html);

        assert!(plugin.on_deactivate(&mut registry));
        assert!(!plugin.is_active());
        assert_eq!(registry.apply_filters(THE_CONTENT, html, &ctx), html);

        assert!(!plugin.on_deactivate(&mut registry));
    }

    #[test]
    fn test_admin_notice_once() {
        let plugin = plugin();

        assert!(plugin.on_admin_notices().unwrap().is_some());
        assert!(plugin.on_admin_notices().unwrap().is_none());
        assert!(plugin.settings().unwrap().notice_shown);
        assert_eq!(
            plugin.store().get_option(OPTION_NOTICE_SHOWN).unwrap().as_deref(),
            Some("1")
        );
    }

    #[test]
    fn test_admin_nonce_separate_from_save_nonce() {
        let plugin = plugin();

        assert!(plugin.verify_admin_nonce(&plugin.admin_nonce()));
        assert!(!plugin.verify_admin_nonce(&plugin.settings_nonce()));
        assert!(!plugin.verify_admin_nonce(""));

        let outcome = plugin
            .save_settings(&SettingsForm::redirect_url("https://x.test"), &plugin.admin_nonce())
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Rejected);
    }

    struct FailingStore;

    #[derive(Debug, thiserror::Error)]
    #[error("disk on fire")]
    struct Boom;

    impl OptionStore for FailingStore {
        fn get_option(&self, _name: &str) -> Result<Option<String>> {
            Err(CoreError::store(Boom))
        }

        fn set_option(&self, _name: &str, _value: &str) -> Result<()> {
            Err(CoreError::store(Boom))
        }

        fn add_option(&self, _name: &str, _value: &str) -> Result<bool> {
            Err(CoreError::store(Boom))
        }

        fn delete_option(&self, _name: &str) -> Result<bool> {
            Err(CoreError::store(Boom))
        }
    }

    #[test]
    fn test_render_survives_store_failure() {
        let plugin = SafeLinkChecker::new(Arc::new(FailingStore));
        let html = r#"<a href="https://other.test/">x</a>"#;
        assert_eq!(plugin.on_render(html, "mysite.test"), html);
    }

    #[test]
    fn test_save_propagates_store_failure() {
        let plugin = SafeLinkChecker::new(Arc::new(FailingStore));
        let nonce = plugin.settings_nonce();
        let err = plugin
            .save_settings(&SettingsForm::redirect_url("https://x.test"), &nonce)
            .unwrap_err();
        assert!(err.to_string().contains("disk on fire"));
    }
}
