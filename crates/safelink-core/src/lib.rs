//! Safe Link Checker core.
//!
//! Rewrites external links in rendered article bodies so they pass through a
//! safe check redirector, and keeps the small amount of state the add-on
//! needs:
//!
//! - [`rewriter`] - the link rewriting pass
//! - [`settings`] / [`store`] - redirect URL, whitelist and notice flag on top
//!   of a generic option store
//! - [`plugin`] - lifecycle entry points called by the host
//! - [`hooks`] - named filter registry the host runs on render
//! - [`nonce`], [`sanitize`] - settings form protection and input cleaning
//! - [`notice`], [`admin`] - one-shot welcome notice and settings page markup
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use safelink_core::hooks::{HookRegistry, RenderContext, THE_CONTENT};
//! use safelink_core::{MemoryOptionStore, PluginHooks, SafeLinkChecker};
//!
//! let plugin = Arc::new(SafeLinkChecker::new(Arc::new(MemoryOptionStore::new())));
//! let mut registry = HookRegistry::new();
//! plugin.activate(&mut registry);
//!
//! let ctx = RenderContext::new("mysite.test");
//! let html = registry.apply_filters(THE_CONTENT, r#"<a href="https://mysite.test/">home</a>"#, &ctx);
//! assert_eq!(html, r#"<a href="https://mysite.test/">home</a>"#);
//!
//! plugin.on_deactivate(&mut registry);
//! ```

pub mod admin;
pub mod error;
pub mod hooks;
pub mod nonce;
pub mod notice;
pub mod plugin;
pub mod rewriter;
pub mod sanitize;
pub mod settings;
pub mod store;

pub use error::{CoreError, Result};
pub use notice::{Notice, NoticeKind};
pub use plugin::{PluginHooks, SafeLinkChecker, SaveOutcome, ADMIN_API_ACTION, SAVE_ACTION};
pub use rewriter::{rewrite, rewrite_with_report, LinkDecision, RewriteReport};
pub use settings::{Settings, SettingsForm, DEFAULT_REDIRECT_URL};
pub use store::{MemoryOptionStore, OptionStore};
