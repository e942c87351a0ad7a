//! Admin notices.
//!
//! The welcome notice is a one-shot: the first check returns it and records
//! [`OPTION_NOTICE_SHOWN`] in the store, every later check returns nothing.
//! Nothing here resets the flag; only deleting the stored option does.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::settings::{parse_flag, OPTION_NOTICE_SHOWN};
use crate::store::OptionStore;

/// Text of the one-time welcome notice.
pub const WELCOME_MESSAGE: &str = "Thanks for installing Safe Link Checker! \
Open Safe Link Checker in the admin menu to set your safe check URL. \
External links in your posts are routed through it from now on.";

/// Visual level of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeKind {
    /// CSS class used by the admin stylesheet.
    pub fn css_class(&self) -> &'static str {
        match self {
            NoticeKind::Info => "notice-info",
            NoticeKind::Success => "notice-success",
            NoticeKind::Warning => "notice-warning",
            NoticeKind::Error => "notice-error",
        }
    }
}

/// A message shown at the top of admin pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub dismissible: bool,
}

impl Notice {
    /// Creates a dismissible notice.
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            dismissible: true,
        }
    }

    /// The one-time welcome notice.
    pub fn welcome() -> Self {
        Self::new(NoticeKind::Info, WELCOME_MESSAGE)
    }
}

/// Returns the welcome notice the first time it is called against `store`.
///
/// The flag is claimed with [`OptionStore::add_option`], so concurrent first
/// admin page loads hand the notice to exactly one of them.
pub fn maybe_show_welcome_notice<S: OptionStore + ?Sized>(store: &S) -> Result<Option<Notice>> {
    if !store.add_option(OPTION_NOTICE_SHOWN, "1")? {
        let shown = store
            .get_option(OPTION_NOTICE_SHOWN)?
            .is_some_and(|raw| parse_flag(&raw));
        if shown {
            return Ok(None);
        }

        // A falsy value written from outside still counts as not shown.
        store.set_option(OPTION_NOTICE_SHOWN, "1")?;
    }

    info!("Showing welcome notice");
    Ok(Some(Notice::welcome()))
}
