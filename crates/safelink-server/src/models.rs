//! API request and response models.

use safelink_core::{Notice, Settings, SettingsForm};
use serde::{Deserialize, Serialize};

/// Request body for POST /api/render.
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    /// Rendered article body.
    pub content: String,
    /// Site host to treat as internal (defaults to the server's).
    pub site_host: Option<String>,
}

/// Response body for POST /api/render.
#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub content: String,
}

/// Response body for GET /api/settings.
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub redirect_url: String,
    pub whitelist: Vec<String>,
    pub notice_shown: bool,
    /// Whether the render filter is registered.
    pub active: bool,
    /// Nonce the admin API calls must carry as `_wpnonce`.
    pub admin_nonce: String,
}

impl SettingsResponse {
    pub fn new(settings: Settings, active: bool, admin_nonce: String) -> Self {
        Self {
            redirect_url: settings.redirect_url,
            whitelist: settings.whitelist,
            notice_shown: settings.notice_shown,
            active,
            admin_nonce,
        }
    }
}

/// Query parameters carried by the admin API calls.
#[derive(Debug, Default, Deserialize)]
pub struct AdminNonceQuery {
    #[serde(rename = "_wpnonce", default)]
    pub nonce: String,
}

/// Response body for POST /api/notices.
#[derive(Debug, Serialize)]
pub struct NoticesResponse {
    pub notice: Option<Notice>,
}

/// Response body for POST /api/activate and POST /api/deactivate.
#[derive(Debug, Serialize)]
pub struct LifecycleResponse {
    /// Whether the call changed anything.
    pub changed: bool,
    pub active: bool,
}

/// Query parameters for GET /admin/settings.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsPageQuery {
    #[serde(rename = "settings-updated")]
    pub settings_updated: Option<bool>,
}

/// Form body for POST /admin/post.
#[derive(Debug, Deserialize)]
pub struct AdminPostForm {
    #[serde(default)]
    pub action: String,
    #[serde(rename = "_wpnonce", default)]
    pub nonce: String,
    #[serde(rename = "safe_link_checker_url")]
    pub redirect_url: Option<String>,
    #[serde(rename = "safe_link_checker_whitelist")]
    pub whitelist: Option<String>,
}

impl AdminPostForm {
    /// The settings fields of the submission.
    pub fn settings_form(&self) -> SettingsForm {
        SettingsForm {
            redirect_url: self.redirect_url.clone(),
            whitelist: self.whitelist.clone(),
        }
    }
}
