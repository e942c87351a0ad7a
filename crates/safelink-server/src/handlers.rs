//! Route handlers.

use axum::extract::{Query, State};
use axum::response::{Html, Redirect};
use axum::{Form, Json};
use tracing::{debug, info};

use safelink_core::admin::SettingsPage;
use safelink_core::hooks::{RenderContext, THE_CONTENT};
use safelink_core::{PluginHooks, SAVE_ACTION};

use crate::error::{ApiError, Result};
use crate::models::{
    AdminNonceQuery, AdminPostForm, LifecycleResponse, NoticesResponse, RenderRequest,
    RenderResponse, SettingsPageQuery, SettingsResponse,
};
use crate::state::AppState;

/// Path of the settings page.
pub const SETTINGS_PAGE_PATH: &str = "/admin/settings";

/// Path the settings form posts to.
pub const ADMIN_POST_PATH: &str = "/admin/post";

/// POST /api/render - Run the content filters over a rendered body.
pub async fn render_content(
    State(state): State<AppState>,
    Json(req): Json<RenderRequest>,
) -> Result<Json<RenderResponse>> {
    let ctx = RenderContext::new(req.site_host.unwrap_or_else(|| state.site_host.clone()));

    let content = {
        let hooks = state
            .hooks
            .read()
            .map_err(|_| ApiError::Internal("hook registry lock poisoned".to_string()))?;
        hooks.apply_filters(THE_CONTENT, &req.content, &ctx)
    };

    debug!(
        site_host = %ctx.site_host,
        input_len = req.content.len(),
        output_len = content.len(),
        "Rendered content"
    );

    Ok(Json(RenderResponse { content }))
}

/// GET /api/settings - Current settings.
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<SettingsResponse>> {
    let settings = state.plugin.settings()?;
    Ok(Json(SettingsResponse::new(
        settings,
        state.plugin.is_active(),
        state.plugin.admin_nonce(),
    )))
}

fn require_admin_nonce(state: &AppState, query: &AdminNonceQuery) -> Result<()> {
    if state.plugin.verify_admin_nonce(&query.nonce) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("invalid or missing nonce".to_string()))
    }
}

/// POST /api/notices - The one-shot welcome notice, if still due.
pub async fn take_notices(
    State(state): State<AppState>,
    Query(query): Query<AdminNonceQuery>,
) -> Result<Json<NoticesResponse>> {
    require_admin_nonce(&state, &query)?;

    let notice = state.plugin.on_admin_notices()?;
    Ok(Json(NoticesResponse { notice }))
}

/// POST /api/activate - Register the render filter again.
pub async fn activate(
    State(state): State<AppState>,
    Query(query): Query<AdminNonceQuery>,
) -> Result<Json<LifecycleResponse>> {
    require_admin_nonce(&state, &query)?;
    let was_active = state.plugin.is_active();

    {
        let mut hooks = state
            .hooks
            .write()
            .map_err(|_| ApiError::Internal("hook registry lock poisoned".to_string()))?;
        state.plugin.activate(&mut hooks);
    }

    Ok(Json(LifecycleResponse {
        changed: !was_active,
        active: true,
    }))
}

/// POST /api/deactivate - Unregister the render filter.
pub async fn deactivate(
    State(state): State<AppState>,
    Query(query): Query<AdminNonceQuery>,
) -> Result<Json<LifecycleResponse>> {
    require_admin_nonce(&state, &query)?;

    let changed = {
        let mut hooks = state
            .hooks
            .write()
            .map_err(|_| ApiError::Internal("hook registry lock poisoned".to_string()))?;
        state.plugin.on_deactivate(&mut hooks)
    };

    Ok(Json(LifecycleResponse {
        changed,
        active: state.plugin.is_active(),
    }))
}

/// GET /admin/settings - The settings page.
pub async fn settings_page(
    State(state): State<AppState>,
    Query(query): Query<SettingsPageQuery>,
) -> Result<Html<String>> {
    let settings = state.plugin.settings()?;
    let notice = state.plugin.on_admin_notices()?;
    let nonce = state.plugin.settings_nonce();

    let page = SettingsPage {
        settings: &settings,
        nonce: &nonce,
        form_action: ADMIN_POST_PATH,
        notice: notice.as_ref(),
        updated: query.settings_updated,
    };

    Ok(Html(page.render()))
}

/// POST /admin/post - Form submissions, dispatched on `action`.
///
/// The save action always redirects back to the settings page; a rejected
/// nonce only shows up as `settings-updated=false`.
pub async fn admin_post(
    State(state): State<AppState>,
    Form(form): Form<AdminPostForm>,
) -> Result<Redirect> {
    match form.action.as_str() {
        SAVE_ACTION => {
            let outcome = state.plugin.on_save(&form.settings_form(), &form.nonce)?;
            info!(?outcome, "Settings form handled");

            Ok(Redirect::to(&format!(
                "{}?settings-updated={}",
                SETTINGS_PAGE_PATH,
                outcome.is_saved()
            )))
        }
        other => Err(ApiError::BadRequest(format!("unknown action: {}", other))),
    }
}
