//! Admin menu entry and settings page markup.

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Serialize;

use crate::notice::Notice;
use crate::plugin::SAVE_ACTION;
use crate::settings::{Settings, OPTION_URL, OPTION_WHITELIST};

/// An entry in the host's admin menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub page_title: &'static str,
    pub menu_title: &'static str,
    /// Capability a user needs to see the page.
    pub capability: &'static str,
    pub slug: &'static str,
}

/// The settings page menu entry.
pub const SETTINGS_MENU: MenuEntry = MenuEntry {
    page_title: "Safe Link Checker",
    menu_title: "Safe Link Checker",
    capability: "manage_options",
    slug: "safe-link-checker-settings",
};

/// Everything the settings page shows.
#[derive(Debug, Clone)]
pub struct SettingsPage<'a> {
    pub settings: &'a Settings,
    /// Nonce for [`SAVE_ACTION`].
    pub nonce: &'a str,
    /// URL the form posts to.
    pub form_action: &'a str,
    pub notice: Option<&'a Notice>,
    /// `Some(saved)` right after a submission.
    pub updated: Option<bool>,
}

impl SettingsPage<'_> {
    /// Renders the full HTML document.
    pub fn render(&self) -> String {
        let mut html = String::with_capacity(2048);

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!(
            "<title>{}</title>\n</head>\n<body>\n",
            encode_text(SETTINGS_MENU.page_title)
        ));
        html.push_str("<div class=\"wrap\">\n<h2>Safe Link Checker Settings</h2>\n");

        if let Some(notice) = self.notice {
            html.push_str(&render_notice(notice));
        }

        match self.updated {
            Some(true) => html.push_str(
                "<div class=\"notice notice-success is-dismissible\"><p>Settings saved.</p></div>\n",
            ),
            // Rejected submissions show nothing.
            Some(false) | None => {}
        }

        html.push_str(&format!(
            "<form method=\"post\" action=\"{}\">\n",
            encode_double_quoted_attribute(self.form_action)
        ));
        html.push_str(&format!(
            "<input type=\"hidden\" name=\"action\" value=\"{}\" />\n",
            SAVE_ACTION
        ));
        html.push_str(&format!(
            "<input type=\"hidden\" name=\"_wpnonce\" value=\"{}\" />\n",
            encode_double_quoted_attribute(self.nonce)
        ));

        html.push_str("<h3>Safe Link Checker Settings</h3>\n");
        html.push_str("<p>Configure your Safe Link Checker settings here.</p>\n");
        html.push_str("<table class=\"form-table\">\n");

        html.push_str(&format!(
            "<tr><th scope=\"row\"><label for=\"{name}\">Safe check URL</label></th>\
             <td><input type=\"text\" id=\"{name}\" name=\"{name}\" value=\"{value}\" /></td></tr>\n",
            name = OPTION_URL,
            value = encode_double_quoted_attribute(&self.settings.redirect_url),
        ));

        html.push_str(&format!(
            "<tr><th scope=\"row\"><label for=\"{name}\">Whitelist</label></th>\
             <td><textarea id=\"{name}\" name=\"{name}\" rows=\"5\" cols=\"50\">{value}</textarea>\
             <p class=\"description\">Comma-separated list of exact URLs that are never rewritten.</p></td></tr>\n",
            name = OPTION_WHITELIST,
            value = encode_text(&self.settings.whitelist_string()),
        ));

        html.push_str("</table>\n");
        html.push_str(
            "<p class=\"submit\"><input type=\"submit\" name=\"submit\" class=\"button button-primary\" value=\"Save Changes\" /></p>\n",
        );
        html.push_str("</form>\n</div>\n</body>\n</html>\n");

        html
    }
}

/// Markup for one admin notice.
pub fn render_notice(notice: &Notice) -> String {
    let dismissible = if notice.dismissible {
        " is-dismissible"
    } else {
        ""
    };

    format!(
        "<div class=\"notice {}{}\"><p>{}</p></div>\n",
        notice.kind.css_class(),
        dismissible,
        encode_text(&notice.message)
    )
}
