//! Embed snippet generation for the externally hosted tour widget.
//!
//! The widget runtime is published to npm and served from unpkg; tenants
//! paste the generated snippet into their own pages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::CoreError;
use crate::types::DbId;

/// CDN base the widget bundle is loaded from.
pub const WIDGET_CDN_BASE: &str = "https://unpkg.com/tourflow-widget";

/// Widget release the snippet pins when none is configured.
pub const DEFAULT_WIDGET_VERSION: &str = "1.0.6";

/// Placeholder shown until the tenant substitutes their own key.
pub const PLACEHOLDER_API_KEY: &str = "tf_live_xxxxxxxxxxxx";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetTheme {
    Light,
    #[default]
    Dark,
}

impl WidgetTheme {
    pub const fn as_str(self) -> &'static str {
        match self {
            WidgetTheme::Light => "light",
            WidgetTheme::Dark => "dark",
        }
    }
}

impl FromStr for WidgetTheme {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(WidgetTheme::Light),
            "dark" => Ok(WidgetTheme::Dark),
            other => Err(CoreError::Validation(format!(
                "Invalid theme '{other}'. Must be 'light' or 'dark'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetPosition {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl WidgetPosition {
    pub const fn as_str(self) -> &'static str {
        match self {
            WidgetPosition::BottomRight => "bottom-right",
            WidgetPosition::BottomLeft => "bottom-left",
            WidgetPosition::TopRight => "top-right",
            WidgetPosition::TopLeft => "top-left",
        }
    }
}

impl fmt::Display for WidgetPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetPosition {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bottom-right" => Ok(WidgetPosition::BottomRight),
            "bottom-left" => Ok(WidgetPosition::BottomLeft),
            "top-right" => Ok(WidgetPosition::TopRight),
            "top-left" => Ok(WidgetPosition::TopLeft),
            other => Err(CoreError::Validation(format!(
                "Invalid position '{other}'. Must be one of: bottom-right, bottom-left, top-right, top-left"
            ))),
        }
    }
}

/// Everything needed to render an install snippet for one tour.
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    pub tour_id: DbId,
    pub api_key: String,
    pub theme: WidgetTheme,
    pub position: WidgetPosition,
    /// Public API root the widget fetches steps from, e.g. `https://host/api/v1`.
    pub api_base_url: String,
    pub widget_version: String,
}

/// Rendered install artefacts for one tour.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedSnippet {
    pub tour_id: DbId,
    pub script_url: String,
    pub stylesheet_url: String,
    pub steps_url: String,
    /// Paste before `</body>`.
    pub html: String,
    /// Object accepted by the runtime's `mountWidget`.
    pub mount_config: serde_json::Value,
}

impl EmbedOptions {
    pub fn script_url(&self) -> String {
        format!(
            "{WIDGET_CDN_BASE}@{}/dist/tourflow-widget.iife.js",
            self.widget_version
        )
    }

    pub fn stylesheet_url(&self) -> String {
        format!("{WIDGET_CDN_BASE}@{}/dist/style.css", self.widget_version)
    }

    pub fn steps_url(&self) -> String {
        format!(
            "{}/widget/tours/{}",
            self.api_base_url.trim_end_matches('/'),
            self.tour_id
        )
    }

    pub fn render(&self) -> EmbedSnippet {
        let script_url = self.script_url();
        let stylesheet_url = self.stylesheet_url();
        let steps_url = self.steps_url();
        let api_url = self.api_base_url.trim_end_matches('/');

        let html = format!(
            "<link rel=\"stylesheet\" href=\"{stylesheet}\" id=\"tourflow-styles\" />\n\
             <script\n  src=\"{script}\"\n  id=\"tourflow-script\"\n  \
             data-tour-id=\"{tour_id}\"\n  data-api-key=\"{api_key}\"\n  \
             data-theme=\"{theme}\"\n  data-position=\"{position}\"\n  \
             data-api-url=\"{api_url}\"\n  defer\n></script>",
            stylesheet = escape_attr(&stylesheet_url),
            script = escape_attr(&script_url),
            tour_id = self.tour_id,
            api_key = escape_attr(&self.api_key),
            theme = self.theme.as_str(),
            position = self.position,
            api_url = escape_attr(api_url),
        );

        let mount_config = json!({
            "tour_id": self.tour_id.to_string(),
            "api_key": self.api_key,
            "theme": self.theme.as_str(),
            "position": self.position.as_str(),
            "api_url": api_url,
            "steps_url": steps_url,
        });

        EmbedSnippet {
            tour_id: self.tour_id,
            script_url,
            stylesheet_url,
            steps_url,
            html,
            mount_config,
        }
    }
}

/// Escape a value for use inside a double-quoted HTML attribute.
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
