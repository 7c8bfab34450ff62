//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// `?with_steps=` on `GET /tours`.
#[derive(Debug, Default, Deserialize)]
pub struct ListToursParams {
    #[serde(default)]
    pub with_steps: bool,
}

/// `?limit=` on list endpoints with a small fixed default.
#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

impl LimitParams {
    /// The requested limit clamped to `1..=max`, or `default` when absent.
    pub fn resolve(&self, default: i64, max: i64) -> i64 {
        self.limit.map_or(default, |l| l.clamp(1, max))
    }
}

/// Query parameters for `GET /tours/{id}/embed`.
#[derive(Debug, Default, Deserialize)]
pub struct EmbedParams {
    pub api_key: Option<String>,
    pub theme: Option<String>,
    pub position: Option<String>,
}
