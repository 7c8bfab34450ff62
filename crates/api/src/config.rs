use tourflow_core::embed::DEFAULT_WIDGET_VERSION;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Period of the step-count reconciliation job (default: `300`).
    pub reconcile_interval_secs: u64,
    /// Base URL the widget calls back into, used in embed snippets.
    pub public_api_url: String,
    /// Widget build pinned in embed snippets (default: `1.0.6`).
    pub widget_version: String,
    /// JWT verification settings.
    pub jwt: JwtConfig,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                          |
    /// |---------------------------|----------------------------------|
    /// | `HOST`                    | `0.0.0.0`                        |
    /// | `PORT`                    | `3000`                           |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`          |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                             |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`                             |
    /// | `RECONCILE_INTERVAL_SECS` | `300`                            |
    /// | `PUBLIC_API_URL`          | `http://localhost:3000/api/v1`   |
    /// | `WIDGET_VERSION`          | `1.0.6`                          |
    ///
    /// # Panics
    ///
    /// Panics on unparseable numbers and when `JWT_SECRET` is missing.
    pub fn from_env() -> Self {
        let host = env_or("HOST", "0.0.0.0");

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = env_or("SHUTDOWN_TIMEOUT_SECS", "30")
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let reconcile_interval_secs: u64 = env_or("RECONCILE_INTERVAL_SECS", "300")
            .parse()
            .expect("RECONCILE_INTERVAL_SECS must be a valid u64");
        assert!(
            reconcile_interval_secs > 0,
            "RECONCILE_INTERVAL_SECS must be positive"
        );

        let public_api_url = env_or("PUBLIC_API_URL", "http://localhost:3000/api/v1")
            .trim_end_matches('/')
            .to_string();

        let widget_version = env_or("WIDGET_VERSION", DEFAULT_WIDGET_VERSION);

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            reconcile_interval_secs,
            public_api_url,
            widget_version,
            jwt,
        }
    }
}
