use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// GraphQL endpoint of the product backend.
    pub graphql_url: String,
    /// Path of the single JSON file holding the persisted scan history.
    pub history_path: String,
    /// Bearer token for outbound requests; absent means anonymous access.
    pub api_token: Option<String>,
    /// Signed-in user identifier, if any.
    pub user: Option<String>,
    pub request_timeout_secs: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            graphql_url: require_env("SCANNER_GRAPHQL_URL")?,
            history_path: std::env::var("SCANNER_HISTORY_PATH")
                .unwrap_or_else(|_| "product_history.json".to_string()),
            api_token: std::env::var("SCANNER_API_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            user: std::env::var("SCANNER_USER").ok(),
            request_timeout_secs: std::env::var("SCANNER_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .context("SCANNER_REQUEST_TIMEOUT_SECS must be a number of seconds")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
