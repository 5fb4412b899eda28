use anyhow::{ensure, Context, Result};
use dotenvy::dotenv;
use papertrail_client::{DEFAULT_BASE_URL, TOKEN_ENV};
use std::env;

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "PAPERTRAIL_API_URL";

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub api_token: String,
    pub api_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        let _ = dotenv();

        let api_token = env::var(TOKEN_ENV).with_context(|| format!("{TOKEN_ENV} must be set"))?;
        ensure!(!api_token.trim().is_empty(), "{TOKEN_ENV} must not be empty");

        Ok(Self {
            api_token,
            api_url: env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }
}
