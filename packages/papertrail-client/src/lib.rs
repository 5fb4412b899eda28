//! Pure Papertrail REST API client.
//!
//! A minimal client for the Papertrail v1 API. The transport is hidden behind
//! the [`RemoteApi`] trait (`request(method, path, body) -> (status, body)`);
//! [`Papertrail`] layers typed calls for systems, groups, searches,
//! destinations and event search on top of any implementation.
//!
//! # Example
//!
//! ```rust,ignore
//! use papertrail_client::{Group, Papertrail, PapertrailClient};
//!
//! let client = PapertrailClient::new(token)?;
//! let papertrail = Papertrail::new(client);
//!
//! let group = papertrail.find::<Group, _>(|g| g.name == "production").await?;
//! ```

pub mod error;
pub mod resources;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use error::{ClientError, Result};
pub use resources::{Collection, Papertrail};
pub use types::*;

/// HTTP verb used by [`RemoteApi::request`].
pub use reqwest::Method;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://papertrailapp.com/api/v1";

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "PAPERTRAIL_API_TOKEN";

const TOKEN_HEADER: &str = "X-Papertrail-Token";

/// Raw status code and body of a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Transport capability used by every typed call.
///
/// Implementations only move bytes; status interpretation happens in
/// [`Papertrail`].
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse>;
}

/// HTTP implementation of [`RemoteApi`] authenticated with an API token.
#[derive(Clone)]
pub struct PapertrailClient {
    http_client: reqwest::Client,
    token: String,
    base_url: String,
}

impl PapertrailClient {
    /// Create a client with the given API token.
    ///
    /// Fails with [`ClientError::Config`] when the token is empty, before any
    /// network access happens.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ClientError::Config(format!(
                "{TOKEN_ENV} is empty, it's necessary to define it with your Papertrail API token"
            )));
        }
        Ok(Self {
            http_client: reqwest::Client::new(),
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create from environment variable `PAPERTRAIL_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV)
            .map_err(|_| ClientError::Config(format!("{TOKEN_ENV} not set")))?;
        Self::new(token)
    }

    /// Set a custom base URL (proxies, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl RemoteApi for PapertrailClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse> {
        let url = self.url(path);
        debug!(%method, %url, "Papertrail request");

        let mut request = self
            .http_client
            .request(method, &url)
            .header(TOKEN_HEADER, &self.token);
        if let Some(body) = body {
            // Sets Content-Type: application/json
            request = request.json(&body);
        }

        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();

        if status != 200 {
            warn!(status, %url, "Papertrail returned a non-200 status");
        }

        Ok(ApiResponse { status, body })
    }
}
