//! Backends that answer routed commands.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;
use voxroute_models::{AgentId, BackendRequest, BackendResponse};

use crate::error::{BackendError, Result, RuntimeError};

/// A request/response service that handles routed commands.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Name used in logs and attempt records.
    fn name(&self) -> &str;

    /// Sends one request. Timeouts are applied by the caller.
    async fn send(&self, request: &BackendRequest) -> std::result::Result<BackendResponse, BackendError>;
}

/// Wire shape accepted from HTTP backends.
#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(alias = "response", alias = "message")]
    text: String,
    #[serde(default, alias = "agent")]
    agent_id: Option<AgentId>,
}

/// Posts requests as JSON to a fixed URL.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    name: String,
    url: Url,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Creates a backend for `url`, which must be http or https.
    pub fn new(name: impl Into<String>, url: Url) -> Result<Self> {
        Self::with_client(name, url, reqwest::Client::new())
    }

    /// Creates a backend whose client enforces a connect timeout.
    pub fn with_connect_timeout(name: impl Into<String>, url: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().connect_timeout(timeout).build()?;
        Self::with_client(name, url, client)
    }

    fn with_client(name: impl Into<String>, url: Url, client: reqwest::Client) -> Result<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RuntimeError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        Ok(Self {
            name: name.into(),
            url,
            client,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, request: &BackendRequest) -> std::result::Result<BackendResponse, BackendError> {
        trace!(backend = %self.name, url = %self.url, "posting backend request");

        let response = self
            .client
            .post(self.url.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        let agent_id = wire
            .agent_id
            .or_else(|| request.agent())
            .ok_or_else(|| BackendError::InvalidResponse("response names no agent".into()))?;

        debug!(backend = %self.name, agent = %agent_id, "backend answered");
        Ok(BackendResponse {
            text: wire.text,
            agent_id,
        })
    }
}

/// Answers locally without any network, for offline use.
#[derive(Debug, Clone)]
pub struct EchoBackend {
    name: String,
}

impl EchoBackend {
    pub fn new() -> Self {
        Self {
            name: "echo".to_string(),
        }
    }
}

impl Default for EchoBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for EchoBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, request: &BackendRequest) -> std::result::Result<BackendResponse, BackendError> {
        let agent_id = request
            .agent()
            .ok_or_else(|| BackendError::Unavailable("request names no agent".into()))?;
        Ok(BackendResponse {
            text: format!("{} (offline) heard: {}", agent_id.display_name(), request.message),
            agent_id,
        })
    }
}
