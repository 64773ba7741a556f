//! HTTP transport seam

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::Method;
use url::Url;

use crate::error::ApiError;

/// An outbound request as built by [`AdminClient`](crate::AdminClient).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    /// Bearer token, sent as `Authorization: Bearer <token>` when present.
    pub bearer: Option<String>,
    /// JSON body.
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    /// Creates a request without token or body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            bearer: None,
            body: None,
        }
    }

    /// Sets the bearer token.
    pub fn bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    /// Sets the JSON body.
    pub fn json(mut self, body: Option<serde_json::Value>) -> Self {
        self.body = body;
        self
    }
}

/// A response with its status and raw body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Creates a response from a status and body bytes.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a JSON response.
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests over the wire.
///
/// The client talks to the backend only through this trait, so the token
/// refresh logic can be exercised against a scripted transport.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and returns the raw response, whatever its status.
    ///
    /// Only transport-level failures are errors.
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, ApiError>;
}

/// [`HttpTransport`] backed by `reqwest`.
///
/// The cookie store is enabled so the httpOnly refresh cookie set at login
/// is sent back on every request.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport with an optional request and connect timeout.
    pub fn new(
        timeout: Option<Duration>,
        connect_timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder().cookie_store(true);
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(Self {
            http_client,
            timeout,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, ApiError> {
        let mut builder = self
            .http_client
            .request(request.method, request.url)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| match self.timeout {
            Some(timeout) if e.is_timeout() => ApiError::Timeout(timeout),
            _ => ApiError::Network(e),
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse { status, body })
    }
}
