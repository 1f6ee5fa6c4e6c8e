//! HTTP transport abstraction
//!
//! Everything that talks to the inventory API goes through [`HttpClient`],
//! so the authentication gateway can be layered on top of any transport and
//! tests can swap in a mock.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AlacenaError, AlacenaResult};

/// HTTP method enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    GET,
    POST,
}

/// Response data detached from the transport
#[derive(Debug, Clone)]
pub struct SimpleHttpResponse {
    /// HTTP status code
    status_code: u16,
    /// Response body
    body: String,
}

impl SimpleHttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status_code: status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status_code
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Get the body as text (consumes the response)
    pub fn text(self) -> String {
        self.body
    }

    /// Parse body as JSON; `url` is only used for the error message
    pub fn json<T: DeserializeOwned>(&self, url: &str) -> AlacenaResult<T> {
        serde_json::from_str(&self.body).map_err(|e| AlacenaError::invalid_response(url, e))
    }

    /// Check if successful (2xx status)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// The server's `msg` field if the body carries one, the raw body otherwise
    pub fn error_message(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|v| {
                v.get("msg")
                    .or_else(|| v.get("detail"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| self.body.clone())
    }

    /// Turn a non-2xx response into an [`AlacenaError::Api`]
    pub fn error_for_status(self) -> AlacenaResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AlacenaError::Api {
                status: self.status_code,
                message: self.error_message(),
            })
        }
    }
}

/// Headers for a JSON request body
pub fn json_headers() -> HashMap<String, String> {
    HashMap::from([(
        http::header::CONTENT_TYPE.as_str().to_string(),
        "application/json".to_string(),
    )])
}

/// Trait for HTTP client operations, allowing for mocking and decoration
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform HTTP GET request and return a SimpleHttpResponse
    async fn get(&self, url: &str, headers: HashMap<String, String>)
        -> AlacenaResult<SimpleHttpResponse>;

    /// Perform HTTP POST request and return a SimpleHttpResponse
    async fn post(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        body: String,
    ) -> AlacenaResult<SimpleHttpResponse>;
}

/// Implementation of HttpClient using reqwest
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Client with a per-request timeout
    pub fn with_timeout(timeout: Duration) -> AlacenaResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Create a new client with custom configuration
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        mut request: reqwest::RequestBuilder,
        url: &str,
        headers: HashMap<String, String>,
    ) -> AlacenaResult<SimpleHttpResponse> {
        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AlacenaError::network(url, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AlacenaError::network(url, e))?;
        debug!(url = %url, status, "HTTP response received");

        Ok(SimpleHttpResponse::new(status, body))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(
        &self,
        url: &str,
        headers: HashMap<String, String>,
    ) -> AlacenaResult<SimpleHttpResponse> {
        self.send(self.client.get(url), url, headers).await
    }

    async fn post(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        body: String,
    ) -> AlacenaResult<SimpleHttpResponse> {
        self.send(self.client.post(url).body(body), url, headers).await
    }
}
