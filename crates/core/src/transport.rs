//! HTTP transport seam.
//!
//! Backends never talk to `reqwest` directly: they go through a
//! [`Transport`], so the disk cache can wrap the real client and tests can
//! substitute an in-memory one.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::collections::BTreeMap;
use tracing::trace;

use crate::{Error, Result};

/// A GET request.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    /// Absolute URL.
    pub url: String,
    /// Request headers, in insertion order.
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Create a request for `url` with no headers.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value by case-insensitive name.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A fully buffered response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers with lower-cased names.
    pub headers: BTreeMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response with the given status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Add a header; the name is lower-cased.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Look up a header by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Something that can perform GET requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request and buffer the response.
    ///
    /// Only connection-level failures are errors; any HTTP status is
    /// returned as a response.
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).get(request).await
    }
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the binfetch user agent.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self> {
        let client = build_client(
            Client::builder().user_agent(concat!("binfetch/", env!("CARGO_PKG_VERSION"))),
        )?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn build_client(builder: ClientBuilder) -> Result<Client> {
    builder.build().map_err(|e| {
        Error::config(
            format!("failed to build HTTP client: {e}"),
            "Check the TLS setup of this host",
        )
    })
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
        trace!(url = %request.url, "GET");

        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(&request.url, e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::status(&request.url, status, format!("failed to read body: {e}")))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
