//! HTTP transport seam
//!
//! The runner only talks to the network through [`Transport`]. The real
//! implementation is reqwest; tests plug in an in-process fake.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use apicontract_core::{Config, Method, ResolvedRequest, Response};

/// Sends one resolved request and returns the response.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns [`TransportError`] when no HTTP response was obtained.
    async fn send(&self, request: &ResolvedRequest) -> Result<Response, TransportError>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("apicontract/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(Self { client })
    }

    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        Self::new(config.timeout())
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ResolvedRequest) -> Result<Response, TransportError> {
        let mut req = self.client.request(to_reqwest(request.method), &request.url);
        for (k, v) in &request.headers {
            let name = reqwest::header::HeaderName::from_bytes(k.as_bytes())
                .map_err(|_| TransportError::Invalid(format!("header name {k:?}")))?;
            let value = reqwest::header::HeaderValue::from_str(v)
                .map_err(|_| TransportError::Invalid(format!("value of header {k}")))?;
            req = req.header(name, value);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let start = Instant::now();
        let resp = req.send().await.map_err(TransportError::from)?;

        let status = resp.status().as_u16();
        let headers: BTreeMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = resp.text().await.map_err(TransportError::from)?;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        Ok(Response::new(status, body)
            .with_headers(headers)
            .with_elapsed_ms(elapsed_ms))
    }
}

const fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() {
            Self::Invalid(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}
