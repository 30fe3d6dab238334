//! Request/reply primitives and the transport jobs send them through.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode, Url};
use tracing::debug;

use crate::error::Result;
use crate::models::ApiErrorResponse;

/// MIME type of every request body jobs send.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Wire format declared by a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    Xml,
    Unknown,
}

impl ContentType {
    /// Classify a `Content-Type` header value, ignoring parameters such as
    /// `charset`.
    pub fn from_header(value: &str) -> Self {
        let essence = value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/json" | "text/json" | "text/javascript" => ContentType::Json,
            "application/xml" | "text/xml" | "application/atom+xml" => ContentType::Xml,
            s if s.ends_with("+json") => ContentType::Json,
            _ => ContentType::Unknown,
        }
    }
}

/// One HTTP request waiting in a job's queue.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Attach a body along with its `Content-Type`.
    pub fn with_body(mut self, body: Vec<u8>, content_type: &'static str) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// A completed reply as delivered by a [`Transport`].
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// A `200 OK` reply carrying a JSON body.
    pub fn json(body: impl Into<Vec<u8>>) -> Self {
        Self::new(StatusCode::OK, body).with_content_type(JSON_CONTENT_TYPE)
    }

    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self
    }

    pub fn content_type(&self) -> ContentType {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ContentType::from_header)
            .unwrap_or(ContentType::Unknown)
    }

    /// Human readable error text for a failed reply.
    ///
    /// Prefers the `error.message` field of a Google error body, then the raw
    /// body, then the status reason.
    pub fn error_message(&self) -> String {
        if let Ok(api_error) = serde_json::from_slice::<ApiErrorResponse>(&self.body) {
            return api_error.error.message;
        }

        let text = String::from_utf8_lossy(&self.body).trim().to_string();
        if !text.is_empty() {
            return text;
        }

        self.status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    }
}

/// Sends one request and delivers its reply.
///
/// Jobs never have more than one request outstanding on a transport, but a
/// single transport can serve many jobs concurrently.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Reply>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Create a transport with default timeouts.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http })
    }

    /// Wrap an existing client, e.g. one configured with a proxy.
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Reply> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        debug!(%status, bytes = body.len(), "reply received");
        Ok(Reply {
            status,
            headers,
            body,
        })
    }
}
