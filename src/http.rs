//! One-shot HTTP requests.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderName, InvalidHeaderValue};
use reqwest::{Client, Method, Response};

use crate::context::{Context, ContextError};

/// Error type for [`send_request`]
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("failed to create request: invalid header name: {0}")]
    InvalidHeaderName(#[from] InvalidHeaderName),

    #[error("failed to create request: invalid header value: {0}")]
    InvalidHeaderValue(#[from] InvalidHeaderValue),

    #[error("failed to create client: {0}")]
    BuildClient(#[source] reqwest::Error),

    #[error("failed to create request: {0}")]
    BuildRequest(#[source] reqwest::Error),

    #[error("failed to send request: {0}")]
    Send(#[source] reqwest::Error),

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Describes a single request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub url: String,
    pub body: Vec<u8>,
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub headers: HashMap<String, String>,
}

impl RequestOptions {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Sends the request described by `opt` and returns the response unread.
///
/// Non-success status codes are not treated as errors.
pub async fn send_request(ctx: &Context, opt: RequestOptions) -> Result<Response, HttpError> {
    let mut headers = HeaderMap::with_capacity(opt.headers.len());
    for (name, value) in &opt.headers {
        headers.insert(
            HeaderName::from_bytes(name.as_bytes())?,
            HeaderValue::from_str(value)?,
        );
    }

    let mut builder = Client::builder();
    if let Some(timeout) = opt.timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().map_err(HttpError::BuildClient)?;

    let request = client
        .request(opt.method, opt.url.as_str())
        .headers(headers)
        .body(opt.body)
        .build()
        .map_err(HttpError::BuildRequest)?;

    tracing::debug!(method = %request.method(), url = %request.url(), "sending request");

    ctx.run(async { client.execute(request).await.map_err(HttpError::Send) })
        .await
}
