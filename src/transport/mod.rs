//! HTTP transport seam used by every remote call.
//!
//! The API clients build [`HttpRequest`] values and hand them to a
//! [`Transport`]. Production code uses [`ReqwestTransport`]; tests use the
//! scripted double in [`crate::test_support`].

mod http_client;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub use http_client::ReqwestTransport;

/// Header carrying the per-request correlation identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP verbs used against the provider API.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
}

/// Body attached to an outgoing request.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded` key/value pairs.
    Form(Vec<(String, String)>),
    /// `application/json` payload.
    Json(serde_json::Value),
}

/// Transport-agnostic description of a single HTTP request.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    /// Verb to issue.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Extra headers, in insertion order.
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    /// Starts a request with no headers and no body.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Appends a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attaches a form-encoded body.
    #[must_use]
    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(fields));
        self
    }

    /// Attaches a JSON body.
    #[must_use]
    pub fn json(mut self, payload: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(payload));
        self
    }

    /// Returns the first header value matching `name`, ignoring ASCII case.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and body returned by the remote side.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpResponse {
    /// Numeric HTTP status.
    pub status: u16,
    /// Response body decoded as UTF-8 (lossy).
    pub body: String,
}

impl HttpResponse {
    /// Builds a response from a status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Errors raised before a response status is available.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TransportError {
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// Target URL.
        url: String,
    },
    /// Connection, TLS, or protocol failure.
    #[error("request to {url} failed: {message}")]
    Request {
        /// Target URL.
        url: String,
        /// Underlying error message.
        message: String,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Future returned by [`Transport::send`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + 'a>>;

/// Sends HTTP requests on behalf of the API clients.
pub trait Transport: Send + Sync {
    /// Issues one bounded request and returns the raw response.
    fn send(&self, request: HttpRequest) -> TransportFuture<'_>;
}
