//! `reqwest`-backed transport.

use std::time::Duration;

use super::{HttpRequest, HttpResponse, Method, RequestBody, Transport, TransportError, TransportFuture};

/// Production transport that issues requests through a shared
/// [`reqwest::Client`] with a per-request timeout.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport whose requests abort after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] when the TLS backend cannot be
    /// initialised.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Client(err.to_string()))?;
        Ok(Self { client })
    }

    fn classify(url: &str, err: &reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                url: url.to_owned(),
            }
        } else {
            TransportError::Request {
                url: url.to_owned(),
                message: err.to_string(),
            }
        }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let HttpRequest {
                method,
                url,
                headers,
                body,
            } = request;

            let mut builder = match method {
                Method::Get => self.client.get(&url),
                Method::Post => self.client.post(&url),
                Method::Delete => self.client.delete(&url),
            };
            for (name, value) in &headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder = match body {
                Some(RequestBody::Form(fields)) => builder.form(&fields),
                Some(RequestBody::Json(payload)) => builder.json(&payload),
                None => builder,
            };

            let response = builder
                .send()
                .await
                .map_err(|err| Self::classify(&url, &err))?;
            let status = response.status().as_u16();
            let bytes = response
                .bytes()
                .await
                .map_err(|err| Self::classify(&url, &err))?;

            Ok(HttpResponse {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            })
        })
    }
}
