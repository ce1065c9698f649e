//! Bearer-token acquisition against the provider's OpenID Connect endpoint.
//!
//! Tokens are fetched with the resource-owner password grant and are never
//! cached: every API call asks the [`TokenProvider`] for a fresh
//! [`Credential`].

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::transport::{HttpRequest, Method, Transport, TransportError};

/// Opaque bearer token. The value is redacted from `Debug` output.
#[derive(Clone, Eq, PartialEq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw token value.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Renders the `Authorization` header value.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Client and resource-owner credentials for the identity endpoint.
#[derive(Clone, Eq, PartialEq)]
pub struct AuthSettings {
    /// Token endpoint URL.
    pub auth_url: String,
    /// OAuth client identifier.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// API user name (resource owner).
    pub username: String,
    /// API user password.
    pub password: String,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("auth_url", &self.auth_url)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Reasons a credential could not be obtained.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AuthError {
    /// The identity endpoint could not be reached.
    #[error("token request failed: {0}")]
    Transport(#[from] TransportError),
    /// The identity endpoint answered with a non-success status.
    #[error("token request rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status returned by the endpoint.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },
    /// The response did not carry a usable `access_token`.
    #[error("token response did not contain an access_token")]
    MissingToken,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Obtains bearer credentials through a [`Transport`].
#[derive(Debug)]
pub struct TokenProvider<T> {
    transport: Arc<T>,
    settings: AuthSettings,
}

impl<T> Clone for TokenProvider<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            settings: self.settings.clone(),
        }
    }
}

impl<T: Transport> TokenProvider<T> {
    /// Creates a provider sharing `transport` with the API clients.
    #[must_use]
    pub const fn new(transport: Arc<T>, settings: AuthSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Requests a new bearer token. No retry is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the request fails, the endpoint rejects the
    /// credentials, or the response lacks an `access_token`.
    pub async fn acquire(&self) -> Result<Credential, AuthError> {
        let request = HttpRequest::new(Method::Post, &self.settings.auth_url).form(vec![
            (String::from("client_id"), self.settings.client_id.clone()),
            (
                String::from("client_secret"),
                self.settings.client_secret.clone(),
            ),
            (String::from("username"), self.settings.username.clone()),
            (String::from("password"), self.settings.password.clone()),
            (String::from("grant_type"), String::from("password")),
        ]);

        let response = self.transport.send(request).await?;
        if response.status != 200 {
            tracing::warn!(status = response.status, "token endpoint rejected credentials");
            return Err(AuthError::Rejected {
                status: response.status,
                body: response.body,
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&response.body).map_err(|_| AuthError::MissingToken)?;
        match parsed.access_token {
            Some(token) if !token.trim().is_empty() => {
                tracing::debug!("access token acquired");
                Ok(Credential::new(token))
            }
            _ => Err(AuthError::MissingToken),
        }
    }
}
