//! Error types for the provider API clients.

use thiserror::Error;

use crate::auth::AuthError;
use crate::transport::TransportError;

/// Failure while reading inventory or snapshot listings.
///
/// Listings fail soft: callers receive whatever data was gathered plus this
/// error for logging.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FetchError {
    /// A credential could not be obtained for the request.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The request did not complete.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The API answered with an unexpected status.
    #[error("{url} returned status {status}: {body}")]
    Status {
        /// URL that was requested.
        url: String,
        /// HTTP status.
        status: u16,
        /// Response body.
        body: String,
    },
    /// The response body did not match the expected envelope.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// URL that was requested.
        url: String,
        /// Decoder error message.
        message: String,
    },
}

/// Unexpected failure while issuing a mutating API call.
///
/// Provider refusals are not errors; they surface as
/// [`crate::api::CreateResult::Failed`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// A credential could not be obtained for the request.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The request did not complete.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<ApiError> for FetchError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::Auth(err) => Self::Auth(err),
            ApiError::Transport(err) => Self::Transport(err),
        }
    }
}
