//! Client for the provider's compute API.
//!
//! [`ContaboApi`] wraps a [`Transport`] and a [`TokenProvider`]. Every call
//! fetches a fresh bearer credential and tags the request with a fresh
//! correlation identifier before sending it.

mod error;
mod inventory;
mod snapshots;
mod types;

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::{AuthError, TokenProvider};
use crate::backend::{BackendFuture, SnapshotBackend};
use crate::transport::{HttpRequest, HttpResponse, Method, REQUEST_ID_HEADER, Transport};

pub use error::{ApiError, FetchError};
pub use inventory::Inventory;
pub use snapshots::{CreateResult, QUOTA_EXCEEDED_MARKER, SnapshotListing};
pub use types::{Instance, Snapshot};

/// Default number of instances requested per inventory page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Location and paging settings for the compute API.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiSettings {
    /// Scheme and host of the API, for example `https://api.contabo.com`.
    pub base_url: String,
    /// Instances requested per inventory page.
    pub page_size: u32,
}

impl ApiSettings {
    /// Builds settings, trimming any trailing slash from `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, page_size: u32) -> Self {
        let base = base_url.into();
        Self {
            base_url: base.trim_end_matches('/').to_owned(),
            page_size,
        }
    }

    /// Resolves a `_links` entry against the API base.
    #[must_use]
    pub fn resolve(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_owned()
        } else if link.starts_with('/') {
            format!("{}{link}", self.base_url)
        } else {
            format!("{}/{link}", self.base_url)
        }
    }

    fn instances_url(&self) -> String {
        format!("{}/v1/compute/instances", self.base_url)
    }

    fn snapshots_url(&self, instance_id: &str) -> String {
        format!("{}/v1/compute/instances/{instance_id}/snapshots", self.base_url)
    }
}

/// Generates the correlation identifier sent with each request.
#[must_use]
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Authenticated client for inventory and snapshot endpoints.
#[derive(Debug)]
pub struct ContaboApi<T> {
    transport: Arc<T>,
    tokens: TokenProvider<T>,
    settings: ApiSettings,
}

impl<T> Clone for ContaboApi<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            tokens: self.tokens.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<T: Transport> ContaboApi<T> {
    /// Creates a client. `tokens` should share `transport`.
    #[must_use]
    pub const fn new(transport: Arc<T>, tokens: TokenProvider<T>, settings: ApiSettings) -> Self {
        Self {
            transport,
            tokens,
            settings,
        }
    }

    /// Sends `request` with a fresh bearer credential and correlation id.
    async fn send_authorised(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let credential = self.tokens.acquire().await?;
        let request_id = new_request_id();
        tracing::trace!(url = %request.url, %request_id, "sending API request");
        let authorised = request
            .header("Authorization", credential.bearer())
            .header(REQUEST_ID_HEADER, request_id);
        Ok(self.transport.send(authorised).await?)
    }

    fn request(method: Method, url: impl Into<String>) -> HttpRequest {
        HttpRequest::new(method, url).header("Accept", "application/json")
    }
}

impl<T: Transport> SnapshotBackend for ContaboApi<T> {
    fn authenticate(&self) -> BackendFuture<'_, Result<(), AuthError>> {
        Box::pin(async move { self.tokens.acquire().await.map(|_| ()) })
    }

    fn list_instances(&self) -> BackendFuture<'_, Inventory> {
        Box::pin(self.list_all())
    }

    fn list_snapshots<'a>(&'a self, instance_id: &'a str) -> BackendFuture<'a, SnapshotListing> {
        Box::pin(self.list(instance_id))
    }

    fn create_snapshot<'a>(
        &'a self,
        instance_id: &'a str,
        name: &'a str,
        description: &'a str,
    ) -> BackendFuture<'a, Result<CreateResult, ApiError>> {
        Box::pin(self.create(instance_id, name, description))
    }

    fn delete_snapshot<'a>(&'a self, instance_id: &'a str, snapshot_id: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(self.delete(instance_id, snapshot_id))
    }
}
