//! Per-instance snapshot listing, creation and deletion.

use serde_json::json;

use super::types::{CreatedEnvelope, Snapshot, SnapshotPage};
use super::{ApiError, ContaboApi, FetchError};
use crate::transport::{Method, Transport};

/// Body fragment the provider returns when an instance holds its maximum
/// number of snapshots.
pub const QUOTA_EXCEEDED_MARKER: &str = "Total snapshots exceed the total max limit";

/// Status the provider uses for billing and capacity limits.
const PAYMENT_REQUIRED: u16 = 402;
const CREATED: u16 = 201;
const NO_CONTENT: u16 = 204;

/// Outcome of a snapshot create request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CreateResult {
    /// The provider accepted the request.
    Created(Snapshot),
    /// The instance already holds the maximum number of snapshots.
    QuotaExceeded,
    /// Any other refusal, with status and body.
    Failed(String),
}

impl CreateResult {
    /// Classifies a create response.
    ///
    /// Quota exhaustion requires both the 402 status and
    /// [`QUOTA_EXCEEDED_MARKER`] in the body; either alone is a plain
    /// failure.
    #[must_use]
    pub fn classify(instance_id: &str, name: &str, status: u16, body: &str) -> Self {
        if status == CREATED {
            let snapshot = serde_json::from_str::<CreatedEnvelope>(body)
                .ok()
                .and_then(|envelope| envelope.into_snapshot(instance_id))
                .unwrap_or_else(|| {
                    tracing::debug!(instance_id, "create response carried no snapshot record");
                    Snapshot {
                        id: String::new(),
                        instance_id: instance_id.to_owned(),
                        name: name.to_owned(),
                        created_date: String::new(),
                    }
                });
            return Self::Created(snapshot);
        }
        if status == PAYMENT_REQUIRED && body.contains(QUOTA_EXCEEDED_MARKER) {
            return Self::QuotaExceeded;
        }
        Self::Failed(format!("status {status}: {body}"))
    }
}

/// Snapshots for one instance plus the error that emptied the list, if any.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SnapshotListing {
    /// Snapshots returned by the provider; empty on failure.
    pub snapshots: Vec<Snapshot>,
    /// Failure that caused an empty listing.
    pub error: Option<FetchError>,
}

impl<T: Transport> ContaboApi<T> {
    /// Lists the snapshots of `instance_id`, failing soft.
    pub async fn list(&self, instance_id: &str) -> SnapshotListing {
        match self.fetch_snapshots(instance_id).await {
            Ok(snapshots) => SnapshotListing {
                snapshots,
                error: None,
            },
            Err(err) => {
                tracing::warn!(instance_id, error = %err, "failed to list snapshots");
                SnapshotListing {
                    snapshots: Vec::new(),
                    error: Some(err),
                }
            }
        }
    }

    async fn fetch_snapshots(&self, instance_id: &str) -> Result<Vec<Snapshot>, FetchError> {
        let url = self.settings.snapshots_url(instance_id);
        let response = self
            .send_authorised(Self::request(Method::Get, &url))
            .await?;
        if response.status != 200 {
            return Err(FetchError::Status {
                url,
                status: response.status,
                body: response.body,
            });
        }

        let page: SnapshotPage =
            serde_json::from_str(&response.body).map_err(|err| FetchError::Decode {
                url: url.clone(),
                message: err.to_string(),
            })?;
        Ok(page
            .data
            .into_iter()
            .filter_map(|record| record.into_snapshot(instance_id))
            .collect())
    }

    /// Requests a new snapshot named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when no credential could be obtained or the
    /// request did not complete. Provider refusals are reported through
    /// [`CreateResult`].
    pub async fn create(
        &self,
        instance_id: &str,
        name: &str,
        description: &str,
    ) -> Result<CreateResult, ApiError> {
        let url = self.settings.snapshots_url(instance_id);
        let request = Self::request(Method::Post, url).json(json!({
            "name": name,
            "description": description,
        }));
        let response = self.send_authorised(request).await?;
        let result = CreateResult::classify(instance_id, name, response.status, &response.body);
        match &result {
            CreateResult::Created(snapshot) => {
                tracing::info!(instance_id, snapshot_id = %snapshot.id, name, "snapshot created");
            }
            CreateResult::QuotaExceeded => {
                tracing::info!(instance_id, "snapshot quota exceeded");
            }
            CreateResult::Failed(detail) => {
                tracing::warn!(instance_id, %detail, "snapshot creation refused");
            }
        }
        Ok(result)
    }

    /// Deletes one snapshot. Returns `true` only on `204 No Content`;
    /// failures are logged and never raised.
    pub async fn delete(&self, instance_id: &str, snapshot_id: &str) -> bool {
        let url = format!("{}/{snapshot_id}", self.settings.snapshots_url(instance_id));
        match self.send_authorised(Self::request(Method::Delete, &url)).await {
            Ok(response) if response.status == NO_CONTENT => {
                tracing::info!(instance_id, snapshot_id, "snapshot deleted");
                true
            }
            Ok(response) => {
                tracing::warn!(
                    instance_id,
                    snapshot_id,
                    status = response.status,
                    body = %response.body,
                    "snapshot deletion refused"
                );
                false
            }
            Err(err) => {
                tracing::warn!(instance_id, snapshot_id, error = %err, "snapshot deletion failed");
                false
            }
        }
    }
}
