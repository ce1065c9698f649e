//! Backend abstraction the rotation engine drives.
//!
//! [`crate::api::ContaboApi`] is the production implementation; tests
//! substitute scripted doubles so the state machine can be exercised without
//! HTTP.

use std::future::Future;
use std::pin::Pin;

use crate::api::{ApiError, CreateResult, Inventory, SnapshotListing};
use crate::auth::AuthError;

/// Future returned by backend operations.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Remote operations needed to rotate snapshots.
pub trait SnapshotBackend: Send + Sync {
    /// Confirms that a credential can be obtained.
    fn authenticate(&self) -> BackendFuture<'_, Result<(), AuthError>>;

    /// Lists every managed instance, keeping partial results on failure.
    fn list_instances(&self) -> BackendFuture<'_, Inventory>;

    /// Lists the snapshots of one instance, failing soft.
    fn list_snapshots<'a>(&'a self, instance_id: &'a str) -> BackendFuture<'a, SnapshotListing>;

    /// Requests a snapshot; refusals are reported in the [`CreateResult`].
    fn create_snapshot<'a>(
        &'a self,
        instance_id: &'a str,
        name: &'a str,
        description: &'a str,
    ) -> BackendFuture<'a, Result<CreateResult, ApiError>>;

    /// Deletes one snapshot, returning whether the provider confirmed it.
    fn delete_snapshot<'a>(
        &'a self,
        instance_id: &'a str,
        snapshot_id: &'a str,
    ) -> BackendFuture<'a, bool>;
}
