//! Per-instance snapshot rotation.
//!
//! For each instance the controller walks a bounded state machine:
//! create, and on a quota hit evict the oldest snapshot and create exactly
//! once more. Every instance yields exactly one [`RotationOutcome`], whatever
//! path it took, and a failure never stops the remaining instances.

mod types;

use chrono::FixedOffset;

use crate::api::{ApiError, CreateResult, Instance};
use crate::backend::SnapshotBackend;
use crate::clock::Clock;
use crate::naming::{snapshot_description, snapshot_name};
use crate::retention::pick_eviction;

pub use types::{Eviction, OutcomeStatus, RotationOutcome};

/// Detail recorded when the quota is still exhausted after eviction.
pub const QUOTA_PERSISTED: &str = "snapshot quota still exceeded after eviction";

/// Outcomes of one pass over the inventory.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RotationRun {
    /// One outcome per listed instance, in listing order.
    pub outcomes: Vec<RotationOutcome>,
    /// Whether inventory listing stopped early.
    pub inventory_complete: bool,
}

#[derive(Debug, Default)]
struct Progress {
    attempts: u8,
    eviction: Option<Eviction>,
}

/// Drives the create → evict → retry sequence for every instance.
#[derive(Debug)]
pub struct RotationController<B, C> {
    backend: B,
    clock: C,
    timezone: FixedOffset,
}

impl<B, C> RotationController<B, C>
where
    B: SnapshotBackend,
    C: Clock,
{
    /// Creates a controller rendering snapshot names in `timezone`.
    #[must_use]
    pub const fn new(backend: B, clock: C, timezone: FixedOffset) -> Self {
        Self {
            backend,
            clock,
            timezone,
        }
    }

    /// Returns the backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the clock.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns the timezone used for snapshot names.
    #[must_use]
    pub const fn timezone(&self) -> FixedOffset {
        self.timezone
    }

    /// Lists the inventory and rotates every instance found, in order.
    pub async fn rotate_all(&self) -> RotationRun {
        let inventory = self.backend.list_instances().await;
        if let Some(err) = inventory.interrupted.as_ref() {
            tracing::warn!(
                error = %err,
                instances = inventory.instances.len(),
                "inventory incomplete; rotating the instances that were listed"
            );
        }
        if inventory.instances.is_empty() {
            tracing::info!("no instances to manage");
        }

        let outcomes = self.rotate_instances(&inventory.instances).await;
        RotationRun {
            outcomes,
            inventory_complete: inventory.interrupted.is_none(),
        }
    }

    /// Rotates `instances` sequentially, one outcome each.
    pub async fn rotate_instances(&self, instances: &[Instance]) -> Vec<RotationOutcome> {
        let mut outcomes = Vec::with_capacity(instances.len());
        for instance in instances {
            outcomes.push(self.rotate_instance(instance).await);
        }
        outcomes
    }

    /// Rotates a single instance and records how it ended.
    pub async fn rotate_instance(&self, instance: &Instance) -> RotationOutcome {
        let started = self.clock.now();
        let name = snapshot_name(started, self.timezone);
        let description = snapshot_description(started, self.timezone);
        tracing::info!(
            instance_id = %instance.id,
            display_name = %instance.display_name,
            snapshot_name = %name,
            "creating snapshot"
        );

        let mut progress = Progress::default();
        let result = self
            .create_with_eviction(instance, &name, &description, &mut progress)
            .await;
        self.record(instance, name, progress, result)
    }

    async fn create_with_eviction(
        &self,
        instance: &Instance,
        name: &str,
        description: &str,
        progress: &mut Progress,
    ) -> Result<CreateResult, ApiError> {
        progress.attempts += 1;
        let first = self
            .backend
            .create_snapshot(&instance.id, name, description)
            .await?;
        if first != CreateResult::QuotaExceeded {
            return Ok(first);
        }

        tracing::info!(instance_id = %instance.id, "quota exceeded; evicting oldest snapshot");
        progress.eviction = Some(self.evict_oldest(&instance.id).await);

        // The retry is final whatever it returns.
        progress.attempts += 1;
        self.backend
            .create_snapshot(&instance.id, name, description)
            .await
    }

    async fn evict_oldest(&self, instance_id: &str) -> Eviction {
        let listing = self.backend.list_snapshots(instance_id).await;
        if let Some(err) = listing.error.as_ref() {
            tracing::warn!(instance_id, error = %err, "could not list snapshots for eviction");
        }

        let Some(oldest) = pick_eviction(&listing.snapshots) else {
            tracing::warn!(instance_id, "no snapshot eligible for eviction");
            return Eviction::NoCandidate;
        };

        tracing::info!(
            instance_id,
            snapshot_id = %oldest.id,
            created_date = %oldest.created_date,
            "evicting oldest snapshot"
        );
        let snapshot_id = oldest.id.clone();
        if self.backend.delete_snapshot(instance_id, &snapshot_id).await {
            Eviction::Deleted { snapshot_id }
        } else {
            Eviction::DeleteFailed { snapshot_id }
        }
    }

    fn record(
        &self,
        instance: &Instance,
        snapshot_name: String,
        progress: Progress,
        result: Result<CreateResult, ApiError>,
    ) -> RotationOutcome {
        let (status, snapshot_id, error) = match result {
            Ok(CreateResult::Created(snapshot)) => (
                OutcomeStatus::Success,
                Some(snapshot.id).filter(|id| !id.is_empty()),
                None,
            ),
            Ok(CreateResult::QuotaExceeded) => {
                (OutcomeStatus::Failed, None, Some(QUOTA_PERSISTED.to_owned()))
            }
            Ok(CreateResult::Failed(detail)) => (OutcomeStatus::Failed, None, Some(detail)),
            Err(err) => (OutcomeStatus::Error, None, Some(err.to_string())),
        };

        match status {
            OutcomeStatus::Success => tracing::info!(
                instance_id = %instance.id,
                snapshot_name = %snapshot_name,
                attempts = progress.attempts,
                "snapshot rotation succeeded"
            ),
            OutcomeStatus::Failed | OutcomeStatus::Error => tracing::warn!(
                instance_id = %instance.id,
                status = status.as_str(),
                error = error.as_deref().unwrap_or_default(),
                attempts = progress.attempts,
                "snapshot rotation failed"
            ),
        }

        RotationOutcome {
            instance_id: instance.id.clone(),
            display_name: instance.display_name.clone(),
            snapshot_name,
            snapshot_id,
            success: status == OutcomeStatus::Success,
            error,
            completed_at: self.clock.now(),
            status,
            attempts: progress.attempts,
            eviction: progress.eviction,
        }
    }
}
