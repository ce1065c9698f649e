//! Orchestrates one snapshot run end to end.
//!
//! The job authenticates once, rotates every listed instance, aggregates the
//! outcomes into a [`RunSummary`], and hands it to the reporter. Only the
//! initial authentication is fatal; everything after it is recorded per
//! instance.

use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::backend::SnapshotBackend;
use crate::clock::Clock;
use crate::naming::snapshot_name;
use crate::report::{Reporter, RunSummary};
use crate::rotation::RotationController;

/// Errors that abort a run before any instance is processed.
#[derive(Debug, Error)]
pub enum JobError {
    /// No credential could be obtained.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
}

/// Snapshot a dry run would request for one instance.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PlannedSnapshot {
    /// Instance identifier.
    pub instance_id: String,
    /// Instance display name.
    pub display_name: String,
    /// Name the snapshot would receive.
    pub snapshot_name: String,
}

/// Result of a dry run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RunPlan {
    /// One entry per listed instance.
    pub planned: Vec<PlannedSnapshot>,
    /// Whether inventory listing reached the last page.
    pub inventory_complete: bool,
}

/// Rotation controller paired with the reporter that announces its results.
#[derive(Debug)]
pub struct SnapshotJob<B, C> {
    controller: RotationController<B, C>,
    reporter: Reporter,
}

impl<B, C> SnapshotJob<B, C>
where
    B: SnapshotBackend,
    C: Clock,
{
    /// Creates a job.
    #[must_use]
    pub const fn new(controller: RotationController<B, C>, reporter: Reporter) -> Self {
        Self {
            controller,
            reporter,
        }
    }

    /// Runs the rotation and dispatches the summary.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Auth`] when the initial credential cannot be
    /// acquired; nothing is created or deleted in that case.
    pub async fn execute(&self) -> Result<RunSummary, JobError> {
        let run_at = self.controller.clock().now();
        tracing::info!(run_at = %run_at.to_rfc3339(), "starting snapshot run");
        self.controller.backend().authenticate().await?;

        let run = self.controller.rotate_all().await;
        let summary =
            RunSummary::build(run.outcomes, run_at).with_inventory_complete(run.inventory_complete);
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            inventory_complete = summary.inventory_complete,
            "snapshot run finished"
        );

        let delivered = self.reporter.dispatch(&summary).await;
        if delivered < self.reporter.sink_count() {
            tracing::warn!(
                delivered,
                sinks = self.reporter.sink_count(),
                "report not delivered to every sink"
            );
        }
        Ok(summary)
    }

    /// Lists the inventory and names the snapshots a run would create.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Auth`] when no credential can be acquired.
    pub async fn plan(&self) -> Result<RunPlan, JobError> {
        self.controller.backend().authenticate().await?;
        let inventory = self.controller.backend().list_instances().await;
        if let Some(err) = inventory.interrupted.as_ref() {
            tracing::warn!(error = %err, "inventory incomplete");
        }

        let name = snapshot_name(self.controller.clock().now(), self.controller.timezone());
        let planned = inventory
            .instances
            .into_iter()
            .map(|instance| PlannedSnapshot {
                instance_id: instance.id,
                display_name: instance.display_name,
                snapshot_name: name.clone(),
            })
            .collect();
        Ok(RunPlan {
            planned,
            inventory_complete: inventory.interrupted.is_none(),
        })
    }
}
