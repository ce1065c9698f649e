//! Run aggregation and notification dispatch.
//!
//! A [`RunSummary`] is built once per run from the rotation outcomes and
//! handed to every configured [`NotificationSink`]. Sink failures are logged
//! and never fail the run.

mod sinks;

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::rotation::{OutcomeStatus, RotationOutcome};

pub use sinks::{LogSink, WebhookSink};

/// Aggregated result of one rotation run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RunSummary {
    /// Number of instances processed.
    pub total: usize,
    /// Instances that received a fresh snapshot.
    pub succeeded: usize,
    /// Instances that ended as `failed` or `error`.
    pub failed: usize,
    /// Per-instance outcomes, in listing order.
    pub outcomes: Vec<RotationOutcome>,
    /// Whether inventory listing reached the last page. When `false`,
    /// instances on later pages were never processed.
    pub inventory_complete: bool,
    /// When the run started.
    pub run_at: DateTime<Utc>,
}

impl RunSummary {
    /// Counts `outcomes` into a summary of a complete inventory.
    #[must_use]
    pub fn build(outcomes: Vec<RotationOutcome>, run_at: DateTime<Utc>) -> Self {
        let succeeded = outcomes
            .iter()
            .filter(|outcome| outcome.status == OutcomeStatus::Success)
            .count();
        Self {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            outcomes,
            inventory_complete: true,
            run_at,
        }
    }

    /// Records whether inventory listing reached the last page.
    #[must_use]
    pub const fn with_inventory_complete(mut self, complete: bool) -> Self {
        self.inventory_complete = complete;
        self
    }

    /// Returns `true` when the whole inventory was listed and every instance
    /// succeeded.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.inventory_complete
    }

    /// Subject line used by every sink.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("Snapshot Report - {}", self.run_at.format("%Y-%m-%d"))
    }
}

/// Report line flagging a run whose inventory listing stopped early.
pub const INVENTORY_INCOMPLETE_WARNING: &str =
    "Warning: inventory listing stopped early; instances on later pages were not processed.";

/// Renders the plain-text operator report.
#[must_use]
pub fn render_report(summary: &RunSummary) -> String {
    let mut lines = vec![
        summary.subject(),
        format!("Run at: {}", summary.run_at.to_rfc3339()),
        format!(
            "Total: {}  Succeeded: {}  Failed: {}",
            summary.total, summary.succeeded, summary.failed
        ),
    ];
    if !summary.inventory_complete {
        lines.push(String::from(INVENTORY_INCOMPLETE_WARNING));
    }
    lines.push(String::new());
    if summary.outcomes.is_empty() {
        lines.push(String::from("No instances were processed."));
    }
    lines.extend(summary.outcomes.iter().map(outcome_line));
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn outcome_line(outcome: &RotationOutcome) -> String {
    let detail = outcome
        .error
        .as_deref()
        .map_or_else(String::new, |error| format!(" - {error}"));
    format!(
        "[{}] {} ({}): {}{detail}",
        outcome.status.as_str(),
        outcome.display_name,
        outcome.instance_id,
        outcome.snapshot_name
    )
}

/// Errors raised while delivering a summary.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The sink could not reach its destination.
    #[error("{sink} delivery failed: {message}")]
    Delivery {
        /// Sink name.
        sink: String,
        /// Failure detail.
        message: String,
    },
    /// The destination answered with a non-success status.
    #[error("{sink} rejected the report with status {status}")]
    Rejected {
        /// Sink name.
        sink: String,
        /// HTTP status returned.
        status: u16,
    },
}

/// Future returned by [`NotificationSink::deliver`].
pub type DispatchFuture<'a> = Pin<Box<dyn Future<Output = Result<(), DispatchError>> + Send + 'a>>;

/// Destination for run summaries.
pub trait NotificationSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Delivers `summary`.
    fn deliver<'a>(&'a self, summary: &'a RunSummary) -> DispatchFuture<'a>;
}

/// Fans a summary out to every sink.
#[derive(Default)]
pub struct Reporter {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl Reporter {
    /// Creates a reporter without sinks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink.
    #[must_use]
    pub fn with_sink(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Number of configured sinks.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Delivers `summary` to every sink, returning how many succeeded.
    pub async fn dispatch(&self, summary: &RunSummary) -> usize {
        let mut delivered = 0;
        for sink in &self.sinks {
            match sink.deliver(summary).await {
                Ok(()) => {
                    delivered += 1;
                    tracing::debug!(sink = sink.name(), "report delivered");
                }
                Err(err) => {
                    tracing::error!(sink = sink.name(), error = %err, "report delivery failed");
                }
            }
        }
        delivered
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field(
                "sinks",
                &self.sinks.iter().map(|sink| sink.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests;
