//! Core library for snapwarden, a snapshot rotation engine for Contabo
//! compute instances.
//!
//! A run acquires a bearer token, walks the paginated instance inventory,
//! and requests a fresh snapshot for every instance. When the provider
//! refuses because the per-instance snapshot quota is exhausted, the oldest
//! snapshot is evicted and the create is retried once. Every instance yields
//! one outcome, and the aggregated [`RunSummary`] is handed to the configured
//! notification sinks.

pub mod api;
pub mod auth;
pub mod backend;
pub mod clock;
pub mod config;
pub mod job;
pub mod naming;
pub mod report;
pub mod retention;
pub mod rotation;
pub mod telemetry;
pub mod test_support;
pub mod transport;

pub use api::{ApiError, ApiSettings, ContaboApi, CreateResult, FetchError, Instance, Snapshot};
pub use auth::{AuthError, AuthSettings, Credential, TokenProvider};
pub use backend::{BackendFuture, SnapshotBackend};
pub use clock::{Clock, SystemClock};
pub use config::{ConfigError, LogFormat, SnapwardenConfig};
pub use job::{JobError, PlannedSnapshot, RunPlan, SnapshotJob};
pub use report::{
    DispatchError, INVENTORY_INCOMPLETE_WARNING, LogSink, NotificationSink, Reporter, RunSummary,
    WebhookSink, render_report,
};
pub use retention::pick_eviction;
pub use rotation::{Eviction, OutcomeStatus, RotationController, RotationOutcome, RotationRun};
pub use telemetry::TelemetryError;
pub use transport::{ReqwestTransport, Transport, TransportError};
