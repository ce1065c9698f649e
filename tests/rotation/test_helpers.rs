//! Shared fixtures and helpers for rotation BDD scenarios.

use std::sync::Arc;

use rstest::fixture;
use snapwarden::api::ApiSettings;
use snapwarden::config::parse_timezone;
use snapwarden::test_support::{FixedClock, ScriptedTransport};
use snapwarden::{
    AuthSettings, ContaboApi, LogSink, Reporter, RotationController, RunSummary, SnapshotJob,
    TokenProvider, WebhookSink,
};

pub const API_BASE_URL: &str = "https://api.test";
pub const WEBHOOK_URL: &str = "https://hooks.test/snapwarden";
pub const RUN_INSTANT: &str = "2099-01-01T00:00:00Z";

#[derive(Clone, Debug)]
pub enum RunResult {
    Completed(RunSummary),
    Aborted(String),
}

#[derive(Clone, Debug)]
pub struct RotationContext {
    pub transport: ScriptedTransport,
    pub webhook: bool,
    pub outcome: Option<RunResult>,
}

#[fixture]
pub fn rotation_context() -> RotationContext {
    RotationContext {
        transport: ScriptedTransport::new(),
        webhook: false,
        outcome: None,
    }
}

pub fn snapshots_path(instance_id: &str) -> String {
    format!("{API_BASE_URL}/v1/compute/instances/{instance_id}/snapshots")
}

pub fn build_job(
    context: &RotationContext,
) -> SnapshotJob<ContaboApi<ScriptedTransport>, FixedClock> {
    let transport = Arc::new(context.transport.clone());
    let tokens = TokenProvider::new(
        Arc::clone(&transport),
        AuthSettings {
            auth_url: String::from("https://auth.test/token"),
            client_id: String::from("client"),
            client_secret: String::from("secret"),
            username: String::from("operator"),
            password: String::from("hunter2"),
        },
    );
    let api = ContaboApi::new(
        Arc::clone(&transport),
        tokens,
        ApiSettings::new(API_BASE_URL, 100),
    );
    let timezone =
        parse_timezone("UTC").unwrap_or_else(|err| panic!("UTC should be a valid timezone: {err}"));
    let controller = RotationController::new(api, FixedClock::at(RUN_INSTANT), timezone);

    let mut reporter = Reporter::new().with_sink(LogSink);
    if context.webhook {
        reporter = reporter.with_sink(WebhookSink::new(transport, WEBHOOK_URL));
    }
    SnapshotJob::new(controller, reporter)
}
