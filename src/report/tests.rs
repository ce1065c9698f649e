//! Tests for summary building, rendering, and dispatch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::rotation::Eviction;
use crate::test_support::{FixedClock, ScriptedTransport};
use crate::transport::{Method, RequestBody};

fn outcome(id: &str, status: OutcomeStatus, error: Option<&str>) -> RotationOutcome {
    RotationOutcome {
        instance_id: id.to_owned(),
        display_name: format!("vm-{id}"),
        snapshot_name: String::from("snapshot-2099-01-01_000000"),
        snapshot_id: (status == OutcomeStatus::Success).then(|| format!("snap-{id}")),
        success: status == OutcomeStatus::Success,
        error: error.map(str::to_owned),
        completed_at: FixedClock::at("2099-01-01T00:00:00Z").0,
        status,
        attempts: 1,
        eviction: None,
    }
}

#[fixture]
fn run_at() -> DateTime<Utc> {
    FixedClock::at("2099-01-01T00:00:00Z").0
}

#[fixture]
fn mixed_summary(run_at: DateTime<Utc>) -> RunSummary {
    let mut evicted = outcome("2", OutcomeStatus::Success, None);
    evicted.attempts = 2;
    evicted.eviction = Some(Eviction::Deleted {
        snapshot_id: String::from("old"),
    });
    RunSummary::build(
        vec![
            outcome("1", OutcomeStatus::Success, None),
            evicted,
            outcome("3", OutcomeStatus::Failed, Some("status 500: boom")),
            outcome("4", OutcomeStatus::Error, Some("request timed out")),
        ],
        run_at,
    )
}

#[rstest]
fn build_counts_failed_and_error_as_failures(mixed_summary: RunSummary) {
    assert_eq!(mixed_summary.total, 4);
    assert_eq!(mixed_summary.succeeded, 2);
    assert_eq!(mixed_summary.failed, 2);
    assert!(!mixed_summary.all_succeeded());
}

#[rstest]
fn build_of_empty_run_is_all_succeeded(run_at: DateTime<Utc>) {
    let summary = RunSummary::build(Vec::new(), run_at);
    assert_eq!(summary.total, 0);
    assert!(summary.all_succeeded());
    assert!(render_report(&summary).contains("No instances were processed."));
}

#[rstest]
fn interrupted_inventory_is_flagged_and_not_all_succeeded(run_at: DateTime<Utc>) {
    let summary = RunSummary::build(vec![outcome("1", OutcomeStatus::Success, None)], run_at)
        .with_inventory_complete(false);

    assert_eq!(summary.failed, 0);
    assert!(!summary.all_succeeded());
    let text = render_report(&summary);
    assert!(text.contains(INVENTORY_INCOMPLETE_WARNING), "report: {text}");
    let value = serde_json::to_value(&summary).expect("summary serialises");
    assert_eq!(value["inventory_complete"], false);
}

#[rstest]
fn complete_inventory_has_no_warning(mixed_summary: RunSummary) {
    assert!(mixed_summary.inventory_complete);
    assert!(!render_report(&mixed_summary).contains(INVENTORY_INCOMPLETE_WARNING));
}

#[rstest]
fn report_lists_every_instance(mixed_summary: RunSummary) {
    let text = render_report(&mixed_summary);
    assert!(text.starts_with("Snapshot Report - 2099-01-01\n"));
    assert!(text.contains("Total: 4  Succeeded: 2  Failed: 2"));
    assert!(text.contains("[success] vm-1 (1): snapshot-2099-01-01_000000"));
    assert!(text.contains("[failed] vm-3 (3): snapshot-2099-01-01_000000 - status 500: boom"));
    assert!(text.contains("[error] vm-4 (4)"));
}

#[rstest]
fn summary_serialises_status_tags(mixed_summary: RunSummary) {
    let value = serde_json::to_value(&mixed_summary).expect("summary serialises");
    assert_eq!(value["total"], 4);
    assert_eq!(value["outcomes"][2]["status"], "failed");
    assert_eq!(value["outcomes"][1]["eviction"]["result"], "deleted");
    assert_eq!(value["run_at"], "2099-01-01T00:00:00Z");
}

#[derive(Clone, Default)]
struct CountingSink {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl NotificationSink for CountingSink {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn deliver<'a>(&'a self, _summary: &'a RunSummary) -> DispatchFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DispatchError::Delivery {
                    sink: String::from("counting"),
                    message: String::from("smtp down"),
                })
            } else {
                Ok(())
            }
        })
    }
}

#[rstest]
#[tokio::test]
async fn failing_sink_does_not_stop_the_others(mixed_summary: RunSummary) {
    let failing = CountingSink {
        fail: true,
        ..CountingSink::default()
    };
    let healthy = CountingSink::default();
    let reporter = Reporter::new()
        .with_sink(failing.clone())
        .with_sink(healthy.clone());

    let delivered = reporter.dispatch(&mixed_summary).await;

    assert_eq!(delivered, 1);
    assert_eq!(reporter.sink_count(), 2);
    assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
}

#[rstest]
#[tokio::test]
async fn log_sink_always_delivers(mixed_summary: RunSummary) {
    let reporter = Reporter::new().with_sink(LogSink);
    assert_eq!(reporter.dispatch(&mixed_summary).await, 1);
}

#[rstest]
#[tokio::test]
async fn webhook_posts_subject_text_and_summary(mixed_summary: RunSummary) {
    let transport = ScriptedTransport::default();
    transport.push_response(200, "{}");
    let sink = WebhookSink::new(Arc::new(transport.clone()), "https://hooks.test/report");

    sink.deliver(&mixed_summary).await.expect("webhook accepts");

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, "https://hooks.test/report");
    let Some(RequestBody::Json(body)) = request.body.as_ref() else {
        panic!("expected a JSON body, got {:?}", request.body);
    };
    assert_eq!(body["subject"], "Snapshot Report - 2099-01-01");
    assert!(body["text"].as_str().is_some_and(|text| text.contains("vm-4")));
    assert_eq!(body["summary"]["failed"], 2);
}

#[rstest]
#[case::rejected(Some(500))]
#[case::unreachable(None)]
#[tokio::test]
async fn webhook_failures_surface_as_dispatch_errors(
    mixed_summary: RunSummary,
    #[case] status: Option<u16>,
) {
    let transport = ScriptedTransport::default();
    match status {
        Some(code) => transport.push_response(code, "nope"),
        None => transport.push_network_error("connection refused"),
    }
    let sink = WebhookSink::new(Arc::new(transport), "https://hooks.test/report");

    let err = sink
        .deliver(&mixed_summary)
        .await
        .expect_err("delivery should fail");

    match (status, err) {
        (Some(code), DispatchError::Rejected { status: got, .. }) => assert_eq!(got, code),
        (None, DispatchError::Delivery { message, .. }) => {
            assert!(message.contains("connection refused"));
        }
        (_, other) => panic!("unexpected error: {other}"),
    }
}
