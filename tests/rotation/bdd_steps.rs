//! BDD step definitions for snapshot rotation runs.

use rstest_bdd_macros::{given, then, when};
use snapwarden::api::QUOTA_EXCEEDED_MARKER;
use snapwarden::test_support::{json_created_snapshot, json_instances_page, json_snapshots};
use snapwarden::transport::{Method, RequestBody};
use snapwarden::{INVENTORY_INCOMPLETE_WARNING, render_report};
use tokio::runtime::Runtime;

use super::test_helpers::{
    RotationContext, RunResult, WEBHOOK_URL, build_job, snapshots_path,
};

const SNAPSHOT_NAME: &str = "snapshot-2099-01-01_000000";

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn script_inventory(context: &RotationContext, ids: &[&str]) {
    let pairs: Vec<(&str, &str)> = ids.iter().map(|id| (*id, *id)).collect();
    context.transport.push_token();
    context.transport.push_token();
    context
        .transport
        .push_response(200, json_instances_page(&pairs, None));
}

fn script_eviction(context: &RotationContext, id: &str) {
    let newer = format!("{id}-new");
    let older = format!("{id}-old");
    context.transport.push_token();
    context
        .transport
        .push_response(402, format!("{{\"message\":\"{QUOTA_EXCEEDED_MARKER}\"}}"));
    context.transport.push_token();
    context.transport.push_response(
        200,
        json_snapshots(&[
            (newer.as_str(), "2024-02-01T00:00:00Z"),
            (older.as_str(), "2024-01-01T00:00:00Z"),
        ]),
    );
    context.transport.push_token();
    context.transport.push_response(204, "");
}

fn summary(context: &RotationContext) -> Result<&snapwarden::RunSummary, StepError> {
    match context.outcome.as_ref() {
        Some(RunResult::Completed(summary)) => Ok(summary),
        Some(RunResult::Aborted(message)) => Err(StepError::Assertion(format!(
            "expected a completed run, got abort: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[given("an account listing instances \"{first}\" and \"{second}\"")]
fn account_with_two(
    rotation_context: RotationContext,
    first: String,
    second: String,
) -> RotationContext {
    script_inventory(&rotation_context, &[first.as_str(), second.as_str()]);
    rotation_context
}

#[given("an account listing instance \"{id}\"")]
fn account_with_one(rotation_context: RotationContext, id: String) -> RotationContext {
    script_inventory(&rotation_context, &[id.as_str()]);
    rotation_context
}

#[given("an account whose second inventory page fails after instance \"{id}\"")]
fn account_with_failing_page(rotation_context: RotationContext, id: String) -> RotationContext {
    let transport = &rotation_context.transport;
    transport.push_token();
    transport.push_token();
    transport.push_response(
        200,
        json_instances_page(
            &[(id.as_str(), id.as_str())],
            Some("/v1/compute/instances?page=2&size=100"),
        ),
    );
    transport.push_token();
    transport.push_response(500, "internal error");
    rotation_context
}

#[given("snapshot creation succeeds for \"{id}\"")]
fn creation_succeeds(rotation_context: RotationContext, id: String) -> RotationContext {
    rotation_context.transport.push_token();
    rotation_context
        .transport
        .push_response(201, json_created_snapshot(&format!("{id}-fresh"), SNAPSHOT_NAME));
    rotation_context
}

#[given("snapshot creation fails for \"{id}\" with status {status:u16}")]
fn creation_fails(rotation_context: RotationContext, id: String, status: u16) -> RotationContext {
    rotation_context.transport.push_token();
    rotation_context
        .transport
        .push_response(status, format!("cannot snapshot {id}"));
    rotation_context
}

#[given("\"{id}\" hits its snapshot quota once")]
fn quota_hit_once(rotation_context: RotationContext, id: String) -> RotationContext {
    script_eviction(&rotation_context, &id);
    rotation_context.transport.push_token();
    rotation_context
        .transport
        .push_response(201, json_created_snapshot(&format!("{id}-fresh"), SNAPSHOT_NAME));
    rotation_context
}

#[given("\"{id}\" stays over its snapshot quota")]
fn quota_persists(rotation_context: RotationContext, id: String) -> RotationContext {
    script_eviction(&rotation_context, &id);
    rotation_context.transport.push_token();
    rotation_context
        .transport
        .push_response(402, QUOTA_EXCEEDED_MARKER);
    rotation_context
}

#[given("the webhook accepts reports")]
fn webhook_accepts(mut rotation_context: RotationContext) -> RotationContext {
    rotation_context.webhook = true;
    rotation_context.transport.push_response(200, "ok");
    rotation_context
}

#[given("the webhook rejects reports")]
fn webhook_rejects(mut rotation_context: RotationContext) -> RotationContext {
    rotation_context.webhook = true;
    rotation_context.transport.push_response(503, "unavailable");
    rotation_context
}

#[given("the token endpoint rejects the credentials")]
fn token_rejected(rotation_context: RotationContext) -> RotationContext {
    rotation_context
        .transport
        .push_response(401, "{\"error\":\"invalid_grant\"}");
    rotation_context
}

#[when("the snapshot job runs")]
fn run_job(mut rotation_context: RotationContext) -> Result<RotationContext, StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))?;
    let job = build_job(&rotation_context);
    let result = runtime.block_on(async move { job.execute().await });
    rotation_context.outcome = Some(match result {
        Ok(summary) => RunResult::Completed(summary),
        Err(err) => RunResult::Aborted(err.to_string()),
    });
    Ok(rotation_context)
}

#[then(
    "the run summary reports {total:usize} total, {succeeded:usize} succeeded and {failed:usize} failed"
)]
fn summary_counts(
    rotation_context: &RotationContext,
    total: usize,
    succeeded: usize,
    failed: usize,
) -> Result<(), StepError> {
    let summary = summary(rotation_context)?;
    if (summary.total, summary.succeeded, summary.failed) == (total, succeeded, failed) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {total}/{succeeded}/{failed}, got {}/{}/{}",
            summary.total, summary.succeeded, summary.failed
        )))
    }
}

#[then("instance \"{id}\" needed {attempts:u8} attempts")]
fn attempts_for(
    rotation_context: &RotationContext,
    id: String,
    attempts: u8,
) -> Result<(), StepError> {
    let summary = summary(rotation_context)?;
    let outcome = summary
        .outcomes
        .iter()
        .find(|outcome| outcome.instance_id == id)
        .ok_or_else(|| StepError::Assertion(format!("no outcome for {id}")))?;
    if outcome.attempts == attempts {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {attempts} attempts for {id}, got {}",
            outcome.attempts
        )))
    }
}

#[then("the oldest snapshot of \"{id}\" is deleted")]
fn oldest_deleted(rotation_context: &RotationContext, id: String) -> Result<(), StepError> {
    let expected = format!("{}/{id}-old", snapshots_path(&id));
    let deletes: Vec<String> = rotation_context
        .transport
        .requests()
        .into_iter()
        .filter(|request| request.method == Method::Delete)
        .map(|request| request.url)
        .collect();
    if deletes == vec![expected.clone()] {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected a single delete of {expected}, got {deletes:?}"
        )))
    }
}

#[then("at most {limit:usize} snapshots were requested for \"{id}\"")]
fn create_limit(
    rotation_context: &RotationContext,
    limit: usize,
    id: String,
) -> Result<(), StepError> {
    let path = snapshots_path(&id);
    let creates = rotation_context
        .transport
        .requests()
        .iter()
        .filter(|request| request.method == Method::Post && request.url == path)
        .count();
    if creates <= limit {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected at most {limit} creates for {id}, got {creates}"
        )))
    }
}

#[then("the report flags the inventory as incomplete")]
fn report_flags_incomplete(rotation_context: &RotationContext) -> Result<(), StepError> {
    let summary = summary(rotation_context)?;
    if summary.inventory_complete || summary.all_succeeded() {
        return Err(StepError::Assertion(format!(
            "expected an incomplete inventory, got {summary:?}"
        )));
    }
    let text = render_report(summary);
    if !text.contains(INVENTORY_INCOMPLETE_WARNING) {
        return Err(StepError::Assertion(format!(
            "report should warn about the incomplete inventory: {text}"
        )));
    }
    let webhook_flagged = rotation_context
        .transport
        .requests()
        .iter()
        .filter(|request| request.url == WEBHOOK_URL)
        .any(|request| {
            matches!(
                request.body.as_ref(),
                Some(RequestBody::Json(body)) if body["summary"]["inventory_complete"] == false
            )
        });
    if webhook_flagged {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from(
            "webhook payload should carry inventory_complete = false",
        )))
    }
}

#[then("the report is delivered to the webhook")]
fn report_delivered(rotation_context: &RotationContext) -> Result<(), StepError> {
    let delivered = rotation_context
        .transport
        .requests()
        .iter()
        .any(|request| request.method == Method::Post && request.url == WEBHOOK_URL);
    if delivered {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from(
            "expected a POST to the webhook",
        )))
    }
}

#[then("the run is aborted with an authentication error")]
fn run_aborted(rotation_context: &RotationContext) -> Result<(), StepError> {
    match rotation_context.outcome.as_ref() {
        Some(RunResult::Aborted(message)) if message.contains("authentication failed") => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected an authentication abort, got {other:?}"
        ))),
    }
}

#[then("no snapshot is requested")]
fn no_snapshot_requested(rotation_context: &RotationContext) -> Result<(), StepError> {
    let requested = rotation_context
        .transport
        .requests()
        .iter()
        .any(|request| request.url.contains("/snapshots"));
    if requested {
        Err(StepError::Assertion(String::from(
            "no snapshot endpoint should be called",
        )))
    } else {
        Ok(())
    }
}
