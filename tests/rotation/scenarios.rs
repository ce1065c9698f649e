//! BDD scenarios for snapshot rotation runs.

use rstest_bdd_macros::scenario;

use super::test_helpers::{RotationContext, rotation_context};

#[scenario(
    path = "tests/features/rotation.feature",
    name = "Recover from a quota hit by evicting the oldest snapshot"
)]
fn scenario_quota_recovery(rotation_context: RotationContext) {
    let _ = rotation_context;
}

#[scenario(
    path = "tests/features/rotation.feature",
    name = "Give up when the quota persists after eviction"
)]
fn scenario_quota_persists(rotation_context: RotationContext) {
    let _ = rotation_context;
}

#[scenario(
    path = "tests/features/rotation.feature",
    name = "Keep the first page when the second inventory page fails"
)]
fn scenario_partial_inventory(rotation_context: RotationContext) {
    let _ = rotation_context;
}

#[scenario(
    path = "tests/features/rotation.feature",
    name = "A failing notification sink does not fail the run"
)]
fn scenario_failing_sink(rotation_context: RotationContext) {
    let _ = rotation_context;
}

#[scenario(
    path = "tests/features/rotation.feature",
    name = "Abort the run when authentication fails"
)]
fn scenario_auth_failure(rotation_context: RotationContext) {
    let _ = rotation_context;
}
