//! Snapshot names and descriptions derived from the run clock.

use chrono::{DateTime, FixedOffset, Utc};

/// Prefix shared by every generated snapshot name.
pub const SNAPSHOT_PREFIX: &str = "snapshot-";

/// Renders `snapshot-<date>_<time>` in `timezone` and sanitises it.
///
/// Names are second-resolution; two snapshots of one instance within the
/// same second share a name.
#[must_use]
pub fn snapshot_name(now: DateTime<Utc>, timezone: FixedOffset) -> String {
    let local = now.with_timezone(&timezone);
    sanitize_name(&format!(
        "{SNAPSHOT_PREFIX}{}",
        local.format("%Y-%m-%d_%H:%M:%S")
    ))
}

/// Human-readable description sent alongside the name.
#[must_use]
pub fn snapshot_description(now: DateTime<Utc>, timezone: FixedOffset) -> String {
    let local = now.with_timezone(&timezone);
    format!(
        "Automated snapshot taken on {}",
        local.format("%Y-%m-%d %H:%M:%S %:z")
    )
}

/// Strips every character outside letters, digits, space, dash and
/// underscore.
#[must_use]
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '-' | '_'))
        .collect()
}
