//! Eviction choice when an instance has hit its snapshot quota.

use chrono::{DateTime, FixedOffset};

use crate::api::Snapshot;

/// Picks the oldest snapshot to evict.
///
/// Snapshots with an empty creation timestamp are never chosen, so `None`
/// is returned both for an empty listing and for one where no snapshot
/// carries a timestamp. When every candidate timestamp parses as RFC 3339
/// the instants are compared; otherwise every candidate is compared as
/// text. The mode is chosen once per listing, so the result does not depend
/// on listing order. On equal timestamps the first one encountered wins.
#[must_use]
pub fn pick_eviction(snapshots: &[Snapshot]) -> Option<&Snapshot> {
    let candidates: Vec<&Snapshot> = snapshots
        .iter()
        .filter(|snapshot| !snapshot.created_date.trim().is_empty())
        .collect();

    let instants: Option<Vec<DateTime<FixedOffset>>> = candidates
        .iter()
        .map(|snapshot| DateTime::parse_from_rfc3339(snapshot.created_date.trim()).ok())
        .collect();

    match instants {
        Some(instants) => first_minimum(candidates.iter().copied().zip(instants)),
        None => first_minimum(
            candidates
                .iter()
                .map(|&snapshot| (snapshot, snapshot.created_date.trim())),
        ),
    }
}

fn first_minimum<'a, K: Ord>(
    keyed: impl Iterator<Item = (&'a Snapshot, K)>,
) -> Option<&'a Snapshot> {
    let mut oldest: Option<(&Snapshot, K)> = None;
    for (snapshot, key) in keyed {
        if oldest.as_ref().is_none_or(|(_, current)| key < *current) {
            oldest = Some((snapshot, key));
        }
    }
    oldest.map(|(snapshot, _)| snapshot)
}
