//! Domain records and the wire envelopes they are decoded from.

use serde::{Deserialize, Deserializer, Serialize};

/// Compute instance managed by the account.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Instance {
    /// Provider identifier.
    pub id: String,
    /// Human-friendly name, used for reporting only.
    pub display_name: String,
}

impl Instance {
    /// Builds an instance record.
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Point-in-time snapshot of one instance.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Snapshot {
    /// Provider identifier.
    pub id: String,
    /// Identifier of the owning instance.
    pub instance_id: String,
    /// Snapshot name as stored by the provider.
    pub name: String,
    /// Creation timestamp as emitted by the API (ISO-8601).
    pub created_date: String,
}

impl Snapshot {
    /// Builds a snapshot record.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        instance_id: impl Into<String>,
        created_date: impl Into<String>,
    ) -> Self {
        let snapshot_id = id.into();
        Self {
            name: snapshot_id.clone(),
            id: snapshot_id,
            instance_id: instance_id.into(),
            created_date: created_date.into(),
        }
    }
}

/// Accepts identifiers emitted either as JSON strings or numbers.
fn opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) if !text.trim().is_empty() => Some(text),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct Links {
    #[serde(default)]
    pub(crate) next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InstancePage {
    #[serde(default)]
    pub(crate) data: Vec<InstanceRecord>,
    #[serde(rename = "_links", default)]
    pub(crate) links: Option<Links>,
}

impl InstancePage {
    pub(crate) fn next_link(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|links| links.next.as_deref())
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InstanceRecord {
    #[serde(default, deserialize_with = "opaque_id")]
    pub(crate) instance_id: Option<String>,
    #[serde(default)]
    pub(crate) display_name: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
}

impl InstanceRecord {
    /// Converts into an [`Instance`], or `None` when the identifier is missing.
    pub(crate) fn into_instance(self) -> Option<Instance> {
        let id = self.instance_id?;
        let display_name = self
            .display_name
            .filter(|name| !name.trim().is_empty())
            .or(self.name)
            .unwrap_or_default();
        Some(Instance { id, display_name })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SnapshotPage {
    #[serde(default)]
    pub(crate) data: Vec<SnapshotRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SnapshotRecord {
    #[serde(default, deserialize_with = "opaque_id")]
    pub(crate) snapshot_id: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) created_date: Option<String>,
}

impl SnapshotRecord {
    pub(crate) fn into_snapshot(self, instance_id: &str) -> Option<Snapshot> {
        let id = self.snapshot_id?;
        Some(Snapshot {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            instance_id: instance_id.to_owned(),
            created_date: self.created_date.unwrap_or_default(),
        })
    }
}

/// Create responses carry `data` either as an object or a one-element array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CreatedData {
    Many(Vec<SnapshotRecord>),
    One(SnapshotRecord),
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedEnvelope {
    pub(crate) data: CreatedData,
}

impl CreatedEnvelope {
    pub(crate) fn into_snapshot(self, instance_id: &str) -> Option<Snapshot> {
        let record = match self.data {
            CreatedData::Many(records) => records.into_iter().next()?,
            CreatedData::One(record) => record,
        };
        record.into_snapshot(instance_id)
    }
}
