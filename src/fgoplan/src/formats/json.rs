//! Native JSON snapshots
//!
//! Two layouts are accepted: a bare array of servants (the oldest format) and
//! `{"version": 1, "servants": [...], "items": [[id, count]], "filters": {...}}`.
//! Anything else is rejected as a whole.

use super::{FormatError, Snapshot};
use crate::constants::{LEGACY_QP_ID, QP_ID};
use crate::id::ItemId;
use crate::roster::{Filters, OwnedServant};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const CURRENT_VERSION: u64 = 1;

#[derive(Serialize, Deserialize)]
struct Versioned {
    version: u64,
    servants: Vec<OwnedServant>,
    #[serde(default)]
    items: Vec<(ItemId, u64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filters: Option<Filters>,
}

/// Decode a snapshot, migrating older layouts.
pub fn read(contents: &str) -> Result<Snapshot, FormatError> {
    let value: Value = serde_json::from_str(contents)?;

    let legacy = match &value {
        Value::Array(_) => true,
        Value::Object(object) => {
            let version = object.get("version");
            if version.and_then(Value::as_u64) != Some(CURRENT_VERSION) {
                let version = version.map_or_else(|| "none".to_string(), Value::to_string);
                return Err(FormatError::UnsupportedVersion(version));
            }
            false
        }
        other => {
            return Err(FormatError::Layout(format!(
                "expected an array or object, found {}",
                other
            )))
        }
    };

    let mut snapshot = if legacy {
        Snapshot {
            servants: serde_json::from_value(value)?,
            ..Default::default()
        }
    } else {
        let data: Versioned = serde_json::from_value(value)?;
        Snapshot {
            servants: data.servants,
            items: data.items.into_iter().collect(),
            filters: data.filters.unwrap_or_default(),
        }
    };

    if let Some(qp) = snapshot.items.remove(&LEGACY_QP_ID) {
        snapshot.items.insert(QP_ID, qp);
    }

    Ok(snapshot)
}

/// Encode a snapshot in the current layout.
pub fn write(snapshot: &Snapshot, with_filters: bool) -> Result<String, FormatError> {
    let data = Versioned {
        version: CURRENT_VERSION,
        servants: snapshot.servants.clone(),
        items: snapshot.items.iter().map(|(&id, &count)| (id, count)).collect(),
        filters: with_filters.then_some(snapshot.filters),
    };
    Ok(serde_json::to_string(&data)?)
}
