//! Encoding and decoding of the rollback log file
//!
//! The log is a pretty-printed JSON array of
//! `{ "kind", "payload", "recoveryMessage", "recordedAt" }` records, newest first.

use crate::entry::{
    AddModelPayload, DeleteModelPayload, MigrationPayload, RenameModelPayload, RollbackAction,
    RollbackEntry, RollbackKind,
};
use crate::error::{RollbackError, RollbackResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// On-disk shape of one record. `type`/`data` are accepted for logs written
/// by the first releases of the tool.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(alias = "type")]
    kind: String,
    #[serde(default, alias = "data")]
    payload: serde_json::Value,
    #[serde(default)]
    recovery_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recorded_at: Option<DateTime<Utc>>,
}

/// A record that was skipped while decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeWarning {
    /// Position of the record in the file
    pub index: usize,
    /// The unrecognized kind tag
    pub kind: String,
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record {} has unknown kind '{}' and was skipped",
            self.index, self.kind
        )
    }
}

/// Result of a lenient decode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedLog {
    pub entries: Vec<RollbackEntry>,
    pub warnings: Vec<DecodeWarning>,
}

/// Encode entries into the log file format
pub fn encode(entries: &[RollbackEntry]) -> RollbackResult<String> {
    let raw = entries
        .iter()
        .map(to_raw)
        .collect::<RollbackResult<Vec<_>>>()?;
    serde_json::to_string_pretty(&raw)
        .map_err(|e| RollbackError::corrupt(format!("failed to encode entries: {}", e)))
}

/// Decode a log, failing on any record whose kind is unknown
pub fn decode(text: &str) -> RollbackResult<Vec<RollbackEntry>> {
    let decoded = decode_lenient(text)?;
    match decoded.warnings.first() {
        Some(warning) => Err(RollbackError::corrupt(warning.to_string())),
        None => Ok(decoded.entries),
    }
}

/// Decode a log, skipping records with unknown kinds and reporting each one
///
/// Empty (or whitespace-only) text decodes to an empty log. Malformed JSON,
/// records without a kind, and malformed payloads of known kinds are errors.
pub fn decode_lenient(text: &str) -> RollbackResult<DecodedLog> {
    if text.trim().is_empty() {
        return Ok(DecodedLog::default());
    }

    let raw: Vec<RawEntry> = serde_json::from_str(text)
        .map_err(|e| RollbackError::corrupt(format!("not a list of rollback records: {}", e)))?;

    let mut decoded = DecodedLog::default();
    for (index, record) in raw.into_iter().enumerate() {
        match RollbackKind::from_tag(&record.kind) {
            Some(kind) => decoded.entries.push(from_raw(index, kind, record)?),
            None => decoded.warnings.push(DecodeWarning {
                index,
                kind: record.kind,
            }),
        }
    }
    Ok(decoded)
}

fn to_raw(entry: &RollbackEntry) -> RollbackResult<RawEntry> {
    let payload = match &entry.action {
        RollbackAction::AddModel(p) => serde_json::to_value(p),
        RollbackAction::RenameModel(p) => serde_json::to_value(p),
        RollbackAction::DeleteModel(p) => serde_json::to_value(p),
        RollbackAction::Migration(p) => serde_json::to_value(p),
    }
    .map_err(|e| RollbackError::corrupt(format!("failed to encode payload: {}", e)))?;

    Ok(RawEntry {
        kind: entry.kind().as_str().to_string(),
        payload,
        recovery_message: entry.recovery_message.clone(),
        recorded_at: entry.recorded_at,
    })
}

fn from_raw(index: usize, kind: RollbackKind, raw: RawEntry) -> RollbackResult<RollbackEntry> {
    let action = match kind {
        RollbackKind::AddModel => {
            RollbackAction::AddModel(payload::<AddModelPayload>(index, kind, raw.payload)?)
        }
        RollbackKind::RenameModel => {
            RollbackAction::RenameModel(payload::<RenameModelPayload>(index, kind, raw.payload)?)
        }
        RollbackKind::DeleteModel => {
            RollbackAction::DeleteModel(payload::<DeleteModelPayload>(index, kind, raw.payload)?)
        }
        RollbackKind::Migration => {
            // Early logs stored the model names as a bare array
            let payload = match raw.payload {
                serde_json::Value::Array(_) => MigrationPayload {
                    model_names: payload(index, kind, raw.payload)?,
                },
                other => payload(index, kind, other)?,
            };
            RollbackAction::Migration(payload)
        }
    };

    Ok(RollbackEntry {
        action,
        recovery_message: raw.recovery_message,
        recorded_at: raw.recorded_at,
    })
}

fn payload<T: DeserializeOwned>(
    index: usize,
    kind: RollbackKind,
    value: serde_json::Value,
) -> RollbackResult<T> {
    serde_json::from_value(value).map_err(|e| {
        RollbackError::corrupt(format!(
            "record {} ({}) has a malformed payload: {}",
            index, kind, e
        ))
    })
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn name_strategy() -> impl Strategy<Value = String> {
        r"[a-z_][a-z0-9_]{0,12}".prop_map(|s| s.to_string())
    }

    fn value_strategy() -> impl Strategy<Value = serde_json::Value> {
        prop_oneof![
            Just(serde_json::Value::Null),
            any::<i64>().prop_map(|n| json!(n)),
            r"[ -~]{0,20}".prop_map(|s| json!(s)),
        ]
    }

    fn action_strategy() -> impl Strategy<Value = RollbackAction> {
        prop_oneof![
            name_strategy().prop_map(RollbackAction::add_model),
            (name_strategy(), name_strategy()).prop_map(|(a, b)| RollbackAction::rename_model(a, b)),
            prop::collection::vec(name_strategy(), 0..4).prop_map(RollbackAction::migration),
            (name_strategy(), 1usize..4)
                .prop_flat_map(|(name, width)| {
                    (
                        Just(name),
                        prop::collection::vec((name_strategy(), "TEXT|INTEGER|REAL"), width),
                        prop::collection::vec(prop::collection::vec(value_strategy(), width), 0..4),
                    )
                })
                .prop_map(|(name, cols, rows)| {
                    let columns: Vec<_> = cols
                        .into_iter()
                        .map(|(n, t)| crate::collaborators::ColumnDef::new(n, t))
                        .collect();
                    RollbackAction::delete_model(name, &columns, rows)
                }),
        ]
    }

    proptest! {
        /// decode(encode(entries)) == entries for every kind
        #[test]
        fn prop_round_trip(
            entries in prop::collection::vec((action_strategy(), r"[ -~]{0,40}"), 0..8)
        ) {
            let entries: Vec<RollbackEntry> = entries
                .into_iter()
                .map(|(action, msg)| RollbackEntry::new(action, msg))
                .collect();
            let text = encode(&entries).unwrap();
            prop_assert_eq!(decode(&text).unwrap(), entries);
        }
    }
}
