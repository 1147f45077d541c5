// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Captured row records
//!
//! A baseline is a set of [`BaselineRow`]s, one per captured fragment type.
//! A delta is a set of [`DeltaRow`]s, one per detected change. Both carry the
//! same [`RowHeader`] so that rows read back from disk can be regrouped by
//! subject without any side index.

use crate::payload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version written into every row header
pub const SCHEMA_VERSION: u32 = 1;

/// Row kind for captured fragments
pub const COMPONENT_ROW: &str = "component";

/// The subject a snapshot belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    /// Display name as reported by the runtime (may change between sessions)
    pub name: String,
    /// Stable numeric identity
    pub id: u64,
}

impl Subject {
    pub fn new(name: impl Into<String>, id: u64) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// Header fields shared by baseline and delta rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowHeader {
    pub version: u32,
    pub snapshot_id: String,
    pub subject_key: String,
    pub display_name: String,
    pub subject_id: u64,
    pub zone_id: String,
    pub captured_at: DateTime<Utc>,
}

impl RowHeader {
    pub fn new(
        snapshot_id: impl Into<String>,
        subject_key: impl Into<String>,
        subject: &Subject,
        zone_id: impl Into<String>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION,
            snapshot_id: snapshot_id.into(),
            subject_key: subject_key.into(),
            display_name: subject.name.clone(),
            subject_id: subject.id,
            zone_id: zone_id.into(),
            captured_at,
        }
    }

    pub fn subject(&self) -> Subject {
        Subject::new(self.display_name.clone(), self.subject_id)
    }
}

impl Default for RowHeader {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            snapshot_id: String::new(),
            subject_key: String::new(),
            display_name: String::new(),
            subject_id: 0,
            zone_id: String::new(),
            captured_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Rows that carry a [`RowHeader`]
pub trait HeaderRow {
    fn header(&self) -> &RowHeader;
}

/// One captured fragment
///
/// `(snapshot_id, qualified_type)` is unique within a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineRow {
    pub header: RowHeader,
    pub row_kind: String,
    /// Short type name (last path segment)
    pub type_name: String,
    /// Fully-qualified type name used as the identity of the fragment
    pub qualified_type: String,
    pub existed: bool,
    /// Base64 of the UTF-8 JSON payload
    pub payload: String,
    /// Uppercase hex SHA-256 of the JSON payload
    pub payload_hash: String,
}

impl BaselineRow {
    /// Build a component row from a fragment's JSON text
    pub fn component(header: RowHeader, qualified_type: &str, existed: bool, json: &str) -> Self {
        Self {
            header,
            row_kind: COMPONENT_ROW.to_string(),
            type_name: payload::short_type_name(qualified_type).to_string(),
            qualified_type: qualified_type.to_string(),
            existed,
            payload: payload::encode(json),
            payload_hash: payload::hash(json),
        }
    }

    /// Decoded JSON text of the payload (empty when missing or undecodable)
    pub fn json(&self) -> String {
        payload::decode(&self.payload)
    }
}

impl HeaderRow for BaselineRow {
    fn header(&self) -> &RowHeader {
        &self.header
    }
}

/// Operation recorded by a delta row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaOp {
    Changed,
    Opened,
    Created,
    Removed,
    PrefabChanged,
}

impl DeltaOp {
    pub fn as_str(self) -> &'static str {
        match self {
            DeltaOp::Changed => "changed",
            DeltaOp::Opened => "opened",
            DeltaOp::Created => "created",
            DeltaOp::Removed => "removed",
            DeltaOp::PrefabChanged => "prefab_changed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "changed" => Some(DeltaOp::Changed),
            "opened" => Some(DeltaOp::Opened),
            "created" => Some(DeltaOp::Created),
            "removed" => Some(DeltaOp::Removed),
            "prefab_changed" => Some(DeltaOp::PrefabChanged),
            _ => None,
        }
    }

    /// Row kind tag written next to the operation
    pub fn row_kind(self) -> &'static str {
        match self {
            DeltaOp::Changed => "component_changed",
            DeltaOp::Opened => "tech_opened",
            DeltaOp::Created => "entity_created",
            DeltaOp::Removed => "entity_removed",
            DeltaOp::PrefabChanged => "entity_prefab_changed",
        }
    }
}

impl fmt::Display for DeltaOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// World-space position of an owned object
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// One detected change
///
/// The operation decides which optional fields are populated. Unused fields
/// hold zero values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaRow {
    pub header: RowHeader,
    pub op: DeltaOp,
    pub type_name: String,
    pub before_payload: String,
    pub after_payload: String,
    pub tech_id: i64,
    pub tech_label: String,
    pub entity_index: i32,
    pub entity_version: i32,
    pub prefab_id: i64,
    pub prefab_name: String,
    pub position: Position,
}

impl DeltaRow {
    /// An empty row for the given operation
    pub fn new(op: DeltaOp) -> Self {
        Self {
            header: RowHeader::default(),
            op,
            type_name: String::new(),
            before_payload: String::new(),
            after_payload: String::new(),
            tech_id: 0,
            tech_label: String::new(),
            entity_index: 0,
            entity_version: 0,
            prefab_id: 0,
            prefab_name: String::new(),
            position: Position::default(),
        }
    }

    pub fn changed(type_name: &str, before_payload: &str, after_payload: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            before_payload: before_payload.to_string(),
            after_payload: after_payload.to_string(),
            ..Self::new(DeltaOp::Changed)
        }
    }

    pub fn opened(tech_id: i64) -> Self {
        Self {
            tech_id,
            tech_label: format!("GUID:{tech_id}"),
            ..Self::new(DeltaOp::Opened)
        }
    }

    /// A created/removed/prefab_changed row for an owned object
    pub fn owned(op: DeltaOp, object: &OwnedObject) -> Self {
        Self {
            entity_index: object.index,
            entity_version: object.version,
            prefab_id: object.prefab_id,
            prefab_name: object.prefab_name.clone(),
            position: object.position,
            ..Self::new(op)
        }
    }

    pub fn row_kind(&self) -> &'static str {
        self.op.row_kind()
    }
}

impl HeaderRow for DeltaRow {
    fn header(&self) -> &RowHeader {
        &self.header
    }
}

/// A sub-object owned by the subject's surroundings (e.g. placed in a zone)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedObject {
    pub index: i32,
    pub version: i32,
    pub prefab_id: i64,
    pub prefab_name: String,
    pub position: Position,
}

impl OwnedObject {
    pub fn new(index: i32, version: i32, prefab_id: i64, prefab_name: impl Into<String>) -> Self {
        Self {
            index,
            version,
            prefab_id,
            prefab_name: prefab_name.into(),
            position: Position::default(),
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Identity pair used for diffing
    pub fn identity(&self) -> (i32, i32) {
        (self.index, self.version)
    }
}

/// Transient record bridging a capture to the matching enter
#[derive(Debug, Clone, PartialEq)]
pub struct PendingContext {
    pub subject_key: String,
    pub subject: Subject,
    pub zone_id: String,
    pub snapshot_id: String,
    pub captured_at: DateTime<Utc>,
    pub rows: Vec<BaselineRow>,
    /// Owned objects observed immediately before capture
    pub owned_before: Vec<OwnedObject>,
}

/// A subject's rows together with their shared snapshot metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<R> {
    pub subject_key: String,
    pub subject: Subject,
    pub zone_id: String,
    pub snapshot_id: String,
    pub captured_at: DateTime<Utc>,
    pub rows: Vec<R>,
}

impl<R: HeaderRow> Snapshot<R> {
    /// Build a snapshot from a non-empty group of rows sharing one key
    ///
    /// Rows are ordered by capture time; metadata comes from the earliest row.
    pub fn from_rows(subject_key: impl Into<String>, mut rows: Vec<R>) -> Option<Self> {
        rows.sort_by_key(|r| r.header().captured_at);
        let first = rows.first()?.header().clone();
        Some(Self {
            subject_key: subject_key.into(),
            subject: first.subject(),
            zone_id: first.zone_id,
            snapshot_id: first.snapshot_id,
            captured_at: first.captured_at,
            rows,
        })
    }
}

pub type BaselineSnapshot = Snapshot<BaselineRow>;
pub type DeltaSnapshot = Snapshot<DeltaRow>;

#[cfg(test)]
#[path = "row_tests.rs"]
mod tests;
