// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only progression journal (JSON lines)

use chrono::{DateTime, Utc};
use sbx_core::payload;
use sbx_core::{BaselineRow, RowHeader, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur in journal operations
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How a fragment changed across an enter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalOp {
    Add,
    Remove,
    Modify,
}

impl JournalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            JournalOp::Add => "add",
            JournalOp::Remove => "remove",
            JournalOp::Modify => "modify",
        }
    }
}

/// One journal line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub version: u32,
    pub snapshot_id: String,
    pub player_key: String,
    pub character_name: String,
    pub platform_id: u64,
    pub zone_id: String,
    pub captured_utc: DateTime<Utc>,
    pub operation: JournalOp,
    pub component_type: String,
    pub assembly_qualified_type: String,
    #[serde(default)]
    pub before_json: String,
    #[serde(default)]
    pub after_json: String,
}

/// Records for every fragment whose decoded payload differs between captures
///
/// A fragment absent (or recorded as not existing) before is an `add`; absent
/// after is a `remove`; anything else is a `modify`.
pub fn journal_records(
    pre: &[BaselineRow],
    post: &[BaselineRow],
    header: &RowHeader,
) -> Vec<JournalRecord> {
    let index = |rows: &[BaselineRow]| -> BTreeMap<String, BaselineRow> {
        rows.iter()
            .filter(|r| r.row_kind.eq_ignore_ascii_case(sbx_core::row::COMPONENT_ROW))
            .map(|r| (r.qualified_type.clone(), r.clone()))
            .collect()
    };
    let before = index(pre);
    let after = index(post);

    let mut types: Vec<&String> = before.keys().chain(after.keys()).collect();
    types.sort();
    types.dedup();

    let mut records = Vec::new();
    for qualified in types {
        let b = before.get(qualified).filter(|r| r.existed);
        let a = after.get(qualified).filter(|r| r.existed);
        let before_json = b.map(BaselineRow::json).unwrap_or_default();
        let after_json = a.map(BaselineRow::json).unwrap_or_default();
        let operation = match (b, a) {
            (None, None) => continue,
            (Some(_), Some(_)) if before_json == after_json => continue,
            (None, Some(_)) => JournalOp::Add,
            (Some(_), None) => JournalOp::Remove,
            (Some(_), Some(_)) => JournalOp::Modify,
        };
        records.push(JournalRecord {
            version: SCHEMA_VERSION,
            snapshot_id: header.snapshot_id.clone(),
            player_key: header.subject_key.clone(),
            character_name: header.display_name.clone(),
            platform_id: header.subject_id,
            zone_id: header.zone_id.clone(),
            captured_utc: header.captured_at,
            operation,
            component_type: payload::short_type_name(qualified).to_string(),
            assembly_qualified_type: qualified.clone(),
            before_json,
            after_json,
        });
    }
    records
}

/// Append-only journal file
pub struct Journal {
    file: File,
    appended: u64,
}

impl Journal {
    /// Open or create a journal at the given path
    pub fn open(path: &Path) -> Result<Self, JournalError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file, appended: 0 })
    }

    /// Append records and sync them to disk
    pub fn append(&mut self, records: &[JournalRecord]) -> Result<u64, JournalError> {
        if records.is_empty() {
            return Ok(self.appended);
        }
        let mut buf = String::new();
        for record in records {
            buf.push_str(&serde_json::to_string(record)?);
            buf.push('\n');
        }
        self.file.write_all(buf.as_bytes())?;
        self.file.sync_all()?;
        self.appended += records.len() as u64;
        Ok(self.appended)
    }

    /// Number of records appended through this handle
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Read every record, skipping lines that do not parse
    pub fn replay(path: &Path) -> Result<Vec<JournalRecord>, JournalError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JournalRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(line = n + 1, error = %e, "skipping malformed journal line"),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
