// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Baseline and delta file listings

use crate::output::{clip, print_list, OutputFormat};
use chrono::{DateTime, Utc};
use clap::Args;
use sbx_core::{payload, BaselineRow, DeltaOp, DeltaRow, Position};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Args)]
pub struct RowsArgs {
    /// Gzip CSV file to read
    pub file: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub struct BaselineLine {
    key: String,
    name: String,
    platform_id: u64,
    zone_id: String,
    snapshot_id: String,
    captured_utc: DateTime<Utc>,
    type_name: String,
    qualified_type: String,
    existed: bool,
    /// Decoded JSON text
    payload: String,
    payload_hash: String,
}

impl From<BaselineRow> for BaselineLine {
    fn from(row: BaselineRow) -> Self {
        let payload = row.json();
        Self {
            key: row.header.subject_key,
            name: row.header.display_name,
            platform_id: row.header.subject_id,
            zone_id: row.header.zone_id,
            snapshot_id: row.header.snapshot_id,
            captured_utc: row.header.captured_at,
            type_name: row.type_name,
            qualified_type: row.qualified_type,
            existed: row.existed,
            payload,
            payload_hash: row.payload_hash,
        }
    }
}

impl fmt::Display for BaselineLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.existed { "present" } else { "absent" };
        write!(
            f,
            "{:<16} {:<28} {:<8} {}",
            clip(&self.key, 16),
            clip(&self.type_name, 28),
            state,
            self.payload
        )
    }
}

#[derive(Debug, Serialize)]
pub struct DeltaLine {
    key: String,
    name: String,
    platform_id: u64,
    zone_id: String,
    snapshot_id: String,
    captured_utc: DateTime<Utc>,
    operation: &'static str,
    type_name: String,
    before: String,
    after: String,
    tech_id: i64,
    tech_name: String,
    entity_index: i32,
    entity_version: i32,
    prefab_id: i64,
    prefab_name: String,
    position: Position,
    #[serde(skip)]
    op: DeltaOp,
}

impl From<DeltaRow> for DeltaLine {
    fn from(row: DeltaRow) -> Self {
        Self {
            key: row.header.subject_key,
            name: row.header.display_name,
            platform_id: row.header.subject_id,
            zone_id: row.header.zone_id,
            snapshot_id: row.header.snapshot_id,
            captured_utc: row.header.captured_at,
            operation: row.op.as_str(),
            type_name: row.type_name,
            before: payload::decode(&row.before_payload),
            after: payload::decode(&row.after_payload),
            tech_id: row.tech_id,
            tech_name: row.tech_label,
            entity_index: row.entity_index,
            entity_version: row.entity_version,
            prefab_id: row.prefab_id,
            prefab_name: row.prefab_name,
            position: row.position,
            op: row.op,
        }
    }
}

fn or_absent(payload: &str) -> &str {
    if payload.is_empty() {
        "(absent)"
    } else {
        payload
    }
}

impl fmt::Display for DeltaLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<16} {:<14} ", clip(&self.key, 16), self.operation)?;
        match self.op {
            DeltaOp::Changed => write!(
                f,
                "{}: {} -> {}",
                self.type_name,
                or_absent(&self.before),
                or_absent(&self.after)
            ),
            DeltaOp::Opened => write!(f, "{}", self.tech_name),
            DeltaOp::PrefabChanged => write!(
                f,
                "#{}:{} {} -> {}",
                self.entity_index, self.entity_version, self.before, self.after
            ),
            DeltaOp::Created | DeltaOp::Removed => write!(
                f,
                "#{}:{} {} ({}) at ({:.1}, {:.1}, {:.1})",
                self.entity_index,
                self.entity_version,
                self.prefab_name,
                self.prefab_id,
                self.position.x,
                self.position.y,
                self.position.z
            ),
        }
    }
}

pub fn baseline(args: RowsArgs) -> anyhow::Result<()> {
    let lines: Vec<BaselineLine> = sbx_storage::read_baseline(&args.file)?
        .into_iter()
        .map(BaselineLine::from)
        .collect();
    print_list(&lines, args.format, "No baseline rows")
}

pub fn delta(args: RowsArgs) -> anyhow::Result<()> {
    let lines: Vec<DeltaLine> = sbx_storage::read_delta(&args.file)?
        .into_iter()
        .map(DeltaLine::from)
        .collect();
    print_list(&lines, args.format, "No delta rows")
}

#[cfg(test)]
#[path = "rows_tests.rs"]
mod tests;
