// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-subject summary of a snapshot directory

use crate::output::{clip, print_list, OutputFormat};
use chrono::{DateTime, Utc};
use clap::Args;
use sbx_core::{id, BaselineRow, DeltaOp, DeltaRow, RowHeader};
use sbx_storage::SnapshotFiles;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Args)]
pub struct StatusArgs {
    /// Snapshot directory
    pub dir: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEntry {
    pub key: String,
    pub name: String,
    pub platform_id: u64,
    pub zone_id: String,
    pub snapshot_id: String,
    pub captured_utc: DateTime<Utc>,
    pub baseline_rows: usize,
    pub delta_rows: usize,
    pub changed: usize,
    pub opened: usize,
    /// Created, removed and prefab-changed object rows
    pub objects: usize,
}

impl StatusEntry {
    fn new(key: String, header: &RowHeader) -> Self {
        Self {
            key,
            name: header.display_name.clone(),
            platform_id: header.subject_id,
            zone_id: header.zone_id.clone(),
            snapshot_id: header.snapshot_id.clone(),
            captured_utc: header.captured_at,
            baseline_rows: 0,
            delta_rows: 0,
            changed: 0,
            opened: 0,
            objects: 0,
        }
    }
}

impl fmt::Display for StatusEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<16} {:<20} {:<12} baseline={} delta={} (changed={}, opened={}, objects={})",
            clip(&self.key, 16),
            self.platform_id,
            clip(&self.zone_id, 12),
            self.baseline_rows,
            self.delta_rows,
            self.changed,
            self.opened,
            self.objects
        )
    }
}

fn row_key(header: &RowHeader) -> String {
    if header.subject_key.trim().is_empty() {
        id::composite_key(&header.display_name, header.subject_id)
    } else {
        header.subject_key.clone()
    }
}

/// One entry per subject key, ordered by key
pub fn summarize(baselines: &[BaselineRow], deltas: &[DeltaRow]) -> Vec<StatusEntry> {
    let mut entries: BTreeMap<String, StatusEntry> = BTreeMap::new();
    for row in baselines {
        let key = row_key(&row.header);
        entries
            .entry(key.clone())
            .or_insert_with(|| StatusEntry::new(key, &row.header))
            .baseline_rows += 1;
    }
    for row in deltas {
        let key = row_key(&row.header);
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| StatusEntry::new(key, &row.header));
        entry.delta_rows += 1;
        match row.op {
            DeltaOp::Changed => entry.changed += 1,
            DeltaOp::Opened => entry.opened += 1,
            DeltaOp::Created | DeltaOp::Removed | DeltaOp::PrefabChanged => entry.objects += 1,
        }
    }
    entries.into_values().collect()
}

pub fn handle(args: StatusArgs) -> anyhow::Result<()> {
    let files = SnapshotFiles::new(&args.dir);
    let baselines = sbx_storage::read_baseline(&files.baseline_path())?;
    let deltas = sbx_storage::read_delta(&files.delta_path())?;
    tracing::debug!(
        dir = %args.dir.display(),
        baseline_rows = baselines.len(),
        delta_rows = deltas.len(),
        "read snapshot files"
    );
    print_list(
        &summarize(&baselines, &deltas),
        args.format,
        "No active snapshots",
    )
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
