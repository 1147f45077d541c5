// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progression journal listing

use crate::output::{clip, print_list, OutputFormat};
use chrono::SecondsFormat;
use clap::Args;
use sbx_storage::{Journal, JournalRecord, SnapshotFiles};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Args)]
pub struct JournalArgs {
    /// Snapshot directory
    pub dir: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Serialize)]
#[serde(transparent)]
struct JournalLine(JournalRecord);

impl fmt::Display for JournalLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.0;
        write!(
            f,
            "{} {:<16} {:<6} {}",
            r.captured_utc.to_rfc3339_opts(SecondsFormat::Secs, true),
            clip(&r.player_key, 16),
            r.operation.as_str(),
            r.component_type
        )
    }
}

pub fn handle(args: JournalArgs) -> anyhow::Result<()> {
    let path = SnapshotFiles::new(&args.dir).journal_path();
    tracing::debug!(path = %path.display(), "replaying journal");
    let lines: Vec<JournalLine> = Journal::replay(&path)?
        .into_iter()
        .map(JournalLine)
        .collect();
    print_list(&lines, args.format, "No journal records")
}
