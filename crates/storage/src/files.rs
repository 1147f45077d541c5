// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot file set
//!
//! The active baselines and deltas of every subject live in two gzip CSV
//! files in one directory. A mutex scoped to this file set serializes every
//! read/modify/write sequence; it is separate from the store's lock.

use crate::atomic::{remove_if_exists, StagedFile};
use crate::codec::{self, CodecError};
use crate::journal::{Journal, JournalError, JournalRecord};
use crate::legacy::LegacyEnvelope;
use chrono::{DateTime, Utc};
use sbx_core::{BaselineRow, BaselineSnapshot, DeltaRow, DeltaSnapshot, HeaderRow, Snapshot};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

pub const BASELINE_FILE: &str = "sandbox_baseline.csv.gz";
pub const DELTA_FILE: &str = "sandbox_delta.csv.gz";
pub const JOURNAL_FILE: &str = "sandbox_progression_journal.jsonl";
pub const LEGACY_FILE: &str = "sandbox_progression_snapshots.json";

/// Errors from loading or persisting the snapshot file set
#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Journal(#[from] JournalError),
    #[error("failed to replace {}: {source}", path.display())]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read legacy snapshots {}: {source}", path.display())]
    LegacyRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid legacy snapshots {}: {source}", path.display())]
    LegacyParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where snapshots loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Empty,
    Csv,
    Legacy,
}

/// Snapshots read at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub baselines: Vec<BaselineSnapshot>,
    pub deltas: Vec<DeltaSnapshot>,
    pub source: LoadSource,
}

/// Row counts of a completed write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub baseline_rows: usize,
    pub delta_rows: usize,
}

/// The files backing one snapshot directory
#[derive(Debug)]
pub struct SnapshotFiles {
    dir: PathBuf,
    legacy: PathBuf,
    lock: Mutex<()>,
}

impl SnapshotFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            legacy: dir.join(LEGACY_FILE),
            dir,
            lock: Mutex::new(()),
        }
    }

    /// Interpret a configured snapshot path
    ///
    /// Empty means no file I/O. A path with an extension names a file whose
    /// parent is the snapshot directory; a `.json` file is also the legacy
    /// envelope.
    pub fn from_config_path(path: &str) -> Option<Self> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return None;
        }
        let path = Path::new(trimmed);
        let Some(ext) = path.extension() else {
            return Some(Self::new(path));
        };
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut files = Self::new(dir);
        if ext.eq_ignore_ascii_case("json") {
            files.legacy = path.to_path_buf();
        }
        Some(files)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn baseline_path(&self) -> PathBuf {
        self.dir.join(BASELINE_FILE)
    }

    pub fn delta_path(&self) -> PathBuf {
        self.dir.join(DELTA_FILE)
    }

    pub fn journal_path(&self) -> PathBuf {
        self.dir.join(JOURNAL_FILE)
    }

    pub fn legacy_path(&self) -> &Path {
        &self.legacy
    }

    /// Acquire the file-set lock
    pub fn lock(&self) -> FilesGuard<'_> {
        FilesGuard {
            files: self,
            _guard: self.lock.lock().unwrap_or_else(|e| e.into_inner()),
        }
    }
}

/// Exclusive access to a [`SnapshotFiles`] set
pub struct FilesGuard<'a> {
    files: &'a SnapshotFiles,
    _guard: MutexGuard<'a, ()>,
}

impl FilesGuard<'_> {
    /// Read the active set, migrating the legacy envelope if no CSV exists
    ///
    /// `resolve_key` supplies a key for rows or entries that carry none.
    pub fn load(
        &self,
        now: DateTime<Utc>,
        resolve_key: impl Fn(&str, u64) -> String,
    ) -> Result<Loaded, PersistError> {
        let baseline_path = self.files.baseline_path();
        let delta_path = self.files.delta_path();

        if baseline_path.exists() || delta_path.exists() {
            let baseline_rows = codec::read_baseline(&baseline_path)?;
            let delta_rows = codec::read_delta(&delta_path)?;
            return Ok(Loaded {
                baselines: group_rows(baseline_rows, &resolve_key),
                deltas: group_rows(delta_rows, &resolve_key),
                source: LoadSource::Csv,
            });
        }

        let legacy = self.files.legacy_path();
        if legacy.exists() {
            let text = std::fs::read_to_string(legacy).map_err(|source| {
                PersistError::LegacyRead {
                    path: legacy.to_path_buf(),
                    source,
                }
            })?;
            let envelope =
                LegacyEnvelope::parse(&text).map_err(|source| PersistError::LegacyParse {
                    path: legacy.to_path_buf(),
                    source,
                })?;
            return Ok(Loaded {
                baselines: envelope.into_baselines(now, resolve_key),
                deltas: Vec::new(),
                source: LoadSource::Legacy,
            });
        }

        Ok(Loaded {
            baselines: Vec::new(),
            deltas: Vec::new(),
            source: LoadSource::Empty,
        })
    }

    /// Atomically replace both files with the given active set
    ///
    /// An empty row set deletes its file.
    pub fn write(
        &self,
        baselines: &[BaselineSnapshot],
        deltas: &[DeltaSnapshot],
    ) -> Result<WriteSummary, PersistError> {
        let baseline_rows: Vec<BaselineRow> = baselines.iter().flat_map(keyed_rows).collect();
        let delta_rows: Vec<DeltaRow> = deltas.iter().flat_map(keyed_rows).collect();

        replace(&self.files.baseline_path(), &baseline_rows, codec::write_baseline)?;
        replace(&self.files.delta_path(), &delta_rows, codec::write_delta)?;

        Ok(WriteSummary {
            baseline_rows: baseline_rows.len(),
            delta_rows: delta_rows.len(),
        })
    }

    /// Append records to the progression journal
    pub fn append_journal(&self, records: &[JournalRecord]) -> Result<(), PersistError> {
        if records.is_empty() {
            return Ok(());
        }
        Journal::open(&self.files.journal_path())?.append(records)?;
        Ok(())
    }
}

/// A snapshot's rows with the snapshot key written into each header
fn keyed_rows<R>(snapshot: &Snapshot<R>) -> Vec<R>
where
    R: Clone + HasKey,
{
    snapshot
        .rows
        .iter()
        .cloned()
        .map(|mut row| {
            if row.key_mut().trim().is_empty() {
                *row.key_mut() = snapshot.subject_key.clone();
            }
            row
        })
        .collect()
}

trait HasKey {
    fn key_mut(&mut self) -> &mut String;
}

impl HasKey for BaselineRow {
    fn key_mut(&mut self) -> &mut String {
        &mut self.header.subject_key
    }
}

impl HasKey for DeltaRow {
    fn key_mut(&mut self) -> &mut String {
        &mut self.header.subject_key
    }
}

fn group_rows<R: HeaderRow>(
    rows: Vec<R>,
    resolve_key: impl Fn(&str, u64) -> String,
) -> Vec<Snapshot<R>> {
    let mut groups: BTreeMap<String, Vec<R>> = BTreeMap::new();
    for row in rows {
        let header = row.header();
        let key = if header.subject_key.trim().is_empty() {
            resolve_key(&header.display_name, header.subject_id)
        } else {
            header.subject_key.clone()
        };
        groups.entry(key).or_default().push(row);
    }
    groups
        .into_iter()
        .filter_map(|(key, rows)| Snapshot::from_rows(key, rows))
        .collect()
}

fn replace<R>(
    path: &Path,
    rows: &[R],
    write: fn(&Path, &[R]) -> Result<(), CodecError>,
) -> Result<(), PersistError> {
    if rows.is_empty() {
        remove_if_exists(path).map_err(|source| PersistError::Replace {
            path: path.to_path_buf(),
            source,
        })?;
        return Ok(());
    }
    let staged = StagedFile::new(path);
    write(staged.path(), rows)?;
    staged.commit().map_err(|source| PersistError::Replace {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;
