// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot lifecycle
//!
//! `prepare` captures the pre-entry state, `enter` applies an alteration and
//! records what changed, `exit` restores the captured state. Each operation
//! catches its own failures and reports them through its outcome.

use crate::capture::{self, CaptureOutcome, RestoreReport};
use crate::config::EngineConfig;
use crate::error::EngineError;
use sbx_core::delta::{component_delta, entity_delta, opened_tech, stamp};
use sbx_core::{
    id, AccessError, BaselineSnapshot, Clock, DeltaOp, DeltaRow, DeltaSnapshot, FragmentAccessor,
    KeywordFilter, PendingContext, RowHeader, SnapshotStore, Subject, SystemClock,
};
use sbx_storage::{journal_records, LoadSource, SnapshotFiles, WriteSummary};
use std::sync::Arc;

/// Lifecycle detail, at info when verbose logging is on
macro_rules! detail {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

/// External change applied to a subject between capture and exit
pub trait Alteration<A: FragmentAccessor> {
    fn apply(&self, accessor: &A, handle: A::Handle) -> Result<(), AccessError>;
}

impl<A, F> Alteration<A> for F
where
    A: FragmentAccessor,
    F: Fn(&A, A::Handle) -> Result<(), AccessError>,
{
    fn apply(&self, accessor: &A, handle: A::Handle) -> Result<(), AccessError> {
        self(accessor, handle)
    }
}

/// An alteration that changes nothing
pub fn no_alteration<A: FragmentAccessor>(_: &A, _: A::Handle) -> Result<(), AccessError> {
    Ok(())
}

/// Result of loading persisted snapshots at configure time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Disabled, or no snapshot path configured
    Skipped,
    Loaded {
        source: LoadSource,
        baselines: usize,
        deltas: usize,
    },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing to write, or persistence is off
    Skipped,
    Written(WriteSummary),
    /// Write failed; the store stays dirty for a later retry
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrepareOutcome {
    Disabled,
    AlreadyActive { key: String },
    NotLive,
    /// The pre-entry state could not be listed; nothing was stored
    Failed(String),
    Pending { key: String, capture: CaptureOutcome },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnterReport {
    pub key: String,
    pub snapshot_id: String,
    pub baseline_rows: usize,
    pub delta: Vec<DeltaRow>,
    /// True when no pending context existed and the baseline was captured here
    pub fallback_capture: bool,
    /// Types that could not be read in either capture
    pub skipped: Vec<String>,
    pub alteration_error: Option<String>,
    pub journal_records: usize,
    pub flush: FlushOutcome,
}

impl EnterReport {
    /// Number of delta rows with the given operation
    pub fn count(&self, op: DeltaOp) -> usize {
        self.delta.iter().filter(|r| r.op == op).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnterOutcome {
    Disabled,
    AlreadyActive { key: String },
    NotLive,
    /// The fallback capture could not list the object's fragments
    Failed(String),
    Entered(EnterReport),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitReport {
    pub key: String,
    pub restore: RestoreReport,
    /// Baseline against the state found at exit
    pub audit: Vec<DeltaRow>,
    /// Fragments still differing from the baseline after restore
    pub verify_mismatches: usize,
    pub objects_removed: usize,
    pub objects_unresolved: usize,
    pub flush: FlushOutcome,
}

impl ExitReport {
    pub fn ok(&self) -> bool {
        self.restore.ok() && self.verify_mismatches == 0 && self.objects_unresolved == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExitOutcome {
    Disabled,
    /// Nothing was active; exit is trivially successful
    NoSnapshot,
    /// The active record is kept so a later exit can retry
    NotLive { key: String },
    Restored(ExitReport),
}

/// Capture/restore engine over one accessor and a shared store
pub struct Engine<A: FragmentAccessor, C: Clock = SystemClock> {
    accessor: A,
    store: Arc<SnapshotStore>,
    clock: C,
    filter: KeywordFilter,
    config: EngineConfig,
    files: Option<SnapshotFiles>,
}

impl<A: FragmentAccessor, C: Clock> Engine<A, C> {
    pub fn new(accessor: A, store: Arc<SnapshotStore>, clock: C) -> Self {
        Self {
            accessor,
            store,
            clock,
            filter: KeywordFilter::progression(),
            config: EngineConfig::default(),
            files: None,
        }
    }

    pub fn with_filter(mut self, filter: KeywordFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn files(&self) -> Option<&SnapshotFiles> {
        self.files.as_ref()
    }

    fn verbose(&self) -> bool {
        self.config.verbose_logs
    }

    /// Apply configuration and load persisted snapshots
    ///
    /// Replaces whatever the store held. CSV files import clean; a migrated
    /// legacy envelope imports dirty so the next flush rewrites it as CSV.
    pub fn configure(&mut self, config: EngineConfig) -> LoadOutcome {
        self.files = if config.persists() {
            SnapshotFiles::from_config_path(&config.snapshot_path)
        } else {
            None
        };
        self.config = config;
        self.store.clear_all();

        match self.load() {
            Ok(Some(outcome)) => outcome,
            Ok(None) => LoadOutcome::Skipped,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load snapshots");
                LoadOutcome::Failed(e.to_string())
            }
        }
    }

    fn load(&self) -> Result<Option<LoadOutcome>, EngineError> {
        let Some(files) = &self.files else {
            return Ok(None);
        };
        let store = &self.store;
        let loaded = files
            .lock()
            .load(self.clock.now(), |name, id| store.preferred_key(name, id))?;
        let baselines = loaded.baselines.len();
        let deltas = loaded.deltas.len();
        store.import_active(
            loaded.baselines,
            loaded.deltas,
            loaded.source == LoadSource::Legacy,
        );
        tracing::info!(
            dir = %files.dir().display(),
            source = ?loaded.source,
            baselines,
            deltas,
            "loaded snapshots"
        );
        Ok(Some(LoadOutcome::Loaded {
            source: loaded.source,
            baselines,
            deltas,
        }))
    }

    /// Capture the pre-entry state and hold it as pending
    pub fn prepare(&self, subject: &Subject, zone_id: &str, handle: A::Handle) -> PrepareOutcome {
        if !self.config.enabled {
            return PrepareOutcome::Disabled;
        }
        if let Some(active) = self.blocking_active(subject) {
            return PrepareOutcome::AlreadyActive { key: active };
        }

        let (ctx, capture) = match self.capture_context(subject, zone_id, handle) {
            Ok(pair) => pair,
            Err(failed) => {
                return match failed.error {
                    Some(error) => PrepareOutcome::Failed(error),
                    None => PrepareOutcome::NotLive,
                }
            }
        };
        let key = self.store.upsert_pending(ctx);
        detail!(
            self.verbose(),
            key = %key,
            zone_id,
            rows = capture.rows.len(),
            skipped = capture.skipped.len(),
            "captured pending baseline"
        );
        PrepareOutcome::Pending { key, capture }
    }

    /// Apply the alteration and record the subject as active
    pub fn enter(
        &self,
        subject: &Subject,
        handle: A::Handle,
        alteration: &dyn Alteration<A>,
    ) -> EnterOutcome {
        if !self.config.enabled {
            return EnterOutcome::Disabled;
        }
        if let Some(key) = self.blocking_active(subject) {
            // a stale pending capture must not outlive this no-op
            self.store.take_pending(&subject.name, subject.id);
            detail!(self.verbose(), key = %key, "enter ignored, snapshot already active");
            return EnterOutcome::AlreadyActive { key };
        }
        if !self.accessor.is_live(handle) {
            tracing::warn!(subject = %subject, "enter skipped, object not live");
            return EnterOutcome::NotLive;
        }

        let (key, ctx, fallback_capture, mut skipped) =
            match self.store.take_pending(&subject.name, subject.id) {
                Some((key, ctx)) => (key, ctx, false, Vec::new()),
                None => {
                    let (ctx, capture) = match self.capture_context(subject, "", handle) {
                        Ok(pair) => pair,
                        Err(failed) => {
                            return match failed.error {
                                Some(error) => EnterOutcome::Failed(error),
                                None => EnterOutcome::NotLive,
                            }
                        }
                    };
                    let key = self.store.preferred_key(&subject.name, subject.id);
                    (key, ctx, true, capture.skipped)
                }
            };

        let alteration_error = match alteration.apply(&self.accessor, handle) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "alteration failed");
                Some(e.to_string())
            }
        };

        let header = RowHeader::new(
            &ctx.snapshot_id,
            &key,
            subject,
            &ctx.zone_id,
            self.clock.now(),
        );
        let post = capture::capture(&self.accessor, handle, &self.filter, &header);
        skipped.extend(post.skipped.iter().cloned());

        let mut baseline_rows = ctx.rows;
        for row in &mut baseline_rows {
            row.header.subject_key = key.clone();
        }

        let mut delta = component_delta(&baseline_rows, &post.rows);
        delta.extend(opened_tech(&baseline_rows, &post.rows));
        let owned_after = self.accessor.owned_objects(&ctx.zone_id);
        delta.extend(entity_delta(&ctx.owned_before, &owned_after));
        stamp(&mut delta, &header);

        let records = journal_records(&baseline_rows, &post.rows, &header);
        let baseline = BaselineSnapshot {
            subject_key: key.clone(),
            subject: ctx.subject,
            zone_id: ctx.zone_id.clone(),
            snapshot_id: ctx.snapshot_id.clone(),
            captured_at: ctx.captured_at,
            rows: baseline_rows,
        };
        let delta_snapshot = DeltaSnapshot {
            subject_key: key.clone(),
            subject: subject.clone(),
            zone_id: ctx.zone_id,
            snapshot_id: ctx.snapshot_id.clone(),
            captured_at: header.captured_at,
            rows: delta.clone(),
        };
        let baseline_len = baseline.rows.len();
        self.store.put_active(&key, baseline, delta_snapshot);

        if let Some(files) = &self.files {
            if let Err(e) = files.lock().append_journal(&records) {
                tracing::warn!(key = %key, error = %e, "failed to append journal");
            }
        }
        let flush = self.flush();

        detail!(
            self.verbose(),
            key = %key,
            snapshot_id = %ctx.snapshot_id,
            baseline_rows = baseline_len,
            delta_rows = delta.len(),
            fallback_capture,
            "subject entered"
        );
        EnterOutcome::Entered(EnterReport {
            key,
            snapshot_id: ctx.snapshot_id,
            baseline_rows: baseline_len,
            delta,
            fallback_capture,
            skipped,
            alteration_error,
            journal_records: records.len(),
            flush,
        })
    }

    /// Restore the subject's captured state and drop its active record
    pub fn exit(&self, subject: &Subject, handle: A::Handle) -> ExitOutcome {
        if !self.config.enabled {
            return ExitOutcome::Disabled;
        }
        // a prepare without a matching enter is abandoned here
        self.store.take_pending(&subject.name, subject.id);

        let Some(active) = self.store.active(&subject.name, subject.id) else {
            detail!(self.verbose(), subject = %subject, "exit with no active snapshot");
            return ExitOutcome::NoSnapshot;
        };
        let key = active.key;
        let Some(baseline) = active.baseline else {
            tracing::warn!(key = %key, "active delta without baseline, discarding");
            self.store.remove_active(&key);
            self.flush();
            return ExitOutcome::NoSnapshot;
        };
        if !self.accessor.is_live(handle) {
            tracing::warn!(key = %key, "exit deferred, object not live");
            return ExitOutcome::NotLive { key };
        }

        let header = RowHeader::new(
            &baseline.snapshot_id,
            &key,
            subject,
            &baseline.zone_id,
            self.clock.now(),
        );
        let current = capture::capture(&self.accessor, handle, &self.filter, &header);

        let created: Vec<&DeltaRow> = active
            .delta
            .as_ref()
            .map(|d| d.rows.iter().filter(|r| r.op == DeltaOp::Created).collect())
            .unwrap_or_default();
        let mut objects_removed = 0;
        for row in &created {
            match self
                .accessor
                .destroy_owned(row.entity_index, row.entity_version, row.prefab_id)
            {
                Ok(true) => objects_removed += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(
                    key = %key,
                    index = row.entity_index,
                    version = row.entity_version,
                    error = %e,
                    "failed to destroy created object"
                ),
            }
        }

        let restore = capture::restore(&self.accessor, handle, &self.filter, &baseline.rows);
        if !restore.ok() {
            tracing::warn!(key = %key, failed = restore.failed.len(), "restore incomplete");
        }

        let mut audit = component_delta(&baseline.rows, &current.rows);
        stamp(&mut audit, &header);

        let objects_unresolved = created
            .iter()
            .filter(|r| self.accessor.owned_exists(r.entity_index, r.entity_version))
            .count();

        let verify = capture::capture(&self.accessor, handle, &self.filter, &header);
        let verify_mismatches = component_delta(&baseline.rows, &verify.rows).len();
        if verify_mismatches > 0 {
            tracing::warn!(key = %key, verify_mismatches, "restored state differs from baseline");
        }

        self.store.remove_active(&key);
        let flush = self.flush();

        detail!(
            self.verbose(),
            key = %key,
            removed = restore.removed,
            written = restore.written,
            audit_rows = audit.len(),
            objects_removed,
            objects_unresolved,
            "subject exited"
        );
        ExitOutcome::Restored(ExitReport {
            key,
            restore,
            audit,
            verify_mismatches,
            objects_removed,
            objects_unresolved,
            flush,
        })
    }

    /// Write the active set if it changed since the last successful write
    pub fn flush(&self) -> FlushOutcome {
        let Some(files) = &self.files else {
            return FlushOutcome::Skipped;
        };
        let guard = files.lock();
        if !self.store.is_dirty() {
            return FlushOutcome::Skipped;
        }
        let export = self.store.export_active();
        match guard.write(&export.baselines, &export.deltas) {
            Ok(summary) => {
                if !self.store.mark_clean_at(export.generation) {
                    tracing::debug!("store changed during flush, staying dirty");
                }
                tracing::debug!(
                    baseline_rows = summary.baseline_rows,
                    delta_rows = summary.delta_rows,
                    "flushed snapshots"
                );
                FlushOutcome::Written(summary)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to flush snapshots");
                FlushOutcome::Failed(e.to_string())
            }
        }
    }

    /// Key of an active record that makes a new capture a no-op
    fn blocking_active(&self, subject: &Subject) -> Option<String> {
        if self.config.recapture_when_active {
            return None;
        }
        self.store
            .active(&subject.name, subject.id)
            .filter(|a| a.baseline.is_some())
            .map(|a| a.key)
    }

    /// Pre-entry capture; a dead object or failed listing comes back as `Err`
    fn capture_context(
        &self,
        subject: &Subject,
        zone_id: &str,
        handle: A::Handle,
    ) -> Result<(PendingContext, CaptureOutcome), CaptureOutcome> {
        let now = self.clock.now();
        let key = self.store.preferred_key(&subject.name, subject.id);
        let snapshot_id = id::snapshot_id(&subject.name, subject.id, now);
        let header = RowHeader::new(&snapshot_id, &key, subject, zone_id, now);

        let owned_before = self.accessor.owned_objects(zone_id);
        let capture = capture::capture(&self.accessor, handle, &self.filter, &header);
        if !capture.live || capture.error.is_some() {
            return Err(capture);
        }
        let ctx = PendingContext {
            subject_key: key,
            subject: subject.clone(),
            zone_id: zone_id.to_string(),
            snapshot_id,
            captured_at: now,
            rows: capture.rows.clone(),
            owned_before,
        };
        Ok((ctx, capture))
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
