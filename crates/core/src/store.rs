// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyed snapshot store
//!
//! Holds pending contexts and active baseline/delta pairs per resolved
//! subject key. A single mutex guards all maps; every operation holds it for
//! its full duration and never across I/O. Callers receive copies.

use crate::id::{composite_key, normalize_name};
use crate::row::{BaselineSnapshot, DeltaSnapshot, PendingContext};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Result of an active-snapshot lookup
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveLookup {
    pub key: String,
    pub baseline: Option<BaselineSnapshot>,
    pub delta: Option<DeltaSnapshot>,
}

/// Point-in-time copy of the active set, tagged with the state generation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveExport {
    pub baselines: Vec<BaselineSnapshot>,
    pub deltas: Vec<DeltaSnapshot>,
    pub generation: u64,
}

#[derive(Debug, Default)]
struct StoreState {
    pending: BTreeMap<String, PendingContext>,
    baselines: BTreeMap<String, BaselineSnapshot>,
    deltas: BTreeMap<String, DeltaSnapshot>,
    dirty: bool,
    /// Bumped on every mutation of the active set
    generation: u64,
}

impl StoreState {
    fn bound_identity(&self, key: &str) -> Option<u64> {
        self.pending
            .get(key)
            .map(|p| p.subject.id)
            .or_else(|| self.baselines.get(key).map(|b| b.subject.id))
            .or_else(|| self.deltas.get(key).map(|d| d.subject.id))
    }

    /// Bare name unless it is bound to another identity, then `name|id`
    fn resolve_key(&self, name: &str, id: u64) -> String {
        let bare = normalize_name(name, id);
        let bound = self.bound_identity(&bare);
        if bound == Some(id) {
            return bare;
        }
        let composite = composite_key(name, id);
        if self.bound_identity(&composite).is_some() || bound.is_some() {
            return composite;
        }
        bare
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.generation = self.generation.wrapping_add(1);
    }

    fn has_active(&self, key: &str) -> bool {
        self.baselines.contains_key(key) || self.deltas.contains_key(key)
    }

    /// Key of any active record belonging to `id`
    fn active_key_for_identity(&self, id: u64) -> Option<String> {
        self.baselines
            .iter()
            .find(|(_, b)| b.subject.id == id)
            .map(|(k, _)| k.clone())
            .or_else(|| {
                self.deltas
                    .iter()
                    .find(|(_, d)| d.subject.id == id)
                    .map(|(k, _)| k.clone())
            })
    }
}

/// Thread-safe registry of pending and active snapshots
#[derive(Debug, Default)]
pub struct SnapshotStore {
    inner: Mutex<StoreState>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Key the store would use for this subject right now
    pub fn preferred_key(&self, name: &str, id: u64) -> String {
        self.state().resolve_key(name, id)
    }

    /// Store a pending context under its resolved key and return the key
    pub fn upsert_pending(&self, mut ctx: PendingContext) -> String {
        let mut state = self.state();
        let key = state.resolve_key(&ctx.subject.name, ctx.subject.id);
        ctx.subject_key = key.clone();
        state.pending.insert(key.clone(), ctx);
        key
    }

    /// Remove and return the subject's pending context
    ///
    /// Falls back to any pending context with the same identity when the
    /// display name changed since it was stored.
    pub fn take_pending(&self, name: &str, id: u64) -> Option<(String, PendingContext)> {
        let mut state = self.state();
        let key = state.resolve_key(name, id);
        if let Some(ctx) = state.pending.remove(&key) {
            return Some((key, ctx));
        }
        let fallback = state
            .pending
            .iter()
            .find(|(_, p)| p.subject.id == id)
            .map(|(k, _)| k.clone())?;
        state.pending.remove(&fallback).map(|ctx| (fallback, ctx))
    }

    /// Active baseline and delta for the subject, if any
    pub fn active(&self, name: &str, id: u64) -> Option<ActiveLookup> {
        let state = self.state();
        let mut key = state.resolve_key(name, id);
        if !state.has_active(&key) {
            key = state.active_key_for_identity(id)?;
        }
        Some(ActiveLookup {
            baseline: state.baselines.get(&key).cloned(),
            delta: state.deltas.get(&key).cloned(),
            key,
        })
    }

    /// Overwrite the active pair for `key`
    pub fn put_active(&self, key: &str, baseline: BaselineSnapshot, delta: DeltaSnapshot) {
        let mut state = self.state();
        state.baselines.insert(key.to_string(), baseline);
        state.deltas.insert(key.to_string(), delta);
        state.touch();
    }

    /// Drop the active pair for `key`; returns whether anything was removed
    pub fn remove_active(&self, key: &str) -> bool {
        let mut state = self.state();
        let removed_baseline = state.baselines.remove(key).is_some();
        let removed_delta = state.deltas.remove(key).is_some();
        let removed = removed_baseline || removed_delta;
        if removed {
            state.touch();
        }
        removed
    }

    /// Replace all pending and active records with the given active set
    ///
    /// Snapshots without a subject key get one resolved from name and identity.
    pub fn import_active(
        &self,
        baselines: Vec<BaselineSnapshot>,
        deltas: Vec<DeltaSnapshot>,
        mark_dirty: bool,
    ) {
        let mut state = self.state();
        state.pending.clear();
        state.baselines.clear();
        state.deltas.clear();
        for mut snapshot in baselines {
            if snapshot.subject_key.trim().is_empty() {
                snapshot.subject_key =
                    state.resolve_key(&snapshot.subject.name, snapshot.subject.id);
            }
            state.baselines.insert(snapshot.subject_key.clone(), snapshot);
        }
        for mut snapshot in deltas {
            if snapshot.subject_key.trim().is_empty() {
                snapshot.subject_key =
                    state.resolve_key(&snapshot.subject.name, snapshot.subject.id);
            }
            state.deltas.insert(snapshot.subject_key.clone(), snapshot);
        }
        state.generation = state.generation.wrapping_add(1);
        state.dirty = mark_dirty;
        tracing::debug!(
            baselines = state.baselines.len(),
            deltas = state.deltas.len(),
            mark_dirty,
            "imported active snapshots"
        );
    }

    pub fn active_baselines(&self) -> Vec<BaselineSnapshot> {
        self.state().baselines.values().cloned().collect()
    }

    pub fn active_deltas(&self) -> Vec<DeltaSnapshot> {
        self.state().deltas.values().cloned().collect()
    }

    /// Copy of the active set for persistence
    pub fn export_active(&self) -> ActiveExport {
        let state = self.state();
        ActiveExport {
            baselines: state.baselines.values().cloned().collect(),
            deltas: state.deltas.values().cloned().collect(),
            generation: state.generation,
        }
    }

    /// Clear the dirty flag if nothing changed since `generation` was exported
    pub fn mark_clean_at(&self, generation: u64) -> bool {
        let mut state = self.state();
        if state.generation == generation {
            state.dirty = false;
            true
        } else {
            false
        }
    }

    pub fn mark_dirty(&self) {
        self.state().touch();
    }

    pub fn mark_clean(&self) {
        self.state().dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.state().dirty
    }

    pub fn pending_count(&self) -> usize {
        self.state().pending.len()
    }

    /// Drop every record and reset the dirty flag
    pub fn clear_all(&self) {
        let mut state = self.state();
        state.pending.clear();
        state.baselines.clear();
        state.deltas.clear();
        state.dirty = false;
        state.generation = state.generation.wrapping_add(1);
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
