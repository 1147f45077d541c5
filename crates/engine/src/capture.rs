// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fragment capture and restore
//!
//! Both directions are best-effort: a fragment that cannot be read or
//! written is skipped and reported, never aborting the whole pass.

use crate::error::EngineError;
use sbx_core::{BaselineRow, FragmentAccessor, KeywordFilter, RowHeader};
use serde_json::Value;
use std::collections::BTreeSet;

/// Rows captured from one object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureOutcome {
    pub rows: Vec<BaselineRow>,
    /// Relevant types that were attached but could not be read
    pub skipped: Vec<String>,
    /// False when the handle did not resolve to a live object
    pub live: bool,
    /// Listing the attached fragments failed; no rows were captured
    pub error: Option<String>,
}

impl CaptureOutcome {
    pub fn ok(&self) -> bool {
        self.live && self.error.is_none() && self.skipped.is_empty()
    }
}

/// Per-step counts of a restore
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub removed: usize,
    pub added: usize,
    pub written: usize,
    /// Rows with no qualified type
    pub skipped: usize,
    /// Types whose step failed, with the reason
    pub failed: Vec<(String, String)>,
    pub live: bool,
}

impl RestoreReport {
    /// True only if every step applied
    pub fn ok(&self) -> bool {
        self.live && self.failed.is_empty()
    }

    fn fail(&mut self, type_name: &str, err: impl std::fmt::Display) {
        tracing::warn!(type_name, error = %err, "restore step failed");
        self.failed.push((type_name.to_string(), err.to_string()));
    }
}

/// Serialize every relevant fragment attached to the object
///
/// Relevant types the accessor knows about but that are absent get an
/// `existed = false` row, so a restore removes them if they appear later.
/// Rows are ordered by qualified type.
pub fn capture<A: FragmentAccessor>(
    accessor: &A,
    handle: A::Handle,
    filter: &KeywordFilter,
    header: &RowHeader,
) -> CaptureOutcome {
    if !accessor.is_live(handle) {
        tracing::warn!(?handle, "capture skipped, object not live");
        return CaptureOutcome::default();
    }
    let mut outcome = CaptureOutcome {
        live: true,
        ..CaptureOutcome::default()
    };
    let attached: BTreeSet<String> = match accessor.attached_types(handle) {
        Ok(types) => types.into_iter().filter(|t| filter.matches(t)).collect(),
        Err(e) => {
            tracing::warn!(?handle, error = %e, "failed to enumerate fragments");
            outcome.error = Some(e.to_string());
            return outcome;
        }
    };

    for type_name in &attached {
        match read_json(accessor, handle, type_name) {
            Ok(json) => outcome
                .rows
                .push(BaselineRow::component(header.clone(), type_name, true, &json)),
            Err(e) => {
                tracing::warn!(type_name = %type_name, error = %e, "skipping fragment");
                outcome.skipped.push(type_name.clone());
            }
        }
    }
    let absent: BTreeSet<String> = accessor
        .known_types()
        .into_iter()
        .filter(|t| filter.matches(t) && !attached.contains(t))
        .collect();
    for type_name in &absent {
        outcome
            .rows
            .push(BaselineRow::component(header.clone(), type_name, false, ""));
    }
    outcome
        .rows
        .sort_by(|a, b| a.qualified_type.cmp(&b.qualified_type));
    outcome
}

fn read_json<A: FragmentAccessor>(
    accessor: &A,
    handle: A::Handle,
    type_name: &str,
) -> Result<String, EngineError> {
    let value = accessor.get_fragment(handle, type_name)?;
    serde_json::to_string(&value).map_err(|e| EngineError::Payload {
        type_name: type_name.to_string(),
        message: e.to_string(),
    })
}

/// Bring the object's relevant fragments back to the captured rows
///
/// Pass one removes relevant fragments the rows do not mention, leaving
/// types the accessor cannot resolve untouched. Pass two applies each row:
/// absent rows are removed, present rows are attached if needed and
/// overwritten with the stored payload.
pub fn restore<A: FragmentAccessor>(
    accessor: &A,
    handle: A::Handle,
    filter: &KeywordFilter,
    rows: &[BaselineRow],
) -> RestoreReport {
    let mut report = RestoreReport::default();
    if !accessor.is_live(handle) {
        tracing::warn!(?handle, "restore skipped, object not live");
        return report;
    }
    report.live = true;

    let captured: BTreeSet<&str> = rows
        .iter()
        .map(|r| r.qualified_type.as_str())
        .filter(|t| !t.trim().is_empty())
        .collect();

    match accessor.attached_types(handle) {
        Ok(types) => {
            for type_name in types {
                if !filter.matches(&type_name) || captured.contains(type_name.as_str()) {
                    continue;
                }
                if !accessor.resolves(&type_name) {
                    tracing::debug!(type_name = %type_name, "keeping unresolvable fragment");
                    continue;
                }
                match accessor.remove_fragment(handle, &type_name) {
                    Ok(()) => report.removed += 1,
                    Err(e) => report.fail(&type_name, e),
                }
            }
        }
        Err(e) => report.fail("*", e),
    }

    for row in rows {
        let type_name = row.qualified_type.as_str();
        if type_name.trim().is_empty() {
            report.skipped += 1;
            continue;
        }
        if let Err(e) = apply_row(accessor, handle, row, &mut report) {
            report.fail(type_name, e);
        }
    }
    report
}

fn apply_row<A: FragmentAccessor>(
    accessor: &A,
    handle: A::Handle,
    row: &BaselineRow,
    report: &mut RestoreReport,
) -> Result<(), EngineError> {
    let type_name = row.qualified_type.as_str();
    let present = accessor.has_fragment(handle, type_name)?;

    if !row.existed {
        if present {
            accessor.remove_fragment(handle, type_name)?;
            report.removed += 1;
        }
        return Ok(());
    }

    let json = row.json();
    if json.is_empty() {
        return Err(EngineError::Payload {
            type_name: type_name.to_string(),
            message: "empty payload".to_string(),
        });
    }
    let value: Value = serde_json::from_str(&json).map_err(|e| EngineError::Payload {
        type_name: type_name.to_string(),
        message: e.to_string(),
    })?;

    if !present {
        accessor.add_fragment(handle, type_name)?;
        report.added += 1;
    }
    accessor.set_fragment(handle, type_name, &value)?;
    report.written += 1;
    Ok(())
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;
