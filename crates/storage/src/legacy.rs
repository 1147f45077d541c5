// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Legacy JSON snapshot envelope
//!
//! Older installs kept one JSON document mapping subject keys to captured
//! fragments. It is read once and converted to baseline snapshots.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use sbx_core::id;
use sbx_core::{BaselineRow, BaselineSnapshot, RowHeader, Subject};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegacyEnvelope {
    #[serde(alias = "Version")]
    pub version: u32,
    #[serde(alias = "Players")]
    pub players: BTreeMap<String, LegacySubject>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegacySubject {
    #[serde(alias = "PlatformId", alias = "platformId")]
    pub platform_id: u64,
    /// `None` when missing, unparseable, or the zero timestamp
    #[serde(
        alias = "CapturedUtc",
        alias = "capturedUtc",
        deserialize_with = "lenient_timestamp"
    )]
    pub captured_utc: Option<DateTime<Utc>>,
    #[serde(alias = "Components")]
    pub components: BTreeMap<String, LegacyComponent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegacyComponent {
    #[serde(alias = "Existed")]
    pub existed: bool,
    #[serde(alias = "AssemblyQualifiedType", alias = "assemblyQualifiedType")]
    pub assembly_qualified_type: String,
    #[serde(alias = "JsonPayload", alias = "jsonPayload")]
    pub json_payload: String,
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(parse_captured))
}

/// RFC 3339, or an offset-less timestamp read as UTC
fn parse_captured(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    let parsed = DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").map(|t| t.and_utc())
        })
        .ok()?;
    // year one is the writer's unset value
    (parsed.year() > 1).then_some(parsed)
}

impl LegacyEnvelope {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Convert to baseline snapshots
    ///
    /// The envelope carries no display names, so subjects are named by their
    /// identity. Entries without a usable identity (neither a non-zero
    /// `platform_id` nor a numeric key) are dropped. `resolve_key` maps
    /// name and identity to the store key.
    pub fn into_baselines(
        self,
        now: DateTime<Utc>,
        resolve_key: impl Fn(&str, u64) -> String,
    ) -> Vec<BaselineSnapshot> {
        let mut snapshots = Vec::new();
        for (key, entry) in self.players {
            let platform_id = match entry.platform_id {
                0 => match key.trim().parse::<u64>() {
                    Ok(id) => id,
                    Err(_) => {
                        tracing::warn!(key = %key, "skipping legacy snapshot without identity");
                        continue;
                    }
                },
                id => id,
            };
            let captured_at = entry.captured_utc.unwrap_or(now);
            let subject = Subject::new(id::normalize_name("", platform_id), platform_id);
            let subject_key = resolve_key(&subject.name, platform_id);
            let snapshot_id = id::snapshot_id(&subject.name, platform_id, captured_at);
            let header = RowHeader::new(&snapshot_id, &subject_key, &subject, "", captured_at);

            let rows = entry
                .components
                .into_iter()
                .filter_map(|(name, component)| {
                    let qualified = if component.assembly_qualified_type.trim().is_empty() {
                        name
                    } else {
                        component.assembly_qualified_type
                    };
                    if qualified.trim().is_empty() {
                        return None;
                    }
                    Some(BaselineRow::component(
                        header.clone(),
                        &qualified,
                        component.existed,
                        &component.json_payload,
                    ))
                })
                .collect();

            snapshots.push(BaselineSnapshot {
                subject_key,
                subject,
                zone_id: String::new(),
                snapshot_id,
                captured_at,
                rows,
            });
        }
        snapshots
    }
}

#[cfg(test)]
#[path = "legacy_tests.rs"]
mod tests;
