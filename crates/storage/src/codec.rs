// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gzip-compressed CSV codec for baseline and delta rows
//!
//! One logical record per row with a fixed header. Fields containing a comma,
//! quote or line break are quoted with embedded quotes doubled. Readers skip
//! records shorter than the header and default unparseable scalars.

use chrono::{DateTime, SecondsFormat, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sbx_core::{BaselineRow, DeltaOp, DeltaRow, Position, RowHeader};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const BASELINE_HEADER: &[&str] = &[
    "version",
    "snapshot_id",
    "player_key",
    "character_name",
    "platform_id",
    "zone_id",
    "captured_utc",
    "row_type",
    "component_type",
    "assembly_qualified_type",
    "existed",
    "payload_base64",
    "payload_hash",
];

pub const DELTA_HEADER: &[&str] = &[
    "version",
    "snapshot_id",
    "player_key",
    "character_name",
    "platform_id",
    "zone_id",
    "captured_utc",
    "row_type",
    "operation",
    "component_type",
    "before_payload_base64",
    "after_payload_base64",
    "tech_guid",
    "tech_name",
    "entity_index",
    "entity_version",
    "prefab_guid",
    "prefab_name",
    "pos_x",
    "pos_y",
    "pos_z",
];

/// Errors from reading or writing a row file
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub fn write_baseline(path: &Path, rows: &[BaselineRow]) -> Result<(), CodecError> {
    write_records(path, BASELINE_HEADER, rows.iter().map(baseline_fields))
}

pub fn write_delta(path: &Path, rows: &[DeltaRow]) -> Result<(), CodecError> {
    write_records(path, DELTA_HEADER, rows.iter().map(delta_fields))
}

/// Read baseline rows; a missing file reads as empty
pub fn read_baseline(path: &Path) -> Result<Vec<BaselineRow>, CodecError> {
    Ok(read_records(path, BASELINE_HEADER.len())?
        .iter()
        .map(|cols| parse_baseline(cols))
        .collect())
}

/// Read delta rows; a missing file reads as empty
///
/// Rows whose operation is unknown and whose row kind does not imply one are
/// skipped.
pub fn read_delta(path: &Path) -> Result<Vec<DeltaRow>, CodecError> {
    Ok(read_records(path, DELTA_HEADER.len())?
        .iter()
        .filter_map(|cols| parse_delta(cols))
        .collect())
}

fn header_fields(h: &RowHeader) -> Vec<String> {
    vec![
        h.version.to_string(),
        h.snapshot_id.clone(),
        h.subject_key.clone(),
        h.display_name.clone(),
        h.subject_id.to_string(),
        h.zone_id.clone(),
        h.captured_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    ]
}

fn baseline_fields(row: &BaselineRow) -> Vec<String> {
    let mut fields = header_fields(&row.header);
    fields.extend([
        row.row_kind.clone(),
        row.type_name.clone(),
        row.qualified_type.clone(),
        row.existed.to_string(),
        row.payload.clone(),
        row.payload_hash.clone(),
    ]);
    fields
}

fn delta_fields(row: &DeltaRow) -> Vec<String> {
    let mut fields = header_fields(&row.header);
    fields.extend([
        row.row_kind().to_string(),
        row.op.as_str().to_string(),
        row.type_name.clone(),
        row.before_payload.clone(),
        row.after_payload.clone(),
        row.tech_id.to_string(),
        row.tech_label.clone(),
        row.entity_index.to_string(),
        row.entity_version.to_string(),
        row.prefab_id.to_string(),
        row.prefab_name.clone(),
        row.position.x.to_string(),
        row.position.y.to_string(),
        row.position.z.to_string(),
    ]);
    fields
}

fn parse_header(cols: &[String]) -> RowHeader {
    RowHeader {
        version: parse_or_default(&cols[0]),
        snapshot_id: cols[1].clone(),
        subject_key: cols[2].clone(),
        display_name: cols[3].clone(),
        subject_id: parse_or_default(&cols[4]),
        zone_id: cols[5].clone(),
        captured_at: parse_timestamp(&cols[6]),
    }
}

fn parse_baseline(cols: &[String]) -> BaselineRow {
    BaselineRow {
        header: parse_header(cols),
        row_kind: cols[7].clone(),
        type_name: cols[8].clone(),
        qualified_type: cols[9].clone(),
        existed: parse_bool(&cols[10]),
        payload: cols[11].clone(),
        payload_hash: cols[12].clone(),
    }
}

fn op_from_row_kind(kind: &str) -> Option<DeltaOp> {
    [
        DeltaOp::Changed,
        DeltaOp::Opened,
        DeltaOp::Created,
        DeltaOp::Removed,
        DeltaOp::PrefabChanged,
    ]
    .into_iter()
    .find(|op| op.row_kind().eq_ignore_ascii_case(kind))
}

fn parse_delta(cols: &[String]) -> Option<DeltaRow> {
    let op = DeltaOp::parse(&cols[8]).or_else(|| op_from_row_kind(&cols[7]));
    let Some(op) = op else {
        tracing::debug!(operation = %cols[8], row_type = %cols[7], "skipping delta row");
        return None;
    };
    Some(DeltaRow {
        header: parse_header(cols),
        op,
        type_name: cols[9].clone(),
        before_payload: cols[10].clone(),
        after_payload: cols[11].clone(),
        tech_id: parse_or_default(&cols[12]),
        tech_label: cols[13].clone(),
        entity_index: parse_or_default(&cols[14]),
        entity_version: parse_or_default(&cols[15]),
        prefab_id: parse_or_default(&cols[16]),
        prefab_name: cols[17].clone(),
        position: Position::new(
            parse_or_default(&cols[18]),
            parse_or_default(&cols[19]),
            parse_or_default(&cols[20]),
        ),
    })
}

fn parse_or_default<T: std::str::FromStr + Default>(s: &str) -> T {
    s.trim().parse().unwrap_or_default()
}

fn parse_bool(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("true")
}

/// RFC 3339 timestamp, or the Unix epoch when unparseable
pub fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn escape_field(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Join fields into one CSV record (no trailing newline)
pub fn join_record<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Split CSV text into records
///
/// Quoted fields may span lines. A `\r` directly before a record break is
/// dropped. Blank lines produce no record.
pub fn parse_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
            continue;
        }
        match ch {
            ',' => record.push(std::mem::take(&mut field)),
            '"' => in_quotes = true,
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                if !record.is_empty() || !field.is_empty() {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
            }
            _ => field.push(ch),
        }
    }
    if !record.is_empty() || !field.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

fn write_records<I>(path: &Path, header: &[&str], rows: I) -> Result<(), CodecError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let write_err = |source| CodecError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let file = File::create(path).map_err(write_err)?;
    let mut out = BufWriter::new(GzEncoder::new(file, Compression::default()));
    writeln!(out, "{}", join_record(header)).map_err(write_err)?;
    for fields in rows {
        writeln!(out, "{}", join_record(&fields)).map_err(write_err)?;
    }
    let encoder = out.into_inner().map_err(|e| write_err(e.into_error()))?;
    let file = encoder.finish().map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    Ok(())
}

fn read_records(path: &Path, min_columns: usize) -> Result<Vec<Vec<String>>, CodecError> {
    let read_err = |source| CodecError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_err(e)),
    };

    let mut text = String::new();
    GzDecoder::new(file)
        .read_to_string(&mut text)
        .map_err(read_err)?;

    Ok(parse_records(&text)
        .into_iter()
        .skip(1)
        .filter(|cols| cols.len() >= min_columns)
        .collect())
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
