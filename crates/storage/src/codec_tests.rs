// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use flate2::write::GzEncoder;
use proptest::prelude::*;
use sbx_core::{OwnedObject, Subject};

fn header() -> RowHeader {
    let at = Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap()
        + chrono::Duration::microseconds(123_456);
    RowHeader::new("snap-1", "alice", &Subject::new("Alice", 42), "sandbox_alpha", at)
}

fn gz_text(path: &Path, text: &str) {
    let mut enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    enc.write_all(text.as_bytes()).unwrap();
    enc.finish().unwrap();
}

#[test]
fn baseline_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("baseline.csv.gz");
    let rows = vec![
        BaselineRow::component(header(), "ProjectM.ResearchComponent, ProjectM", true, r#"{"guid":123}"#),
        BaselineRow::component(header(), "ProjectM.TechState", false, ""),
    ];

    write_baseline(&path, &rows).unwrap();
    assert_eq!(read_baseline(&path).unwrap(), rows);
}

#[test]
fn delta_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/delta.csv.gz");

    let mut changed = DeltaRow::changed("ResearchComponent", "e30=", "eyJhIjoxfQ==");
    changed.header = header();
    let mut opened = DeltaRow::opened(456);
    opened.header = header();
    let object = OwnedObject::new(12, 1, 99, "Prefab_99").at(Position::new(1.5, -2.25, 3.0e-3));
    let mut created = DeltaRow::owned(DeltaOp::Created, &object);
    created.header = header();
    let rows = vec![changed, opened, created];

    write_delta(&path, &rows).unwrap();
    let back = read_delta(&path).unwrap();
    assert_eq!(back, rows);
    assert_eq!(back[1].row_kind(), "tech_opened");
    assert_eq!(back[1].tech_id, 456);
}

#[test]
fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_baseline(&dir.path().join("absent.csv.gz")).unwrap().is_empty());
    assert!(read_delta(&dir.path().join("absent.csv.gz")).unwrap().is_empty());
}

#[test]
fn header_only_file_has_no_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv.gz");
    write_baseline(&path, &[]).unwrap();
    assert!(read_baseline(&path).unwrap().is_empty());
}

#[test]
fn short_records_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("baseline.csv.gz");
    let full = join_record(&baseline_fields(&BaselineRow::component(
        header(),
        "A.TechState",
        true,
        "{}",
    )));
    let text = format!("{}\n1,snap,alice\n{full}\n", join_record(BASELINE_HEADER));
    gz_text(&path, &text);

    let rows = read_baseline(&path).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].qualified_type, "A.TechState");
}

#[test]
fn extra_trailing_columns_are_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("baseline.csv.gz");
    let mut fields = baseline_fields(&BaselineRow::component(header(), "A.TechState", true, "{}"));
    fields.push("future".into());
    gz_text(&path, &format!("{}\n{}\n", join_record(BASELINE_HEADER), join_record(&fields)));

    assert_eq!(read_baseline(&path).unwrap().len(), 1);
}

#[test]
fn unparseable_scalars_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("delta.csv.gz");
    let record = [
        "x", "snap", "alice", "Alice", "-1", "zone", "yesterday", "entity_created", "created", "",
        "", "", "abc", "", "1.5", "", "big", "", "n/a", "2", "",
    ];
    gz_text(&path, &format!("{}\n{}\n", join_record(DELTA_HEADER), join_record(&record)));

    let rows = read_delta(&path).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.header.version, 0);
    assert_eq!(row.header.subject_id, 0);
    assert_eq!(row.header.captured_at, DateTime::<Utc>::UNIX_EPOCH);
    assert_eq!(row.tech_id, 0);
    assert_eq!(row.entity_index, 0);
    assert_eq!(row.prefab_id, 0);
    assert_eq!(row.position, Position::new(0.0, 2.0, 0.0));
}

#[test]
fn delta_op_falls_back_to_row_kind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("delta.csv.gz");
    let mut known = vec![""; DELTA_HEADER.len()];
    known[7] = "entity_removed";
    let mut unknown = vec![""; DELTA_HEADER.len()];
    unknown[7] = "entity_moved";
    unknown[8] = "moved";
    gz_text(
        &path,
        &format!(
            "{}\n{}\n{}\n",
            join_record(DELTA_HEADER),
            join_record(&known),
            join_record(&unknown)
        ),
    );

    let rows = read_delta(&path).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].op, DeltaOp::Removed);
}

#[test]
fn bool_parsing_is_case_insensitive() {
    assert!(parse_bool("True"));
    assert!(parse_bool(" true "));
    assert!(!parse_bool("1"));
    assert!(!parse_bool(""));
}

#[test]
fn truncated_stream_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("baseline.csv.gz");
    let rows: Vec<BaselineRow> = (0..50)
        .map(|i| BaselineRow::component(header(), &format!("A.Tech{i}"), true, "{}"))
        .collect();
    write_baseline(&path, &rows).unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let err = read_baseline(&path).unwrap_err();
    assert!(matches!(err, CodecError::Read { .. }));
}

#[test]
fn parse_records_handles_quotes_and_line_breaks() {
    let text = "a,\"b,c\",\"say \"\"hi\"\"\"\r\n\"multi\nline\",x\n\n";
    let records = parse_records(text);
    assert_eq!(
        records,
        vec![
            vec!["a".to_string(), "b,c".into(), "say \"hi\"".into()],
            vec!["multi\nline".to_string(), "x".into()],
        ]
    );
}

fn field() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9 _.|-]{0,12}",
        "[A-Za-z0-9,\"\r\n ]{0,12}",
    ]
}

proptest! {
    #[test]
    fn escaped_records_parse_back(fields in prop::collection::vec(field(), 2..8)) {
        let text = format!("{}\n", join_record(&fields));
        let records = parse_records(&text);
        prop_assert_eq!(records, vec![fields]);
    }

    #[test]
    fn baseline_text_fields_survive_round_trip(
        name in field(),
        zone in field(),
        qualified in "[A-Za-z.,\" ]{1,16}",
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.csv.gz");
        let subject = Subject::new(name.clone(), 7);
        let head = RowHeader::new("snap", name, &subject, zone, DateTime::<Utc>::UNIX_EPOCH);
        let rows = vec![BaselineRow::component(head, &qualified, true, "{\"k\":\"v,\\\"q\\\"\"}")];

        write_baseline(&path, &rows).unwrap();
        prop_assert_eq!(read_baseline(&path).unwrap(), rows);
    }
}
