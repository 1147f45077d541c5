//! Baseline listing specs

use crate::prelude::*;

#[test]
fn lists_captured_fragments() {
    let project = Project::with_active_subject();
    project
        .sbx()
        .arg("baseline")
        .arg(project.baseline_path())
        .passes()
        .stdout_has("ResearchUnlockState")
        .stdout_has(r#"{"level":1}"#)
        .stdout_has("VBloodUnlockState")
        .stdout_has("absent");
}

#[test]
fn json_rows_carry_header_fields() {
    let project = Project::with_active_subject();
    let run = project
        .sbx()
        .arg("baseline")
        .arg(project.baseline_path())
        .args(["--format", "json"])
        .passes();

    let rows = run.json();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["key"], "Abc");
    assert_eq!(rows[0]["platform_id"], 42);
    assert_eq!(rows[0]["zone_id"], "arena");
    assert_eq!(rows[0]["qualified_type"], RESEARCH);
    assert_eq!(rows[0]["existed"], true);
    assert_eq!(rows[0]["payload"], r#"{"level":1}"#);
    assert_eq!(rows[1]["existed"], false);
    assert_eq!(rows[1]["payload"], "");
}
