//! Progression journal specs

use crate::prelude::*;

#[test]
fn missing_journal_is_empty() {
    let project = Project::empty();
    project
        .sbx()
        .arg("journal")
        .arg(project.path())
        .passes()
        .stdout_has("No journal records");
}

#[test]
fn lists_appended_records() {
    let project = Project::empty();
    project.write_journal();
    project
        .sbx()
        .arg("journal")
        .arg(project.path())
        .passes()
        .stdout_has("modify ResearchUnlockState")
        .stdout_has("add    VBloodUnlockState");
}

#[test]
fn malformed_lines_are_skipped() {
    let project = Project::empty();
    project.write_journal();
    let path = project.files().journal_path();
    let mut text = std::fs::read_to_string(&path).unwrap();
    text.push_str("{not json\n");
    std::fs::write(&path, text).unwrap();

    let run = project
        .sbx()
        .arg("journal")
        .arg(project.path())
        .args(["--format", "json"])
        .passes();
    let records = run.json();
    assert_eq!(records.as_array().unwrap().len(), 2);
    assert_eq!(records[0]["operation"], "modify");
    assert_eq!(records[0]["before_json"], r#"{"level":1}"#);
}
