//! Snapshot directory status specs

use crate::prelude::*;

#[test]
fn empty_directory_has_no_active_snapshots() {
    let project = Project::empty();
    project
        .sbx()
        .arg("status")
        .arg(project.path())
        .passes()
        .stdout_has("No active snapshots");
}

#[test]
fn summarizes_each_subject_key() {
    let project = Project::empty();
    project.write_active(&[active_pair("Abc", "Abc", 42), active_pair("Abc|7", "Abc", 7)]);
    project
        .sbx()
        .arg("status")
        .arg(project.path())
        .passes()
        .stdout_has("Abc|7")
        .stdout_has("baseline=2 delta=3 (changed=1, opened=1, objects=1)");
}

#[test]
fn json_status_is_ordered_by_key() {
    let project = Project::empty();
    project.write_active(&[active_pair("Zed", "Zed", 1), active_pair("Abc", "Abc", 42)]);
    let run = project
        .sbx()
        .arg("status")
        .arg(project.path())
        .args(["--format", "json"])
        .passes();

    let status = run.json();
    let keys: Vec<&str> = status
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["Abc", "Zed"]);
    assert_eq!(status[0]["snapshot_id"], "20260304050607000_Abc_42");
}
