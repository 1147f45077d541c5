//! Error reporting specs
//!
//! Missing files are empty listings; unreadable files fail with the path.

use crate::prelude::*;

#[test]
fn missing_baseline_file_is_an_empty_listing() {
    let project = Project::empty();
    project
        .sbx()
        .arg("baseline")
        .arg(project.baseline_path())
        .passes()
        .stdout_has("No baseline rows");
}

#[test]
fn missing_delta_file_is_an_empty_json_array() {
    let project = Project::empty();
    let run = project
        .sbx()
        .arg("delta")
        .arg(project.delta_path())
        .args(["--format", "json"])
        .passes();
    assert_eq!(run.json(), serde_json::json!([]));
}

#[test]
fn corrupt_baseline_fails_with_path() {
    let project = Project::empty();
    let path = project.file("sandbox_baseline.csv.gz", b"\x1f\x8b\x08\x00garbage");
    project
        .sbx()
        .arg("baseline")
        .arg(&path)
        .fails()
        .stderr_has("sandbox_baseline.csv.gz");
}

#[test]
fn corrupt_status_directory_fails() {
    let project = Project::empty();
    project.file("sandbox_delta.csv.gz", b"not gzip at all");
    project
        .sbx()
        .arg("status")
        .arg(project.path())
        .fails()
        .stderr_has("sandbox_delta.csv.gz");
}
