//! Delta listing specs

use crate::prelude::*;

#[test]
fn lists_each_operation() {
    let project = Project::with_active_subject();
    project
        .sbx()
        .arg("delta")
        .arg(project.delta_path())
        .passes()
        .stdout_has(r#"ResearchUnlockState: {"level":1} -> {"level":99}"#)
        .stdout_has("GUID:-1391546313")
        .stdout_has("#5:1 Throne (900) at (10.0, 0.0, -4.5)");
}

#[test]
fn json_rows_name_the_operation() {
    let project = Project::with_active_subject();
    let run = project
        .sbx()
        .arg("delta")
        .arg(project.delta_path())
        .args(["--format", "json"])
        .passes();

    let ops: Vec<String> = run
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["operation"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ops, vec!["changed", "opened", "created"]);
}
