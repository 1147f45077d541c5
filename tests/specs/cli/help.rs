//! Help and usage specs

use crate::prelude::*;

#[test]
fn help_lists_subcommands() {
    let project = Project::empty();
    project
        .sbx()
        .arg("--help")
        .passes()
        .stdout_has("baseline")
        .stdout_has("delta")
        .stdout_has("status")
        .stdout_has("journal");
}

#[test]
fn no_subcommand_is_a_usage_error() {
    Project::empty()
        .sbx()
        .fails()
        .stderr_has("Usage");
}

#[test]
fn unknown_format_is_rejected() {
    let project = Project::empty();
    project
        .sbx()
        .args(["status", "--format", "yaml"])
        .arg(project.path())
        .fails()
        .stderr_has("yaml");
}
