//! Shared helpers for CLI specs

#![allow(dead_code)]

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use predicates::prelude::*;
use sbx_core::{
    BaselineRow, BaselineSnapshot, DeltaOp, DeltaRow, DeltaSnapshot, OwnedObject, Position,
    RowHeader, Subject,
};
use sbx_storage::{journal_records, SnapshotFiles};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const RESEARCH: &str = "ProjectM.ResearchUnlockState, ProjectM";
pub const VBLOOD: &str = "ProjectM.VBloodUnlockState, ProjectM";

/// A scratch snapshot directory
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Directory holding one active subject "Abc" (42) that entered the arena
    pub fn with_active_subject() -> Self {
        let project = Self::empty();
        project.write_active(&[active_pair("Abc", "Abc", 42)]);
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn files(&self) -> SnapshotFiles {
        SnapshotFiles::new(self.dir.path())
    }

    pub fn baseline_path(&self) -> PathBuf {
        self.files().baseline_path()
    }

    pub fn delta_path(&self) -> PathBuf {
        self.files().delta_path()
    }

    pub fn write_active(&self, pairs: &[(BaselineSnapshot, DeltaSnapshot)]) {
        let baselines: Vec<_> = pairs.iter().map(|(b, _)| b.clone()).collect();
        let deltas: Vec<_> = pairs.iter().map(|(_, d)| d.clone()).collect();
        self.files().lock().write(&baselines, &deltas).unwrap();
    }

    /// Journal records for the research and vblood changes of "Abc"
    pub fn write_journal(&self) {
        let (baseline, _) = active_pair("Abc", "Abc", 42);
        let header = baseline.rows[0].header.clone();
        let post = vec![
            BaselineRow::component(header.clone(), RESEARCH, true, r#"{"level":99}"#),
            BaselineRow::component(header.clone(), VBLOOD, true, r#"{"unlocked_guids":[5]}"#),
        ];
        let records = journal_records(&baseline.rows, &post, &header);
        self.files().lock().append_journal(&records).unwrap();
    }

    pub fn file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn sbx(&self) -> CliBuilder {
        CliBuilder::new()
    }
}

/// Baseline and delta of a subject that entered "arena"
pub fn active_pair(key: &str, name: &str, id: u64) -> (BaselineSnapshot, DeltaSnapshot) {
    let subject = Subject::new(name, id);
    let header = RowHeader::new(
        format!("20260304050607000_{name}_{id}"),
        key,
        &subject,
        "arena",
        Default::default(),
    );
    let rows = vec![
        BaselineRow::component(header.clone(), RESEARCH, true, r#"{"level":1}"#),
        BaselineRow::component(header.clone(), VBLOOD, false, ""),
    ];

    let mut changed = DeltaRow::changed(
        "ResearchUnlockState",
        &rows[0].payload,
        &sbx_core::payload::encode(r#"{"level":99}"#),
    );
    changed.header = header.clone();
    let mut opened = DeltaRow::opened(-1391546313);
    opened.header = header.clone();
    let throne = OwnedObject::new(5, 1, 900, "Throne").at(Position::new(10.0, 0.0, -4.5));
    let mut created = DeltaRow::owned(DeltaOp::Created, &throne);
    created.header = header.clone();

    let baseline = BaselineSnapshot {
        subject_key: key.to_string(),
        subject: subject.clone(),
        zone_id: "arena".into(),
        snapshot_id: header.snapshot_id.clone(),
        captured_at: header.captured_at,
        rows,
    };
    let delta = DeltaSnapshot {
        subject_key: key.to_string(),
        subject,
        zone_id: "arena".into(),
        snapshot_id: header.snapshot_id.clone(),
        captured_at: header.captured_at,
        rows: vec![changed, opened, created],
    };
    (baseline, delta)
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    fn new() -> Self {
        let mut cmd = Command::cargo_bin("sbx").unwrap();
        cmd.env_remove("RUST_LOG");
        Self { cmd }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.cmd.args(args);
        self
    }

    pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.arg(arg);
        self
    }

    pub fn passes(mut self) -> RunAssert {
        RunAssert {
            assert: self.cmd.assert().success(),
        }
    }

    pub fn fails(mut self) -> RunAssert {
        RunAssert {
            assert: self.cmd.assert().failure(),
        }
    }
}

pub struct RunAssert {
    assert: Assert,
}

impl RunAssert {
    pub fn stdout_has(self, expected: &str) -> Self {
        Self {
            assert: self.assert.stdout(predicate::str::contains(expected)),
        }
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        Self {
            assert: self
                .assert
                .stdout(predicate::str::contains(unexpected).not()),
        }
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        Self {
            assert: self.assert.stderr(predicate::str::contains(expected)),
        }
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.assert.get_output().stdout).into_owned()
    }

    /// Parse stdout as JSON
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout()).unwrap()
    }
}
