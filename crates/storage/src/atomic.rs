// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replace-on-write file staging
//!
//! Content is written to `<target>.tmp` and renamed over the target on
//! commit. Dropping an uncommitted stage removes the temporary file and
//! leaves the target untouched.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A pending replacement of `target`
#[derive(Debug)]
pub struct StagedFile {
    target: PathBuf,
    staging: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn new(target: &Path) -> Self {
        let mut name = OsString::from(target.as_os_str());
        name.push(".tmp");
        Self {
            target: target.to_path_buf(),
            staging: PathBuf::from(name),
            committed: false,
        }
    }

    /// Path writers should write to
    pub fn path(&self) -> &Path {
        &self.staging
    }

    /// Move the staged content over the target
    pub fn commit(mut self) -> io::Result<()> {
        fs::rename(&self.staging, &self.target)?;
        self.committed = true;
        remove_if_exists(&self.staging)?;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.staging);
        }
    }
}

/// Delete a file, treating "not found" as success
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
