// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Settings supplied once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// When false every lifecycle operation is a no-op
    pub enabled: bool,
    pub persist_snapshots: bool,
    /// Snapshot directory, or a file inside it (empty disables file I/O)
    pub snapshot_path: String,
    /// Emit per-subject lifecycle detail at info instead of debug
    pub verbose_logs: bool,
    /// Let a fresh enter replace an active snapshot whose exit was skipped
    pub recapture_when_active: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            persist_snapshots: true,
            snapshot_path: String::new(),
            verbose_logs: false,
            recapture_when_active: false,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Whether snapshots should touch the filesystem
    pub fn persists(&self) -> bool {
        self.enabled && self.persist_snapshots && !self.snapshot_path.trim().is_empty()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
