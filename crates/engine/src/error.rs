// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the snapshot engine

use crate::config::ConfigError;
use sbx_core::AccessError;
use sbx_storage::PersistError;
use thiserror::Error;

/// Errors raised inside the engine
///
/// Lifecycle operations catch these and report them through their outcomes.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),
    #[error("accessor error: {0}")]
    Access(#[from] AccessError),
    #[error("invalid payload for {type_name}: {message}")]
    Payload { type_name: String, message: String },
}
