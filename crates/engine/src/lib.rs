// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Sandbox snapshot engine
//!
//! Captures a subject's progression fragments before an altered-state window,
//! restores them afterwards, and keeps the active set on disk across restarts.

pub mod capture;
mod config;
mod engine;
mod error;

pub use capture::{capture, restore, CaptureOutcome, RestoreReport};
pub use config::{ConfigError, EngineConfig};
pub use engine::{
    no_alteration, Alteration, Engine, EnterOutcome, EnterReport, ExitOutcome, ExitReport,
    FlushOutcome, LoadOutcome, PrepareOutcome,
};
pub use error::EngineError;
