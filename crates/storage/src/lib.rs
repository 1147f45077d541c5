// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sbx-storage: durable snapshot persistence
//!
//! Gzip CSV codec, atomic file replacement, the snapshot file set with
//! legacy migration, and the progression journal.

pub mod atomic;
pub mod codec;
pub mod files;
pub mod journal;
pub mod legacy;

pub use codec::{read_baseline, read_delta, write_baseline, write_delta, CodecError};
pub use files::{FilesGuard, LoadSource, Loaded, PersistError, SnapshotFiles, WriteSummary};
pub use journal::{journal_records, Journal, JournalError, JournalOp, JournalRecord};
