// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Sandbox snapshot core
//!
//! Row records, payload encoding, the keyword filter, delta computation, the
//! keyed snapshot store, and the runtime-object accessor interface.

pub mod accessor;
pub mod clock;
pub mod delta;
pub mod filter;
pub mod id;
pub mod memory;
pub mod payload;
pub mod row;
pub mod store;

pub use accessor::{AccessError, FragmentAccessor};
pub use clock::{Clock, FakeClock, SystemClock};
pub use filter::KeywordFilter;
pub use memory::{MemoryWorld, ObjectHandle};
pub use row::{
    BaselineRow, BaselineSnapshot, DeltaOp, DeltaRow, DeltaSnapshot, HeaderRow, OwnedObject,
    PendingContext, Position, RowHeader, Snapshot, Subject, SCHEMA_VERSION,
};
pub use store::{ActiveExport, ActiveLookup, SnapshotStore};
