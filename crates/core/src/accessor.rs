// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime-object accessor
//!
//! Capability interface over an entity-component runtime. Fragment types are
//! named by their fully-qualified type string; values travel as JSON.

use crate::row::OwnedObject;
use serde_json::Value;
use std::fmt::Debug;
use thiserror::Error;

/// Errors from accessor operations
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("object not found: {0}")]
    ObjectNotFound(String),
    #[error("unknown fragment type: {0}")]
    UnknownType(String),
    #[error("fragment {0} is not attached")]
    NotAttached(String),
    #[error("failed to serialize {type_name}: {source}")]
    Serialize {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to deserialize {type_name}: {source}")]
    Deserialize {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Other(String),
}

/// Access to a runtime object's attached fragments
///
/// Methods take `&self`; implementations use interior mutability. The caller
/// holds exclusive access to the object for the duration of a restore.
pub trait FragmentAccessor: Send + Sync {
    type Handle: Copy + Debug + Send + Sync;

    /// Whether the handle resolves to a live object
    fn is_live(&self, handle: Self::Handle) -> bool;

    /// Qualified names of every fragment attached to the object
    fn attached_types(&self, handle: Self::Handle) -> Result<Vec<String>, AccessError>;

    /// Types the runtime can resolve, attached or not
    fn known_types(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether the runtime can resolve a type name to a fragment layout
    ///
    /// Fragments of unresolvable types are never captured, so restore must
    /// leave them in place.
    fn resolves(&self, _type_name: &str) -> bool {
        true
    }

    fn has_fragment(&self, handle: Self::Handle, type_name: &str) -> Result<bool, AccessError>;

    fn get_fragment(&self, handle: Self::Handle, type_name: &str) -> Result<Value, AccessError>;

    fn set_fragment(
        &self,
        handle: Self::Handle,
        type_name: &str,
        value: &Value,
    ) -> Result<(), AccessError>;

    /// Attach a default-valued fragment
    fn add_fragment(&self, handle: Self::Handle, type_name: &str) -> Result<(), AccessError>;

    fn remove_fragment(&self, handle: Self::Handle, type_name: &str) -> Result<(), AccessError>;

    /// Sub-objects currently owned by a zone
    fn owned_objects(&self, _zone_id: &str) -> Vec<OwnedObject> {
        Vec::new()
    }

    /// Whether an owned object with this identity still exists
    fn owned_exists(&self, _index: i32, _version: i32) -> bool {
        false
    }

    /// Destroy an owned object; a non-zero `prefab_id` must match
    ///
    /// Returns `Ok(false)` when no matching object exists.
    fn destroy_owned(
        &self,
        _index: i32,
        _version: i32,
        _prefab_id: i64,
    ) -> Result<bool, AccessError> {
        Ok(false)
    }
}
