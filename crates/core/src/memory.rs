// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory runtime world
//!
//! A typed fragment store implementing [`FragmentAccessor`]. Fragment types
//! are registered with their Rust type so values are validated through serde
//! on every write, the same way a real runtime would reject a payload that
//! does not fit the component layout.

use crate::accessor::{AccessError, FragmentAccessor};
use crate::row::OwnedObject;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle to an object in a [`MemoryWorld`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u32);

#[derive(Clone, Copy)]
struct FragmentCodec {
    default: fn() -> Result<Value, serde_json::Error>,
    normalize: fn(&Value) -> Result<Value, serde_json::Error>,
}

fn default_value<T: Serialize + Default>() -> Result<Value, serde_json::Error> {
    serde_json::to_value(T::default())
}

fn normalize_as<T: Serialize + DeserializeOwned>(value: &Value) -> Result<Value, serde_json::Error> {
    let typed: T = serde_json::from_value(value.clone())?;
    serde_json::to_value(typed)
}

#[derive(Default)]
struct WorldState {
    registry: BTreeMap<String, FragmentCodec>,
    objects: BTreeMap<u32, BTreeMap<String, Value>>,
    next_id: u32,
    owned: BTreeMap<String, Vec<OwnedObject>>,
    failing_reads: BTreeSet<String>,
    failing_writes: BTreeSet<String>,
    failing_enumeration: bool,
}

impl WorldState {
    fn object(&self, handle: ObjectHandle) -> Result<&BTreeMap<String, Value>, AccessError> {
        self.objects
            .get(&handle.0)
            .ok_or_else(|| AccessError::ObjectNotFound(handle.0.to_string()))
    }

    fn object_mut(
        &mut self,
        handle: ObjectHandle,
    ) -> Result<&mut BTreeMap<String, Value>, AccessError> {
        self.objects
            .get_mut(&handle.0)
            .ok_or_else(|| AccessError::ObjectNotFound(handle.0.to_string()))
    }

    fn codec(&self, type_name: &str) -> Result<FragmentCodec, AccessError> {
        self.registry
            .get(type_name)
            .copied()
            .ok_or_else(|| AccessError::UnknownType(type_name.to_string()))
    }
}

/// Shared, cloneable in-memory world
#[derive(Clone, Default)]
pub struct MemoryWorld {
    state: Arc<Mutex<WorldState>>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make a fragment type resolvable under its qualified name
    pub fn register<T>(&self, qualified: &str) -> &Self
    where
        T: Serialize + DeserializeOwned + Default + 'static,
    {
        self.state().registry.insert(
            qualified.to_string(),
            FragmentCodec {
                default: default_value::<T>,
                normalize: normalize_as::<T>,
            },
        );
        self
    }

    pub fn spawn(&self) -> ObjectHandle {
        let mut state = self.state();
        state.next_id += 1;
        let id = state.next_id;
        state.objects.insert(id, BTreeMap::new());
        ObjectHandle(id)
    }

    pub fn despawn(&self, handle: ObjectHandle) {
        self.state().objects.remove(&handle.0);
    }

    /// Attach or overwrite a fragment, bypassing the registry
    pub fn insert<T: Serialize>(
        &self,
        handle: ObjectHandle,
        qualified: &str,
        value: &T,
    ) -> Result<(), AccessError> {
        let json = serde_json::to_value(value).map_err(|source| AccessError::Serialize {
            type_name: qualified.to_string(),
            source,
        })?;
        self.state()
            .object_mut(handle)?
            .insert(qualified.to_string(), json);
        Ok(())
    }

    /// Read a fragment as `T`
    pub fn get<T: DeserializeOwned>(&self, handle: ObjectHandle, qualified: &str) -> Option<T> {
        let state = self.state();
        let value = state.objects.get(&handle.0)?.get(qualified)?.clone();
        serde_json::from_value(value).ok()
    }

    pub fn contains(&self, handle: ObjectHandle, qualified: &str) -> bool {
        self.state()
            .objects
            .get(&handle.0)
            .is_some_and(|o| o.contains_key(qualified))
    }

    /// Place an owned object in a zone
    pub fn place(&self, zone_id: &str, object: OwnedObject) {
        self.state()
            .owned
            .entry(zone_id.to_string())
            .or_default()
            .push(object);
    }

    /// Make reads of a type fail with a serialization error
    pub fn fail_reads_for(&self, qualified: &str) {
        self.state().failing_reads.insert(qualified.to_string());
    }

    /// Make writes of a type fail with a deserialization error
    pub fn fail_writes_for(&self, qualified: &str) {
        self.state().failing_writes.insert(qualified.to_string());
    }

    /// Make listing attached fragments fail on every object
    pub fn fail_enumeration(&self) {
        self.state().failing_enumeration = true;
    }
}

fn injected(type_name: &str) -> serde_json::Error {
    serde::de::Error::custom(format!("injected failure for {type_name}"))
}

impl FragmentAccessor for MemoryWorld {
    type Handle = ObjectHandle;

    fn is_live(&self, handle: ObjectHandle) -> bool {
        self.state().objects.contains_key(&handle.0)
    }

    fn attached_types(&self, handle: ObjectHandle) -> Result<Vec<String>, AccessError> {
        let state = self.state();
        let object = state.object(handle)?;
        if state.failing_enumeration {
            return Err(AccessError::Other("injected enumeration failure".into()));
        }
        Ok(object.keys().cloned().collect())
    }

    fn known_types(&self) -> Vec<String> {
        self.state().registry.keys().cloned().collect()
    }

    fn resolves(&self, type_name: &str) -> bool {
        self.state().registry.contains_key(type_name)
    }

    fn has_fragment(&self, handle: ObjectHandle, type_name: &str) -> Result<bool, AccessError> {
        Ok(self.state().object(handle)?.contains_key(type_name))
    }

    fn get_fragment(&self, handle: ObjectHandle, type_name: &str) -> Result<Value, AccessError> {
        let state = self.state();
        let codec = state.codec(type_name)?;
        let value = state
            .object(handle)?
            .get(type_name)
            .ok_or_else(|| AccessError::NotAttached(type_name.to_string()))?;
        if state.failing_reads.contains(type_name) {
            return Err(AccessError::Serialize {
                type_name: type_name.to_string(),
                source: injected(type_name),
            });
        }
        (codec.normalize)(value).map_err(|source| AccessError::Serialize {
            type_name: type_name.to_string(),
            source,
        })
    }

    fn set_fragment(
        &self,
        handle: ObjectHandle,
        type_name: &str,
        value: &Value,
    ) -> Result<(), AccessError> {
        let mut state = self.state();
        let codec = state.codec(type_name)?;
        if state.failing_writes.contains(type_name) {
            return Err(AccessError::Deserialize {
                type_name: type_name.to_string(),
                source: injected(type_name),
            });
        }
        let typed = (codec.normalize)(value).map_err(|source| AccessError::Deserialize {
            type_name: type_name.to_string(),
            source,
        })?;
        let slot = state
            .object_mut(handle)?
            .get_mut(type_name)
            .ok_or_else(|| AccessError::NotAttached(type_name.to_string()))?;
        *slot = typed;
        Ok(())
    }

    fn add_fragment(&self, handle: ObjectHandle, type_name: &str) -> Result<(), AccessError> {
        let mut state = self.state();
        let codec = state.codec(type_name)?;
        let value = (codec.default)().map_err(|source| AccessError::Serialize {
            type_name: type_name.to_string(),
            source,
        })?;
        state
            .object_mut(handle)?
            .entry(type_name.to_string())
            .or_insert(value);
        Ok(())
    }

    fn remove_fragment(&self, handle: ObjectHandle, type_name: &str) -> Result<(), AccessError> {
        self.state().object_mut(handle)?.remove(type_name);
        Ok(())
    }

    fn owned_objects(&self, zone_id: &str) -> Vec<OwnedObject> {
        self.state().owned.get(zone_id).cloned().unwrap_or_default()
    }

    fn owned_exists(&self, index: i32, version: i32) -> bool {
        self.state()
            .owned
            .values()
            .flatten()
            .any(|o| o.identity() == (index, version))
    }

    fn destroy_owned(&self, index: i32, version: i32, prefab_id: i64) -> Result<bool, AccessError> {
        let mut state = self.state();
        for objects in state.owned.values_mut() {
            let found = objects.iter().position(|o| {
                o.identity() == (index, version) && (prefab_id == 0 || o.prefab_id == prefab_id)
            });
            if let Some(pos) = found {
                objects.remove(pos);
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
