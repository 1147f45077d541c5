// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct ResearchUnlockState {
    level: u32,
}

const RESEARCH: &str = "ProjectM.ResearchUnlockState, ProjectM";

fn world() -> (MemoryWorld, ObjectHandle) {
    let world = MemoryWorld::new();
    world.register::<ResearchUnlockState>(RESEARCH);
    let handle = world.spawn();
    (world, handle)
}

#[test]
fn insert_and_read_back_typed_fragment() {
    let (world, handle) = world();
    world
        .insert(handle, RESEARCH, &ResearchUnlockState { level: 1 })
        .unwrap();
    assert!(world.contains(handle, RESEARCH));
    assert_eq!(
        world.get::<ResearchUnlockState>(handle, RESEARCH),
        Some(ResearchUnlockState { level: 1 })
    );
    assert_eq!(world.get_fragment(handle, RESEARCH).unwrap(), json!({"level": 1}));
}

#[test]
fn add_attaches_default_value() {
    let (world, handle) = world();
    world.add_fragment(handle, RESEARCH).unwrap();
    assert_eq!(world.get_fragment(handle, RESEARCH).unwrap(), json!({"level": 0}));
}

#[test]
fn set_requires_attached_fragment() {
    let (world, handle) = world();
    let err = world
        .set_fragment(handle, RESEARCH, &json!({"level": 5}))
        .unwrap_err();
    assert!(matches!(err, AccessError::NotAttached(_)));
}

#[test]
fn set_rejects_values_that_do_not_fit_the_type() {
    let (world, handle) = world();
    world.add_fragment(handle, RESEARCH).unwrap();
    let err = world
        .set_fragment(handle, RESEARCH, &json!({"level": "high"}))
        .unwrap_err();
    assert!(matches!(err, AccessError::Deserialize { .. }));
}

#[test]
fn unregistered_types_are_listed_but_unresolvable() {
    let (world, handle) = world();
    world.insert(handle, "Game.TechMystery", &json!({"x": 1})).unwrap();
    assert_eq!(world.attached_types(handle).unwrap(), vec!["Game.TechMystery"]);
    let err = world.get_fragment(handle, "Game.TechMystery").unwrap_err();
    assert!(matches!(err, AccessError::UnknownType(_)));
    assert!(!world.resolves("Game.TechMystery"));
    assert!(world.resolves(RESEARCH));
}

#[test]
fn despawned_object_is_not_live() {
    let (world, handle) = world();
    world.despawn(handle);
    assert!(!world.is_live(handle));
    assert!(matches!(
        world.attached_types(handle),
        Err(AccessError::ObjectNotFound(_))
    ));
}

#[test]
fn injected_failures() {
    let (world, handle) = world();
    world.add_fragment(handle, RESEARCH).unwrap();
    world.fail_reads_for(RESEARCH);
    world.fail_writes_for(RESEARCH);
    assert!(matches!(
        world.get_fragment(handle, RESEARCH),
        Err(AccessError::Serialize { .. })
    ));
    assert!(matches!(
        world.set_fragment(handle, RESEARCH, &json!({"level": 1})),
        Err(AccessError::Deserialize { .. })
    ));

    world.fail_enumeration();
    assert!(world.is_live(handle));
    assert!(matches!(world.attached_types(handle), Err(AccessError::Other(_))));
}

#[test]
fn owned_objects_can_be_destroyed_when_prefab_matches() {
    let world = MemoryWorld::new();
    world.place("arena", OwnedObject::new(3, 1, 30, "C"));
    assert!(world.owned_exists(3, 1));

    assert!(!world.destroy_owned(3, 1, 99).unwrap());
    assert!(world.owned_exists(3, 1));
    assert!(world.destroy_owned(3, 1, 30).unwrap());
    assert!(!world.owned_exists(3, 1));
    assert!(world.owned_objects("arena").is_empty());
}

#[test]
fn zero_prefab_id_matches_any_object() {
    let world = MemoryWorld::new();
    world.place("arena", OwnedObject::new(4, 2, 40, "D"));
    assert!(world.destroy_owned(4, 2, 0).unwrap());
}
