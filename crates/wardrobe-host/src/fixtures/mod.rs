//! Shared catalog fixtures for engine tests.
//!
//! Only `wardrobe_types` paths are used here so integration tests can pull this
//! file in with `#[path]`.

#![allow(dead_code)]

use std::collections::BTreeMap;

use uuid::Uuid;
use wardrobe_types::{
    DrawData, EquipSlot, ItemId, RestraintSet, SetId, StainId, Stains, StatusId, WardrobeCatalog,
};

pub const BALLGAG: &str = "Ballgag";
pub const MUZZLE: &str = "Muzzle";
pub const COLLAR_GAG: &str = "Collar Gag";

pub const HEAD_HARNESS: u64 = 7;
pub const BODY_HARNESS: u64 = 8;
pub const WRIST_CUFFS: u64 = 9;
pub const BLINDFOLD_ITEM: u64 = 99;

pub fn status(n: u128) -> StatusId {
    StatusId(Uuid::from_u128(n))
}

pub fn gag_stains() -> Stains {
    Stains(StainId(3), StainId(4))
}

pub fn blindfold_stains() -> Stains {
    Stains(StainId(1), StainId(1))
}

pub fn head_harness_set_id() -> SetId {
    SetId(Uuid::from_u128(0x5e7))
}

pub fn ballgag() -> DrawData {
    DrawData::new(EquipSlot::Head, ItemId(42))
        .with_stains(gag_stains())
        .with_statuses([status(1), status(2)])
}

pub fn muzzle() -> DrawData {
    DrawData::new(EquipSlot::Head, ItemId(43)).with_statuses([status(3)])
}

pub fn collar_gag() -> DrawData {
    DrawData::new(EquipSlot::Neck, ItemId(55)).with_statuses([status(4)])
}

pub fn head_harness_set() -> RestraintSet {
    let mut draw_data = BTreeMap::new();
    draw_data.insert(
        EquipSlot::Head,
        DrawData::new(EquipSlot::Head, ItemId(HEAD_HARNESS)).with_statuses([status(10)]),
    );
    draw_data.insert(
        EquipSlot::Body,
        DrawData::new(EquipSlot::Body, ItemId(BODY_HARNESS)).forcing(false, true),
    );
    RestraintSet {
        id: head_harness_set_id(),
        name: "Head Harness".into(),
        draw_data,
    }
}

pub fn cuffs_set_id() -> SetId {
    SetId(Uuid::from_u128(0xc0ff))
}

pub fn cuffs_set() -> RestraintSet {
    let mut draw_data = BTreeMap::new();
    draw_data.insert(
        EquipSlot::Hands,
        DrawData::new(EquipSlot::Hands, ItemId(WRIST_CUFFS)).with_statuses([status(11)]),
    );
    RestraintSet {
        id: cuffs_set_id(),
        name: "Wrist Cuffs".into(),
        draw_data,
    }
}

/// Ballgag and muzzle on the head, a collar gag on the neck, one restraint set
/// covering head and body, a second set on the hands, and a head blindfold.
pub fn catalog() -> WardrobeCatalog {
    let mut catalog = WardrobeCatalog {
        blindfold: DrawData::new(EquipSlot::Head, ItemId(BLINDFOLD_ITEM))
            .with_stains(blindfold_stains()),
        ..WardrobeCatalog::default()
    };
    catalog.insert_gag(BALLGAG, ballgag());
    catalog.insert_gag(MUZZLE, muzzle());
    catalog.insert_gag(COLLAR_GAG, collar_gag());
    catalog.insert_restraint_set(head_harness_set());
    catalog.insert_restraint_set(cuffs_set());
    catalog
}
