//! Layer resolution: merges restraint, gag and blindfold draw data into one equip map.
//!
//! Precedence from bottom to top is restraint set, gags (layer 0 before 1 before 2,
//! a later layer never takes a slot an earlier one claimed), blindfold. Slots no
//! layer claims are left out of the map entirely.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use wardrobe_types::{
    DrawData, EquipSlot, ItemId, LayerIndex, MetadataFlag, ProfileId, Stains, Variant,
    WardrobeCatalog,
};

use crate::snapshot::Snapshot;

/// Which layers may contribute to a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerMask {
    pub restraint: bool,
    pub gags: bool,
    pub blindfold: bool,
}

impl LayerMask {
    pub const ALL: LayerMask = LayerMask {
        restraint: true,
        gags: true,
        blindfold: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerSource {
    Restraint,
    Gag(LayerIndex),
    Blindfold,
    /// Explicit "nothing" emitted when a slot loses its last claimant.
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEquip {
    pub item: ItemId,
    pub stains: Stains,
    pub variant: Variant,
    pub source: LayerSource,
    pub forces_headgear: bool,
    pub forces_visor: bool,
}

impl ResolvedEquip {
    fn from_draw(draw: &DrawData, source: LayerSource) -> Self {
        Self {
            item: draw.item,
            stains: draw.stains,
            variant: draw.variant,
            source,
            forces_headgear: draw.forces_headgear,
            forces_visor: draw.forces_visor,
        }
    }

    fn cleared() -> Self {
        Self {
            item: ItemId::NOTHING,
            stains: Stains::NONE,
            variant: Variant::default(),
            source: LayerSource::Cleared,
            forces_headgear: false,
            forces_visor: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipMap(BTreeMap<EquipSlot, ResolvedEquip>);

impl EquipMap {
    pub fn get(&self, slot: EquipSlot) -> Option<&ResolvedEquip> {
        self.0.get(&slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EquipSlot, &ResolvedEquip)> {
        self.0.iter().map(|(slot, equip)| (*slot, equip))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries for the given slots only.
    pub fn restrict(&self, slots: &BTreeSet<EquipSlot>) -> EquipMap {
        EquipMap(
            self.0
                .iter()
                .filter(|(slot, _)| slots.contains(slot))
                .map(|(slot, equip)| (*slot, *equip))
                .collect(),
        )
    }

    /// Entries won by a layer matching `keep`.
    pub fn filter_sources(&self, keep: impl Fn(LayerSource) -> bool) -> EquipMap {
        EquipMap(
            self.0
                .iter()
                .filter(|(_, equip)| keep(equip.source))
                .map(|(slot, equip)| (*slot, *equip))
                .collect(),
        )
    }

    /// Headgear/visor forcing implied by the winning entries.
    pub fn metadata_flag(&self) -> MetadataFlag {
        let (hat, visor) = self
            .0
            .values()
            .fold((false, false), |(hat, visor), equip| {
                (hat || equip.forces_headgear, visor || equip.forces_visor)
            });
        MetadataFlag::from_forces(hat, visor)
    }
}

impl FromIterator<(EquipSlot, ResolvedEquip)> for EquipMap {
    fn from_iter<T: IntoIterator<Item = (EquipSlot, ResolvedEquip)>>(iter: T) -> Self {
        EquipMap(iter.into_iter().collect())
    }
}

/// Draw data of every worn gag that is enabled, lowest layer first.
pub fn active_gag_draws<'a>(
    snapshot: &'a Snapshot,
    catalog: &'a WardrobeCatalog,
) -> impl Iterator<Item = (LayerIndex, &'a DrawData)> + 'a {
    snapshot
        .worn_gags()
        .filter_map(|slot| catalog.gag(&slot.gag_type).map(|draw| (slot.layer, draw)))
        .filter(|(_, draw)| draw.is_enabled)
}

/// Draw data of the active restraint set that claims its slot.
pub fn active_restraint_draws(snapshot: &Snapshot) -> impl Iterator<Item = &DrawData> {
    let active = snapshot.restraint.is_active();
    snapshot
        .restraint
        .per_slot_draw_data
        .values()
        .filter(move |draw| active && draw.claims_restraint_slot())
}

pub fn resolve(snapshot: &Snapshot, catalog: &WardrobeCatalog, mask: LayerMask) -> EquipMap {
    let mut map = BTreeMap::new();

    if mask.restraint {
        for draw in active_restraint_draws(snapshot) {
            map.insert(draw.slot, ResolvedEquip::from_draw(draw, LayerSource::Restraint));
        }
    }

    if mask.gags {
        let mut claimed = BTreeSet::new();
        for (layer, draw) in active_gag_draws(snapshot, catalog) {
            if claimed.insert(draw.slot) {
                map.insert(draw.slot, ResolvedEquip::from_draw(draw, LayerSource::Gag(layer)));
            }
        }
    }

    if mask.blindfold && snapshot.blindfold.is_equipped {
        let draw = &catalog.blindfold;
        map.insert(draw.slot, ResolvedEquip::from_draw(draw, LayerSource::Blindfold));
    }

    EquipMap(map)
}

/// `next` plus an explicit nothing for every slot `prev` claimed and `next` does not.
pub fn resolve_transition(prev: &EquipMap, next: &EquipMap) -> EquipMap {
    let mut map = next.0.clone();
    for slot in prev.0.keys() {
        map.entry(*slot).or_insert_with(ResolvedEquip::cleared);
    }
    EquipMap(map)
}

/// Linked profile of the highest-priority worn gag; ties go to the lowest layer.
pub fn linked_profile(
    snapshot: &Snapshot,
    catalog: &WardrobeCatalog,
    mask: LayerMask,
) -> Option<ProfileId> {
    if !mask.gags {
        return None;
    }
    snapshot
        .worn_gags()
        .filter_map(|slot| catalog.gag(&slot.gag_type).map(|draw| (slot.layer, draw)))
        .filter_map(|(layer, draw)| {
            draw.linked_profile_id
                .map(|profile| (draw.profile_priority, layer, profile))
        })
        // max priority, then min layer: compare (priority, Reverse(layer))
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)))
        .map(|(_, _, profile)| profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, BALLGAG, HEAD_HARNESS, MUZZLE};
    use wardrobe_types::{GagSlot, GagType, RestraintSetState, StainId};

    fn layer(n: u8) -> LayerIndex {
        LayerIndex::new(n).unwrap()
    }

    fn wear(snapshot: &mut Snapshot, n: u8, gag: &str) {
        *snapshot.gag_mut(layer(n)) = GagSlot {
            layer: layer(n),
            gag_type: GagType::new(gag),
            is_active: true,
        };
    }

    fn with_restraint(snapshot: &mut Snapshot, catalog: &WardrobeCatalog) {
        let set = &catalog.restraint_sets[&fixtures::head_harness_set_id()];
        snapshot.restraint = RestraintSetState {
            active_set_id: Some(set.id),
            per_slot_draw_data: set.draw_data.clone(),
        };
    }

    #[test]
    fn gag_beats_restraint_and_blindfold_beats_gag() {
        let catalog = fixtures::catalog();
        let mut snap = Snapshot::default();
        with_restraint(&mut snap, &catalog);
        assert_eq!(
            resolve(&snap, &catalog, LayerMask::ALL).get(EquipSlot::Head).unwrap().item,
            ItemId(HEAD_HARNESS)
        );

        wear(&mut snap, 0, BALLGAG);
        let map = resolve(&snap, &catalog, LayerMask::ALL);
        let head = map.get(EquipSlot::Head).unwrap();
        assert_eq!(head.item, ItemId(42));
        assert_eq!(head.stains, Stains(StainId(3), StainId(4)));
        assert_eq!(head.source, LayerSource::Gag(layer(0)));

        snap.blindfold.is_equipped = true;
        let map = resolve(&snap, &catalog, LayerMask::ALL);
        assert_eq!(map.get(EquipSlot::Head).unwrap().item, ItemId(99));
        assert_eq!(map.get(EquipSlot::Head).unwrap().source, LayerSource::Blindfold);

        snap.blindfold.is_equipped = false;
        let map = resolve(&snap, &catalog, LayerMask::ALL);
        assert_eq!(map.get(EquipSlot::Head).unwrap().item, ItemId(42));
        // restraint slots the gag does not cover still show
        assert_eq!(map.get(EquipSlot::Body).unwrap().source, LayerSource::Restraint);
    }

    #[test]
    fn earlier_gag_layer_keeps_a_shared_slot() {
        let catalog = fixtures::catalog();
        let mut snap = Snapshot::default();
        wear(&mut snap, 1, MUZZLE);
        wear(&mut snap, 0, BALLGAG);
        let map = resolve(&snap, &catalog, LayerMask::ALL);
        assert_eq!(map.get(EquipSlot::Head).unwrap().source, LayerSource::Gag(layer(0)));
    }

    #[test]
    fn inactive_or_disabled_gags_do_not_claim() {
        let mut catalog = fixtures::catalog();
        let mut snap = Snapshot::default();
        wear(&mut snap, 0, BALLGAG);
        snap.gag_mut(layer(0)).is_active = false;
        assert!(resolve(&snap, &catalog, LayerMask::ALL).is_empty());

        snap.gag_mut(layer(0)).is_active = true;
        catalog.insert_gag(BALLGAG, fixtures::ballgag().disabled());
        assert!(resolve(&snap, &catalog, LayerMask::ALL).is_empty());
    }

    #[test]
    fn masked_layers_are_skipped() {
        let catalog = fixtures::catalog();
        let mut snap = Snapshot::default();
        with_restraint(&mut snap, &catalog);
        wear(&mut snap, 0, BALLGAG);
        let mask = LayerMask {
            gags: false,
            ..LayerMask::ALL
        };
        let map = resolve(&snap, &catalog, mask);
        assert_eq!(map.get(EquipSlot::Head).unwrap().source, LayerSource::Restraint);
    }

    #[test]
    fn transition_clears_slots_that_lost_their_claimant() {
        let catalog = fixtures::catalog();
        let mut snap = Snapshot::default();
        wear(&mut snap, 0, BALLGAG);
        let prev = resolve(&snap, &catalog, LayerMask::ALL);
        *snap.gag_mut(layer(0)) = GagSlot::empty(layer(0));
        let next = resolve(&snap, &catalog, LayerMask::ALL);
        assert!(next.is_empty());

        let transition = resolve_transition(&prev, &next);
        let head = transition.get(EquipSlot::Head).unwrap();
        assert_eq!(head.item, ItemId::NOTHING);
        assert_eq!(head.source, LayerSource::Cleared);
    }

    #[test]
    fn profile_goes_to_highest_priority_then_lowest_layer() {
        let mut catalog = fixtures::catalog();
        let low = ProfileId::new_v4();
        let high = ProfileId::new_v4();
        let tie = ProfileId::new_v4();
        catalog.insert_gag("A", DrawData::new(EquipSlot::Ears, ItemId(1)).with_profile(low, 1));
        catalog.insert_gag("B", DrawData::new(EquipSlot::Neck, ItemId(2)).with_profile(high, 5));
        catalog.insert_gag("C", DrawData::new(EquipSlot::Feet, ItemId(3)).with_profile(tie, 5));

        let mut snap = Snapshot::default();
        wear(&mut snap, 0, "A");
        wear(&mut snap, 1, "B");
        wear(&mut snap, 2, "C");
        assert_eq!(linked_profile(&snap, &catalog, LayerMask::ALL), Some(high));

        *snap.gag_mut(layer(1)) = GagSlot::empty(layer(1));
        wear(&mut snap, 0, "C");
        wear(&mut snap, 2, "B");
        assert_eq!(linked_profile(&snap, &catalog, LayerMask::ALL), Some(tie));
    }

    #[test]
    fn metadata_flag_combines_winning_entries() {
        let mut catalog = fixtures::catalog();
        catalog.insert_gag("Hood", DrawData::new(EquipSlot::Ears, ItemId(5)).forcing(true, false));
        catalog.insert_gag("Visor", DrawData::new(EquipSlot::Neck, ItemId(6)).forcing(false, true));
        let mut snap = Snapshot::default();
        wear(&mut snap, 0, "Hood");
        assert_eq!(resolve(&snap, &catalog, LayerMask::ALL).metadata_flag(), MetadataFlag::Hat);
        wear(&mut snap, 1, "Visor");
        assert_eq!(resolve(&snap, &catalog, LayerMask::ALL).metadata_flag(), MetadataFlag::Both);
    }
}
