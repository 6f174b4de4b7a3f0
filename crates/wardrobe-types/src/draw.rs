use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::{EquipSlot, ItemId, ProfileId, Stains, StatusId, Variant};

/// Cosmetic override configured for a gag type, a restraint-set slot or the blindfold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawData {
    pub slot: EquipSlot,
    pub item: ItemId,
    #[serde(default)]
    pub stains: Stains,
    #[serde(default)]
    pub variant: Variant,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    #[serde(default)]
    pub forces_headgear: bool,
    #[serde(default)]
    pub forces_visor: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_profile_id: Option<ProfileId>,
    /// Priority of the linked profile when several gags carry one.
    #[serde(default)]
    pub profile_priority: u32,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub associated_statuses: BTreeSet<StatusId>,
}

fn default_enabled() -> bool {
    true
}

impl DrawData {
    pub fn new(slot: EquipSlot, item: ItemId) -> Self {
        Self {
            slot,
            item,
            stains: Stains::NONE,
            variant: Variant::default(),
            is_enabled: true,
            forces_headgear: false,
            forces_visor: false,
            linked_profile_id: None,
            profile_priority: 0,
            associated_statuses: BTreeSet::new(),
        }
    }

    pub fn with_stains(mut self, stains: Stains) -> Self {
        self.stains = stains;
        self
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = StatusId>) -> Self {
        self.associated_statuses.extend(statuses);
        self
    }

    pub fn with_profile(mut self, profile: ProfileId, priority: u32) -> Self {
        self.linked_profile_id = Some(profile);
        self.profile_priority = priority;
        self
    }

    pub fn forcing(mut self, headgear: bool, visor: bool) -> Self {
        self.forces_headgear = headgear;
        self.forces_visor = visor;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.is_enabled = false;
        self
    }

    /// Restraint slots claim the slot when enabled or when they carry a real item.
    pub fn claims_restraint_slot(&self) -> bool {
        self.is_enabled || !self.item.is_nothing()
    }
}

/// Character metadata toggle driven by headgear/visor forcing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataFlag {
    Hat,
    Visor,
    Both,
    None,
}

impl MetadataFlag {
    pub fn from_forces(headgear: bool, visor: bool) -> Self {
        match (headgear, visor) {
            (true, true) => MetadataFlag::Both,
            (true, false) => MetadataFlag::Hat,
            (false, true) => MetadataFlag::Visor,
            (false, false) => MetadataFlag::None,
        }
    }

    /// (headgear, visor) pair this flag stands for.
    pub fn components(&self) -> (bool, bool) {
        match self {
            MetadataFlag::Both => (true, true),
            MetadataFlag::Hat => (true, false),
            MetadataFlag::Visor => (false, true),
            MetadataFlag::None => (false, false),
        }
    }
}
