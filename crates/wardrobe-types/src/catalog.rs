use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::draw::DrawData;
use crate::ids::{EquipSlot, GagType, ItemId, SetId};

/// Named bundle of per-slot overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestraintSet {
    pub id: SetId,
    pub name: String,
    pub draw_data: BTreeMap<EquipSlot, DrawData>,
}

/// Draw-data configuration for every gag type, restraint set and the blindfold.
///
/// The engine only ever reads the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardrobeCatalog {
    #[serde(default)]
    pub gags: BTreeMap<GagType, DrawData>,
    #[serde(default)]
    pub restraint_sets: BTreeMap<SetId, RestraintSet>,
    #[serde(default = "default_blindfold")]
    pub blindfold: DrawData,
}

fn default_blindfold() -> DrawData {
    DrawData::new(EquipSlot::Head, ItemId::NOTHING)
}

impl Default for WardrobeCatalog {
    fn default() -> Self {
        Self {
            gags: BTreeMap::new(),
            restraint_sets: BTreeMap::new(),
            blindfold: default_blindfold(),
        }
    }
}

impl WardrobeCatalog {
    pub fn gag(&self, gag_type: &GagType) -> Option<&DrawData> {
        if gag_type.is_none() {
            return None;
        }
        self.gags.get(gag_type)
    }

    pub fn restraint_set(&self, id: &SetId) -> Option<&RestraintSet> {
        self.restraint_sets.get(id)
    }

    pub fn insert_gag(&mut self, gag_type: impl Into<GagType>, draw: DrawData) {
        self.gags.insert(gag_type.into(), draw);
    }

    pub fn insert_restraint_set(&mut self, set: RestraintSet) {
        self.restraint_sets.insert(set.id, set);
    }
}
