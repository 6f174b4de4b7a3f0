use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::draw::DrawData;
use crate::ids::{EquipSlot, GagType, LayerIndex, PeerId, SetId};

/// One of the three independent gag layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GagSlot {
    pub layer: LayerIndex,
    pub gag_type: GagType,
    pub is_active: bool,
}

impl GagSlot {
    pub fn empty(layer: LayerIndex) -> Self {
        Self {
            layer,
            gag_type: GagType::none(),
            is_active: false,
        }
    }

    /// Active and holding a real gag.
    pub fn is_worn(&self) -> bool {
        self.is_active && !self.gag_type.is_none()
    }
}

/// Currently active restraint set, if any, with the draw data it applies per slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RestraintSetState {
    pub active_set_id: Option<SetId>,
    #[serde(default)]
    pub per_slot_draw_data: BTreeMap<EquipSlot, DrawData>,
}

impl RestraintSetState {
    pub fn is_active(&self) -> bool {
        self.active_set_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlindfoldState {
    pub is_equipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigner_id: Option<PeerId>,
}
