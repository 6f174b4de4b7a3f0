use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{GagType, LayerIndex, PeerId, SetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewState {
    Enabled,
    Disabled,
}

impl NewState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, NewState::Enabled)
    }
}

/// How the glamour service reverts the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevertStyle {
    #[default]
    RevertToBase,
    RevertEquipOnly,
    RevertToAutomationProfile,
    RevertEquipOnlyToAutomationProfile,
}

impl RevertStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevertStyle::RevertToBase => "revert_to_base",
            RevertStyle::RevertEquipOnly => "revert_equip_only",
            RevertStyle::RevertToAutomationProfile => "revert_to_automation_profile",
            RevertStyle::RevertEquipOnlyToAutomationProfile => {
                "revert_equip_only_to_automation_profile"
            }
        }
    }
}

impl std::str::FromStr for RevertStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "revert_to_base" => Ok(RevertStyle::RevertToBase),
            "revert_equip_only" => Ok(RevertStyle::RevertEquipOnly),
            "revert_to_automation_profile" => Ok(RevertStyle::RevertToAutomationProfile),
            "revert_equip_only_to_automation_profile" => {
                Ok(RevertStyle::RevertEquipOnlyToAutomationProfile)
            }
            other => Err(format!("unknown revert style '{other}'")),
        }
    }
}

/// Classified reason for an appearance update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateKind {
    Safeword,
    JobChange,
    ZoneChange,
    Login,
    RefreshAll,
    GagChanged {
        layer: LayerIndex,
        gag_type: GagType,
        state: NewState,
    },
    RestraintChanged {
        set_id: SetId,
        state: NewState,
    },
    BlindfoldChanged {
        state: NewState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        assigner_id: Option<PeerId>,
    },
}

impl UpdateKind {
    pub fn label(&self) -> &'static str {
        match self {
            UpdateKind::Safeword => "safeword",
            UpdateKind::JobChange => "job_change",
            UpdateKind::ZoneChange => "zone_change",
            UpdateKind::Login => "login",
            UpdateKind::RefreshAll => "refresh_all",
            UpdateKind::GagChanged { .. } => "gag_changed",
            UpdateKind::RestraintChanged { .. } => "restraint_changed",
            UpdateKind::BlindfoldChanged { .. } => "blindfold_changed",
        }
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
