use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Equip slot on the rendered character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipSlot {
    Head,
    Body,
    Hands,
    Legs,
    Feet,
    Ears,
    Neck,
    Wrists,
    RFinger,
    LFinger,
}

impl EquipSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipSlot::Head => "head",
            EquipSlot::Body => "body",
            EquipSlot::Hands => "hands",
            EquipSlot::Legs => "legs",
            EquipSlot::Feet => "feet",
            EquipSlot::Ears => "ears",
            EquipSlot::Neck => "neck",
            EquipSlot::Wrists => "wrists",
            EquipSlot::RFinger => "rfinger",
            EquipSlot::LFinger => "lfinger",
        }
    }
}

impl fmt::Display for EquipSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Game item id. `ItemId::NOTHING` clears a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl ItemId {
    pub const NOTHING: ItemId = ItemId(0);

    pub fn is_nothing(&self) -> bool {
        *self == Self::NOTHING
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StainId(pub u8);

/// Primary and secondary dye channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Stains(pub StainId, pub StainId);

impl Stains {
    pub const NONE: Stains = Stains(StainId(0), StainId(0));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variant(pub u8);

macro_rules! uuid_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

uuid_id!(StatusId, "Status (mood) effect id known to the status service.");
uuid_id!(ProfileId, "Linked cosmetic profile id.");
uuid_id!(SetId, "Restraint set id.");

/// Remote peer identity (their user id).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host object handle of a rendered character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterHandle(pub u64);

/// Gag layer, always in `0..=2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LayerIndex(u8);

impl LayerIndex {
    pub const COUNT: usize = 3;
    pub const ALL: [LayerIndex; 3] = [LayerIndex(0), LayerIndex(1), LayerIndex(2)];

    pub fn new(layer: u8) -> Option<Self> {
        ((layer as usize) < Self::COUNT).then_some(Self(layer))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for LayerIndex {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        LayerIndex::new(value).ok_or_else(|| format!("gag layer {value} out of range 0..=2"))
    }
}

impl From<LayerIndex> for u8 {
    fn from(value: LayerIndex) -> Self {
        value.0
    }
}

impl fmt::Display for LayerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gag kind name. The `None` gag marks an empty layer.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GagType(String);

impl GagType {
    pub const NONE: &'static str = "None";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn none() -> Self {
        Self(Self::NONE.to_owned())
    }

    pub fn is_none(&self) -> bool {
        self.0 == Self::NONE || self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GagType {
    fn default() -> Self {
        Self::none()
    }
}

impl<S: Into<String>> From<S> for GagType {
    fn from(value: S) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for GagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
