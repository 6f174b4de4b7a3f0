//! Shared wardrobe data model: equip slots, draw data, layer state and update kinds.

mod catalog;
mod draw;
mod ids;
mod state;
mod update;

pub use catalog::{RestraintSet, WardrobeCatalog};
pub use draw::{DrawData, MetadataFlag};
pub use ids::{
    CharacterHandle, EquipSlot, GagType, ItemId, LayerIndex, PeerId, ProfileId, SetId, StainId,
    Stains, StatusId, Variant,
};
pub use state::{BlindfoldState, GagSlot, RestraintSetState};
pub use update::{NewState, RevertStyle, UpdateKind};
