use std::collections::BTreeSet;

use async_trait::async_trait;
use wardrobe_types::{EquipSlot, ItemId, MetadataFlag, ProfileId, RevertStyle, Stains, StatusId, Variant};

use crate::error::MutatorError;

/// Equipment glamour service of the host.
#[async_trait]
pub trait GlamourAdapter: Send + Sync {
    async fn set_equip_item(
        &self,
        slot: EquipSlot,
        item: ItemId,
        stains: Stains,
        variant: Variant,
    ) -> Result<(), MutatorError>;

    async fn set_metadata_flag(&self, flag: MetadataFlag, value: bool) -> Result<(), MutatorError>;

    async fn revert_character(&self, style: RevertStyle) -> Result<(), MutatorError>;
}

/// Status (mood effect) service of the host.
#[async_trait]
pub trait StatusAdapter: Send + Sync {
    async fn apply_statuses(&self, ids: &BTreeSet<StatusId>) -> Result<(), MutatorError>;

    async fn remove_statuses(&self, ids: &BTreeSet<StatusId>) -> Result<(), MutatorError>;

    async fn read_active_statuses(&self) -> Result<BTreeSet<StatusId>, MutatorError>;
}

/// Cosmetic profile service (body/face profiles linked to gags).
#[async_trait]
pub trait ProfileAdapter: Send + Sync {
    async fn enable_linked_profile(&self, id: ProfileId) -> Result<(), MutatorError>;

    async fn disable_linked_profile(&self, id: ProfileId) -> Result<(), MutatorError>;
}
