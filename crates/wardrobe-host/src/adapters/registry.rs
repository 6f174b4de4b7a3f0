use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use wardrobe_types::{EquipSlot, MetadataFlag, ProfileId, RevertStyle, StatusId};

use super::traits::{GlamourAdapter, ProfileAdapter, StatusAdapter};
use crate::config::EngineConfig;
use crate::error::MutatorError;
use crate::resolver::ResolvedEquip;

#[derive(Debug, Clone)]
pub struct MutatorRegistryConfig {
    /// Upper bound for a single service call; `None` waits forever.
    pub call_timeout: Option<Duration>,
}

impl Default for MutatorRegistryConfig {
    fn default() -> Self {
        Self {
            call_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl From<&EngineConfig> for MutatorRegistryConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            call_timeout: config.mutator_timeout(),
        }
    }
}

/// The three host services the engine mutates, behind one timeout policy.
#[derive(Clone)]
pub struct MutatorRegistry {
    glamour: Arc<dyn GlamourAdapter>,
    status: Arc<dyn StatusAdapter>,
    profile: Arc<dyn ProfileAdapter>,
    config: MutatorRegistryConfig,
}

impl MutatorRegistry {
    pub fn new(
        glamour: Arc<dyn GlamourAdapter>,
        status: Arc<dyn StatusAdapter>,
        profile: Arc<dyn ProfileAdapter>,
        config: MutatorRegistryConfig,
    ) -> Self {
        Self {
            glamour,
            status,
            profile,
            config,
        }
    }

    /// Registry whose three services are backed by the same adapter.
    pub fn from_adapter<A>(adapter: Arc<A>, config: MutatorRegistryConfig) -> Self
    where
        A: GlamourAdapter + StatusAdapter + ProfileAdapter + 'static,
    {
        Self::new(adapter.clone(), adapter.clone(), adapter, config)
    }

    pub fn config(&self) -> &MutatorRegistryConfig {
        &self.config
    }

    async fn guarded<T>(
        &self,
        call: impl Future<Output = Result<T, MutatorError>>,
    ) -> Result<T, MutatorError> {
        match self.config.call_timeout {
            Some(limit) => match timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(MutatorError::Timeout(limit)),
            },
            None => call.await,
        }
    }

    pub async fn set_equip(&self, slot: EquipSlot, equip: &ResolvedEquip) -> Result<(), MutatorError> {
        self.guarded(
            self.glamour
                .set_equip_item(slot, equip.item, equip.stains, equip.variant),
        )
        .await
    }

    pub async fn set_metadata_flag(&self, flag: MetadataFlag, value: bool) -> Result<(), MutatorError> {
        self.guarded(self.glamour.set_metadata_flag(flag, value)).await
    }

    pub async fn revert_character(&self, style: RevertStyle) -> Result<(), MutatorError> {
        self.guarded(self.glamour.revert_character(style)).await
    }

    pub async fn apply_statuses(&self, ids: &BTreeSet<StatusId>) -> Result<(), MutatorError> {
        self.guarded(self.status.apply_statuses(ids)).await
    }

    pub async fn remove_statuses(&self, ids: &BTreeSet<StatusId>) -> Result<(), MutatorError> {
        self.guarded(self.status.remove_statuses(ids)).await
    }

    pub async fn read_active_statuses(&self) -> Result<BTreeSet<StatusId>, MutatorError> {
        self.guarded(self.status.read_active_statuses()).await
    }

    pub async fn enable_linked_profile(&self, id: ProfileId) -> Result<(), MutatorError> {
        self.guarded(self.profile.enable_linked_profile(id)).await
    }

    pub async fn disable_linked_profile(&self, id: ProfileId) -> Result<(), MutatorError> {
        self.guarded(self.profile.disable_linked_profile(id)).await
    }
}
