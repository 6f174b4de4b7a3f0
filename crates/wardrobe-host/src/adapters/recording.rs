//! In-process adapter that records every mutator call.
//!
//! `RecordingMutator` stands in for all three host services. It keeps the
//! simulated set of active statuses so reconciles behave like against a real
//! status service, and can inject latency, failures and a per-call hook (used to
//! fire synthetic host events while a call is in flight).

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use wardrobe_types::{
    EquipSlot, ItemId, MetadataFlag, ProfileId, RevertStyle, Stains, StatusId, Variant,
};

use super::traits::{GlamourAdapter, ProfileAdapter, StatusAdapter};
use crate::error::MutatorError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum MutatorCall {
    SetEquipItem {
        slot: EquipSlot,
        item: ItemId,
        stains: Stains,
        variant: Variant,
    },
    SetMetadataFlag {
        flag: MetadataFlag,
        value: bool,
    },
    RevertCharacter {
        style: RevertStyle,
    },
    ApplyStatuses {
        ids: BTreeSet<StatusId>,
    },
    RemoveStatuses {
        ids: BTreeSet<StatusId>,
    },
    ReadActiveStatuses,
    EnableLinkedProfile {
        id: ProfileId,
    },
    DisableLinkedProfile {
        id: ProfileId,
    },
}

impl MutatorCall {
    pub fn is_equip(&self) -> bool {
        matches!(self, MutatorCall::SetEquipItem { .. })
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, MutatorCall::RevertCharacter { .. })
    }

    pub fn is_status_apply(&self) -> bool {
        matches!(self, MutatorCall::ApplyStatuses { .. })
    }
}

pub type CallHook = Arc<dyn Fn(&MutatorCall) + Send + Sync>;
pub type FailureRule = Arc<dyn Fn(&MutatorCall) -> Option<MutatorError> + Send + Sync>;

#[derive(Default)]
struct RecordingState {
    calls: Vec<MutatorCall>,
    active_statuses: BTreeSet<StatusId>,
}

#[derive(Default)]
pub struct RecordingMutator {
    state: Mutex<RecordingState>,
    latency: Option<Duration>,
    hook: Option<CallHook>,
    failure: Option<FailureRule>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingMutator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Run `hook` synchronously at the start of every call.
    pub fn with_hook(mut self, hook: impl Fn(&MutatorCall) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Fail every call for which `rule` returns an error. Failed calls are still recorded.
    pub fn with_failures(
        mut self,
        rule: impl Fn(&MutatorCall) -> Option<MutatorError> + Send + Sync + 'static,
    ) -> Self {
        self.failure = Some(Arc::new(rule));
        self
    }

    pub async fn calls(&self) -> Vec<MutatorCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    pub async fn active_statuses(&self) -> BTreeSet<StatusId> {
        self.state.lock().await.active_statuses.clone()
    }

    /// Pretend something outside the engine changed the status set.
    pub async fn set_active_statuses(&self, ids: BTreeSet<StatusId>) {
        self.state.lock().await.active_statuses = ids;
    }

    /// Highest number of calls ever observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::Acquire)
    }

    async fn record(&self, call: MutatorCall) -> Result<(), MutatorError> {
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.max_in_flight.fetch_max(now, Ordering::AcqRel);
        // decremented on drop so timed-out calls are not counted forever
        let _in_flight = InFlight(&self.in_flight);

        if let Some(hook) = &self.hook {
            hook(&call);
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let outcome = match self.failure.as_ref().and_then(|rule| rule(&call)) {
            Some(err) => Err(err),
            None => Ok(()),
        };

        let mut state = self.state.lock().await;
        if outcome.is_ok() {
            match &call {
                MutatorCall::ApplyStatuses { ids } => state.active_statuses.extend(ids),
                MutatorCall::RemoveStatuses { ids } => {
                    state.active_statuses.retain(|id| !ids.contains(id))
                }
                _ => {}
            }
        }
        debug!(?call, ok = outcome.is_ok(), "recorded mutator call");
        state.calls.push(call);
        outcome
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[async_trait]
impl GlamourAdapter for RecordingMutator {
    async fn set_equip_item(
        &self,
        slot: EquipSlot,
        item: ItemId,
        stains: Stains,
        variant: Variant,
    ) -> Result<(), MutatorError> {
        self.record(MutatorCall::SetEquipItem {
            slot,
            item,
            stains,
            variant,
        })
        .await
    }

    async fn set_metadata_flag(&self, flag: MetadataFlag, value: bool) -> Result<(), MutatorError> {
        self.record(MutatorCall::SetMetadataFlag { flag, value }).await
    }

    async fn revert_character(&self, style: RevertStyle) -> Result<(), MutatorError> {
        self.record(MutatorCall::RevertCharacter { style }).await
    }
}

#[async_trait]
impl StatusAdapter for RecordingMutator {
    async fn apply_statuses(&self, ids: &BTreeSet<StatusId>) -> Result<(), MutatorError> {
        self.record(MutatorCall::ApplyStatuses { ids: ids.clone() }).await
    }

    async fn remove_statuses(&self, ids: &BTreeSet<StatusId>) -> Result<(), MutatorError> {
        self.record(MutatorCall::RemoveStatuses { ids: ids.clone() }).await
    }

    async fn read_active_statuses(&self) -> Result<BTreeSet<StatusId>, MutatorError> {
        self.record(MutatorCall::ReadActiveStatuses).await?;
        Ok(self.active_statuses().await)
    }
}

#[async_trait]
impl ProfileAdapter for RecordingMutator {
    async fn enable_linked_profile(&self, id: ProfileId) -> Result<(), MutatorError> {
        self.record(MutatorCall::EnableLinkedProfile { id }).await
    }

    async fn disable_linked_profile(&self, id: ProfileId) -> Result<(), MutatorError> {
        self.record(MutatorCall::DisableLinkedProfile { id }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::registry::{MutatorRegistry, MutatorRegistryConfig};
    use crate::fixtures::status;

    #[tokio::test]
    async fn statuses_follow_apply_and_remove() {
        let mutator = RecordingMutator::new();
        let ids: BTreeSet<_> = [status(1), status(2)].into_iter().collect();
        mutator.apply_statuses(&ids).await.unwrap();
        mutator
            .remove_statuses(&[status(1)].into_iter().collect())
            .await
            .unwrap();
        assert_eq!(
            mutator.read_active_statuses().await.unwrap(),
            [status(2)].into_iter().collect()
        );
        assert_eq!(mutator.calls().await.len(), 3);
    }

    #[tokio::test]
    async fn injected_failures_are_recorded_and_returned() {
        let mutator = RecordingMutator::new().with_failures(|call| {
            call.is_revert()
                .then(|| MutatorError::Unavailable("glamour offline".into()))
        });
        let err = mutator
            .revert_character(RevertStyle::RevertToBase)
            .await
            .unwrap_err();
        assert_eq!(err, MutatorError::Unavailable("glamour offline".into()));
        assert_eq!(mutator.calls().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn registry_times_out_slow_calls() {
        let mutator = Arc::new(RecordingMutator::new().with_latency(Duration::from_secs(5)));
        let registry = MutatorRegistry::from_adapter(
            mutator,
            MutatorRegistryConfig {
                call_timeout: Some(Duration::from_secs(1)),
            },
        );
        let err = registry
            .revert_character(RevertStyle::RevertEquipOnly)
            .await
            .unwrap_err();
        assert_eq!(err, MutatorError::Timeout(Duration::from_secs(1)));
    }

    #[test]
    fn calls_serialize_with_call_tag() {
        let call = MutatorCall::SetEquipItem {
            slot: EquipSlot::Head,
            item: ItemId(42),
            stains: Stains::NONE,
            variant: Variant(0),
        };
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            serde_json::json!({
                "call": "set_equip_item",
                "slot": "head",
                "item": 42,
                "stains": [0, 0],
                "variant": 0
            })
        );
    }
}
