//! Shared test helpers for integration tests.
//!
//! Each integration test compiles this module separately, so some helpers may
//! look unused from a given test file.

#![allow(dead_code)]

#[path = "../src/fixtures/mod.rs"]
pub mod fixtures;

use std::sync::Arc;

use tokio::sync::watch;
use wardrobe_host::{
    Dispatcher, EngineConfig, MutatorCall, MutatorRegistry, MutatorRegistryConfig,
    RecordingMutator, SnapshotStore, SuppressionFlag, UpdateGate,
};
use wardrobe_types::{EquipSlot, ItemId, LayerIndex};

pub struct Harness {
    pub dispatcher: Arc<Dispatcher>,
    pub mutator: Arc<RecordingMutator>,
    pub config_tx: watch::Sender<EngineConfig>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(RecordingMutator::new(), EngineConfig::default(), SuppressionFlag::new())
    }

    pub fn with_mutator(mutator: RecordingMutator) -> Self {
        Self::with(mutator, EngineConfig::default(), SuppressionFlag::new())
    }

    pub fn with(
        mutator: RecordingMutator,
        config: EngineConfig,
        suppression: SuppressionFlag,
    ) -> Self {
        let mutator = Arc::new(mutator);
        let registry = MutatorRegistry::from_adapter(
            Arc::clone(&mutator),
            MutatorRegistryConfig::from(&config),
        );
        let (config_tx, config_rx) = watch::channel(config);
        let dispatcher = Dispatcher::new(
            Arc::new(UpdateGate::new(suppression)),
            Arc::new(SnapshotStore::new()),
            Arc::new(fixtures::catalog()),
            registry,
            config_rx,
        );
        Self {
            dispatcher: Arc::new(dispatcher),
            mutator,
            config_tx,
        }
    }

    /// Recorded calls since the last [`Harness::take_calls`].
    pub async fn take_calls(&self) -> Vec<MutatorCall> {
        let calls = self.mutator.calls().await;
        self.mutator.clear_calls().await;
        calls
    }
}

pub fn layer(n: u8) -> LayerIndex {
    LayerIndex::new(n).expect("layer in range")
}

/// `(slot, item)` of every equip call, in call order.
pub fn equips(calls: &[MutatorCall]) -> Vec<(EquipSlot, ItemId)> {
    calls
        .iter()
        .filter_map(|call| match call {
            MutatorCall::SetEquipItem { slot, item, .. } => Some((*slot, *item)),
            _ => None,
        })
        .collect()
}

pub fn count(calls: &[MutatorCall], pred: impl Fn(&MutatorCall) -> bool) -> usize {
    calls.iter().filter(|call| pred(call)).count()
}
