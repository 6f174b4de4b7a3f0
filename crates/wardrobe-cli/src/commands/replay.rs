//! `wardrobe replay` command.
//!
//! Runs a scenario through a real engine loop backed by the recording adapter,
//! then prints every mutator call plus the final snapshot.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::info;
use wardrobe_host::{
    AppearanceEngine, Dispatcher, EngineConfig, EventBus, MutatorCall, MutatorRegistry,
    MutatorRegistryConfig, RecordingMutator, Snapshot, SnapshotStore, SuppressionFlag, UpdateGate,
};
use wardrobe_types::StatusId;

use crate::opts::GlobalOpts;
use crate::output::print_json;
use crate::scenario::Scenario;

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Scenario JSON file
    pub scenario: PathBuf,

    /// Time to let pending debounces fire after the last step (default: debounce + 100ms)
    #[arg(long, env = "WARDROBE_SETTLE_MS")]
    pub settle_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    calls: Vec<MutatorCall>,
    active_statuses: BTreeSet<StatusId>,
    snapshot: Snapshot,
}

pub async fn cmd_replay(opts: &GlobalOpts, args: &ReplayArgs) -> Result<()> {
    let scenario: Scenario = super::read_json(&args.scenario)?;
    let config = match scenario.config {
        Some(config) => config,
        None => EngineConfig::from_env().context("load engine config from environment")?,
    };
    anyhow::ensure!(config.bus_capacity > 0, "bus_capacity must be at least 1");
    let settle = args
        .settle_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.status_debounce() + Duration::from_millis(100));

    let mutator = Arc::new(RecordingMutator::new());
    let registry = MutatorRegistry::from_adapter(
        Arc::clone(&mutator),
        MutatorRegistryConfig::from(&config),
    );
    let suppression = SuppressionFlag::new();
    let (bus, events) = EventBus::new(config.bus_capacity, suppression.clone());
    let (_config_tx, config_rx) = watch::channel(config);
    let store = Arc::new(SnapshotStore::new());
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(UpdateGate::new(suppression)),
        Arc::clone(&store),
        Arc::new(scenario.catalog),
        registry,
        config_rx,
    ));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let mut engine = AppearanceEngine::new(dispatcher, events, shutdown_rx);
    let engine_task = tokio::spawn(async move { engine.run().await });

    info!(steps = scenario.steps.len(), "replaying scenario");
    for (index, step) in scenario.steps.iter().enumerate() {
        step.run(&bus)
            .await
            .with_context(|| format!("step {index}"))?;
    }
    tokio::time::sleep(settle).await;

    let _ = shutdown_tx.send(());
    engine_task.await.context("engine task")??;

    let report = ReplayReport {
        calls: mutator.calls().await,
        active_statuses: mutator.active_statuses().await,
        snapshot: store.read().await,
    };
    print_json(opts, &report)
}
