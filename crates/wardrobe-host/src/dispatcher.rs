//! Routes a classified [`UpdateKind`] to its resolve/apply sequence.
//!
//! Every sequence runs inside the [`UpdateGate`]; the snapshot is locked for the
//! whole body so a cycle never observes a half-applied state change.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wardrobe_types::{
    BlindfoldState, CharacterHandle, GagSlot, GagType, LayerIndex, MetadataFlag, NewState, PeerId,
    RestraintSetState, SetId, StatusId, UpdateKind, WardrobeCatalog,
};

use crate::adapters::registry::MutatorRegistry;
use crate::apply::{self, ApplyReport};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::gate::{SuppressionFlag, UpdateGate};
use crate::resolver::{EquipMap, LayerSource, linked_profile, resolve, resolve_transition};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::status::{StatusChange, expected_statuses};

/// An update waiting for the gate.
#[derive(Debug)]
pub struct PendingUpdateRequest {
    pub kind: UpdateKind,
    pub completion: Option<oneshot::Sender<bool>>,
}

impl PendingUpdateRequest {
    pub fn new(kind: UpdateKind) -> Self {
        Self {
            kind,
            completion: None,
        }
    }

    /// Request plus the receiver that resolves once the attempt finished.
    pub fn with_completion(kind: UpdateKind) -> (Self, oneshot::Receiver<bool>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                kind,
                completion: Some(tx),
            },
            rx,
        )
    }
}

pub struct Dispatcher {
    gate: Arc<UpdateGate>,
    store: Arc<SnapshotStore>,
    catalog: Arc<WardrobeCatalog>,
    mutators: MutatorRegistry,
    config: watch::Receiver<EngineConfig>,
}

impl Dispatcher {
    pub fn new(
        gate: Arc<UpdateGate>,
        store: Arc<SnapshotStore>,
        catalog: Arc<WardrobeCatalog>,
        mutators: MutatorRegistry,
        config: watch::Receiver<EngineConfig>,
    ) -> Self {
        Self {
            gate,
            store,
            catalog,
            mutators,
            config,
        }
    }

    pub fn gate(&self) -> &Arc<UpdateGate> {
        &self.gate
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn catalog(&self) -> &WardrobeCatalog {
        &self.catalog
    }

    pub fn suppression(&self) -> &SuppressionFlag {
        self.gate.suppression()
    }

    pub async fn submit(&self, request: PendingUpdateRequest) {
        let PendingUpdateRequest { kind, completion } = request;
        let label = kind.label();
        self.gate.submit(label, completion, self.dispatch(kind)).await;
    }

    pub async fn submit_kind(&self, kind: UpdateKind) {
        self.submit(PendingUpdateRequest::new(kind)).await;
    }

    /// Record the local character and run the login refresh.
    pub async fn start_session(&self, character: CharacterHandle) {
        self.gate
            .submit("login", None, async {
                self.store.lock().await.character = Some(character);
                self.dispatch(UpdateKind::Login).await
            })
            .await;
    }

    /// Forget all logical appearance state.
    pub async fn end_session(&self) {
        self.gate
            .submit("session_end", None, async {
                self.store.reset().await;
                info!("session ended; snapshot reset");
                anyhow::Ok(())
            })
            .await;
    }

    /// (Re)start the soft refresh that follows a status-manager change.
    pub async fn schedule_status_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let delay = self.config.borrow().status_debounce();
        let dispatcher = Arc::clone(self);
        self.gate
            .debounce(delay, "status_refresh", move || async move {
                dispatcher.dispatch(UpdateKind::RefreshAll).await
            })
            .await
    }

    async fn dispatch(&self, kind: UpdateKind) -> Result<()> {
        let config = self.config.borrow().clone();
        debug!(%kind, "dispatching update");

        let mut snapshot = self.store.lock().await;
        let mut report = ApplyReport::default();
        match &kind {
            UpdateKind::Safeword => self.safeword(&config, &mut snapshot, &mut report).await,
            UpdateKind::JobChange
            | UpdateKind::ZoneChange
            | UpdateKind::Login
            | UpdateKind::RefreshAll => self.refresh_all(&config, &mut snapshot, &mut report).await,
            UpdateKind::GagChanged {
                layer,
                gag_type,
                state,
            } => {
                self.gag_changed(&config, &mut snapshot, *layer, gag_type, *state, &mut report)
                    .await?
            }
            UpdateKind::RestraintChanged { set_id, state } => {
                self.restraint_changed(&config, &mut snapshot, *set_id, *state, &mut report)
                    .await?
            }
            UpdateKind::BlindfoldChanged { state, assigner_id } => {
                self.blindfold_changed(&config, &mut snapshot, *state, assigner_id, &mut report)
                    .await
            }
        }

        if report.failed > 0 {
            warn!(
                %kind,
                failed = report.failed,
                calls = report.calls,
                "update finished with failed mutator calls"
            );
        } else {
            debug!(%kind, calls = report.calls, "update finished");
        }
        Ok(())
    }

    async fn safeword(
        &self,
        config: &EngineConfig,
        snapshot: &mut Snapshot,
        report: &mut ApplyReport,
    ) {
        info!(style = config.revert_style.as_str(), "safeword used; releasing everything");
        // the revert leaves the status service alone; release what we put there
        let mut released = snapshot.expected_statuses.clone();
        released.extend(expected_statuses(snapshot, &self.catalog));
        snapshot.clear_layers();
        if !config.wardrobe_enabled {
            precondition("safeword", "wardrobe disabled");
            return;
        }
        self.revert(config, report).await;
        self.reconcile_statuses(snapshot, &StatusChange::removal(released), report)
            .await;
    }

    async fn refresh_all(
        &self,
        config: &EngineConfig,
        snapshot: &mut Snapshot,
        report: &mut ApplyReport,
    ) {
        if !config.wardrobe_enabled {
            precondition("refresh", "wardrobe disabled");
            return;
        }
        let mask = config.layer_mask();
        let next = resolve(snapshot, &self.catalog, mask);
        apply::apply_equips(&self.mutators, &next, report).await;
        apply::apply_metadata(
            &self.mutators,
            MetadataFlag::None,
            next.metadata_flag(),
            true,
            report,
        )
        .await;
        let profile = linked_profile(snapshot, &self.catalog, mask);
        apply::apply_profile(&self.mutators, None, profile, true, report).await;
        self.reconcile_statuses(snapshot, &StatusChange::Application, report)
            .await;
    }

    async fn gag_changed(
        &self,
        config: &EngineConfig,
        snapshot: &mut Snapshot,
        layer: LayerIndex,
        gag_type: &GagType,
        state: NewState,
        report: &mut ApplyReport,
    ) -> Result<()> {
        let next_slot = match state {
            NewState::Enabled if !gag_type.is_none() => {
                if self.catalog.gag(gag_type).is_none() {
                    return Err(EngineError::UnknownGag(gag_type.clone()).into());
                }
                GagSlot {
                    layer,
                    gag_type: gag_type.clone(),
                    is_active: true,
                }
            }
            _ => GagSlot::empty(layer),
        };

        let prev = snapshot.clone();
        let old_slot = prev.gag(layer).clone();
        *snapshot.gag_mut(layer) = next_slot.clone();

        if !config.wardrobe_enabled || !config.item_auto_equip_enabled {
            precondition("gag_changed", "item auto-equip disabled");
            return Ok(());
        }

        // the old and new gag's slots, plus the blindfold so it stays on top
        let mut scope = BTreeSet::new();
        for slot in [&old_slot, &next_slot] {
            if let Some(draw) = self.catalog.gag(&slot.gag_type) {
                scope.insert(draw.slot);
            }
        }
        if snapshot.blindfold.is_equipped {
            scope.insert(self.catalog.blindfold.slot);
        }

        let mask = config.layer_mask();
        let prev_map = resolve(&prev, &self.catalog, mask);
        let next_map = resolve(snapshot, &self.catalog, mask);
        let transition = resolve_transition(&prev_map, &next_map).restrict(&scope);
        apply::apply_equips(&self.mutators, &transition, report).await;
        apply::apply_metadata(
            &self.mutators,
            prev_map.metadata_flag(),
            next_map.metadata_flag(),
            false,
            report,
        )
        .await;
        apply::apply_profile(
            &self.mutators,
            linked_profile(&prev, &self.catalog, mask),
            linked_profile(snapshot, &self.catalog, mask),
            false,
            report,
        )
        .await;

        let replaced = old_slot.is_worn() && old_slot.gag_type != next_slot.gag_type;
        let change = if replaced || (old_slot.is_worn() && !next_slot.is_worn()) {
            StatusChange::removal(self.gag_statuses(&old_slot.gag_type))
        } else {
            StatusChange::Application
        };
        self.reconcile_statuses(snapshot, &change, report).await;
        Ok(())
    }

    async fn restraint_changed(
        &self,
        config: &EngineConfig,
        snapshot: &mut Snapshot,
        set_id: SetId,
        state: NewState,
        report: &mut ApplyReport,
    ) -> Result<()> {
        match state {
            NewState::Enabled => self.enable_restraint(config, snapshot, set_id, report).await,
            NewState::Disabled => {
                self.disable_restraint(config, snapshot, set_id, report).await;
                Ok(())
            }
        }
    }

    async fn enable_restraint(
        &self,
        config: &EngineConfig,
        snapshot: &mut Snapshot,
        set_id: SetId,
        report: &mut ApplyReport,
    ) -> Result<()> {
        let set = self
            .catalog
            .restraint_set(&set_id)
            .ok_or(EngineError::UnknownRestraintSet(set_id))?;

        let prev = snapshot.clone();
        // a different set still active is disabled first
        let released = match prev.restraint.active_set_id {
            Some(previous) if previous != set_id => {
                debug!(%previous, next = %set_id, "replacing active restraint set");
                restraint_statuses(&prev.restraint)
            }
            _ => BTreeSet::new(),
        };
        snapshot.restraint = RestraintSetState {
            active_set_id: Some(set_id),
            per_slot_draw_data: set.draw_data.clone(),
        };

        if !config.wardrobe_enabled || !config.restraint_auto_equip_enabled {
            precondition("restraint_changed", "restraint auto-equip disabled");
            return Ok(());
        }

        info!(set = %set.name, "applying restraint set");
        let mask = config.layer_mask();
        let prev_map = resolve(&prev, &self.catalog, mask);
        let next_map = resolve(snapshot, &self.catalog, mask);
        let transition = resolve_transition(&prev_map, &next_map);
        apply::apply_equips(&self.mutators, &transition, report).await;
        apply::apply_metadata(
            &self.mutators,
            prev_map.metadata_flag(),
            next_map.metadata_flag(),
            false,
            report,
        )
        .await;

        let change = if released.is_empty() {
            StatusChange::Application
        } else {
            StatusChange::removal(released)
        };
        self.reconcile_statuses(snapshot, &change, report).await;
        Ok(())
    }

    async fn disable_restraint(
        &self,
        config: &EngineConfig,
        snapshot: &mut Snapshot,
        set_id: SetId,
        report: &mut ApplyReport,
    ) {
        if snapshot.restraint.active_set_id != Some(set_id) {
            debug!(%set_id, "restraint set not active; nothing to disable");
            return;
        }
        let released = restraint_statuses(&snapshot.restraint);
        snapshot.restraint = RestraintSetState::default();

        if !config.wardrobe_enabled || !config.restraint_auto_equip_enabled {
            precondition("restraint_changed", "restraint auto-equip disabled");
            return;
        }

        info!(%set_id, "removing restraint set");
        self.revert(config, report).await;

        // the revert also cleared gags and the blindfold; put back what is still worn
        let mask = config.layer_mask();
        let remaining = resolve(snapshot, &self.catalog, mask)
            .filter_sources(|source| matches!(source, LayerSource::Gag(_) | LayerSource::Blindfold));
        apply::apply_equips(&self.mutators, &remaining, report).await;
        apply::apply_metadata(
            &self.mutators,
            MetadataFlag::None,
            remaining.metadata_flag(),
            true,
            report,
        )
        .await;
        self.reconcile_statuses(snapshot, &StatusChange::removal(released), report)
            .await;
    }

    async fn blindfold_changed(
        &self,
        config: &EngineConfig,
        snapshot: &mut Snapshot,
        state: NewState,
        assigner_id: &Option<PeerId>,
        report: &mut ApplyReport,
    ) {
        let prev = snapshot.clone();
        snapshot.blindfold = BlindfoldState {
            is_equipped: state.is_enabled(),
            assigner_id: if state.is_enabled() {
                assigner_id.clone()
            } else {
                None
            },
        };
        if !config.wardrobe_enabled {
            precondition("blindfold_changed", "wardrobe disabled");
            return;
        }

        let mask = config.layer_mask();
        let prev_map = resolve(&prev, &self.catalog, mask);
        let next_map = resolve(snapshot, &self.catalog, mask);
        let scope = BTreeSet::from([self.catalog.blindfold.slot]);
        let transition: EquipMap = resolve_transition(&prev_map, &next_map).restrict(&scope);
        apply::apply_equips(&self.mutators, &transition, report).await;
        apply::apply_metadata(
            &self.mutators,
            prev_map.metadata_flag(),
            next_map.metadata_flag(),
            false,
            report,
        )
        .await;
    }

    async fn revert(&self, config: &EngineConfig, report: &mut ApplyReport) {
        let result = self.mutators.revert_character(config.revert_style).await;
        if let Err(err) = &result {
            warn!(style = config.revert_style.as_str(), error = %err, "revert failed");
        }
        report.calls += 1;
        report.failed += usize::from(result.is_err());
    }

    async fn reconcile_statuses(
        &self,
        snapshot: &mut Snapshot,
        change: &StatusChange,
        report: &mut ApplyReport,
    ) {
        let expected = expected_statuses(snapshot, &self.catalog);
        apply::apply_statuses(&self.mutators, &expected, change, report).await;
        snapshot.expected_statuses = expected;
    }

    fn gag_statuses(&self, gag_type: &GagType) -> BTreeSet<StatusId> {
        self.catalog
            .gag(gag_type)
            .map(|draw| draw.associated_statuses.clone())
            .unwrap_or_default()
    }
}

fn restraint_statuses(restraint: &RestraintSetState) -> BTreeSet<StatusId> {
    restraint
        .per_slot_draw_data
        .values()
        .flat_map(|draw| draw.associated_statuses.iter().copied())
        .collect()
}

fn precondition(kind: &'static str, reason: &'static str) {
    debug!(kind, reason, "precondition not met; apply skipped");
}
