//! Replay scenario file format.
//!
//! ```json
//! {
//!   "catalog": { "gags": { "Ballgag": { "slot": "head", "item": 42 } } },
//!   "steps": [
//!     { "step": "session_started", "character": 1 },
//!     { "step": "gag", "layer": 0, "gag_type": "Ballgag", "state": "enabled" },
//!     { "step": "wait", "ms": 600 }
//!   ]
//! }
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;
use wardrobe_host::{EngineConfig, EventBus, TriggerEvent};
use wardrobe_types::{
    CharacterHandle, GagType, LayerIndex, NewState, PeerId, SetId, UpdateKind, WardrobeCatalog,
};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Falls back to `WARDROBE_*` over the defaults when absent.
    #[serde(default)]
    pub config: Option<EngineConfig>,
    pub catalog: WardrobeCatalog,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    SessionStarted {
        character: CharacterHandle,
    },
    SessionEnded,
    Refresh {
        update: UpdateKind,
    },
    Gag {
        layer: LayerIndex,
        gag_type: GagType,
        state: NewState,
    },
    Restraint {
        set_id: SetId,
        state: NewState,
    },
    Blindfold {
        state: NewState,
        #[serde(default)]
        assigner_id: Option<PeerId>,
    },
    StatusChanged {
        character: CharacterHandle,
    },
    Wait {
        ms: u64,
    },
}

impl Step {
    /// Publish this step. Gag and restraint steps wait until the engine applied them.
    pub async fn run(&self, bus: &EventBus) -> Result<()> {
        debug!(step = ?self, "replay step");
        match self.clone() {
            Step::SessionStarted { character } => {
                bus.publish(TriggerEvent::SessionStarted { character }).await?
            }
            Step::SessionEnded => bus.publish(TriggerEvent::SessionEnded).await?,
            Step::Refresh { update } => bus.request_refresh(update).await?,
            Step::Gag {
                layer,
                gag_type,
                state,
            } => {
                let done = bus.gag_state_changed(layer, gag_type, state).await?;
                done.await.context("engine dropped gag update")?;
            }
            Step::Restraint { set_id, state } => {
                let done = bus.restraint_state_changed(set_id, state).await?;
                done.await.context("engine dropped restraint update")?;
            }
            Step::Blindfold { state, assigner_id } => {
                bus.blindfold_state_changed(state, assigner_id).await?
            }
            Step::StatusChanged { character } => bus.status_manager_changed(character)?,
            Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(ms)).await,
        }
        // let the engine pick the event up before the next step
        tokio::task::yield_now().await;
        Ok(())
    }
}
