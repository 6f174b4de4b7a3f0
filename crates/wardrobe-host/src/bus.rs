//! Owned trigger channel shared by every event source.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use wardrobe_types::{CharacterHandle, GagType, LayerIndex, NewState, PeerId, SetId, UpdateKind};

use crate::error::EngineError;
use crate::gate::SuppressionFlag;

/// Inbound trigger consumed by [`crate::engine::AppearanceEngine`].
#[derive(Debug)]
pub enum TriggerEvent {
    AppearanceRefreshRequested(UpdateKind),
    GagStateChanged {
        layer: LayerIndex,
        gag_type: GagType,
        new_state: NewState,
        completion: Option<oneshot::Sender<bool>>,
    },
    RestraintStateChanged {
        set_id: SetId,
        new_state: NewState,
        completion: Option<oneshot::Sender<bool>>,
    },
    BlindfoldStateChanged {
        new_state: NewState,
        assigner_id: Option<PeerId>,
    },
    /// The status manager of some character changed; debounced.
    StatusManagerChanged(CharacterHandle),
    SessionStarted {
        character: CharacterHandle,
    },
    SessionEnded,
}

/// Cloneable publisher handle. Also carries the suppression flag so host-event
/// listeners can check it before publishing.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: mpsc::Sender<TriggerEvent>,
    suppression: SuppressionFlag,
}

impl EventBus {
    pub fn new(capacity: usize, suppression: SuppressionFlag) -> (Self, mpsc::Receiver<TriggerEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, suppression }, rx)
    }

    pub fn suppression(&self) -> &SuppressionFlag {
        &self.suppression
    }

    pub async fn publish(&self, event: TriggerEvent) -> Result<(), EngineError> {
        self.tx.send(event).await.map_err(|_| EngineError::BusClosed)
    }

    /// Non-blocking publish for synchronous host callbacks.
    pub fn try_publish(&self, event: TriggerEvent) -> Result<(), EngineError> {
        self.tx.try_send(event).map_err(|err| match err {
            TrySendError::Full(_) => EngineError::BusFull,
            TrySendError::Closed(_) => EngineError::BusClosed,
        })
    }

    pub async fn request_refresh(&self, kind: UpdateKind) -> Result<(), EngineError> {
        self.publish(TriggerEvent::AppearanceRefreshRequested(kind))
            .await
    }

    /// Publish a gag change; the receiver resolves once it was applied.
    pub async fn gag_state_changed(
        &self,
        layer: LayerIndex,
        gag_type: GagType,
        new_state: NewState,
    ) -> Result<oneshot::Receiver<bool>, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.publish(TriggerEvent::GagStateChanged {
            layer,
            gag_type,
            new_state,
            completion: Some(tx),
        })
        .await?;
        Ok(rx)
    }

    pub async fn restraint_state_changed(
        &self,
        set_id: SetId,
        new_state: NewState,
    ) -> Result<oneshot::Receiver<bool>, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.publish(TriggerEvent::RestraintStateChanged {
            set_id,
            new_state,
            completion: Some(tx),
        })
        .await?;
        Ok(rx)
    }

    pub async fn blindfold_state_changed(
        &self,
        new_state: NewState,
        assigner_id: Option<PeerId>,
    ) -> Result<(), EngineError> {
        self.publish(TriggerEvent::BlindfoldStateChanged {
            new_state,
            assigner_id,
        })
        .await
    }

    /// Host-side status callback. Dropped here already when we caused it.
    pub fn status_manager_changed(&self, character: CharacterHandle) -> Result<(), EngineError> {
        if !self.suppression.admit() {
            return Ok(());
        }
        self.try_publish(TriggerEvent::StatusManagerChanged(character))
    }
}
