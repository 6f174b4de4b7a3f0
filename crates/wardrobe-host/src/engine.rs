//! Long-lived engine loop.
//!
//! The engine drains the [`EventBus`], turns each trigger into a gate
//! submission and spawns it, so triggers contend for the gate the way
//! independent host threads would. On shutdown it cancels any pending soft
//! debounce and waits for in-flight submissions.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, trace, warn};
use wardrobe_types::{CharacterHandle, UpdateKind};

use crate::bus::TriggerEvent;
use crate::dispatcher::{Dispatcher, PendingUpdateRequest};
use crate::error::EngineError;

pub struct AppearanceEngine {
    dispatcher: Arc<Dispatcher>,
    events: mpsc::Receiver<TriggerEvent>,
    shutdown_rx: broadcast::Receiver<()>,
    tasks: JoinSet<()>,
    /// Latest status debounce; may still be running its refresh.
    soft: Option<JoinHandle<()>>,
    local_character: Option<CharacterHandle>,
}

impl AppearanceEngine {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        events: mpsc::Receiver<TriggerEvent>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            dispatcher,
            events,
            shutdown_rx,
            tasks: JoinSet::new(),
            soft: None,
            local_character: None,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Run until the bus closes or shutdown is signalled.
    pub async fn run(&mut self) -> Result<(), EngineError> {
        info!("appearance engine started");
        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => {
                        debug!("event bus closed");
                        break;
                    }
                },
                _ = self.shutdown_rx.recv() => {
                    info!("shutdown signal received");
                    break;
                }
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(err) = joined {
                        warn!(error = %err, "update task failed");
                    }
                }
            }
        }

        self.dispatcher.gate().cancel_soft().await;
        if let Some(soft) = self.soft.take() {
            if let Err(err) = soft.await {
                warn!(error = %err, "status refresh task failed");
            }
        }
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "update task failed");
            }
        }
        info!("appearance engine stopped");
        Ok(())
    }

    async fn handle(&mut self, event: TriggerEvent) {
        match event {
            TriggerEvent::AppearanceRefreshRequested(kind) => {
                self.spawn(PendingUpdateRequest::new(kind));
            }
            TriggerEvent::GagStateChanged {
                layer,
                gag_type,
                new_state,
                completion,
            } => self.spawn(PendingUpdateRequest {
                kind: UpdateKind::GagChanged {
                    layer,
                    gag_type,
                    state: new_state,
                },
                completion,
            }),
            TriggerEvent::RestraintStateChanged {
                set_id,
                new_state,
                completion,
            } => self.spawn(PendingUpdateRequest {
                kind: UpdateKind::RestraintChanged {
                    set_id,
                    state: new_state,
                },
                completion,
            }),
            TriggerEvent::BlindfoldStateChanged {
                new_state,
                assigner_id,
            } => self.spawn(PendingUpdateRequest::new(UpdateKind::BlindfoldChanged {
                state: new_state,
                assigner_id,
            })),
            TriggerEvent::StatusManagerChanged(character) => {
                if self.local_character != Some(character) {
                    trace!(?character, "status change for another character; ignored");
                    return;
                }
                let next = self.dispatcher.schedule_status_refresh().await;
                if let Some(previous) = self.soft.replace(next) {
                    // cancelled by the restart unless it already holds the gate
                    if !previous.is_finished() {
                        self.tasks.spawn(async move {
                            let _ = previous.await;
                        });
                    }
                }
            }
            TriggerEvent::SessionStarted { character } => {
                self.local_character = Some(character);
                let dispatcher = Arc::clone(&self.dispatcher);
                self.tasks
                    .spawn(async move { dispatcher.start_session(character).await });
            }
            TriggerEvent::SessionEnded => {
                self.local_character = None;
                let dispatcher = Arc::clone(&self.dispatcher);
                self.tasks.spawn(async move { dispatcher.end_session().await });
            }
        }
    }

    fn spawn(&mut self, request: PendingUpdateRequest) {
        let dispatcher = Arc::clone(&self.dispatcher);
        self.tasks.spawn(async move { dispatcher.submit(request).await });
    }
}
