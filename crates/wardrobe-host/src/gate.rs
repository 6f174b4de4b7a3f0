//! Single-flight update gate.
//!
//! At most one apply body runs at a time. While it runs, and for one scheduler
//! tick after, the shared [`SuppressionFlag`] is raised so listeners can drop
//! the host events our own mutator calls cause. Hard submissions cancel a
//! pending soft debounce before they wait for the permit; a soft debounce can
//! be cancelled until it holds the permit and never after.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{Mutex, MutexGuard, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

/// Raised while the engine is mutating the character.
#[derive(Debug, Clone, Default)]
pub struct SuppressionFlag(Arc<AtomicBool>);

impl SuppressionFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_suppressed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `true` when an inbound host event should be processed.
    pub fn admit(&self) -> bool {
        !self.is_suppressed()
    }

    fn set(&self, value: bool) {
        self.0.store(value, Ordering::Release);
    }
}

struct SuppressionGuard<'a>(&'a SuppressionFlag);

impl<'a> SuppressionGuard<'a> {
    fn raise(flag: &'a SuppressionFlag) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for SuppressionGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

struct SoftSlot {
    generation: u64,
    token: CancellationToken,
}

pub struct UpdateGate {
    permit: Mutex<()>,
    suppression: SuppressionFlag,
    soft: Mutex<Option<SoftSlot>>,
    generation: AtomicU64,
}

impl UpdateGate {
    pub fn new(suppression: SuppressionFlag) -> Self {
        Self {
            permit: Mutex::new(()),
            suppression,
            soft: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn suppression(&self) -> &SuppressionFlag {
        &self.suppression
    }

    /// Run `body` inside the critical section.
    ///
    /// Errors and panics from `body` are logged and swallowed. `completion`, when
    /// given, receives `true` exactly once after the body finished either way.
    pub async fn submit<F>(
        &self,
        label: &'static str,
        completion: Option<oneshot::Sender<bool>>,
        body: F,
    ) where
        F: Future<Output = anyhow::Result<()>>,
    {
        self.cancel_soft().await;
        let permit = self.permit.lock().await;
        self.run_locked(permit, label, completion, body).await;
    }

    /// Start, or restart, the soft debounce window.
    ///
    /// After `delay`, unless cancelled by a newer debounce or a hard submission,
    /// `make_body` runs inside the critical section.
    pub async fn debounce<F, Fut>(
        self: &Arc<Self>,
        delay: Duration,
        label: &'static str,
        make_body: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let token = CancellationToken::new();
        {
            let mut slot = self.soft.lock().await;
            if let Some(previous) = slot.replace(SoftSlot {
                generation,
                token: token.clone(),
            }) {
                previous.token.cancel();
            }
        }

        let gate = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!(label, "debounce cancelled before firing");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            let permit = tokio::select! {
                _ = token.cancelled() => {
                    trace!(label, "debounce cancelled while waiting for the gate");
                    return;
                }
                permit = gate.permit.lock() => permit,
            };
            gate.release_soft(generation).await;
            gate.run_locked(permit, label, None, make_body()).await;
        })
    }

    /// Cancel a pending soft debounce, if any.
    pub async fn cancel_soft(&self) {
        if let Some(previous) = self.soft.lock().await.take() {
            trace!("cancelling pending debounce");
            previous.token.cancel();
        }
    }

    async fn release_soft(&self, generation: u64) {
        let mut slot = self.soft.lock().await;
        if slot.as_ref().is_some_and(|s| s.generation == generation) {
            *slot = None;
        }
    }

    async fn run_locked<F>(
        &self,
        permit: MutexGuard<'_, ()>,
        label: &'static str,
        completion: Option<oneshot::Sender<bool>>,
        body: F,
    ) where
        F: Future<Output = anyhow::Result<()>>,
    {
        let suppression = SuppressionGuard::raise(&self.suppression);
        match AssertUnwindSafe(body).catch_unwind().await {
            Ok(Ok(())) => debug!(label, "update applied"),
            Ok(Err(err)) => warn!(label, "update failed: {err:#}"),
            Err(_) => error!(label, "update body panicked"),
        }
        // host events raised by our last call may arrive on the next tick
        tokio::task::yield_now().await;
        drop(suppression);

        if let Some(tx) = completion {
            let _ = tx.send(true);
        }
        drop(permit);
    }
}
