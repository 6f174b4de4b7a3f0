//! Logical appearance state owned by the engine.
//!
//! The store is only written from inside the update gate's critical section,
//! so a single apply cycle always sees a consistent snapshot.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use wardrobe_types::{
    BlindfoldState, CharacterHandle, GagSlot, LayerIndex, RestraintSetState, StatusId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub gags: [GagSlot; LayerIndex::COUNT],
    pub restraint: RestraintSetState,
    pub blindfold: BlindfoldState,
    /// Statuses the current layers imply, as of the last reconcile.
    pub expected_statuses: BTreeSet<StatusId>,
    /// Local character, recorded at login.
    pub character: Option<CharacterHandle>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            gags: LayerIndex::ALL.map(GagSlot::empty),
            restraint: RestraintSetState::default(),
            blindfold: BlindfoldState::default(),
            expected_statuses: BTreeSet::new(),
            character: None,
        }
    }
}

impl Snapshot {
    pub fn gag(&self, layer: LayerIndex) -> &GagSlot {
        &self.gags[layer.as_usize()]
    }

    pub fn gag_mut(&mut self, layer: LayerIndex) -> &mut GagSlot {
        &mut self.gags[layer.as_usize()]
    }

    /// Layers currently wearing a gag, lowest layer first.
    pub fn worn_gags(&self) -> impl Iterator<Item = &GagSlot> {
        self.gags.iter().filter(|slot| slot.is_worn())
    }

    /// Drop gag, restraint and blindfold state but keep the session's character.
    pub fn clear_layers(&mut self) {
        let character = self.character;
        *self = Snapshot {
            character,
            ..Snapshot::default()
        };
    }
}

#[derive(Debug, Default)]
pub struct SnapshotStore {
    inner: Mutex<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.inner.lock().await
    }

    /// Copy of the current snapshot.
    pub async fn read(&self) -> Snapshot {
        self.inner.lock().await.clone()
    }

    /// Back to empty, as at session start.
    pub async fn reset(&self) {
        *self.inner.lock().await = Snapshot::default();
    }
}
