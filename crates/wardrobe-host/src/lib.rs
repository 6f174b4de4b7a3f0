pub mod adapters;
pub mod bus;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod gate;
pub mod resolver;
pub mod snapshot;
pub mod status;

mod apply;

#[cfg(any(feature = "test-fixtures", test))]
pub mod fixtures;

pub use adapters::recording::{MutatorCall, RecordingMutator};
pub use adapters::registry::{MutatorRegistry, MutatorRegistryConfig};
pub use bus::{EventBus, TriggerEvent};
pub use config::EngineConfig;
pub use dispatcher::{Dispatcher, PendingUpdateRequest};
pub use engine::AppearanceEngine;
pub use error::{EngineError, MutatorError};
pub use gate::{SuppressionFlag, UpdateGate};
pub use resolver::{EquipMap, LayerMask, LayerSource, ResolvedEquip};
pub use snapshot::{Snapshot, SnapshotStore};
