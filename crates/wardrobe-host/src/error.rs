use std::time::Duration;

use thiserror::Error;
use wardrobe_types::{GagType, SetId};

/// Failure reported by an external cosmetic service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutatorError {
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("invalid character handle")]
    InvalidHandle,
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
    #[error("call rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("event bus closed")]
    BusClosed,
    #[error("event bus full")]
    BusFull,
    #[error("unknown gag type: {0}")]
    UnknownGag(GagType),
    #[error("unknown restraint set: {0}")]
    UnknownRestraintSet(SetId),
    #[error("config error: {0}")]
    Config(String),
}
