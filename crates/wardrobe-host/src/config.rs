use std::time::Duration;

use serde::{Deserialize, Serialize};
use wardrobe_types::RevertStyle;

use crate::error::EngineError;
use crate::resolver::LayerMask;

/// Externally owned switches the engine reads on every dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Master switch; when off no appearance is ever applied.
    pub wardrobe_enabled: bool,
    /// Apply gag draw data when gags change.
    pub item_auto_equip_enabled: bool,
    /// Apply restraint-set draw data when sets change.
    pub restraint_auto_equip_enabled: bool,
    pub revert_style: RevertStyle,
    /// Delay before a status-manager change triggers a refresh.
    pub status_debounce_ms: u64,
    /// Per-call mutator timeout; `None` waits forever.
    pub mutator_timeout_ms: Option<u64>,
    /// Inbound trigger queue depth.
    pub bus_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wardrobe_enabled: true,
            item_auto_equip_enabled: true,
            restraint_auto_equip_enabled: true,
            revert_style: RevertStyle::default(),
            status_debounce_ms: 500,
            mutator_timeout_ms: Some(30_000),
            bus_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// Build config from `WARDROBE_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EngineError> {
        let mut config = Self::default();
        if let Some(v) = lookup("WARDROBE_ENABLED") {
            config.wardrobe_enabled = parse_bool("WARDROBE_ENABLED", &v)?;
        }
        if let Some(v) = lookup("WARDROBE_ITEM_AUTO_EQUIP") {
            config.item_auto_equip_enabled = parse_bool("WARDROBE_ITEM_AUTO_EQUIP", &v)?;
        }
        if let Some(v) = lookup("WARDROBE_RESTRAINT_AUTO_EQUIP") {
            config.restraint_auto_equip_enabled =
                parse_bool("WARDROBE_RESTRAINT_AUTO_EQUIP", &v)?;
        }
        if let Some(v) = lookup("WARDROBE_REVERT_STYLE") {
            config.revert_style = v
                .parse()
                .map_err(|e: String| EngineError::Config(format!("WARDROBE_REVERT_STYLE: {e}")))?;
        }
        if let Some(v) = lookup("WARDROBE_STATUS_DEBOUNCE_MS") {
            config.status_debounce_ms = parse_u64("WARDROBE_STATUS_DEBOUNCE_MS", &v)?;
        }
        if let Some(v) = lookup("WARDROBE_MUTATOR_TIMEOUT_MS") {
            // 0 disables the timeout.
            config.mutator_timeout_ms = match parse_u64("WARDROBE_MUTATOR_TIMEOUT_MS", &v)? {
                0 => None,
                ms => Some(ms),
            };
        }
        if let Some(v) = lookup("WARDROBE_BUS_CAPACITY") {
            let capacity = parse_u64("WARDROBE_BUS_CAPACITY", &v)?;
            if capacity == 0 {
                return Err(EngineError::Config(
                    "WARDROBE_BUS_CAPACITY must be at least 1".into(),
                ));
            }
            config.bus_capacity = capacity as usize;
        }
        Ok(config)
    }

    pub fn status_debounce(&self) -> Duration {
        Duration::from_millis(self.status_debounce_ms)
    }

    pub fn mutator_timeout(&self) -> Option<Duration> {
        self.mutator_timeout_ms.map(Duration::from_millis)
    }

    /// Layers the resolver may emit under the current switches.
    pub fn layer_mask(&self) -> LayerMask {
        LayerMask {
            restraint: self.wardrobe_enabled && self.restraint_auto_equip_enabled,
            gags: self.wardrobe_enabled && self.item_auto_equip_enabled,
            blindfold: self.wardrobe_enabled,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, EngineError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(EngineError::Config(format!("{key}: expected a boolean, got '{other}'"))),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, EngineError> {
    value
        .trim()
        .parse()
        .map_err(|e| EngineError::Config(format!("{key}: {e}")))
}
