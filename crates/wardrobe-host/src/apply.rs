//! Mutator side of an apply cycle. Failures are logged and counted, never raised.

use std::collections::BTreeSet;

use futures::future::join_all;
use tracing::{debug, warn};
use wardrobe_types::{MetadataFlag, ProfileId, StatusId};

use crate::adapters::registry::MutatorRegistry;
use crate::resolver::EquipMap;
use crate::status::{StatusChange, reconcile};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ApplyReport {
    pub calls: usize,
    pub failed: usize,
}

impl ApplyReport {
    fn record<T>(&mut self, what: &'static str, result: &Result<T, crate::error::MutatorError>) {
        self.calls += 1;
        if let Err(err) = result {
            self.failed += 1;
            warn!(call = what, error = %err, "mutator call failed");
        }
    }
}

/// Set every entry of `map`, all slots at once, and wait for all of them.
pub(crate) async fn apply_equips(
    mutators: &MutatorRegistry,
    map: &EquipMap,
    report: &mut ApplyReport,
) {
    let calls = map.iter().map(|(slot, equip)| async move {
        let result = mutators.set_equip(slot, equip).await;
        (slot, equip.item, result)
    });
    for (slot, item, result) in join_all(calls).await {
        report.calls += 1;
        if let Err(err) = result {
            report.failed += 1;
            warn!(%slot, item = item.0, error = %err, "equip call failed; slot skipped");
        }
    }
}

/// Flag writes needed to go from `prev` to `next` forcing.
///
/// `force` re-asserts `next` even when unchanged (after a revert or on refresh).
pub(crate) fn metadata_updates(
    prev: MetadataFlag,
    next: MetadataFlag,
    force: bool,
) -> Vec<(MetadataFlag, bool)> {
    let mut updates = Vec::new();
    if next != MetadataFlag::None && (force || next != prev) {
        updates.push((next, true));
    }
    let (prev_hat, prev_visor) = prev.components();
    let (next_hat, next_visor) = next.components();
    let lost = MetadataFlag::from_forces(prev_hat && !next_hat, prev_visor && !next_visor);
    if lost != MetadataFlag::None {
        updates.push((lost, false));
    }
    updates
}

pub(crate) async fn apply_metadata(
    mutators: &MutatorRegistry,
    prev: MetadataFlag,
    next: MetadataFlag,
    force: bool,
    report: &mut ApplyReport,
) {
    for (flag, value) in metadata_updates(prev, next, force) {
        let result = mutators.set_metadata_flag(flag, value).await;
        report.record("set_metadata_flag", &result);
    }
}

pub(crate) async fn apply_profile(
    mutators: &MutatorRegistry,
    prev: Option<ProfileId>,
    next: Option<ProfileId>,
    force: bool,
    report: &mut ApplyReport,
) {
    if prev != next {
        if let Some(old) = prev {
            let result = mutators.disable_linked_profile(old).await;
            report.record("disable_linked_profile", &result);
        }
    } else if !force {
        return;
    }
    if let Some(new) = next {
        let result = mutators.enable_linked_profile(new).await;
        report.record("enable_linked_profile", &result);
    }
}

/// Bring the status service in line with `expected`.
pub(crate) async fn apply_statuses(
    mutators: &MutatorRegistry,
    expected: &BTreeSet<StatusId>,
    change: &StatusChange,
    report: &mut ApplyReport,
) {
    let current = match mutators.read_active_statuses().await {
        Ok(current) => current,
        Err(err) => {
            report.calls += 1;
            report.failed += 1;
            warn!(error = %err, "could not read active statuses; skipping reconcile");
            return;
        }
    };
    report.calls += 1;

    let plan = reconcile(expected, &current, change);
    if plan.is_noop() {
        debug!("statuses already in place");
        return;
    }
    if !plan.remove.is_empty() {
        let result = mutators.remove_statuses(&plan.remove).await;
        report.record("remove_statuses", &result);
    }
    if !plan.apply.is_empty() {
        let result = mutators.apply_statuses(&plan.apply).await;
        report.record("apply_statuses", &result);
    }
}
