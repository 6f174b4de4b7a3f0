//! Status (mood effect) reconciliation between the layers and the status service.

use std::collections::BTreeSet;

use wardrobe_types::{StatusId, WardrobeCatalog};

use crate::resolver::{active_gag_draws, active_restraint_draws};
use crate::snapshot::Snapshot;

/// What kind of change the reconcile follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    Application,
    /// An item was taken off; `released` is every status it carried.
    Removal { released: BTreeSet<StatusId> },
}

impl StatusChange {
    pub fn removal(released: BTreeSet<StatusId>) -> Self {
        StatusChange::Removal { released }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusPlan {
    pub remove: BTreeSet<StatusId>,
    pub apply: BTreeSet<StatusId>,
}

impl StatusPlan {
    pub fn is_noop(&self) -> bool {
        self.remove.is_empty() && self.apply.is_empty()
    }
}

/// Union of the statuses every active, enabled gag and restraint slot carries.
pub fn expected_statuses(snapshot: &Snapshot, catalog: &WardrobeCatalog) -> BTreeSet<StatusId> {
    let gags = active_gag_draws(snapshot, catalog).map(|(_, draw)| draw);
    let restraint = active_restraint_draws(snapshot).filter(|draw| draw.is_enabled);
    gags.chain(restraint)
        .flat_map(|draw| draw.associated_statuses.iter().copied())
        .collect()
}

/// Plan the status calls for a change.
///
/// Applications only add what is missing, so repeating one is a no-op. Removals
/// clear the full released list and then restore anything another layer still
/// expects.
pub fn reconcile(
    expected: &BTreeSet<StatusId>,
    current: &BTreeSet<StatusId>,
    change: &StatusChange,
) -> StatusPlan {
    match change {
        StatusChange::Application => StatusPlan {
            remove: BTreeSet::new(),
            apply: expected.difference(current).copied().collect(),
        },
        StatusChange::Removal { released } => {
            let remaining: BTreeSet<StatusId> = current.difference(released).copied().collect();
            StatusPlan {
                remove: released.clone(),
                apply: expected.difference(&remaining).copied().collect(),
            }
        }
    }
}
