//! Resolve/apply sequences driven straight through the dispatcher.

use std::collections::BTreeSet;

use wardrobe_host::{MutatorCall, MutatorError, PendingUpdateRequest};
use wardrobe_types::{
    CharacterHandle, EquipSlot, GagType, ItemId, MetadataFlag, NewState, RevertStyle, UpdateKind,
};

#[path = "helpers.rs"]
mod helpers;

use helpers::fixtures::{self, BALLGAG, COLLAR_GAG, MUZZLE, status};
use helpers::{Harness, count, equips, layer};

fn gag(layer_n: u8, gag_type: &str, state: NewState) -> UpdateKind {
    UpdateKind::GagChanged {
        layer: layer(layer_n),
        gag_type: GagType::from(gag_type),
        state,
    }
}

fn restraint(state: NewState) -> UpdateKind {
    UpdateKind::RestraintChanged {
        set_id: fixtures::head_harness_set_id(),
        state,
    }
}

fn blindfold(state: NewState) -> UpdateKind {
    UpdateKind::BlindfoldChanged {
        state,
        assigner_id: None,
    }
}

fn statuses(ids: &[u128]) -> BTreeSet<wardrobe_types::StatusId> {
    ids.iter().copied().map(status).collect()
}

#[tokio::test]
async fn gag_over_restraint_then_blindfold_on_and_off() {
    let h = Harness::new();
    h.dispatcher.submit_kind(restraint(NewState::Enabled)).await;
    let calls = h.take_calls().await;
    let mut equipped = equips(&calls);
    equipped.sort();
    assert_eq!(
        equipped,
        vec![
            (EquipSlot::Head, ItemId(fixtures::HEAD_HARNESS)),
            (EquipSlot::Body, ItemId(fixtures::BODY_HARNESS)),
        ]
    );
    assert!(calls.contains(&MutatorCall::SetMetadataFlag {
        flag: MetadataFlag::Visor,
        value: true,
    }));

    h.dispatcher.submit_kind(gag(0, BALLGAG, NewState::Enabled)).await;
    assert_eq!(
        equips(&h.take_calls().await),
        vec![(EquipSlot::Head, ItemId(42))]
    );

    h.dispatcher.submit_kind(blindfold(NewState::Enabled)).await;
    assert_eq!(
        equips(&h.take_calls().await),
        vec![(EquipSlot::Head, ItemId(fixtures::BLINDFOLD_ITEM))]
    );

    h.dispatcher.submit_kind(blindfold(NewState::Disabled)).await;
    assert_eq!(
        equips(&h.take_calls().await),
        vec![(EquipSlot::Head, ItemId(42))]
    );
}

#[tokio::test]
async fn removing_a_restraint_reverts_then_restores_worn_gags() {
    let h = Harness::new();
    h.dispatcher.submit_kind(restraint(NewState::Enabled)).await;
    h.dispatcher.submit_kind(gag(0, BALLGAG, NewState::Enabled)).await;
    h.dispatcher.submit_kind(gag(1, COLLAR_GAG, NewState::Enabled)).await;
    h.take_calls().await;

    h.dispatcher.submit_kind(restraint(NewState::Disabled)).await;
    let calls = h.take_calls().await;

    assert_eq!(
        calls.first(),
        Some(&MutatorCall::RevertCharacter {
            style: RevertStyle::RevertToBase,
        })
    );
    assert_eq!(count(&calls, MutatorCall::is_revert), 1);
    let mut equipped = equips(&calls);
    equipped.sort();
    assert_eq!(
        equipped,
        vec![(EquipSlot::Head, ItemId(42)), (EquipSlot::Neck, ItemId(55))]
    );
    assert!(calls.contains(&MutatorCall::RemoveStatuses {
        ids: statuses(&[10]),
    }));
    assert_eq!(h.mutator.active_statuses().await, statuses(&[1, 2, 4]));
    assert!(h.dispatcher.store().read().await.restraint.active_set_id.is_none());
}

#[tokio::test]
async fn reapplying_the_same_gag_applies_statuses_once() {
    let h = Harness::new();
    h.dispatcher.submit_kind(gag(0, BALLGAG, NewState::Enabled)).await;
    h.dispatcher.submit_kind(gag(0, BALLGAG, NewState::Enabled)).await;

    let calls = h.take_calls().await;
    assert_eq!(count(&calls, MutatorCall::is_status_apply), 1);
    assert_eq!(h.mutator.active_statuses().await, statuses(&[1, 2]));
}

#[tokio::test]
async fn replacing_a_gag_swaps_its_statuses() {
    let h = Harness::new();
    h.dispatcher.submit_kind(gag(0, BALLGAG, NewState::Enabled)).await;
    h.take_calls().await;

    h.dispatcher.submit_kind(gag(0, MUZZLE, NewState::Enabled)).await;
    let calls = h.take_calls().await;
    assert_eq!(equips(&calls), vec![(EquipSlot::Head, ItemId(43))]);
    assert!(calls.contains(&MutatorCall::RemoveStatuses {
        ids: statuses(&[1, 2]),
    }));
    assert!(calls.contains(&MutatorCall::ApplyStatuses {
        ids: statuses(&[3]),
    }));
    assert_eq!(h.mutator.active_statuses().await, statuses(&[3]));
}

#[tokio::test]
async fn removing_a_gag_clears_its_slot() {
    let h = Harness::new();
    h.dispatcher.submit_kind(gag(2, COLLAR_GAG, NewState::Enabled)).await;
    h.take_calls().await;

    h.dispatcher.submit_kind(gag(2, "None", NewState::Disabled)).await;
    let calls = h.take_calls().await;
    assert_eq!(equips(&calls), vec![(EquipSlot::Neck, ItemId::NOTHING)]);
    assert!(h.mutator.active_statuses().await.is_empty());
}

#[tokio::test]
async fn safeword_reverts_and_forgets_every_layer() {
    let h = Harness::new();
    h.dispatcher.submit_kind(restraint(NewState::Enabled)).await;
    h.dispatcher.submit_kind(gag(0, BALLGAG, NewState::Enabled)).await;
    h.dispatcher.submit_kind(blindfold(NewState::Enabled)).await;
    h.take_calls().await;

    h.dispatcher.submit_kind(UpdateKind::Safeword).await;
    let calls = h.take_calls().await;
    assert_eq!(
        calls.first(),
        Some(&MutatorCall::RevertCharacter {
            style: RevertStyle::RevertToBase,
        })
    );
    assert!(equips(&calls).is_empty());
    assert!(calls.contains(&MutatorCall::RemoveStatuses {
        ids: statuses(&[1, 2, 10]),
    }));
    assert!(h.mutator.active_statuses().await.is_empty());
    {
        let snapshot = h.dispatcher.store().read().await;
        assert_eq!(snapshot.worn_gags().count(), 0);
        assert!(!snapshot.restraint.is_active());
        assert!(!snapshot.blindfold.is_equipped);
        assert!(snapshot.expected_statuses.is_empty());
    }

    // a later refresh has nothing to put back
    h.dispatcher.submit_kind(UpdateKind::RefreshAll).await;
    assert!(h.mutator.active_statuses().await.is_empty());
}

#[tokio::test]
async fn every_revert_style_reaches_the_glamour_service() {
    for style in [
        RevertStyle::RevertToBase,
        RevertStyle::RevertEquipOnly,
        RevertStyle::RevertToAutomationProfile,
        RevertStyle::RevertEquipOnlyToAutomationProfile,
    ] {
        let h = Harness::new();
        h.config_tx.send_modify(|config| config.revert_style = style);

        h.dispatcher.submit_kind(UpdateKind::Safeword).await;
        let calls = h.take_calls().await;
        assert_eq!(
            calls.first(),
            Some(&MutatorCall::RevertCharacter { style }),
            "safeword with {style:?}"
        );

        h.dispatcher.submit_kind(restraint(NewState::Enabled)).await;
        h.take_calls().await;
        h.dispatcher.submit_kind(restraint(NewState::Disabled)).await;
        let calls = h.take_calls().await;
        assert_eq!(
            calls.first(),
            Some(&MutatorCall::RevertCharacter { style }),
            "restraint removal with {style:?}"
        );
        assert_eq!(count(&calls, MutatorCall::is_revert), 1);
    }
}

#[tokio::test]
async fn enabling_another_set_replaces_the_active_one() {
    let h = Harness::new();
    h.dispatcher.submit_kind(restraint(NewState::Enabled)).await;
    assert_eq!(h.mutator.active_statuses().await, statuses(&[10]));
    h.take_calls().await;

    h.dispatcher
        .submit_kind(UpdateKind::RestraintChanged {
            set_id: fixtures::cuffs_set_id(),
            state: NewState::Enabled,
        })
        .await;
    let calls = h.take_calls().await;

    let mut equipped = equips(&calls);
    equipped.sort();
    assert_eq!(
        equipped,
        vec![
            (EquipSlot::Head, ItemId::NOTHING),
            (EquipSlot::Body, ItemId::NOTHING),
            (EquipSlot::Hands, ItemId(fixtures::WRIST_CUFFS)),
        ]
    );
    assert!(calls.contains(&MutatorCall::SetMetadataFlag {
        flag: MetadataFlag::Visor,
        value: false,
    }));
    assert!(calls.contains(&MutatorCall::RemoveStatuses {
        ids: statuses(&[10]),
    }));
    assert_eq!(h.mutator.active_statuses().await, statuses(&[11]));
    assert_eq!(
        h.dispatcher.store().read().await.restraint.active_set_id,
        Some(fixtures::cuffs_set_id())
    );
}

#[tokio::test]
async fn refresh_restores_statuses_lost_on_the_host() {
    let h = Harness::new();
    h.dispatcher.submit_kind(gag(0, BALLGAG, NewState::Enabled)).await;
    h.mutator.set_active_statuses(statuses(&[2])).await;
    h.take_calls().await;

    h.dispatcher.submit_kind(UpdateKind::RefreshAll).await;
    assert!(h.take_calls().await.contains(&MutatorCall::ApplyStatuses {
        ids: statuses(&[1]),
    }));
    assert_eq!(h.mutator.active_statuses().await, statuses(&[1, 2]));
}

#[tokio::test]
async fn unknown_gag_still_resolves_completion() {
    let h = Harness::new();
    let (request, done) =
        PendingUpdateRequest::with_completion(gag(0, "Spider Gag", NewState::Enabled));
    h.dispatcher.submit(request).await;

    assert_eq!(done.await, Ok(true));
    assert!(h.take_calls().await.is_empty());
    assert!(h.dispatcher.store().read().await.gag(layer(0)).gag_type.is_none());
}

#[tokio::test]
async fn failed_equip_still_completes_and_runs_the_rest() {
    let mutator = wardrobe_host::RecordingMutator::new().with_failures(|call| {
        call.is_equip()
            .then(|| MutatorError::Rejected("slot locked".into()))
    });
    let h = Harness::with_mutator(mutator);
    let (request, done) =
        PendingUpdateRequest::with_completion(gag(0, BALLGAG, NewState::Enabled));
    h.dispatcher.submit(request).await;

    assert_eq!(done.await, Ok(true));
    let calls = h.take_calls().await;
    assert_eq!(equips(&calls), vec![(EquipSlot::Head, ItemId(42))]);
    assert_eq!(count(&calls, MutatorCall::is_status_apply), 1);
}

#[tokio::test]
async fn disabled_auto_equip_updates_state_without_calls() {
    let h = Harness::new();
    h.config_tx
        .send_modify(|config| config.item_auto_equip_enabled = false);

    h.dispatcher.submit_kind(gag(1, BALLGAG, NewState::Enabled)).await;
    assert!(h.take_calls().await.is_empty());
    assert_eq!(
        h.dispatcher.store().read().await.gag(layer(1)).gag_type,
        GagType::from(BALLGAG)
    );

    // the next full refresh picks up what was skipped
    h.config_tx.send_modify(|config| config.item_auto_equip_enabled = true);
    h.dispatcher.submit_kind(UpdateKind::RefreshAll).await;
    assert_eq!(
        equips(&h.take_calls().await),
        vec![(EquipSlot::Head, ItemId(42))]
    );
}

#[tokio::test]
async fn refresh_reasserts_everything() {
    let h = Harness::new();
    h.dispatcher.submit_kind(restraint(NewState::Enabled)).await;
    h.dispatcher.submit_kind(gag(1, COLLAR_GAG, NewState::Enabled)).await;
    h.take_calls().await;

    h.dispatcher.submit_kind(UpdateKind::ZoneChange).await;
    let calls = h.take_calls().await;
    let mut equipped = equips(&calls);
    equipped.sort();
    assert_eq!(
        equipped,
        vec![
            (EquipSlot::Head, ItemId(fixtures::HEAD_HARNESS)),
            (EquipSlot::Body, ItemId(fixtures::BODY_HARNESS)),
            (EquipSlot::Neck, ItemId(55)),
        ]
    );
    assert!(calls.contains(&MutatorCall::SetMetadataFlag {
        flag: MetadataFlag::Visor,
        value: true,
    }));
    // statuses were already in place
    assert_eq!(count(&calls, MutatorCall::is_status_apply), 0);
}

#[tokio::test]
async fn session_lifecycle_tracks_character_and_resets_state() {
    let h = Harness::new();
    h.dispatcher.start_session(CharacterHandle(7)).await;
    assert_eq!(
        h.dispatcher.store().read().await.character,
        Some(CharacterHandle(7))
    );

    h.dispatcher.submit_kind(gag(0, BALLGAG, NewState::Enabled)).await;
    h.dispatcher.end_session().await;
    let snapshot = h.dispatcher.store().read().await;
    assert_eq!(snapshot.worn_gags().count(), 0);
    assert!(snapshot.character.is_none());
}
