#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Map, json};

use toastline::notification::{Action, NewNotification, NotificationPatch};
use toastline::store::{ActionOutcome, NotificationStore, StoreSettings};
use toastline::types::{Kind, Position};

fn store() -> NotificationStore {
    NotificationStore::new(StoreSettings::default()).expect("inside a runtime")
}

fn store_with_capacity(max_visible: usize) -> NotificationStore {
    NotificationStore::new(StoreSettings {
        max_visible,
        ..StoreSettings::default()
    })
    .expect("inside a runtime")
}

/// Moves the paused clock forward and lets woken timer tasks run.
async fn advance(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn ids_are_unique_among_active_notifications() {
    let store = store_with_capacity(100);
    let ids: Vec<_> = (0..50)
        .map(|n| store.add(NewNotification::info(format!("n{n}"))))
        .collect();
    let unique: HashSet<_> = store.snapshot().ids().into_iter().collect();
    assert_eq!(unique.len(), 50);
    assert_eq!(store.snapshot().ids(), ids);
}

#[tokio::test(start_paused = true)]
async fn missing_duration_defaults_to_five_seconds() {
    let store = store();
    let id = store.add(NewNotification::new(Kind::Info, "m"));
    let stored = store.get(&id).expect("stored");
    assert_eq!(stored.duration(), Some(Duration::from_millis(5_000)));
    assert_eq!(stored.kind(), Kind::Info);
    assert_eq!(stored.message(), "m");
}

#[tokio::test(start_paused = true)]
async fn default_duration_is_captured_at_creation() {
    let store = store();
    let early = store.add(NewNotification::info("early"));
    store.set_default_duration(Duration::from_secs(1));
    let late = store.add(NewNotification::info("late"));

    assert_eq!(store.default_duration(), Duration::from_secs(1));
    assert_eq!(
        store.get(&early).and_then(|n| n.duration()),
        Some(Duration::from_secs(5))
    );
    assert_eq!(
        store.get(&late).and_then(|n| n.duration()),
        Some(Duration::from_secs(1))
    );

    advance(1_000).await;
    assert!(store.get(&late).is_none());
    assert!(store.get(&early).is_some());
}

#[tokio::test(start_paused = true)]
async fn remove_is_idempotent() {
    let store = store();
    let keep = store.add(NewNotification::info("keep"));
    let id = store.add(NewNotification::info("gone"));

    store.remove(&id);
    let after_first = store.snapshot().ids();
    store.remove(&id);
    assert_eq!(store.snapshot().ids(), after_first);
    assert_eq!(after_first, vec![keep]);
}

#[tokio::test(start_paused = true)]
async fn expires_exactly_at_its_duration() {
    let store = store();
    let id = store.add(NewNotification::success("m").with_duration(Duration::from_millis(200)));

    advance(199).await;
    assert!(store.get(&id).is_some());

    advance(1).await;
    assert!(store.get(&id).is_none());
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn zero_duration_still_expires() {
    let store = store();
    let id = store.add(NewNotification::error("m").with_duration(Duration::ZERO));
    advance(0).await;
    assert!(store.get(&id).is_none());
}

#[tokio::test(start_paused = true)]
async fn capacity_evicts_oldest_first() {
    let store = store_with_capacity(2);
    let a = store.add(NewNotification::info("a"));
    let b = store.add(NewNotification::info("b"));
    let c = store.add(NewNotification::info("c"));

    assert_eq!(store.snapshot().ids(), vec![b, c]);
    assert!(store.get(&a).is_none());
}

#[tokio::test(start_paused = true)]
async fn lowering_capacity_evicts_immediately() {
    let store = store();
    let ids: Vec<_> = (0..4)
        .map(|n| store.add(NewNotification::info(format!("n{n}"))))
        .collect();

    store.set_max_visible(2);
    assert_eq!(store.max_visible(), 2);
    assert_eq!(store.snapshot().ids(), ids[2..].to_vec());

    store.set_max_visible(10);
    assert_eq!(store.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn early_removal_cancels_the_timer() {
    let store = store();
    let x = store.add(NewNotification::info("m").with_duration(Duration::from_millis(5_000)));
    store.remove(&x);

    let y = store.add(NewNotification::info("later").with_duration(Duration::from_secs(10)));
    advance(5_000).await;
    advance(1_000).await;

    assert!(store.get(&x).is_none());
    assert_eq!(store.snapshot().ids(), vec![y]);
}

#[tokio::test(start_paused = true)]
async fn evicted_notifications_leave_no_timer_behind() {
    let store = store_with_capacity(1);
    store.add(NewNotification::info("old").with_duration(Duration::from_millis(100)));
    let survivor = store.add(NewNotification::info("new").sticky());

    advance(500).await;
    assert_eq!(store.snapshot().ids(), vec![survivor]);
}

#[tokio::test(start_paused = true)]
async fn clear_all_empties_and_cancels_everything() {
    let store = store();
    for ms in [100, 200, 300] {
        store.add(NewNotification::warning("m").with_duration(Duration::from_millis(ms)));
    }
    store.add(NewNotification::warning("sticky").sticky());
    store.clear_all();
    assert!(store.is_empty());

    let fresh = store.add(NewNotification::info("fresh").with_duration(Duration::from_secs(60)));
    advance(1_000).await;
    assert_eq!(store.snapshot().ids(), vec![fresh]);
}

#[tokio::test(start_paused = true)]
async fn update_scenario_keeps_identity() {
    let store = store();
    let a = store.add(NewNotification::info("A").with_duration(Duration::from_millis(100)));
    let b = store.add(NewNotification::info("B"));
    assert_eq!(store.snapshot().ids(), vec![a, b]);

    advance(150).await;
    assert_eq!(store.snapshot().ids(), vec![b]);

    let before = store.get(&b).expect("b active");
    store.update(&b, NotificationPatch::new().message("updated"));
    let after = store.get(&b).expect("b still active");
    assert_eq!(after.message(), "updated");
    assert_eq!(after.id(), before.id());
    assert_eq!(after.created_at(), before.created_at());
    assert_eq!(after.duration(), before.duration());
    assert_eq!(store.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn update_of_unknown_id_is_a_no_op() {
    let store = store();
    let id = store.add(NewNotification::info("m"));
    store.remove(&id);
    store.update(&id, NotificationPatch::new().message("ghost"));
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn duration_update_is_measured_from_creation() {
    let store = store();
    let id = store.add(NewNotification::info("m").with_duration(Duration::from_secs(10)));

    advance(300).await;
    store.update(&id, NotificationPatch::new().duration(Duration::from_millis(500)));
    advance(199).await;
    assert!(store.get(&id).is_some());
    advance(1).await;
    assert!(store.get(&id).is_none());
}

#[tokio::test(start_paused = true)]
async fn making_a_notification_sticky_stops_expiry() {
    let store = store();
    let id = store.add(NewNotification::info("m").with_duration(Duration::from_millis(100)));
    store.update(&id, NotificationPatch::new().sticky());

    advance(10_000).await;
    assert!(store.get(&id).is_some_and(|n| n.duration().is_none()));
}

#[tokio::test(start_paused = true)]
async fn action_runs_callback_then_removes() {
    let store = store();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let id = store.add(
        NewNotification::info("Item removed from cart")
            .sticky()
            .with_action(Action::new("Undo", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
    );
    assert!(store.get(&id).is_some_and(|n| n.has_action()));

    assert_eq!(store.invoke_action(&id), ActionOutcome::Invoked);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(store.get(&id).is_none());

    assert_eq!(store.invoke_action(&id), ActionOutcome::Missing);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn panicking_action_still_removes() {
    let store = store();
    let id = store.add(
        NewNotification::error("Payment failed")
            .with_action(Action::new("Retry", || panic!("retry handler exploded"))),
    );
    assert_eq!(store.invoke_action(&id), ActionOutcome::Panicked);
    assert!(store.get(&id).is_none());
}

#[tokio::test(start_paused = true)]
async fn action_without_callback_just_removes() {
    let store = store();
    let id = store.add(NewNotification::info("plain"));
    assert_eq!(store.invoke_action(&id), ActionOutcome::NoAction);
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn action_callback_may_reenter_the_store() {
    let store = store();
    let handle = store.downgrade();
    let id = store.add(
        NewNotification::info("Booking cancelled")
            .sticky()
            .with_action(Action::new("Undo", move || {
                if let Some(store) = handle.upgrade() {
                    store.add(NewNotification::success("Booking restored"));
                }
            })),
    );

    assert_eq!(store.invoke_action(&id), ActionOutcome::Invoked);
    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.notifications()[0].message(), "Booking restored");
}

#[tokio::test(start_paused = true)]
async fn store_drops_while_callbacks_hold_weak_handles() {
    let store = store();
    let mut updates = store.subscribe();
    let handle = store.downgrade();
    store.add(
        NewNotification::info("Seat released")
            .sticky()
            .with_action(Action::new("Undo", move || {
                if let Some(store) = handle.upgrade() {
                    store.add(NewNotification::success("Seat held again"));
                }
            })),
    );
    store.add(NewNotification::info("Price alert").with_duration(Duration::from_secs(1)));
    updates.borrow_and_update();

    drop(store);
    let closed = tokio::time::timeout(Duration::from_secs(60), updates.changed()).await;
    assert!(matches!(closed, Ok(Err(_))), "subscription should close");
}

#[tokio::test(start_paused = true)]
async fn payload_survives_updates_until_cleared() {
    let store = store();
    let mut data = Map::new();
    data.insert("booking".to_string(), json!("LX-4821"));
    data.insert("nights".to_string(), json!(3));
    let id = store.add(NewNotification::success("Hotel booked").with_data(data.clone()));
    assert_eq!(store.get(&id).and_then(|n| n.data().cloned()), Some(data.clone()));

    store.update(&id, NotificationPatch::new().message("Hotel booked, 3 nights"));
    assert_eq!(store.get(&id).and_then(|n| n.data().cloned()), Some(data));

    store.update(&id, NotificationPatch::new().clear_data());
    let cleared = store.get(&id).expect("still active");
    assert!(cleared.data().is_none());
    assert_eq!(cleared.message(), "Hotel booked, 3 nights");
}

#[tokio::test(start_paused = true)]
async fn dismiss_waits_for_the_exit_delay() {
    let store = store();
    let id = store.add(NewNotification::info("m").with_duration(Duration::from_millis(100)));

    store.dismiss(&id);
    assert!(store.get(&id).is_some_and(|n| n.is_exiting()));

    advance(200).await;
    assert!(store.get(&id).is_some(), "expiry timer replaced by exit");
    store.dismiss(&id);

    advance(100).await;
    assert!(store.get(&id).is_none());
}

#[tokio::test(start_paused = true)]
async fn dismiss_without_exit_delay_is_immediate() {
    let store = NotificationStore::new(StoreSettings {
        exit_delay: Duration::ZERO,
        ..StoreSettings::default()
    })
    .expect("inside a runtime");
    let id = store.add(NewNotification::info("m"));
    store.dismiss(&id);
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn configuration_is_shared_by_all_handles() {
    let store = store();
    let other = store.clone();
    assert_eq!(store.position(), Position::TopRight);
    assert_eq!(store.max_visible(), 5);

    other.set_position(Position::BottomCenter);
    assert_eq!(store.position(), Position::BottomCenter);
    assert_eq!(store.snapshot().position(), Position::BottomCenter);

    let id = other.add(NewNotification::info("shared"));
    assert!(store.get(&id).is_some());
}

#[tokio::test(start_paused = true)]
async fn stores_are_independent() {
    let first = store();
    let second = store();
    first.add(NewNotification::info("only here"));
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
}

#[tokio::test(start_paused = true)]
async fn dispose_cancels_pending_expiries() {
    let store = store();
    let mut updates = store.subscribe();
    store.add(NewNotification::info("m").with_duration(Duration::from_millis(100)));
    store.add(NewNotification::info("n").sticky());
    updates.borrow_and_update();

    let handle = store.clone();
    store.dispose();
    assert!(handle.is_empty());
    assert!(updates.has_changed().unwrap());
    assert!(updates.borrow_and_update().is_empty());

    advance(1_000).await;
    assert!(!updates.has_changed().unwrap());

    drop(handle);
    assert!(updates.changed().await.is_err());
}
