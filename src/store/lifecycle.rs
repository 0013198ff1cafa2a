//! Expiry timers, capacity eviction and the two dismissal paths built on them.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::task::AbortHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use super::{Inner, NotificationStore, State};
use crate::notification::NotificationId;

/// Pending removal of one notification.
///
/// The generation ties a firing timer to the bookkeeping entry that created
/// it; a timer whose entry has since been rescheduled or removed does nothing.
pub(super) struct Timer {
    generation: u64,
    handle: AbortHandle,
}

impl Timer {
    pub(super) fn cancel(self) {
        self.handle.abort();
    }
}

pub(super) fn spawn_timer(
    inner: &Arc<Inner>,
    id: NotificationId,
    generation: u64,
    deadline: Instant,
) -> Timer {
    let store = Arc::downgrade(inner);
    let task = inner.runtime.spawn(async move {
        sleep_until(deadline).await;
        if let Some(inner) = store.upgrade() {
            inner.fire(id, generation);
        }
    });
    Timer {
        generation,
        handle: task.abort_handle(),
    }
}

impl Inner {
    fn fire(&self, id: NotificationId, generation: u64) {
        let mut state = self.state.lock();
        let Some(index) = state.entries.iter().position(|entry| {
            entry.notification.id() == id
                && entry
                    .timer
                    .as_ref()
                    .is_some_and(|timer| timer.generation == generation)
        }) else {
            return;
        };
        let entry = state.entries.remove(index);
        if entry.notification.is_exiting() {
            debug!(%id, "dismissed notification removed");
        } else {
            debug!(%id, "notification expired");
        }
        self.publish(&state);
    }
}

impl State {
    /// Drops the oldest entries until the list fits `max_visible`.
    pub(super) fn evict_overflow(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.max_visible);
        for mut entry in self.entries.drain(..excess) {
            entry.cancel_timer();
            info!(
                id = %entry.notification.id(),
                max_visible = self.max_visible,
                "notification evicted"
            );
        }
        excess
    }
}

/// What happened when a notification's action was invoked.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionOutcome {
    /// The callback ran and the notification was removed.
    Invoked,
    /// The callback panicked; the notification was removed anyway.
    Panicked,
    /// The notification had no action; it was removed.
    NoAction,
    /// No active notification has this id.
    Missing,
}

impl NotificationStore {
    /// Starts the exit of a notification: it stays listed, flagged as
    /// exiting, until the configured exit delay has passed.
    pub fn dismiss(&self, id: &NotificationId) {
        let mut state = self.inner.state.lock();
        if state.exit_delay.is_zero() {
            if state.remove(id).is_some() {
                debug!(%id, "notification dismissed");
                self.inner.publish(&state);
            }
            return;
        }

        let Some(index) = state.index_of(id) else {
            return;
        };
        if state.entries[index].notification.is_exiting() {
            return;
        }
        let generation = state.next_generation();
        let deadline = Instant::now() + state.exit_delay;
        let entry = &mut state.entries[index];
        entry.notification.mark_exiting();
        entry.cancel_timer();
        entry.timer = Some(spawn_timer(&self.inner, *id, generation, deadline));
        debug!(%id, "notification dismissing");
        self.inner.publish(&state);
    }

    /// Runs the notification's action callback, then removes it.
    ///
    /// The callback runs without the store lock held, so it may call back
    /// into the store. Removal happens even if the callback panics.
    pub fn invoke_action(&self, id: &NotificationId) -> ActionOutcome {
        let callback = {
            let state = self.inner.state.lock();
            let Some(index) = state.index_of(id) else {
                return ActionOutcome::Missing;
            };
            state.entries[index]
                .notification
                .action()
                .map(|action| (action.label().to_string(), action.callback()))
        };

        let outcome = match callback {
            None => ActionOutcome::NoAction,
            Some((label, callback)) => {
                match panic::catch_unwind(AssertUnwindSafe(|| callback())) {
                    Ok(()) => {
                        debug!(%id, %label, "notification action invoked");
                        ActionOutcome::Invoked
                    }
                    Err(_) => {
                        warn!(%id, %label, "notification action panicked");
                        ActionOutcome::Panicked
                    }
                }
            }
        };

        self.remove(id);
        outcome
    }
}
