//! The shared store of active notifications.
//!
//! A [`NotificationStore`] is a cheap handle onto one shared list plus its
//! display configuration. Every mutation publishes a fresh [`Snapshot`] to
//! subscribers; readers never see a list that is being modified.

mod lifecycle;

pub use lifecycle::ActionOutcome;

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::Result;
use crate::error::StoreError;
use crate::notification::{NewNotification, Notification, NotificationId, NotificationPatch};
use crate::types::Position;

pub const DEFAULT_DURATION: Duration = Duration::from_millis(5_000);
pub const DEFAULT_MAX_VISIBLE: usize = 5;
pub const DEFAULT_EXIT_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub position: Position,
    pub max_visible: usize,
    pub default_duration: Duration,
    /// Grace period between `dismiss` and the actual removal.
    pub exit_delay: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            position: Position::default(),
            max_visible: DEFAULT_MAX_VISIBLE,
            default_duration: DEFAULT_DURATION,
            exit_delay: DEFAULT_EXIT_DELAY,
        }
    }
}

/// Immutable view of the store at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    notifications: Arc<[Notification]>,
    position: Position,
    max_visible: usize,
}

impl Snapshot {
    /// Active notifications in insertion order.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub const fn position(&self) -> Position {
        self.position
    }

    pub const fn max_visible(&self) -> usize {
        self.max_visible
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn ids(&self) -> Vec<NotificationId> {
        self.notifications.iter().map(Notification::id).collect()
    }

    pub fn get(&self, id: &NotificationId) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id() == *id)
    }
}

#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<Inner>,
}

/// Non-owning handle onto a [`NotificationStore`].
///
/// Action callbacks live inside the store, so a callback that holds a full
/// handle keeps its own store alive forever. Capture one of these instead.
#[derive(Clone)]
pub struct WeakNotificationStore {
    inner: Weak<Inner>,
}

impl WeakNotificationStore {
    /// Returns a full handle while any other full handle still exists.
    pub fn upgrade(&self) -> Option<NotificationStore> {
        self.inner.upgrade().map(|inner| NotificationStore { inner })
    }
}

struct Inner {
    state: Mutex<State>,
    updates: watch::Sender<Snapshot>,
    runtime: Handle,
}

struct State {
    entries: Vec<Entry>,
    position: Position,
    max_visible: usize,
    default_duration: Duration,
    exit_delay: Duration,
    generation: u64,
}

struct Entry {
    notification: Notification,
    timer: Option<lifecycle::Timer>,
}

impl Entry {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

impl NotificationStore {
    /// Creates a store bound to the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoRuntime`] when called outside a runtime.
    pub fn new(settings: StoreSettings) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|source| StoreError::NoRuntime { source })?;
        Ok(Self::with_runtime(runtime, settings))
    }

    /// Creates a store whose expiry timers run on `runtime`.
    pub fn with_runtime(runtime: Handle, settings: StoreSettings) -> Self {
        let state = State {
            entries: Vec::new(),
            position: settings.position,
            max_visible: clamp_max_visible(settings.max_visible),
            default_duration: settings.default_duration,
            exit_delay: settings.exit_delay,
            generation: 0,
        };
        let (updates, _) = watch::channel(state.snapshot());
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                updates,
                runtime,
            }),
        }
    }

    pub fn downgrade(&self) -> WeakNotificationStore {
        WeakNotificationStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Appends a notification and returns its id.
    ///
    /// The oldest notifications are evicted if the list grows past
    /// `max_visible`.
    pub fn add(&self, input: NewNotification) -> NotificationId {
        let mut state = self.inner.state.lock();
        let notification = Notification::create(input, state.default_duration);
        let id = notification.id();
        debug!(
            %id,
            kind = %notification.kind(),
            duration_ms = notification.duration().map(|d| d.as_millis()),
            "notification added"
        );

        let generation = state.next_generation();
        let timer = notification
            .deadline()
            .map(|deadline| lifecycle::spawn_timer(&self.inner, id, generation, deadline));
        state.entries.push(Entry {
            notification,
            timer,
        });
        state.evict_overflow();
        self.inner.publish(&state);
        id
    }

    /// Merges `patch` into the notification with `id`. Unknown ids are ignored.
    ///
    /// Only a duration change touches the expiry timer; the new deadline is
    /// still measured from the notification's creation.
    pub fn update(&self, id: &NotificationId, patch: NotificationPatch) {
        let mut state = self.inner.state.lock();
        let Some(index) = state.index_of(id) else {
            debug!(%id, "update ignored for unknown notification");
            return;
        };
        let generation = state.next_generation();
        let entry = &mut state.entries[index];
        if entry.notification.apply(patch) && !entry.notification.is_exiting() {
            entry.cancel_timer();
            entry.timer = entry
                .notification
                .deadline()
                .map(|deadline| lifecycle::spawn_timer(&self.inner, *id, generation, deadline));
        }
        debug!(%id, "notification updated");
        self.inner.publish(&state);
    }

    /// Removes the notification with `id` and cancels its timer. Idempotent.
    pub fn remove(&self, id: &NotificationId) {
        let mut state = self.inner.state.lock();
        if state.remove(id).is_some() {
            debug!(%id, "notification removed");
            self.inner.publish(&state);
        }
    }

    pub fn clear_all(&self) {
        let mut state = self.inner.state.lock();
        let cleared = state.clear();
        debug!(cleared, "notifications cleared");
        self.inner.publish(&state);
    }

    pub fn position(&self) -> Position {
        self.inner.state.lock().position
    }

    pub fn set_position(&self, position: Position) {
        let mut state = self.inner.state.lock();
        state.position = position;
        debug!(%position, "position changed");
        self.inner.publish(&state);
    }

    pub fn max_visible(&self) -> usize {
        self.inner.state.lock().max_visible
    }

    /// Sets the capacity, clamped to at least one, and evicts any overflow.
    pub fn set_max_visible(&self, max_visible: usize) {
        if max_visible == 0 {
            warn!("max_visible must be positive, clamping to 1");
        }
        let mut state = self.inner.state.lock();
        state.max_visible = clamp_max_visible(max_visible);
        debug!(max_visible = state.max_visible, "capacity changed");
        state.evict_overflow();
        self.inner.publish(&state);
    }

    pub fn default_duration(&self) -> Duration {
        self.inner.state.lock().default_duration
    }

    /// Affects notifications added from now on only.
    pub fn set_default_duration(&self, duration: Duration) {
        self.inner.state.lock().default_duration = duration;
    }

    pub fn get(&self, id: &NotificationId) -> Option<Notification> {
        let state = self.inner.state.lock();
        state
            .index_of(id)
            .map(|index| state.entries[index].notification.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().entries.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.updates.borrow().clone()
    }

    /// Receives a new [`Snapshot`] after every mutation. The receiver errors
    /// once the last store handle is gone.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.updates.subscribe()
    }

    /// Resolves an id from a unique prefix of its textual form.
    pub fn resolve_prefix(&self, prefix: &str) -> Option<NotificationId> {
        let state = self.inner.state.lock();
        let mut matches = state
            .entries
            .iter()
            .map(|entry| entry.notification.id())
            .filter(|id| id.matches_prefix(prefix));
        let first = matches.next()?;
        matches.next().is_none().then_some(first)
    }

    /// Cancels every pending timer and empties the store.
    pub fn dispose(self) {
        let mut state = self.inner.state.lock();
        let cleared = state.clear();
        debug!(cleared, "notification store disposed");
        self.inner.publish(&state);
    }
}

impl Inner {
    fn publish(&self, state: &State) {
        self.updates.send_replace(state.snapshot());
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.state.get_mut().clear();
    }
}

impl State {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            notifications: self
                .entries
                .iter()
                .map(|entry| entry.notification.clone())
                .collect(),
            position: self.position,
            max_visible: self.max_visible,
        }
    }

    fn index_of(&self, id: &NotificationId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.notification.id() == *id)
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn remove(&mut self, id: &NotificationId) -> Option<Notification> {
        let index = self.index_of(id)?;
        let mut entry = self.entries.remove(index);
        entry.cancel_timer();
        Some(entry.notification)
    }

    fn clear(&mut self) -> usize {
        let cleared = self.entries.len();
        for mut entry in self.entries.drain(..) {
            entry.cancel_timer();
        }
        cleared
    }
}

const fn clamp_max_visible(max_visible: usize) -> usize {
    if max_visible == 0 { 1 } else { max_visible }
}
