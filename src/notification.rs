use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::time::Instant;
use uuid::Uuid;

use crate::types::Kind;

/// Free-form payload attached to a notification. Never interpreted by the store.
pub type Payload = Map<String, Value>;

/// Opaque identifier assigned by the store when a notification is added.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First eight hex digits, enough to tell active notifications apart.
    pub fn short(&self) -> String {
        let mut simple = self.0.simple().to_string();
        simple.truncate(8);
        simple
    }

    /// Matches either the hyphenated or the simple form.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.to_ascii_lowercase();
        !prefix.is_empty()
            && (self.0.hyphenated().to_string().starts_with(&prefix)
                || self.0.simple().to_string().starts_with(&prefix))
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for NotificationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

pub type ActionCallback = Arc<dyn Fn() + Send + Sync>;

/// Button shown on a notification. Invoking it always dismisses the notification.
///
/// A callback that needs the store should capture a
/// [`WeakNotificationStore`](crate::store::WeakNotificationStore); a full
/// handle would keep the store and its timers alive after every other handle
/// is gone.
#[derive(Clone)]
pub struct Action {
    label: String,
    callback: ActionCallback,
}

impl Action {
    pub fn new(label: impl Into<String>, callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            callback: Arc::new(callback),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn callback(&self) -> ActionCallback {
        Arc::clone(&self.callback)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// How long a new notification stays up before it expires on its own.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Expiry {
    /// Use the store's default duration at the time of `add`.
    #[default]
    Default,
    After(Duration),
    /// Stays until dismissed, evicted or cleared.
    Never,
}

/// Input to [`NotificationStore::add`](crate::store::NotificationStore::add).
#[derive(Clone, Debug)]
pub struct NewNotification {
    pub(crate) kind: Kind,
    pub(crate) message: String,
    pub(crate) title: Option<String>,
    pub(crate) expiry: Expiry,
    pub(crate) action: Option<Action>,
    pub(crate) data: Option<Payload>,
}

impl NewNotification {
    pub fn new(kind: Kind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            title: None,
            expiry: Expiry::Default,
            action: None,
            data: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Kind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Kind::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Kind::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Kind::Warning, message)
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.expiry = Expiry::After(duration);
        self
    }

    #[must_use]
    pub const fn with_expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = expiry;
        self
    }

    #[must_use]
    pub const fn sticky(self) -> Self {
        self.with_expiry(Expiry::Never)
    }

    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Payload) -> Self {
        self.data = Some(data);
        self
    }
}

/// Partial update merged into an existing notification.
///
/// Outer `None` leaves a field untouched; for optional fields an inner `None`
/// clears it.
#[derive(Clone, Debug, Default)]
pub struct NotificationPatch {
    pub(crate) message: Option<String>,
    pub(crate) title: Option<Option<String>>,
    pub(crate) kind: Option<Kind>,
    pub(crate) duration: Option<Option<Duration>>,
    pub(crate) action: Option<Option<Action>>,
    pub(crate) data: Option<Option<Payload>>,
}

impl NotificationPatch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(Some(title.into()));
        self
    }

    #[must_use]
    pub fn clear_title(mut self) -> Self {
        self.title = Some(None);
        self
    }

    #[must_use]
    pub const fn kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub const fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(Some(duration));
        self
    }

    #[must_use]
    pub const fn sticky(mut self) -> Self {
        self.duration = Some(None);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(Some(action));
        self
    }

    #[must_use]
    pub fn clear_action(mut self) -> Self {
        self.action = Some(None);
        self
    }

    #[must_use]
    pub fn data(mut self, data: Payload) -> Self {
        self.data = Some(Some(data));
        self
    }

    #[must_use]
    pub fn clear_data(mut self) -> Self {
        self.data = Some(None);
        self
    }
}

/// One active notification as held by the store.
#[derive(Clone, Debug)]
pub struct Notification {
    id: NotificationId,
    kind: Kind,
    message: String,
    title: Option<String>,
    duration: Option<Duration>,
    created_at: DateTime<Utc>,
    created: Instant,
    action: Option<Action>,
    data: Option<Payload>,
    exiting: bool,
}

impl Notification {
    pub(crate) fn create(input: NewNotification, default_duration: Duration) -> Self {
        let duration = match input.expiry {
            Expiry::Default => Some(default_duration),
            Expiry::After(duration) => Some(duration),
            Expiry::Never => None,
        };
        Self {
            id: NotificationId::generate(),
            kind: input.kind,
            message: input.message,
            title: input.title,
            duration,
            created_at: Utc::now(),
            created: Instant::now(),
            action: input.action,
            data: input.data,
            exiting: false,
        }
    }

    /// Merges `patch`, returning whether the duration changed.
    pub(crate) fn apply(&mut self, patch: NotificationPatch) -> bool {
        if let Some(message) = patch.message {
            self.message = message;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(action) = patch.action {
            self.action = action;
        }
        if let Some(data) = patch.data {
            self.data = data;
        }
        match patch.duration {
            Some(duration) if duration != self.duration => {
                self.duration = duration;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn mark_exiting(&mut self) {
        self.exiting = true;
    }

    pub const fn id(&self) -> NotificationId {
        self.id
    }

    pub const fn kind(&self) -> Kind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub const fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Monotonic creation instant, the reference point for expiry and progress.
    pub const fn created(&self) -> Instant {
        self.created
    }

    /// Instant at which the notification expires on its own, if it does.
    pub fn deadline(&self) -> Option<Instant> {
        self.duration.map(|duration| self.created + duration)
    }

    pub const fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub const fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub const fn data(&self) -> Option<&Payload> {
        self.data.as_ref()
    }

    /// Set once the notification has been dismissed and is waiting out its exit delay.
    pub const fn is_exiting(&self) -> bool {
        self.exiting
    }
}
