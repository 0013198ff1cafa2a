//! Which notifications are shown, in what order, and how far along they are.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

use crate::notification::Notification;
use crate::store::{NotificationStore, Snapshot};
use crate::types::Position;

pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

const BAR_WIDTH: usize = 10;

/// A notification as presented, with its derived countdown.
#[derive(Debug, Clone)]
pub struct VisibleNotification {
    pub notification: Notification,
    /// Share of the duration still left, from 100 down to 0. `None` when the
    /// notification does not expire.
    pub remaining_percent: Option<f64>,
}

/// The visible part of a snapshot at one instant.
#[derive(Debug, Clone)]
pub struct Frame {
    pub position: Position,
    /// Most recent `max_visible` notifications, in insertion order.
    pub items: Vec<VisibleNotification>,
}

impl Frame {
    pub fn select(snapshot: &Snapshot, now: Instant) -> Self {
        let all = snapshot.notifications();
        let start = all.len().saturating_sub(snapshot.max_visible());
        let items = all[start..]
            .iter()
            .map(|notification| VisibleNotification {
                remaining_percent: remaining_percent(notification, now),
                notification: notification.clone(),
            })
            .collect();
        Self {
            position: snapshot.position(),
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items from the screen edge inwards. Bottom stacks are reversed so the
    /// newest notification sits nearest the edge.
    pub fn stacking_order(&self) -> Vec<&VisibleNotification> {
        if self.position.is_bottom() {
            self.items.iter().rev().collect()
        } else {
            self.items.iter().collect()
        }
    }

    /// Plain-text rendering, one line per notification in stacking order.
    pub fn render(&self, with_ids: bool) -> String {
        let mut lines = vec![self.position.to_string()];
        lines.extend(
            self.stacking_order()
                .into_iter()
                .map(|item| render_line(item, with_ids)),
        );
        lines.join("\n  ")
    }
}

fn render_line(item: &VisibleNotification, with_ids: bool) -> String {
    let n = &item.notification;
    let mut parts = Vec::new();
    if with_ids {
        parts.push(n.id().short());
    }
    parts.push(format!("[{}]", n.kind()));
    match n.title() {
        Some(title) => parts.push(format!("{title}: {}", n.message())),
        None => parts.push(n.message().to_string()),
    }
    if let Some(percent) = item.remaining_percent {
        parts.push(progress_bar(percent));
    }
    if let Some(action) = n.action() {
        parts.push(format!("<{}>", action.label()));
    }
    if n.is_exiting() {
        parts.push("(closing)".to_string());
    }
    parts.join(" ")
}

/// Countdown value for `notification` at `now`.
pub fn remaining_percent(notification: &Notification, now: Instant) -> Option<f64> {
    let duration = notification.duration()?;
    if duration.is_zero() {
        return Some(0.0);
    }
    let elapsed = now.saturating_duration_since(notification.created());
    let fraction = elapsed.as_secs_f64() / duration.as_secs_f64();
    Some((100.0 * (1.0 - fraction)).clamp(0.0, 100.0))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!(
        "[{}{}] {percent:.0}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled)
    )
}

/// Produces a fresh [`Frame`] whenever the store changes, and on every tick
/// while some visible notification is counting down.
pub struct ProgressTicker {
    updates: watch::Receiver<Snapshot>,
    ticks: Interval,
}

impl ProgressTicker {
    pub fn new(store: &NotificationStore, tick: Duration) -> Self {
        let tick = tick.max(Duration::from_millis(1));
        let mut ticks = interval_at(Instant::now() + tick, tick);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            updates: store.subscribe(),
            ticks,
        }
    }

    /// Waits for the next frame. Returns `None` once the store is gone.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        loop {
            tokio::select! {
                changed = self.updates.changed() => {
                    changed.ok()?;
                    break;
                }
                _ = self.ticks.tick() => {
                    if self.counting_down() {
                        break;
                    }
                }
            }
        }
        let snapshot = self.updates.borrow_and_update().clone();
        Some(Frame::select(&snapshot, Instant::now()))
    }

    fn counting_down(&self) -> bool {
        let snapshot = self.updates.borrow();
        let start = snapshot.len().saturating_sub(snapshot.max_visible());
        snapshot.notifications()[start..]
            .iter()
            .any(|n| n.duration().is_some())
    }
}
