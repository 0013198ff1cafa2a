use std::time::Duration;

use crate::display::DEFAULT_TICK;
use crate::store::{DEFAULT_DURATION, DEFAULT_EXIT_DELAY, DEFAULT_MAX_VISIBLE};

pub(super) fn default_position() -> String {
    "top-right".to_string()
}

pub(super) const fn default_max_visible() -> usize {
    DEFAULT_MAX_VISIBLE
}

pub(super) const fn default_duration() -> Duration {
    DEFAULT_DURATION
}

pub(super) const fn default_exit_delay() -> Duration {
    DEFAULT_EXIT_DELAY
}

pub(super) const fn default_tick() -> Duration {
    DEFAULT_TICK
}

pub(super) const fn default_queue_bound() -> usize {
    64
}
