use std::env::VarError;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use ::config::builder::DefaultState;
use ::config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;

use crate::Result;
use crate::error::ConfigError;
use crate::store::StoreSettings;
use crate::types::Position;

use super::defaults::{
    default_duration, default_exit_delay, default_max_visible, default_position,
    default_queue_bound, default_tick,
};
use super::env::{env_duration, env_parse, env_string};
use super::{Config, HumantimeDuration, MAX_VISIBLE_BOUNDS};

pub(super) fn load(path: impl AsRef<Path>) -> std::result::Result<RawConfig, ConfigError> {
    let builder = ::config::Config::builder()
        .add_source(File::from(path.as_ref()).required(false))
        .add_source(
            Environment::with_prefix("TOASTLINE")
                .separator("__")
                .try_parsing(true),
        );
    build(builder)
}

pub(super) fn build(
    builder: ConfigBuilder<DefaultState>,
) -> std::result::Result<RawConfig, ConfigError> {
    builder
        .build()
        .map_err(|err| ConfigError::Other(err.to_string()))?
        .try_deserialize()
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub(super) store: RawStore,
    #[serde(default)]
    pub(super) display: RawDisplay,
    #[serde(default)]
    pub(super) app: RawApp,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(super) struct RawStore {
    #[serde(default = "default_position")]
    pub(super) position: String,
    #[serde(default = "default_max_visible")]
    pub(super) max_visible: usize,
    #[serde(default = "default_duration")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) default_duration: Duration,
    #[serde(default = "default_exit_delay")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) exit_delay: Duration,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(super) struct RawDisplay {
    #[serde(default = "default_tick")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) tick: Duration,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawApp {
    #[serde(default = "default_queue_bound")]
    pub(super) queue_bound: usize,
}

impl RawConfig {
    pub(super) fn apply_env_overrides(&mut self) -> std::result::Result<(), ConfigError> {
        self.apply_overrides(|key: &str| std::env::var(key))
    }

    pub(super) fn apply_overrides<F>(&mut self, lookup: F) -> std::result::Result<(), ConfigError>
    where
        F: Fn(&str) -> std::result::Result<String, VarError>,
    {
        if let Some(position) = env_string(&lookup, "TOASTLINE_POSITION")? {
            self.store.position = position;
        }
        if let Some(max_visible) = env_parse::<usize, _>(&lookup, "TOASTLINE_MAX_VISIBLE")? {
            self.store.max_visible = max_visible;
        }
        if let Some(duration) = env_duration(&lookup, "TOASTLINE_DEFAULT_DURATION")? {
            self.store.default_duration = duration;
        }
        if let Some(delay) = env_duration(&lookup, "TOASTLINE_EXIT_DELAY")? {
            self.store.exit_delay = delay;
        }
        if let Some(tick) = env_duration(&lookup, "TOASTLINE_TICK")? {
            self.display.tick = tick;
        }
        if let Some(queue) = env_parse::<usize, _>(&lookup, "TOASTLINE_QUEUE_BOUND")? {
            self.app.queue_bound = queue;
        }
        Ok(())
    }

    pub(super) fn validate_and_build(self) -> Result<Config> {
        let position =
            Position::from_str(&self.store.position).map_err(|err| ConfigError::InvalidField {
                field: "store.position",
                message: err,
            })?;

        if !MAX_VISIBLE_BOUNDS.contains(&self.store.max_visible) {
            return Err(ConfigError::InvalidField {
                field: "store.max_visible",
                message: format!(
                    "expected between {} and {}, got {}",
                    MAX_VISIBLE_BOUNDS.start(),
                    MAX_VISIBLE_BOUNDS.end(),
                    self.store.max_visible
                ),
            }
            .into());
        }
        if self.display.tick.is_zero() {
            return Err(ConfigError::InvalidField {
                field: "display.tick",
                message: "tick interval must be greater than zero".to_string(),
            }
            .into());
        }
        if self.app.queue_bound == 0 {
            return Err(ConfigError::InvalidField {
                field: "app.queue_bound",
                message: "queue bound must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(Config {
            store: StoreSettings {
                position,
                max_visible: self.store.max_visible,
                default_duration: self.store.default_duration,
                exit_delay: self.store.exit_delay,
            },
            tick: self.display.tick,
            queue_capacity: self.app.queue_bound,
        })
    }
}

impl Default for RawStore {
    fn default() -> Self {
        Self {
            position: default_position(),
            max_visible: default_max_visible(),
            default_duration: default_duration(),
            exit_delay: default_exit_delay(),
        }
    }
}

impl Default for RawDisplay {
    fn default() -> Self {
        Self {
            tick: default_tick(),
        }
    }
}

impl Default for RawApp {
    fn default() -> Self {
        Self {
            queue_bound: default_queue_bound(),
        }
    }
}
