use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use crate::Result;
use crate::error::Error as ToastError;
use crate::store::StoreSettings;

mod defaults;
mod env;
mod raw;
mod serde;

use serde::HumantimeDuration;

pub const MAX_VISIBLE_BOUNDS: RangeInclusive<usize> = 1..=100;

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreSettings,
    /// Progress refresh interval while a notification counts down.
    pub tick: Duration,
    /// Bound of the command queue feeding the store.
    pub queue_capacity: usize,
}

impl Config {
    /// Load configuration from a TOML file and the environment.
    ///
    /// A missing file is not an error; every field has a default.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be parsed, when environment
    /// overrides are invalid, or when the resulting values fail validation.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut raw = raw::load(path).map_err(ToastError::from)?;
        raw.apply_env_overrides().map_err(ToastError::from)?;
        raw.validate_and_build()
    }

    /// Parse configuration from TOML text alone, without the environment.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env_and_file`], minus the environment.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let builder = ::config::Config::builder()
            .add_source(::config::File::from_str(text, ::config::FileFormat::Toml));
        raw::build(builder)
            .map_err(ToastError::from)?
            .validate_and_build()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            tick: defaults::default_tick(),
            queue_capacity: defaults::default_queue_bound(),
        }
    }
}
