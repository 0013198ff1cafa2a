#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod display;
pub mod error;
pub mod notification;
pub mod store;
pub mod telemetry;
pub mod types;

pub type Result<T> = std::result::Result<T, error::Error>;
