use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use humantime::parse_duration;
use toastline::types::Position;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive a toast notification stack from stdin", long_about = None)]
pub struct Cli {
    /// Path of the TOML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Where the stack is anchored (e.g. "bottom-left").
    #[arg(long)]
    pub position: Option<Position>,

    /// Maximum number of notifications kept at once.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub max_visible: Option<usize>,

    /// Lifetime of notifications added without one (e.g. "5s").
    #[arg(long, value_parser = parse_duration)]
    pub default_duration: Option<Duration>,

    /// Progress refresh interval (e.g. "100ms").
    #[arg(long, value_parser = parse_duration)]
    pub tick: Option<Duration>,

    /// Exit as soon as stdin is exhausted instead of waiting for expiries.
    #[arg(long, action = ArgAction::SetTrue)]
    pub once: bool,

    /// Emit logs as JSON (`--features json-logs`).
    #[arg(long, action = ArgAction::SetTrue)]
    pub json_logs: bool,

    /// Explicit log filter (e.g. "toastline=debug").
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
