//! Line-oriented commands read from stdin.

use std::io::BufRead;
use std::str::FromStr;

use async_channel::Sender;
use humantime::parse_duration;
use thiserror::Error;
use toastline::notification::Expiry;
use toastline::types::{Kind, Position};
use tracing::warn;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Add(AddCommand),
    Update { target: String, message: String },
    Remove(String),
    Dismiss(String),
    Action(String),
    Clear,
    Position(Position),
    Max(usize),
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub struct AddCommand {
    pub kind: Kind,
    pub expiry: Expiry,
    pub title: Option<String>,
    pub action: Option<String>,
    pub message: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("invalid {what}: {message}")]
    Invalid { what: &'static str, message: String },
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandError::Empty)?;
        match verb.to_ascii_lowercase().as_str() {
            "add" => parse_add(words).map(Self::Add),
            "update" => {
                let target = target(&mut words)?;
                let message = rest(words).ok_or(CommandError::Missing("message"))?;
                Ok(Self::Update { target, message })
            }
            "remove" | "rm" => target(&mut words).map(Self::Remove),
            "dismiss" | "close" => target(&mut words).map(Self::Dismiss),
            "action" => target(&mut words).map(Self::Action),
            "clear" => Ok(Self::Clear),
            "position" => {
                let raw = words.next().ok_or(CommandError::Missing("position"))?;
                Position::from_str(raw)
                    .map(Self::Position)
                    .map_err(|message| CommandError::Invalid {
                        what: "position",
                        message,
                    })
            }
            "max" => {
                let raw = words.next().ok_or(CommandError::Missing("count"))?;
                raw.parse()
                    .map(Self::Max)
                    .map_err(|err: std::num::ParseIntError| CommandError::Invalid {
                        what: "count",
                        message: err.to_string(),
                    })
            }
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_add<'a>(mut words: impl Iterator<Item = &'a str>) -> Result<AddCommand, CommandError> {
    let raw_kind = words.next().ok_or(CommandError::Missing("kind"))?;
    let kind = Kind::from_str(raw_kind).map_err(|message| CommandError::Invalid {
        what: "kind",
        message,
    })?;

    let mut expiry = Expiry::Default;
    let mut title = None;
    let mut action = None;
    let mut message = Vec::new();
    while let Some(word) = words.next() {
        if !message.is_empty() {
            message.push(word);
            continue;
        }
        match word {
            "--for" => {
                let raw = words.next().ok_or(CommandError::Missing("duration"))?;
                let duration = parse_duration(raw).map_err(|err| CommandError::Invalid {
                    what: "duration",
                    message: err.to_string(),
                })?;
                expiry = Expiry::After(duration);
            }
            "--sticky" => expiry = Expiry::Never,
            "--title" => {
                title = Some(words.next().ok_or(CommandError::Missing("title"))?.to_string());
            }
            "--action" => {
                action = Some(words.next().ok_or(CommandError::Missing("action label"))?.to_string());
            }
            _ => message.push(word),
        }
    }
    if message.is_empty() {
        return Err(CommandError::Missing("message"));
    }

    Ok(AddCommand {
        kind,
        expiry,
        title,
        action,
        message: message.join(" "),
    })
}

fn target<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<String, CommandError> {
    words
        .next()
        .map(str::to_string)
        .ok_or(CommandError::Missing("notification id"))
}

fn rest<'a>(words: impl Iterator<Item = &'a str>) -> Option<String> {
    let joined = words.collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}

/// Parses `input` line by line and forwards commands until EOF or until the
/// receiving side is gone. Blank lines and `#` comments are skipped.
///
/// Runs on a plain thread: blocking reads on stdin would otherwise hold the
/// runtime open at shutdown.
pub fn read_commands(input: impl BufRead, tx: &Sender<Command>) -> usize {
    let mut forwarded = 0;
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "failed to read command input");
                break;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match trimmed.parse::<Command>() {
            Ok(command) => {
                if tx.send_blocking(command).is_err() {
                    break;
                }
                forwarded += 1;
            }
            Err(err) => warn!(error = %err, line = trimmed, "ignoring malformed command"),
        }
    }
    tx.close();
    forwarded
}
