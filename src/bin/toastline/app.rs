use std::io;
use std::path::PathBuf;
use std::thread;

use async_channel::bounded;
use tokio::signal;
use toastline::Result;
use toastline::config::{Config, MAX_VISIBLE_BOUNDS};
use toastline::display::ProgressTicker;
use toastline::error::{ConfigError, Error as ToastError};
use toastline::notification::{Action, NewNotification, NotificationId, NotificationPatch};
use toastline::store::{ActionOutcome, NotificationStore};
use toastline::telemetry::init_tracing;
use tracing::{debug, info, warn};

use super::cli::Cli;
use super::commands::{AddCommand, Command, read_commands};

const DEFAULT_CONFIG: &str = "toastline.toml";

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.log_filter.as_deref(), cli.json_logs)?;

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = Config::from_env_and_file(&config_path)?;
    apply_cli_overrides(&cli, &mut config)?;

    let store = NotificationStore::new(config.store.clone())?;
    info!(
        position = %config.store.position,
        max_visible = config.store.max_visible,
        "notification store ready"
    );

    let (tx, rx) = bounded(config.queue_capacity);
    thread::spawn(move || read_commands(io::stdin().lock(), &tx));

    let mut ticker = ProgressTicker::new(&store, config.tick);
    let mut input_open = true;
    let mut last_frame = String::new();

    loop {
        tokio::select! {
            biased;
            _ = signal::ctrl_c() => {
                info!("shutdown signal received, stopping loop");
                break;
            }
            command = rx.recv(), if input_open => match command {
                Ok(Command::Quit) => break,
                Ok(command) => execute(&store, command),
                Err(_) => {
                    input_open = false;
                    if cli.once {
                        break;
                    }
                    debug!("input closed, waiting for pending expiries");
                }
            },
            frame = ticker.next_frame() => {
                let Some(frame) = frame else { break };
                let rendered = frame.render(true);
                if rendered != last_frame {
                    println!("{rendered}");
                    last_frame = rendered;
                }
            }
        }

        if !input_open && !has_pending_expiry(&store) {
            break;
        }
    }

    rx.close();
    let remaining = store.len();
    store.dispose();
    info!(remaining, "notification store disposed");
    Ok(())
}

fn apply_cli_overrides(cli: &Cli, config: &mut Config) -> Result<()> {
    if let Some(position) = cli.position {
        config.store.position = position;
    }
    if let Some(max_visible) = cli.max_visible {
        if !MAX_VISIBLE_BOUNDS.contains(&max_visible) {
            return Err(ToastError::from(ConfigError::InvalidField {
                field: "cli.max_visible",
                message: format!(
                    "value must be between {} and {}",
                    MAX_VISIBLE_BOUNDS.start(),
                    MAX_VISIBLE_BOUNDS.end()
                ),
            }));
        }
        config.store.max_visible = max_visible;
    }
    if let Some(duration) = cli.default_duration {
        config.store.default_duration = duration;
    }
    if let Some(tick) = cli.tick {
        if tick.is_zero() {
            return Err(ToastError::from(ConfigError::InvalidField {
                field: "cli.tick",
                message: "tick interval must be greater than zero".to_string(),
            }));
        }
        config.tick = tick;
    }
    Ok(())
}

pub(super) fn execute(store: &NotificationStore, command: Command) {
    match command {
        Command::Add(add) => {
            let id = store.add(build_notification(add));
            info!(%id, short = %id.short(), "notification queued");
        }
        Command::Update { target, message } => {
            if let Some(id) = resolve(store, &target) {
                store.update(&id, NotificationPatch::new().message(message));
            }
        }
        Command::Remove(target) => {
            if let Some(id) = resolve(store, &target) {
                store.remove(&id);
            }
        }
        Command::Dismiss(target) => {
            if let Some(id) = resolve(store, &target) {
                store.dismiss(&id);
            }
        }
        Command::Action(target) => {
            if let Some(id) = resolve(store, &target) {
                match store.invoke_action(&id) {
                    ActionOutcome::Invoked | ActionOutcome::Missing => {}
                    ActionOutcome::NoAction => {
                        warn!(%id, "notification has no action; dismissed");
                    }
                    ActionOutcome::Panicked => {
                        warn!(%id, "notification action failed; dismissed");
                    }
                }
            }
        }
        Command::Clear => store.clear_all(),
        Command::Position(position) => store.set_position(position),
        Command::Max(max_visible) => store.set_max_visible(max_visible),
        Command::Quit => {}
    }
}

fn build_notification(add: AddCommand) -> NewNotification {
    let mut input = NewNotification::new(add.kind, add.message).with_expiry(add.expiry);
    if let Some(title) = add.title {
        input = input.with_title(title);
    }
    if let Some(label) = add.action {
        let logged = label.clone();
        input = input.with_action(Action::new(label, move || {
            info!(label = %logged, "notification action triggered");
        }));
    }
    input
}

fn resolve(store: &NotificationStore, target: &str) -> Option<NotificationId> {
    let id = store.resolve_prefix(target);
    if id.is_none() {
        warn!(target, "no single active notification matches");
    }
    id
}

fn has_pending_expiry(store: &NotificationStore) -> bool {
    store
        .snapshot()
        .notifications()
        .iter()
        .any(|n| n.duration().is_some() || n.is_exiting())
}

#[cfg(test)]
mod tests {
    use super::super::commands::Command;
    use super::{apply_cli_overrides, execute, has_pending_expiry};
    use super::super::cli::Cli;
    use clap::Parser;
    use std::time::Duration;
    use toastline::config::Config;
    use toastline::store::{NotificationStore, StoreSettings};
    use toastline::types::Position;

    fn run_script(store: &NotificationStore, script: &str) {
        for line in script.lines().filter(|l| !l.trim().is_empty()) {
            match line.parse::<Command>() {
                Ok(command) => execute(store, command),
                Err(err) => panic!("bad script line {line:?}: {err}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_session_drives_the_store() {
        let store = NotificationStore::new(StoreSettings::default()).unwrap();
        run_script(
            &store,
            "add success --for 1s --title Booked Hotel confirmed\n\
             add info --sticky --action Undo Cart saved\n\
             position bottom-left\n",
        );
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.position(), Position::BottomLeft);
        assert!(has_pending_expiry(&store));

        let sticky = snapshot.notifications()[1].id();
        let prefix = sticky.short();
        run_script(&store, &format!("update {prefix} Cart restored"));
        assert_eq!(store.get(&sticky).map(|n| n.message().to_string()).as_deref(), Some("Cart restored"));

        run_script(&store, &format!("action {prefix}"));
        assert!(store.get(&sticky).is_none());

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert!(store.is_empty());
        assert!(!has_pending_expiry(&store));
    }

    #[tokio::test]
    async fn unknown_targets_are_ignored() {
        let store = NotificationStore::new(StoreSettings::default()).unwrap();
        run_script(&store, "add info hi\nremove ffffffffffff\nmax 1\n");
        assert_eq!(store.len(), 1);
        assert_eq!(store.max_visible(), 1);
    }

    #[test]
    fn cli_overrides_are_validated() {
        let mut config = Config::default();
        let cli = Cli::parse_from(["toastline", "--max-visible", "0"]);
        assert!(apply_cli_overrides(&cli, &mut config).is_err());

        let cli = Cli::parse_from(["toastline", "--position", "top-center", "--tick", "50ms"]);
        assert!(apply_cli_overrides(&cli, &mut config).is_ok());
        assert_eq!(config.store.position, Position::TopCenter);
        assert_eq!(config.tick, Duration::from_millis(50));
    }
}
