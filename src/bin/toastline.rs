#[path = "toastline/app.rs"]
mod app;
#[path = "toastline/cli.rs"]
mod cli;
#[path = "toastline/commands.rs"]
mod commands;

use std::error::Error as StdError;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = cli::Cli::parse_args();
    match app::run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            std::process::ExitCode::from(if err.is_user_error() { 2 } else { 1 })
        }
    }
}

fn report_error(err: &toastline::error::Error) {
    eprintln!("Error: {err}");
    let mut source: Option<&dyn StdError> = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}
