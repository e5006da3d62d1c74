use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod cover;
mod library;
mod planner;
mod player;
mod runtime;
mod scheduler;
mod stage;
mod tools;

use cli::{Cli, CliError, Command};
use player::ControlCommand;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("STAGEPLAY_LOG").unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn send(action: ControlCommand, socket: Option<PathBuf>, settings: &config::Settings) -> ExitCode {
    let sockets = match socket {
        Some(socket) => vec![socket],
        None => player::find_sockets(&settings.playback.socket_dir),
    };
    if sockets.is_empty() {
        warn!(
            "no running player sockets in {}",
            settings.playback.socket_dir.display()
        );
        return ExitCode::FAILURE;
    }
    let timeout = Duration::from_millis(settings.playback.ipc_timeout_ms);
    if player::send_command(&sockets, action, timeout) > 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    let settings = runtime::load_settings();

    if let Some(Command::Send { action, socket }) = cli.command {
        return send(action, socket, &settings);
    }

    match runtime::run(&cli.play, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.downcast_ref::<CliError>().is_some() => {
            error!("{e}");
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
