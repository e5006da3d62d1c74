use std::process;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use crate::cli::PlayArgs;
use crate::config::Settings;
use crate::player::{MpvProcess, PlayerLaunch, socket_path};
use crate::scheduler::LookaheadScheduler;
use crate::stage::TrackStager;
use crate::tools::Toolbox;

mod controller;
mod report;
mod settings;
mod startup;

use controller::PlaybackController;
use report::{Header, TerminalReport};
use startup::{StartupError, build_source, check_dependencies};

pub use settings::load_settings;

/// Start the player for an already validated play mode and drive it until
/// it exits or the content runs out.
pub fn run(args: &PlayArgs, settings: &Settings) -> anyhow::Result<()> {
    let mode = args.mode(&settings.library)?;
    check_dependencies(settings, args.normalize)?;

    let (source, summary) = build_source(&mode, settings, args.persist_recent_albums)
        .with_context(|| format!("cannot prepare {} mode", mode.name()))?;

    let pid = process::id();
    let scratch_root = startup::create_scratch_root(&startup::scratch_base(settings), pid)?;
    let socket = socket_path(&settings.playback.socket_dir, pid);

    Header {
        mode: &mode,
        summary,
        rescan_interval_secs: settings.spread.rescan_interval_secs,
        spread_threshold: settings.spread.threshold,
        socket: &socket,
        lookahead: settings.playback.lookahead,
        normalize: args.normalize,
    }
    .print();

    let mut extra_args = settings.playback.player_args.clone();
    extra_args.extend(args.mpv_args.iter().cloned());
    let launch = PlayerLaunch {
        bin: settings.playback.player_bin.clone(),
        extra_args,
        socket,
        normalize: args.normalize,
        connect_attempts: settings.playback.ipc_connect_attempts,
        connect_delay: Duration::from_millis(settings.playback.ipc_connect_delay_ms),
        timeout: Duration::from_millis(settings.playback.ipc_timeout_ms),
    };
    let player = match MpvProcess::spawn(&launch) {
        Ok(player) => player,
        Err(e) => {
            let _ = std::fs::remove_dir_all(&scratch_root);
            return Err(StartupError::from(e).into());
        }
    };

    let stager = TrackStager::new(
        scratch_root.clone(),
        mode.library_root(),
        args.normalize,
        settings,
        Toolbox::system(&settings.staging),
    );
    let scheduler = LookaheadScheduler::new(stager, source, settings.playback.lookahead);
    let mut controller = PlaybackController::new(
        player,
        scheduler,
        scratch_root,
        Duration::from_millis(settings.playback.poll_interval_ms),
        Box::new(TerminalReport::new(mode.display_root())),
    );

    info!(mode = mode.name(), tracks = summary.tracks, "starting playback");
    controller.run();
    Ok(())
}

#[cfg(test)]
mod tests;
