use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::{debug, info};

use crate::cli::Mode;
use crate::config::{self, Settings};
use crate::library::{PlaylistError, album_index, audio_files, read_playlist};
use crate::planner::AlbumSpreadPlanner;
use crate::player::LaunchError;
use crate::scheduler::TrackSource;
use crate::tools::which;

/// Conditions that stop a run before playback begins.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("required tool not found: {0}")]
    MissingTool(String),
    #[error("no playable tracks found")]
    NoTracks,
    #[error("cannot create scratch directory {}: {source}", path.display())]
    Scratch { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error(transparent)]
    Playlist(#[from] PlaylistError),
}

/// The player is always required, ffmpeg only when gain is computed.
/// ffprobe is optional: the `image` crate covers most probes on its own.
pub fn check_dependencies(settings: &Settings, normalize: bool) -> Result<(), StartupError> {
    let mut required = vec![settings.playback.player_bin.as_str()];
    if normalize {
        required.push(settings.staging.ffmpeg_bin.as_str());
    }
    for bin in required {
        if which(bin).is_none() {
            return Err(StartupError::MissingTool(bin.to_string()));
        }
    }
    if which(&settings.staging.ffprobe_bin).is_none() {
        debug!("{} not found, probing images in-process only", settings.staging.ffprobe_bin);
    }
    Ok(())
}

/// Directory the per-run scratch root goes under.
pub fn scratch_base(settings: &Settings) -> PathBuf {
    if let Some(dir) = &settings.staging.scratch_dir {
        return dir.clone();
    }
    if let Some(dir) = env::var_os("STAGEPLAY_TMPDIR") {
        return PathBuf::from(dir);
    }
    let shm = Path::new("/dev/shm");
    if shm.is_dir() {
        return shm.to_path_buf();
    }
    env::temp_dir()
}

/// Create `<base>/stageplay-<pid>`, removing a stale one left by a previous
/// run with the same pid.
pub fn create_scratch_root(base: &Path, pid: u32) -> Result<PathBuf, StartupError> {
    let root = base.join(format!("stageplay-{pid}"));
    if root.exists() {
        let _ = fs::remove_dir_all(&root);
    }
    fs::create_dir_all(&root).map_err(|source| StartupError::Scratch {
        path: root.clone(),
        source,
    })?;
    Ok(root)
}

/// Facts about the chosen source, shown in the startup header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceSummary {
    pub tracks: usize,
    pub albums: usize,
    pub history_window: usize,
    pub spread: bool,
}

/// Build the track source for `mode`. Random mode switches to album spread
/// once the library has enough albums, otherwise it is one big shuffle.
pub fn build_source(
    mode: &Mode,
    settings: &Settings,
    persist_recent_albums: bool,
) -> Result<(TrackSource, SourceSummary), StartupError> {
    let (source, summary) = match mode {
        Mode::Random { library } => {
            let albums = album_index(library, &settings.library);
            let album_count = albums.len();
            if album_count >= settings.spread.threshold.max(1) {
                let mut planner = AlbumSpreadPlanner::with_albums(
                    library,
                    albums,
                    &settings.library,
                    &settings.spread,
                    StdRng::from_rng(&mut rand::rng()),
                    Instant::now(),
                );
                if persist_recent_albums {
                    let cache = settings
                        .spread
                        .history_cache_path
                        .clone()
                        .or_else(config::default_history_cache_path);
                    if let Some(cache) = cache {
                        planner = planner.with_cache(cache);
                    }
                }
                let summary = SourceSummary {
                    tracks: planner.track_count(),
                    albums: album_count,
                    history_window: planner.history_window(),
                    spread: true,
                };
                info!(albums = album_count, "album spread enabled");
                (TrackSource::spread(planner), summary)
            } else {
                let mut tracks = audio_files(library, &settings.library);
                tracks.shuffle(&mut rand::rng());
                let summary = SourceSummary {
                    tracks: tracks.len(),
                    albums: album_count,
                    ..SourceSummary::default()
                };
                (TrackSource::listed(tracks), summary)
            }
        }
        Mode::Album { album, .. } => {
            let tracks = audio_files(album, &settings.library);
            let summary = SourceSummary {
                tracks: tracks.len(),
                albums: 1,
                ..SourceSummary::default()
            };
            (TrackSource::listed(tracks), summary)
        }
        Mode::Playlist { file, .. } => {
            let tracks = read_playlist(file, &settings.library)?;
            let summary = SourceSummary {
                tracks: tracks.len(),
                ..SourceSummary::default()
            };
            (TrackSource::listed(tracks), summary)
        }
    };

    if summary.tracks == 0 || !source.has_more() {
        return Err(StartupError::NoTracks);
    }
    Ok((source, summary))
}
