use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/stageplay/config.toml` or `~/.config/stageplay/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `STAGEPLAY__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub cover: CoverSettings,
    pub spread: SpreadSettings,
    pub playback: PlaybackSettings,
    pub staging: StagingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub audio_extensions: Vec<String>,
    /// File extensions considered cover art candidates.
    pub image_extensions: Vec<String>,
    /// Playlist formats accepted by `--playlist`.
    pub playlist_extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            audio_extensions: ["flac", "mp3", "ogg", "opus", "m4a", "alac", "wav", "aiff", "wv"]
                .into_iter()
                .map(String::from)
                .collect(),
            image_extensions: ["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif", "svg"]
                .into_iter()
                .map(String::from)
                .collect(),
            playlist_extensions: ["m3u", "m3u8", "pls", "cue"]
                .into_iter()
                .map(String::from)
                .collect(),
            follow_links: true,
        }
    }
}

impl LibrarySettings {
    pub fn is_audio(&self, path: &std::path::Path) -> bool {
        has_extension(path, &self.audio_extensions)
    }

    pub fn is_image(&self, path: &std::path::Path) -> bool {
        has_extension(path, &self.image_extensions)
    }

    pub fn is_playlist(&self, path: &std::path::Path) -> bool {
        has_extension(path, &self.playlist_extensions)
    }
}

fn has_extension(path: &std::path::Path, exts: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            exts.iter()
                .map(|e| e.trim().trim_start_matches('.'))
                .any(|e| !e.is_empty() && e.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoverSettings {
    /// Bucket-1 images below this pixel area lose to any non-tiny bucket-2 image.
    pub tiny_area: u64,
    /// A challenger within this percentage of the current best's area competes on
    /// scope and keyword instead of raw size.
    pub area_threshold_pct: u64,
    /// Width/height ratio bounds for an image to count as squarish.
    pub aspect_min: f64,
    pub aspect_max: f64,
    /// Album-name token overlap that admits an un-keyworded image to bucket 1.
    pub album_match_ratio: f64,
    /// File name the chosen cover is exposed under next to the staged audio.
    pub canonical_name: String,
}

impl Default for CoverSettings {
    fn default() -> Self {
        Self {
            tiny_area: 200_000,
            area_threshold_pct: 75,
            aspect_min: 0.9,
            aspect_max: 1.1,
            album_match_ratio: 0.75,
            canonical_name: "cover.png".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpreadSettings {
    /// Album count at which random mode switches from one big shuffle to album spread.
    pub threshold: usize,
    /// History window as a percentage of the album count.
    pub history_pct: usize,
    pub history_min: usize,
    pub history_max: usize,
    /// Seconds between library rescans. 0 disables rescans.
    pub rescan_interval_secs: u64,
    /// Override for the persisted recent-albums cache file.
    pub history_cache_path: Option<PathBuf>,
}

impl Default for SpreadSettings {
    fn default() -> Self {
        Self {
            threshold: 50,
            history_pct: 10,
            history_min: 20,
            history_max: 200,
            rescan_interval_secs: 3600,
            history_cache_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Player executable.
    pub player_bin: String,
    /// Extra player arguments, passed before the fixed flags.
    pub player_args: Vec<String>,
    /// Tracks kept staged ahead of the one currently playing.
    pub lookahead: usize,
    /// Control loop tick (milliseconds).
    pub poll_interval_ms: u64,
    /// Directory holding the per-run IPC socket.
    pub socket_dir: PathBuf,
    pub ipc_connect_attempts: u32,
    pub ipc_connect_delay_ms: u64,
    /// Read/write timeout for one IPC request (milliseconds).
    pub ipc_timeout_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            player_bin: "mpv".to_string(),
            player_args: Vec::new(),
            lookahead: 1,
            poll_interval_ms: 5_000,
            socket_dir: PathBuf::from("/tmp"),
            ipc_connect_attempts: 50,
            ipc_connect_delay_ms: 100,
            ipc_timeout_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StagingSettings {
    /// Base directory for the per-run scratch root. Falls back to
    /// `$STAGEPLAY_TMPDIR`, then `/dev/shm`, then the system temp dir.
    pub scratch_dir: Option<PathBuf>,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    /// Loudness the computed track gain aims for (LUFS).
    pub target_loudness_lufs: f64,
}

impl Default for StagingSettings {
    fn default() -> Self {
        Self {
            scratch_dir: None,
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            target_loudness_lufs: -18.0,
        }
    }
}
