use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::config::LibrarySettings;
use crate::player::ControlCommand;

#[derive(Debug, Parser)]
#[command(name = "stageplay")]
#[command(about = "Stage tracks into scratch storage, pick cover art and feed mpv")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub play: PlayArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a control command to running players.
    Send {
        #[arg(value_enum)]
        action: ControlCommand,

        /// Only talk to this socket instead of every live one.
        #[arg(long)]
        socket: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RandomMode {
    /// Every track in the library.
    FullLibrary,
}

#[derive(Debug, Clone, Default, Args)]
pub struct PlayArgs {
    /// Play the library in random order.
    #[arg(long, value_enum)]
    pub random_mode: Option<RandomMode>,

    /// Library root. Required for random mode; enables multi-disc cover search otherwise.
    #[arg(long)]
    pub library: Option<PathBuf>,

    /// Play one album directory in path order.
    #[arg(long)]
    pub album: Option<PathBuf>,

    /// Play an m3u/m3u8/pls/cue playlist in file order.
    #[arg(long)]
    pub playlist: Option<PathBuf>,

    /// Compute track replay gain and let the player apply it.
    #[arg(long)]
    pub normalize: bool,

    /// Extra argument for the player (repeatable).
    #[arg(long = "mpv-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub mpv_args: Vec<String>,

    /// Keep the recently played albums window across runs.
    #[arg(long)]
    pub persist_recent_albums: bool,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("one mode is required: --random-mode full-library, --album or --playlist")]
    NoMode,
    #[error("only one of --random-mode, --album and --playlist may be given")]
    ConflictingModes,
    #[error("--library is required for --random-mode full-library")]
    LibraryRequired,
    #[error("directory not found: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("playlist file not found: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("unsupported playlist extension: {}", .0.display())]
    UnsupportedPlaylist(PathBuf),
}

/// A validated play mode with absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Random {
        library: PathBuf,
    },
    Album {
        album: PathBuf,
        /// Root used for multi-disc detection.
        library: PathBuf,
    },
    Playlist {
        file: PathBuf,
        library: Option<PathBuf>,
    },
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Random { .. } => "random",
            Mode::Album { .. } => "album",
            Mode::Playlist { .. } => "playlist",
        }
    }

    /// Library root used to find album folders around a track.
    pub fn library_root(&self) -> Option<PathBuf> {
        match self {
            Mode::Random { library } | Mode::Album { library, .. } => Some(library.clone()),
            Mode::Playlist { library, .. } => library.clone(),
        }
    }

    /// Root that diagnostic paths are shown relative to.
    pub fn display_root(&self) -> PathBuf {
        match self {
            Mode::Random { library } => library.clone(),
            Mode::Album { album, .. } => album.clone(),
            Mode::Playlist { file, .. } => file.parent().map(Path::to_path_buf).unwrap_or_default(),
        }
    }
}

fn existing_dir(path: &Path) -> Result<PathBuf, CliError> {
    match fs::canonicalize(path) {
        Ok(p) if p.is_dir() => Ok(p),
        _ => Err(CliError::NotADirectory(path.to_path_buf())),
    }
}

impl PlayArgs {
    /// Check the mode flags and resolve every path they name.
    pub fn mode(&self, library_settings: &LibrarySettings) -> Result<Mode, CliError> {
        let given = [
            self.random_mode.is_some(),
            self.album.is_some(),
            self.playlist.is_some(),
        ]
        .into_iter()
        .filter(|&g| g)
        .count();
        match given {
            0 => return Err(CliError::NoMode),
            1 => {}
            _ => return Err(CliError::ConflictingModes),
        }

        let library = self.library.as_deref().map(existing_dir).transpose()?;

        if self.random_mode.is_some() {
            let library = library.ok_or(CliError::LibraryRequired)?;
            return Ok(Mode::Random { library });
        }

        if let Some(album) = &self.album {
            let album = existing_dir(album)?;
            let library = library
                .filter(|lib| album.starts_with(lib) && album != *lib)
                .or_else(|| album.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| album.clone());
            return Ok(Mode::Album { album, library });
        }

        let file = self.playlist.as_deref().ok_or(CliError::NoMode)?;
        let resolved = match fs::canonicalize(file) {
            Ok(p) if p.is_file() => p,
            _ => return Err(CliError::NotAFile(file.to_path_buf())),
        };
        if !library_settings.is_playlist(&resolved) {
            return Err(CliError::UnsupportedPlaylist(file.to_path_buf()));
        }
        Ok(Mode::Playlist {
            file: resolved,
            library,
        })
    }
}
