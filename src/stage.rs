//! Per-track staging: copy a source track into its own scratch slot, clean up
//! its tags, optionally add a track gain and expose one canonical cover.

mod stager;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::tools::TrackGain;

pub use stager::TrackStager;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("cannot create scratch slot {}: {source}", dir.display())]
    Slot { dir: PathBuf, source: io::Error },
    #[error("cannot copy {}: {source}", path.display())]
    Copy { path: PathBuf, source: io::Error },
}

/// A track materialised under the scratch root, ready for the player.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedTrack {
    /// Playlist slot this track occupies in the player.
    pub slot: usize,
    pub source: PathBuf,
    /// The staged audio copy handed to the player.
    pub audio: PathBuf,
    /// Slot directory owning every file of this track.
    pub dir: PathBuf,
    pub gain: Option<TrackGain>,
    pub cover: Option<PathBuf>,
    /// Ranked cover candidate listing for diagnostics.
    pub cover_listing: Vec<String>,
}

impl StagedTrack {
    /// Remove the slot directory and everything in it.
    pub fn destroy(self) {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("cannot remove {}: {e}", self.dir.display()),
        }
    }
}

/// Anything that can turn a source track into a [`StagedTrack`].
pub trait Stage {
    fn stage(&mut self, slot: usize, source: &Path) -> Result<StagedTrack, StageError>;
}
