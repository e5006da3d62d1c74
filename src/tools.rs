//! Narrow seams around the external tools and libraries the staging pipeline
//! relies on: image probing, embedded-art extraction, cover transcoding, tag
//! editing, demux stripping, loudness measurement and plain file copies.
//!
//! The pipeline only ever talks to the traits below, so tests can swap in
//! fakes and never spawn a process.

mod copy;
mod extract;
mod ffmpeg;
mod loudness;
mod probe;
mod tags;
mod transcode;
mod which;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;

use crate::config::StagingSettings;

pub use copy::StdCopier;
pub use extract::EmbeddedArtExtractor;
pub use ffmpeg::{Ffmpeg, FfmpegStripper};
pub use loudness::{FfmpegLoudness, Loudness, TrackGain};
pub use probe::SystemProber;
pub use tags::LoftyTagEditor;
pub use transcode::ImageTranscoder;
pub use which::which;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("failed to run {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error(transparent)]
    Tag(#[from] lofty::error::LoftyError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("unexpected tool output: {0}")]
    Parse(String),
    #[error("operation not supported for {0}")]
    Unsupported(PathBuf),
}

/// Reads pixel dimensions of an image file.
pub trait ImageProber {
    fn dimensions(&self, path: &Path) -> Option<(u32, u32)>;
}

/// Pulls the first embedded picture out of an audio file into `dest_dir`.
/// Returns the written file, or `None` when there is nothing to extract.
pub trait ArtExtractor {
    fn extract(&self, audio: &Path, dest_dir: &Path) -> Option<PathBuf>;
}

/// Re-encodes an image as PNG.
pub trait CoverTranscoder {
    fn to_png(&self, src: &Path, dest: &Path) -> Result<(), ToolError>;
}

/// Format-aware tag editing, used only for files it `supports`.
pub trait TagEditor {
    fn supports(&self, path: &Path) -> bool;
    fn strip_pictures(&self, path: &Path) -> Result<(), ToolError>;
    fn strip_replay_gain(&self, path: &Path) -> Result<(), ToolError>;
    fn write_track_gain(&self, path: &Path, gain: &TrackGain) -> Result<(), ToolError>;
}

/// Drops video/attachment streams from a file while keeping audio and metadata.
pub trait StreamStripper {
    fn strip_attachments(&self, path: &Path) -> Result<(), ToolError>;
}

pub trait LoudnessAnalyzer {
    fn measure(&self, path: &Path) -> Result<Loudness, ToolError>;
}

pub trait FileCopier {
    fn copy(&self, src: &Path, dest: &Path) -> io::Result<()>;
}

/// The full set of tools handed to the stager.
pub struct Toolbox {
    pub prober: Box<dyn ImageProber>,
    pub extractor: Box<dyn ArtExtractor>,
    pub transcoder: Box<dyn CoverTranscoder>,
    pub tags: Box<dyn TagEditor>,
    pub stripper: Box<dyn StreamStripper>,
    pub loudness: Box<dyn LoudnessAnalyzer>,
    pub copier: Box<dyn FileCopier>,
}

impl Toolbox {
    /// Production tools: `image` and `lofty` in-process, with `ffmpeg` and
    /// `ffprobe` as fallbacks.
    pub fn system(settings: &StagingSettings) -> Self {
        let ffmpeg = Ffmpeg::new(&settings.ffmpeg_bin);
        Self {
            prober: Box::new(SystemProber::new(&settings.ffprobe_bin)),
            extractor: Box::new(EmbeddedArtExtractor::new(ffmpeg.clone())),
            transcoder: Box::new(ImageTranscoder::new(ffmpeg.clone())),
            tags: Box::new(LoftyTagEditor),
            stripper: Box::new(FfmpegStripper::new(ffmpeg.clone())),
            loudness: Box::new(FfmpegLoudness::new(ffmpeg)),
            copier: Box::new(StdCopier),
        }
    }
}
