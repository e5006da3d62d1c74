use std::ffi::OsStr;
use std::path::Path;

use image::ImageFormat;
use tracing::debug;

use super::ffmpeg::non_empty;
use super::{CoverTranscoder, Ffmpeg, ToolError};

/// Decodes with the `image` crate and writes PNG; anything it cannot decode
/// (svg, odd tiff variants) is handed to ffmpeg.
pub struct ImageTranscoder {
    ffmpeg: Ffmpeg,
}

impl ImageTranscoder {
    pub fn new(ffmpeg: Ffmpeg) -> Self {
        Self { ffmpeg }
    }
}

impl CoverTranscoder for ImageTranscoder {
    fn to_png(&self, src: &Path, dest: &Path) -> Result<(), ToolError> {
        match image::open(src).and_then(|img| img.save_with_format(dest, ImageFormat::Png)) {
            Ok(()) => return Ok(()),
            Err(e) => debug!("image transcode of {} failed, trying ffmpeg: {e}", src.display()),
        }

        self.ffmpeg.run([
            OsStr::new("-loglevel"),
            OsStr::new("error"),
            OsStr::new("-nostdin"),
            OsStr::new("-y"),
            OsStr::new("-i"),
            src.as_os_str(),
            OsStr::new("-frames:v"),
            OsStr::new("1"),
            dest.as_os_str(),
        ])?;
        if non_empty(dest) {
            Ok(())
        } else {
            Err(ToolError::Parse(format!("{} wrote no image", self.ffmpeg.bin())))
        }
    }
}
