use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use lofty::picture::{Picture, PictureType};
use lofty::prelude::*;
use tracing::debug;

use super::ffmpeg::non_empty;
use super::{ArtExtractor, Ffmpeg};

/// Scratch name of an extracted embedded picture.
pub const EMBEDDED_COVER_NAME: &str = "embedded-cover.png";

/// Extracts the front (or first) embedded picture with `lofty`, re-encoding it
/// as PNG. Files lofty cannot parse go through ffmpeg's first video frame.
pub struct EmbeddedArtExtractor {
    ffmpeg: Ffmpeg,
}

impl EmbeddedArtExtractor {
    pub fn new(ffmpeg: Ffmpeg) -> Self {
        Self { ffmpeg }
    }

    fn extract_with_ffmpeg(&self, audio: &Path, out: &Path) -> Option<()> {
        self.ffmpeg
            .run([
                OsStr::new("-loglevel"),
                OsStr::new("error"),
                OsStr::new("-nostdin"),
                OsStr::new("-y"),
                OsStr::new("-i"),
                audio.as_os_str(),
                OsStr::new("-map"),
                OsStr::new("0:v:0"),
                OsStr::new("-frames:v"),
                OsStr::new("1"),
                out.as_os_str(),
            ])
            .ok()?;
        non_empty(out).then_some(())
    }
}

fn pick_picture<'a>(pictures: &[&'a Picture]) -> Option<&'a Picture> {
    pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())
        .copied()
}

impl ArtExtractor for EmbeddedArtExtractor {
    fn extract(&self, audio: &Path, dest_dir: &Path) -> Option<PathBuf> {
        fs::create_dir_all(dest_dir).ok()?;
        let out = dest_dir.join(EMBEDDED_COVER_NAME);

        let written = match lofty::read_from_path(audio) {
            Ok(tagged) => {
                let pictures: Vec<&Picture> =
                    tagged.tags().iter().flat_map(|t| t.pictures()).collect();
                let picture = pick_picture(&pictures)?;
                match image::load_from_memory(picture.data())
                    .and_then(|img| img.save_with_format(&out, ImageFormat::Png))
                {
                    Ok(()) => Some(()),
                    Err(e) => {
                        debug!("embedded picture in {} is undecodable: {e}", audio.display());
                        None
                    }
                }
            }
            Err(e) => {
                debug!("lofty cannot read {}: {e}; trying ffmpeg", audio.display());
                self.extract_with_ffmpeg(audio, &out)
            }
        };

        if written.is_some() && non_empty(&out) {
            Some(out)
        } else {
            let _ = fs::remove_file(&out);
            None
        }
    }
}
