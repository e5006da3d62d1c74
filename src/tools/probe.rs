use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use super::ImageProber;

/// Reads dimensions from the image header via the `image` crate and falls back
/// to `ffprobe` for formats it cannot parse.
pub struct SystemProber {
    ffprobe_bin: String,
}

impl SystemProber {
    pub fn new(ffprobe_bin: &str) -> Self {
        Self {
            ffprobe_bin: ffprobe_bin.to_string(),
        }
    }

    fn ffprobe_dimensions(&self, path: &Path) -> Option<(u32, u32)> {
        let output = Command::new(&self.ffprobe_bin)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "csv=s=x:p=0",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        parse_wxh(&String::from_utf8_lossy(&output.stdout))
    }
}

impl ImageProber for SystemProber {
    fn dimensions(&self, path: &Path) -> Option<(u32, u32)> {
        match image::image_dimensions(path) {
            Ok(dims) => Some(dims),
            Err(e) => {
                debug!("image probe fell back to ffprobe for {}: {e}", path.display());
                self.ffprobe_dimensions(path)
            }
        }
    }
}

/// Parse the first `WIDTHxHEIGHT` line of ffprobe's csv output.
fn parse_wxh(out: &str) -> Option<(u32, u32)> {
    let line = out.lines().next()?.trim();
    let (w, h) = line.split_once('x')?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}
