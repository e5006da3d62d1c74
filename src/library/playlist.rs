use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::config::LibrarySettings;

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("unsupported playlist extension: {0}")]
    UnsupportedExtension(String),
    #[error("cannot read playlist {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaylistKind {
    M3u,
    Pls,
    Cue,
}

impl PlaylistKind {
    fn from_path(path: &Path) -> Result<Self, PlaylistError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "m3u" | "m3u8" => Ok(Self::M3u),
            "pls" => Ok(Self::Pls),
            "cue" => Ok(Self::Cue),
            _ => Err(PlaylistError::UnsupportedExtension(ext)),
        }
    }
}

/// Read a playlist file and return its playable entries in file order.
///
/// Relative entries resolve against the playlist's directory. Entries that
/// exist but are not audio are skipped with a warning; missing ones are
/// skipped silently.
pub fn read_playlist(file: &Path, settings: &LibrarySettings) -> Result<Vec<PathBuf>, PlaylistError> {
    let kind = PlaylistKind::from_path(file)?;
    let bytes = fs::read(file).map_err(|source| PlaylistError::Read {
        path: file.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let base = file.parent().unwrap_or_else(|| Path::new("."));

    let mut tracks = Vec::new();
    for line in text.lines() {
        let line = line.trim_start_matches('\u{feff}').trim_end_matches('\r');
        let Some(entry) = parse_entry(kind, line) else {
            continue;
        };

        let path = resolve_entry(base, entry);
        if !path.is_file() {
            continue;
        }
        if settings.is_audio(&path) {
            tracks.push(path);
        } else {
            warn!("skipping non-audio entry in playlist: {}", path.display());
        }
    }
    Ok(tracks)
}

fn parse_entry(kind: PlaylistKind, line: &str) -> Option<&str> {
    match kind {
        PlaylistKind::M3u => {
            if line.trim().is_empty() || line.starts_with('#') {
                None
            } else {
                Some(line)
            }
        }
        PlaylistKind::Pls => {
            let (key, value) = line.split_once('=')?;
            let index = key.strip_prefix("File")?;
            if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) || value.is_empty() {
                return None;
            }
            Some(value)
        }
        PlaylistKind::Cue => {
            let trimmed = line.trim_start();
            let keyword = trimmed.get(..4)?;
            if !keyword.eq_ignore_ascii_case("FILE") {
                return None;
            }
            let rest = trimmed[4..].trim_start().strip_prefix('"')?;
            let end = rest.find('"')?;
            Some(&rest[..end])
        }
    }
}

fn resolve_entry(base: &Path, entry: &str) -> PathBuf {
    let path = Path::new(entry);
    if path.is_absolute() || looks_like_drive_path(entry) {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn looks_like_drive_path(entry: &str) -> bool {
    let bytes = entry.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'\\'
}
