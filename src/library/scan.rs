use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::Album;

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn files_matching(dir: &Path, follow_links: bool, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(follow_links)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && keep(p))
        .collect();

    files.sort();
    files
}

/// Every audio file below `dir` (recursive), sorted by path.
pub fn audio_files(dir: &Path, settings: &LibrarySettings) -> Vec<PathBuf> {
    files_matching(dir, settings.follow_links, |p| settings.is_audio(p))
}

/// Every image file below `dir` (recursive), sorted by path.
pub fn image_files(dir: &Path, settings: &LibrarySettings) -> Vec<PathBuf> {
    files_matching(dir, settings.follow_links, |p| settings.is_image(p))
}

/// Build the album index: each direct child directory of `library` that
/// contains audio becomes one album. Albums come back sorted by path.
pub fn album_index(library: &Path, settings: &LibrarySettings) -> Vec<Album> {
    let entries = match fs::read_dir(library) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot read library {}: {e}", library.display());
            return Vec::new();
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir() && !is_hidden(p))
        .collect();
    dirs.sort();

    dirs.into_iter()
        .filter_map(|path| {
            let tracks = audio_files(&path, settings);
            if tracks.is_empty() {
                None
            } else {
                Some(Album { path, tracks })
            }
        })
        .collect()
}
