use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::config::LibrarySettings;
use crate::library::image_files;
use crate::tools::ArtExtractor;

use super::candidate::{CandidateSource, Scope};
use super::tokens::is_disc_folder_name;

/// Where to look for a track's cover art.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverQuery {
    /// Folder holding the source track.
    pub track_dir: PathBuf,
    /// Album folder when the track sits below it (`Album/CD1`, `Album/Side A`).
    pub album_root: Option<PathBuf>,
    /// Name the album is known by, used for filename matching.
    pub album_name: String,
}

impl CoverQuery {
    /// Work out the search area for `track`. Inside `library` the album is
    /// the library child holding the track, and any deeper folder is one
    /// part of it. Outside a library only a disc-named folder (`CD2`,
    /// `Disc 1`) is taken as part of its parent album.
    pub fn for_track(track: &Path, library: Option<&Path>) -> Self {
        let track_dir = track.parent().map(Path::to_path_buf).unwrap_or_default();
        let folder = dir_name(&track_dir);

        let album_root = match library {
            Some(lib) if track.starts_with(lib) => library_album_root(track, lib),
            _ => track_dir
                .parent()
                .filter(|_| is_disc_folder_name(&folder))
                .map(Path::to_path_buf),
        }
        .filter(|root| *root != track_dir);

        let album_name = album_root.as_deref().map(dir_name).unwrap_or(folder);

        Self {
            track_dir,
            album_root,
            album_name,
        }
    }

    #[cfg(test)]
    pub fn is_multi_disc(&self) -> bool {
        self.album_root.is_some()
    }

    /// Classify an on-disk image found while scanning.
    pub fn scope_of(&self, image: &Path) -> Scope {
        if image.starts_with(&self.track_dir) {
            return Scope::Disc;
        }
        let Some(rel) = self
            .album_root
            .as_deref()
            .and_then(|root| image.strip_prefix(root).ok())
        else {
            return Scope::Disc;
        };

        let mut components = rel.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(first)), Some(_))
                if is_disc_folder_name(&first.to_string_lossy()) =>
            {
                Scope::OtherDisc
            }
            _ => Scope::AlbumRoot,
        }
    }
}

/// First child of `library` on the way to `track`; `None` for a track
/// lying loose in the library itself.
fn library_album_root(track: &Path, library: &Path) -> Option<PathBuf> {
    let rel = track.strip_prefix(library).ok()?;
    let mut components = rel.components();
    let first = components.next()?;
    components.next()?;
    Some(library.join(first))
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Gather every candidate image for one track: images in its own folder,
/// images anywhere under the album root for multi-disc albums, and at most
/// one picture extracted from the staged copy into `scratch_dir`.
///
/// The only write is the extracted picture.
pub fn collect_candidates(
    query: &CoverQuery,
    staged_audio: &Path,
    scratch_dir: &Path,
    library: &LibrarySettings,
    extractor: &dyn ArtExtractor,
) -> Vec<CandidateSource> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut out = Vec::new();

    let mut push = |path: PathBuf, query: &CoverQuery| {
        if seen.insert(path.clone()) {
            let scope = query.scope_of(&path);
            out.push(CandidateSource::new(path, scope));
        }
    };

    for image in image_files(&query.track_dir, library) {
        push(image, query);
    }
    if let Some(root) = &query.album_root {
        for image in image_files(root, library) {
            push(image, query);
        }
    }

    if let Some(embedded) = extractor.extract(staged_audio, scratch_dir) {
        out.push(CandidateSource::new(embedded, Scope::Embedded));
    }
    out
}
