use std::path::PathBuf;

/// A directory directly under the library root holding at least one audio
/// file somewhere below it. Identity is the directory path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub path: PathBuf,
    /// Member tracks, sorted by path.
    pub tracks: Vec<PathBuf>,
}

impl Album {
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}
