use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Read a persisted recent-albums list, oldest first. A missing file is an
/// empty history.
pub fn load_history(path: &Path) -> io::Result<Vec<PathBuf>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    serde_json::from_str(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write the recent-albums list, oldest first, replacing the file atomically.
pub fn save_history<'a>(path: &Path, albums: impl IntoIterator<Item = &'a PathBuf>) -> io::Result<()> {
    let albums: Vec<&PathBuf> = albums.into_iter().collect();
    let json = serde_json::to_string_pretty(&albums).map_err(io::Error::other)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)
}
