use std::fs;
use std::io;
use std::path::Path;

use super::FileCopier;

/// Byte-for-byte copy, creating the destination directory as needed.
pub struct StdCopier;

impl FileCopier for StdCopier {
    fn copy(&self, src: &Path, dest: &Path) -> io::Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dest)?;
        Ok(())
    }
}
