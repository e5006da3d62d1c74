//! Track sources: library scans, album indexing and playlist files.
//!
//! Everything here is read-only with respect to the library; callers get
//! absolute track paths and never a handle that could write back.

mod model;
mod playlist;
mod scan;

pub use model::Album;
pub use playlist::{PlaylistError, read_playlist};
pub use scan::{album_index, audio_files, image_files};
