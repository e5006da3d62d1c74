//! The external player: an `mpv` process driven over its JSON IPC socket.
//!
//! Everything behind [`Player`] is best-effort. Socket and protocol failures
//! come back as "no value" so the control loop simply retries on its next tick.

mod control;
mod ipc;
mod process;

#[cfg(test)]
pub mod fake;

use std::path::{Path, PathBuf};

pub use control::{ControlCommand, find_sockets, send_command};
pub use ipc::{IpcError, MpvIpc};
pub use process::{LaunchError, MpvProcess, PlayerLaunch, socket_path};

/// How a file is added to the player's playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Clear the playlist and play this file.
    Replace,
    /// Append, starting playback only if the player is idle.
    AppendPlay,
}

impl LoadMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadMode::Replace => "replace",
            LoadMode::AppendPlay => "append-play",
        }
    }
}

pub trait Player {
    fn clear_playlist(&mut self) -> bool;
    fn load(&mut self, path: &Path, mode: LoadMode) -> bool;
    /// Zero-based playlist index of the current entry, if known.
    fn playlist_pos(&mut self) -> Option<usize>;
    /// Replay gain of the current track in dB, as the player sees it.
    fn track_gain(&mut self) -> Option<f64>;
    fn current_path(&mut self) -> Option<PathBuf>;
    fn has_exited(&mut self) -> bool;
    /// Wait for the player to go away and release its endpoint.
    fn shutdown(&mut self);
}
