use std::fs;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde_json::Value;
use tracing::debug;

use super::MpvIpc;

/// Remote control actions for a running player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ControlCommand {
    /// Toggle pause.
    Pause,
    Next,
    Prev,
}

impl ControlCommand {
    pub fn args(self) -> Vec<Value> {
        let words: &[&str] = match self {
            ControlCommand::Pause => &["cycle", "pause"],
            ControlCommand::Next => &["playlist-next", "weak"],
            ControlCommand::Prev => &["playlist-prev", "weak"],
        };
        words.iter().map(|w| Value::from(*w)).collect()
    }
}

fn is_own_socket_name(name: &str) -> bool {
    name.strip_prefix("stageplay-")
        .and_then(|rest| rest.strip_suffix(".sock"))
        .is_some_and(|pid| !pid.is_empty() && pid.bytes().all(|b| b.is_ascii_digit()))
}

/// Live sockets created by this tool in `dir`, sorted.
pub fn find_sockets(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut sockets: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_socket()))
        .filter(|e| is_own_socket_name(&e.file_name().to_string_lossy()))
        .map(|e| e.path())
        .collect();
    sockets.sort();
    sockets
}

/// Send `command` to each socket. Returns how many accepted it.
pub fn send_command(sockets: &[PathBuf], command: ControlCommand, timeout: Duration) -> usize {
    let args = command.args();
    sockets
        .iter()
        .filter(|socket| {
            match MpvIpc::connect(socket, timeout).and_then(|mut ipc| ipc.command(&args)) {
                Ok(_) => true,
                Err(e) => {
                    debug!("{}: {e}", socket.display());
                    false
                }
            }
        })
        .count()
}
