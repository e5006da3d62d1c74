use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{IpcError, LoadMode, MpvIpc, Player};

/// Per-run IPC endpoint: `<dir>/stageplay-<pid>.sock`.
pub fn socket_path(dir: &Path, pid: u32) -> PathBuf {
    dir.join(format!("stageplay-{pid}.sock"))
}

/// The fixed player flags. With `normalize` the player applies track gain
/// and clips; otherwise replay gain is ignored.
pub fn player_flags(socket: &Path, normalize: bool) -> Vec<String> {
    let mut flags = vec![
        "--force-window=immediate".to_string(),
        "--idle=yes".to_string(),
        "--keep-open=yes".to_string(),
        format!("--input-ipc-server={}", socket.display()),
        "--cover-art-auto=exact".to_string(),
    ];
    if normalize {
        flags.push("--replaygain=track".to_string());
        flags.push("--replaygain-clip=yes".to_string());
    } else {
        flags.push("--replaygain=no".to_string());
    }
    flags
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to start {bin}: {source}")]
    Spawn { bin: String, source: io::Error },
    #[error("player exited during startup with {0}")]
    Exited(ExitStatus),
    #[error("player IPC socket {} never became connectable", socket.display())]
    NoEndpoint { socket: PathBuf },
}

/// Everything needed to start the player.
#[derive(Debug, Clone)]
pub struct PlayerLaunch {
    pub bin: String,
    /// Extra arguments, placed before the fixed flags.
    pub extra_args: Vec<String>,
    pub socket: PathBuf,
    pub normalize: bool,
    pub connect_attempts: u32,
    pub connect_delay: Duration,
    pub timeout: Duration,
}

impl PlayerLaunch {
    pub fn args(&self) -> Vec<String> {
        let mut args = self.extra_args.clone();
        args.extend(player_flags(&self.socket, self.normalize));
        args
    }
}

/// A running player process plus a lazily (re)connected IPC channel.
pub struct MpvProcess {
    child: Child,
    socket: PathBuf,
    timeout: Duration,
    ipc: Option<MpvIpc>,
}

impl MpvProcess {
    /// Start the player and wait, with bounded retries, until its IPC socket
    /// accepts connections.
    pub fn spawn(launch: &PlayerLaunch) -> Result<Self, LaunchError> {
        if launch.socket.exists() {
            let _ = fs::remove_file(&launch.socket);
        }
        let args = launch.args();
        debug!(bin = %launch.bin, ?args, "starting player");
        let child = Command::new(&launch.bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                bin: launch.bin.clone(),
                source,
            })?;

        let mut process = Self {
            child,
            socket: launch.socket.clone(),
            timeout: launch.timeout,
            ipc: None,
        };
        if let Err(e) = process.wait_for_ipc(launch.connect_attempts, launch.connect_delay) {
            let _ = process.child.kill();
            process.shutdown();
            return Err(e);
        }
        info!(socket = %process.socket.display(), "player ready");
        Ok(process)
    }

    fn wait_for_ipc(&mut self, attempts: u32, delay: Duration) -> Result<(), LaunchError> {
        for _ in 0..attempts {
            if let Ok(Some(status)) = self.child.try_wait() {
                return Err(LaunchError::Exited(status));
            }
            if self.socket.exists() {
                if let Ok(ipc) = MpvIpc::connect(&self.socket, self.timeout) {
                    self.ipc = Some(ipc);
                    return Ok(());
                }
            }
            thread::sleep(delay);
        }
        Err(LaunchError::NoEndpoint {
            socket: self.socket.clone(),
        })
    }

    fn connection(&mut self) -> Result<&mut MpvIpc, IpcError> {
        match &mut self.ipc {
            Some(ipc) => Ok(ipc),
            slot @ None => Ok(slot.insert(MpvIpc::connect(&self.socket, self.timeout)?)),
        }
    }

    /// Send a command, treating any failure as "no value" and dropping the
    /// connection so the next call reconnects.
    fn request(&mut self, args: &[Value]) -> Option<Value> {
        match self.connection().and_then(|ipc| ipc.command(args)) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("ipc request {args:?} failed: {e}");
                self.ipc = None;
                None
            }
        }
    }

    fn property(&mut self, name: &str) -> Option<Value> {
        self.request(&[Value::from("get_property"), Value::from(name)])
    }
}

impl Player for MpvProcess {
    fn clear_playlist(&mut self) -> bool {
        self.request(&[Value::from("playlist-clear")]).is_some()
    }

    fn load(&mut self, path: &Path, mode: LoadMode) -> bool {
        let args = [
            Value::from("loadfile"),
            Value::from(path.to_string_lossy().into_owned()),
            Value::from(mode.as_str()),
        ];
        self.request(&args).is_some()
    }

    fn playlist_pos(&mut self) -> Option<usize> {
        self.property("playlist-pos")?
            .as_i64()
            .and_then(|p| usize::try_from(p).ok())
    }

    fn track_gain(&mut self) -> Option<f64> {
        self.property("current-tracks/audio/replaygain-track-gain")?
            .as_f64()
    }

    fn current_path(&mut self) -> Option<PathBuf> {
        self.property("path")?.as_str().map(PathBuf::from)
    }

    fn has_exited(&mut self) -> bool {
        !matches!(self.child.try_wait(), Ok(None))
    }

    fn shutdown(&mut self) {
        self.ipc = None;
        match self.child.wait() {
            Ok(status) => debug!(%status, "player exited"),
            Err(e) => warn!("cannot wait for player: {e}"),
        }
        if self.socket.exists() {
            if let Err(e) = fs::remove_file(&self.socket) {
                warn!("cannot remove {}: {e}", self.socket.display());
            }
        }
    }
}
