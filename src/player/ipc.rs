use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("cannot connect to {}: {source}", path.display())]
    Connect { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed reply: {0}")]
    Json(#[from] serde_json::Error),
    #[error("player closed the connection")]
    Closed,
    #[error("player answered {0}")]
    Status(String),
}

#[derive(Serialize)]
struct Request<'a> {
    command: &'a [Value],
    request_id: u64,
}

#[derive(Deserialize)]
struct Reply {
    request_id: Option<u64>,
    error: Option<String>,
    event: Option<String>,
    #[serde(default)]
    data: Value,
}

/// One connection to mpv's JSON IPC socket. Requests are strictly one at a
/// time; replies are matched by `request_id` and events in between are skipped.
pub struct MpvIpc {
    writer: UnixStream,
    reader: BufReader<UnixStream>,
    next_id: u64,
}

impl MpvIpc {
    pub fn connect(path: &Path, timeout: Duration) -> Result<Self, IpcError> {
        let stream = UnixStream::connect(path).map_err(|source| IpcError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            writer: stream,
            reader,
            next_id: 1,
        })
    }

    /// Run one command and return its `data` (`null` when the reply has none).
    pub fn command(&mut self, args: &[Value]) -> Result<Value, IpcError> {
        let request_id = self.next_id;
        self.next_id += 1;

        let mut line = serde_json::to_string(&Request {
            command: args,
            request_id,
        })?;
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;

        loop {
            let mut buf = String::new();
            if self.reader.read_line(&mut buf)? == 0 {
                return Err(IpcError::Closed);
            }
            let trimmed = buf.trim();
            if trimmed.is_empty() {
                continue;
            }
            let reply: Reply = serde_json::from_str(trimmed)?;
            if reply.event.is_some() || reply.request_id != Some(request_id) {
                trace!(line = trimmed, "skipping unrelated ipc line");
                continue;
            }
            return match reply.error.as_deref() {
                None | Some("success") => Ok(reply.data),
                Some(other) => Err(IpcError::Status(other.to_string())),
            };
        }
    }

    pub fn get_property(&mut self, name: &str) -> Result<Value, IpcError> {
        self.command(&[Value::from("get_property"), Value::from(name)])
    }
}
