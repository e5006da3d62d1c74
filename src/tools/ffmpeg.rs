use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use super::{StreamStripper, ToolError};

/// Thin wrapper over the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    bin: String,
}

impl Ffmpeg {
    pub fn new(bin: &str) -> Self {
        Self {
            bin: bin.to_string(),
        }
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }

    /// Run with the given args and capture output. A non-zero exit is an error.
    pub fn run<I, S>(&self, args: I) -> Result<Output, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.bin)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ToolError::Spawn {
                program: self.bin.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                program: self.bin.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Stream-copy `file` into a sibling temp file with `extra` output
    /// options, then move it over the original.
    pub fn rewrite_in_place(&self, file: &Path, tag: &str, extra: &[&str]) -> Result<(), ToolError> {
        let tmp = sibling_with_tag(file, tag);
        let mut args: Vec<&OsStr> = vec![
            OsStr::new("-loglevel"),
            OsStr::new("error"),
            OsStr::new("-nostdin"),
            OsStr::new("-y"),
            OsStr::new("-i"),
            file.as_os_str(),
            OsStr::new("-map"),
            OsStr::new("0:a"),
            OsStr::new("-map_metadata"),
            OsStr::new("0"),
            OsStr::new("-vn"),
            OsStr::new("-dn"),
            OsStr::new("-sn"),
            OsStr::new("-c"),
            OsStr::new("copy"),
        ];
        args.extend(extra.iter().map(OsStr::new));
        args.push(tmp.as_os_str());

        let result = self.run(args).and_then(|_| {
            if non_empty(&tmp) {
                fs::rename(&tmp, file).map_err(ToolError::from)
            } else {
                Err(ToolError::Parse(format!("{} produced no output", self.bin)))
            }
        });
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }
}

/// `dir/name.ext` -> `dir/name.<tag>.ext`
fn sibling_with_tag(file: &Path, tag: &str) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match file.extension() {
        Some(ext) => format!("{stem}.{tag}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{tag}"),
    };
    file.with_file_name(name)
}

pub(super) fn non_empty(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

/// Demux-based picture stripping for formats the tag editor cannot handle.
pub struct FfmpegStripper {
    ffmpeg: Ffmpeg,
}

impl FfmpegStripper {
    pub fn new(ffmpeg: Ffmpeg) -> Self {
        Self { ffmpeg }
    }
}

impl StreamStripper for FfmpegStripper {
    fn strip_attachments(&self, path: &Path) -> Result<(), ToolError> {
        self.ffmpeg.rewrite_in_place(path, "noart", &[])
    }
}
