use std::path::{Path, PathBuf};

use crossterm::style::Stylize;
use tracing::debug;

use crate::cli::Mode;

use super::startup::SourceSummary;

/// What gets reported once per playlist position.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub position: usize,
    /// Track gain the player says it is applying.
    pub gain: Option<f64>,
    pub source: Option<PathBuf>,
    /// Ranked cover candidates, one line each.
    pub listing: Vec<String>,
}

pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// `path` relative to `root` when it lives under it.
pub fn display_path(path: &Path, root: &Path) -> String {
    if path == root {
        return ".".to_string();
    }
    match path.strip_prefix(root) {
        Ok(rel) => rel.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}

/// Writes the `[RG]`/`[ART]` block to stderr.
pub struct TerminalReport {
    display_root: PathBuf,
}

impl TerminalReport {
    pub fn new(display_root: PathBuf) -> Self {
        Self { display_root }
    }

    fn lines(&self, d: &Diagnostic) -> (String, String) {
        let gain = match d.gain {
            Some(g) => format!("ReplayGain[track]: {g:.2} dB"),
            None => "ReplayGain[track]: (no RG track gain reported)".to_string(),
        };
        let src = d
            .source
            .as_deref()
            .map(|p| display_path(p, &self.display_root))
            .unwrap_or_else(|| "unknown".to_string());
        (format!("{gain} | src: {src}"), d.listing.join("\n"))
    }
}

impl DiagnosticSink for TerminalReport {
    fn report(&mut self, diagnostic: &Diagnostic) {
        debug!(position = diagnostic.position, "reporting");
        let (rg, art) = self.lines(diagnostic);
        eprintln!();
        eprintln!("{} {rg}", "[RG]".yellow());
        eprintln!("{} candidates:", "[ART]".cyan());
        eprintln!("{art}");
        eprintln!("----------------------------------------");
    }
}

pub struct Header<'a> {
    pub mode: &'a Mode,
    pub summary: SourceSummary,
    pub rescan_interval_secs: u64,
    pub spread_threshold: usize,
    pub socket: &'a Path,
    pub lookahead: usize,
    pub normalize: bool,
}

fn human_interval(secs: u64) -> String {
    match secs {
        0 => "never".to_string(),
        s if s % 3600 == 0 => format!("{}h", s / 3600),
        s if s % 60 == 0 => format!("{}m", s / 60),
        s => format!("{s}s"),
    }
}

impl Header<'_> {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match self.mode {
            Mode::Random { library } => {
                lines.push(format!("Library: {}", library.display()));
                lines.push("Mode: random".to_string());
                if self.summary.spread {
                    lines.push(format!(
                        "Rotating albums, skipping the last {} of {}, rescanning every {}.",
                        self.summary.history_window,
                        self.summary.albums,
                        human_interval(self.rescan_interval_secs)
                    ));
                } else {
                    lines.push(format!(
                        "Single big shuffle (library has < {} albums).",
                        self.spread_threshold
                    ));
                }
                lines.push(format!("Albums: {}", self.summary.albums));
            }
            Mode::Album { album, .. } => {
                lines.push(format!("Album: {}", album.display()));
                lines.push("Mode: album".to_string());
            }
            Mode::Playlist { file, .. } => {
                lines.push(format!("Playlist: {}", file.display()));
                lines.push("Mode: playlist".to_string());
            }
        }
        lines.push(format!("Tracks: {}", self.summary.tracks));
        lines.push(format!("Socket: {}", self.socket.display()));
        lines.push(format!("Lookahead: {}", self.lookahead));
        lines.push(format!(
            "Normalize: {}",
            if self.normalize { "on" } else { "off" }
        ));
        lines
    }

    pub fn print(&self) {
        eprintln!("{}", "stageplay".magenta().bold());
        eprintln!("---");
        for line in self.lines() {
            eprintln!("{line}");
        }
        eprintln!("---");
    }
}
