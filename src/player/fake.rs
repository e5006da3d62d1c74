use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use super::{LoadMode, Player};

/// In-memory player for scheduler and controller tests.
#[derive(Debug, Default)]
pub struct FakePlayer {
    pub loads: Vec<(PathBuf, LoadMode)>,
    pub clears: usize,
    /// Positions handed out by successive `playlist_pos` calls; the last one repeats.
    pub positions: VecDeque<Option<usize>>,
    pub gain: Option<f64>,
    /// `has_exited` starts returning true once this many polls have happened.
    pub exit_after_polls: Option<usize>,
    pub polls: usize,
    pub reject_loads: bool,
    pub shut_down: bool,
}

impl FakePlayer {
    pub fn with_positions(positions: impl IntoIterator<Item = Option<usize>>) -> Self {
        Self {
            positions: positions.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn loaded_names(&self) -> Vec<String> {
        self.loads
            .iter()
            .map(|(p, _)| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect()
    }
}

impl Player for FakePlayer {
    fn clear_playlist(&mut self) -> bool {
        self.clears += 1;
        true
    }

    fn load(&mut self, path: &Path, mode: LoadMode) -> bool {
        if self.reject_loads {
            return false;
        }
        self.loads.push((path.to_path_buf(), mode));
        true
    }

    fn playlist_pos(&mut self) -> Option<usize> {
        self.polls += 1;
        if self.positions.len() > 1 {
            self.positions.pop_front().flatten()
        } else {
            self.positions.front().copied().flatten()
        }
    }

    fn track_gain(&mut self) -> Option<f64> {
        self.gain
    }

    fn current_path(&mut self) -> Option<PathBuf> {
        None
    }

    fn has_exited(&mut self) -> bool {
        self.exit_after_polls.is_some_and(|n| self.polls >= n)
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
    }
}
