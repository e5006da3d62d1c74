use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::player::{LoadMode, Player};
use crate::stage::{Stage, StagedTrack};

use super::{SchedulerWindow, TrackSource};

/// Consecutive unstageable tracks tolerated in one top-up before giving the
/// control loop its turn back.
const MAX_SKIPS_PER_TOP_UP: usize = 16;

/// Result of one [`LookaheadScheduler::top_up`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopUp {
    /// This many tracks were handed to the player.
    Appended(usize),
    /// The window already held enough tracks.
    Full,
    /// Nothing could be appended right now; try again next tick.
    Stalled,
    /// The source has nothing left.
    Exhausted,
}

pub struct LookaheadScheduler<S> {
    stager: S,
    source: TrackSource,
    lookahead: usize,
    window: SchedulerWindow,
    /// Slot -> staged track, for every slot not yet torn down.
    staged: BTreeMap<usize, StagedTrack>,
    /// A track the player refused, retried before pulling a new one.
    retry: Option<PathBuf>,
}

impl<S: Stage> LookaheadScheduler<S> {
    pub fn new(stager: S, source: TrackSource, lookahead: usize) -> Self {
        Self {
            stager,
            source,
            lookahead: lookahead.max(1),
            window: SchedulerWindow::default(),
            staged: BTreeMap::new(),
            retry: None,
        }
    }

    #[cfg(test)]
    pub fn window(&self) -> SchedulerWindow {
        self.window
    }

    pub fn source(&self) -> &TrackSource {
        &self.source
    }

    pub fn staged(&self, slot: usize) -> Option<&StagedTrack> {
        self.staged.get(&slot)
    }

    pub fn staged_slots(&self) -> Vec<usize> {
        self.staged.keys().copied().collect()
    }

    /// Whether anything is left to stage.
    pub fn has_more(&self) -> bool {
        self.retry.is_some() || self.source.has_more()
    }

    pub fn tick(&mut self, now: Instant) {
        self.source.tick(now);
    }

    /// Stage and load tracks until `lookahead` of them sit ahead of the
    /// current position. The first slot replaces the player's playlist,
    /// every later one is appended without interrupting playback.
    pub fn top_up(&mut self, player: &mut dyn Player) -> TopUp {
        if self.window.is_full(self.lookahead) {
            return TopUp::Full;
        }

        let mut appended = 0;
        let mut skipped = 0;
        while !self.window.is_full(self.lookahead) {
            let Some(source) = self.retry.take().or_else(|| self.source.next_track()) else {
                return if appended > 0 {
                    TopUp::Appended(appended)
                } else {
                    TopUp::Exhausted
                };
            };

            let slot = self.window.next_slot();
            let track = match self.stager.stage(slot, &source) {
                Ok(track) => track,
                Err(e) => {
                    warn!("skipping {}: {e}", source.display());
                    skipped += 1;
                    if skipped >= MAX_SKIPS_PER_TOP_UP {
                        break;
                    }
                    continue;
                }
            };

            let mode = if slot == 0 {
                LoadMode::Replace
            } else {
                LoadMode::AppendPlay
            };
            if !player.load(&track.audio, mode) {
                warn!("player did not accept {}, will retry", track.audio.display());
                track.destroy();
                self.retry = Some(source);
                break;
            }

            info!(slot, track = %source.display(), "queued");
            self.staged.insert(slot, track);
            self.window.record_append();
            appended += 1;
        }

        if appended > 0 {
            TopUp::Appended(appended)
        } else {
            TopUp::Stalled
        }
    }

    /// Record a new player position and destroy every staged track the
    /// player has moved past. Returns how many were destroyed.
    pub fn advance_to(&mut self, position: usize) -> usize {
        let mut removed = 0;
        for slot in self.window.advance(position) {
            if let Some(track) = self.staged.remove(&slot) {
                debug!(slot, "tearing down");
                track.destroy();
                removed += 1;
            }
        }
        removed
    }

    /// Destroy everything still staged.
    pub fn teardown_all(&mut self) {
        for (_, track) in std::mem::take(&mut self.staged) {
            track.destroy();
        }
    }

    #[cfg(test)]
    pub fn stager(&self) -> &S {
        &self.stager
    }
}
