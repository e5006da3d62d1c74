use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::player::Player;
use crate::scheduler::{LookaheadScheduler, TopUp};
use crate::stage::Stage;

use super::report::{Diagnostic, DiagnosticSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Starting,
    Running,
    Draining,
    Stopped,
}

/// Polls the player, cleans up what it has played and keeps the lookahead
/// window filled.
pub struct PlaybackController<P, S> {
    player: P,
    scheduler: LookaheadScheduler<S>,
    state: ControllerState,
    last_position: Option<usize>,
    reported: HashSet<usize>,
    scratch_root: PathBuf,
    poll_interval: Duration,
    sink: Box<dyn DiagnosticSink>,
}

impl<P: Player, S: Stage> PlaybackController<P, S> {
    pub fn new(
        player: P,
        scheduler: LookaheadScheduler<S>,
        scratch_root: PathBuf,
        poll_interval: Duration,
        sink: Box<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            player,
            scheduler,
            state: ControllerState::Starting,
            last_position: None,
            reported: HashSet::new(),
            scratch_root,
            poll_interval,
            sink,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &LookaheadScheduler<S> {
        &self.scheduler
    }

    #[cfg(test)]
    pub fn player(&self) -> &P {
        &self.player
    }

    /// Clear whatever the player had queued and stage the first track.
    pub fn start(&mut self) {
        if !self.player.clear_playlist() {
            warn!("player did not acknowledge playlist clear");
        }
        let first = self.scheduler.top_up(&mut self.player);
        debug!(?first, "initial top-up");
        self.state = ControllerState::Running;
    }

    /// One poll of the player.
    pub fn tick(&mut self, now: Instant) -> ControllerState {
        if self.state != ControllerState::Running {
            return self.state;
        }
        if self.player.has_exited() {
            info!("player exited");
            self.state = ControllerState::Stopped;
            return self.state;
        }
        self.scheduler.tick(now);

        let bounded = self.scheduler.source().is_bounded();
        match self.player.playlist_pos() {
            None => {
                if bounded && !self.scheduler.has_more() {
                    info!("end of content");
                    self.state = ControllerState::Draining;
                } else {
                    self.fill(bounded);
                }
            }
            Some(position) => {
                if self.last_position != Some(position) {
                    self.last_position = Some(position);
                    let removed = self.scheduler.advance_to(position);
                    debug!(position, removed, "position changed");
                    self.report(position);
                }
                self.fill(bounded);
            }
        }
        self.state
    }

    fn fill(&mut self, bounded: bool) {
        let result = self.scheduler.top_up(&mut self.player);
        if !bounded && result == TopUp::Exhausted {
            warn!("album spread produced no track, stopping");
            self.state = ControllerState::Draining;
        }
    }

    fn report(&mut self, position: usize) {
        if !self.reported.insert(position) {
            return;
        }
        let staged = self.scheduler.staged(position);
        let source = staged
            .map(|t| t.source.clone())
            .or_else(|| self.player.current_path());
        let listing = staged
            .map(|t| t.cover_listing.clone())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| vec!["[ ] no images found".to_string()]);
        let diagnostic = Diagnostic {
            position,
            gain: self.player.track_gain(),
            source,
            listing,
        };
        self.sink.report(&diagnostic);
    }

    /// Poll until the player exits or the content runs out, then clean up.
    pub fn run(&mut self) {
        if self.state == ControllerState::Starting {
            self.start();
        }
        while self.state == ControllerState::Running {
            thread::sleep(self.poll_interval);
            self.tick(Instant::now());
        }
        self.finish();
    }

    /// Tear down every staged track, remove the scratch root and stop the
    /// player.
    pub fn finish(&mut self) {
        self.scheduler.teardown_all();
        if let Some(planner) = self.scheduler.source().planner() {
            planner.persist();
        }
        match fs::remove_dir_all(&self.scratch_root) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("cannot remove {}: {e}", self.scratch_root.display()),
        }
        self.player.shutdown();
        self.state = ControllerState::Stopped;
    }
}
