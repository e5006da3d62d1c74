use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use rand::rngs::StdRng;

use crate::planner::AlbumSpreadPlanner;

/// Where the scheduler gets its next track from.
pub enum TrackSource {
    /// A fixed, ordered list (playlist, album, or a shuffled library).
    Listed {
        pending: VecDeque<PathBuf>,
        total: usize,
    },
    /// An endless album-spread stream.
    Spread(Box<AlbumSpreadPlanner<StdRng>>),
}

impl TrackSource {
    pub fn listed(tracks: Vec<PathBuf>) -> Self {
        TrackSource::Listed {
            total: tracks.len(),
            pending: tracks.into(),
        }
    }

    pub fn spread(planner: AlbumSpreadPlanner<StdRng>) -> Self {
        TrackSource::Spread(Box::new(planner))
    }

    pub fn next_track(&mut self) -> Option<PathBuf> {
        match self {
            TrackSource::Listed { pending, .. } => pending.pop_front(),
            TrackSource::Spread(planner) => planner.next(),
        }
    }

    /// Bounded sources run out; the spread stream never does.
    pub fn is_bounded(&self) -> bool {
        matches!(self, TrackSource::Listed { .. })
    }

    pub fn has_more(&self) -> bool {
        match self {
            TrackSource::Listed { pending, .. } => !pending.is_empty(),
            TrackSource::Spread(planner) => planner.album_count() > 0,
        }
    }

    /// Total track count: list length, or tracks currently indexed.
    #[cfg(test)]
    pub fn total(&self) -> usize {
        match self {
            TrackSource::Listed { total, .. } => *total,
            TrackSource::Spread(planner) => planner.track_count(),
        }
    }

    pub fn planner(&self) -> Option<&AlbumSpreadPlanner<StdRng>> {
        match self {
            TrackSource::Spread(planner) => Some(planner.as_ref()),
            TrackSource::Listed { .. } => None,
        }
    }

    /// Periodic housekeeping: library rescans in spread mode.
    pub fn tick(&mut self, now: Instant) {
        if let TrackSource::Spread(planner) = self {
            planner.maybe_rescan_at(now);
        }
    }
}
