use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{info, warn};

use crate::config::{LibrarySettings, SpreadSettings};
use crate::library::{Album, album_index};

use super::history::{load_history, save_history};

/// Number of recently played albums kept out of rotation: a percentage of the
/// album count, clamped to the configured range and always below the count.
pub fn history_size(album_count: usize, settings: &SpreadSettings) -> usize {
    if album_count < 2 {
        return 0;
    }
    let scaled = album_count * settings.history_pct / 100;
    scaled
        .max(settings.history_min)
        .min(settings.history_max)
        .min(album_count - 1)
}

/// Infinite track generator over a library's albums.
pub struct AlbumSpreadPlanner<R> {
    library: PathBuf,
    scan: LibrarySettings,
    settings: SpreadSettings,
    albums: Vec<Album>,
    track_count: usize,
    /// Oldest first.
    history: VecDeque<PathBuf>,
    window: usize,
    rng: R,
    last_scan: Instant,
    cache: Option<PathBuf>,
}

impl<R: Rng> AlbumSpreadPlanner<R> {
    /// Index `library` and start with an empty history.
    pub fn new(
        library: &Path,
        scan: &LibrarySettings,
        settings: &SpreadSettings,
        rng: R,
        now: Instant,
    ) -> Self {
        let albums = album_index(library, scan);
        Self::with_albums(library, albums, scan, settings, rng, now)
    }

    pub fn with_albums(
        library: &Path,
        albums: Vec<Album>,
        scan: &LibrarySettings,
        settings: &SpreadSettings,
        rng: R,
        now: Instant,
    ) -> Self {
        let mut planner = Self {
            library: library.to_path_buf(),
            scan: scan.clone(),
            settings: settings.clone(),
            albums: Vec::new(),
            track_count: 0,
            history: VecDeque::new(),
            window: 0,
            rng,
            last_scan: now,
            cache: None,
        };
        planner.install(albums);
        planner
    }

    /// Persist history to `path`, seeding it from whatever the file holds now.
    pub fn with_cache(mut self, path: PathBuf) -> Self {
        match load_history(&path) {
            Ok(recent) => self.seed_history(recent),
            Err(e) => warn!("cannot read recent albums from {}: {e}", path.display()),
        }
        self.cache = Some(path);
        self
    }

    pub fn album_count(&self) -> usize {
        self.albums.len()
    }

    pub fn track_count(&self) -> usize {
        self.track_count
    }

    /// Capacity of the recently-played window.
    pub fn history_window(&self) -> usize {
        self.window
    }

    /// Recently chosen albums, oldest first.
    #[cfg(test)]
    pub fn history(&self) -> impl Iterator<Item = &PathBuf> {
        self.history.iter()
    }

    /// Replace the history with `recent` (oldest first), dropping unknown
    /// albums and keeping only the newest entries that fit the window.
    pub fn seed_history(&mut self, recent: Vec<PathBuf>) {
        let known: HashSet<&PathBuf> = self.albums.iter().map(|a| &a.path).collect();
        let mut kept: VecDeque<PathBuf> = VecDeque::new();
        for album in recent {
            if known.contains(&album) && !kept.contains(&album) {
                kept.push_back(album);
            }
        }
        self.history = kept;
        self.trim_history();
    }

    /// Next track to play. `None` only when the library has no albums.
    pub fn next(&mut self) -> Option<PathBuf> {
        let eligible: Vec<&Album> = self
            .albums
            .iter()
            .filter(|a| !self.history.contains(&a.path))
            .collect();

        let album = if eligible.is_empty() {
            self.albums.choose(&mut self.rng)?
        } else {
            *eligible.choose(&mut self.rng)?
        };
        let track = album.tracks.choose(&mut self.rng)?.clone();
        let album_path = album.path.clone();

        self.history.push_back(album_path);
        self.trim_history();
        Some(track)
    }

    /// Rebuild the album index when the rescan interval has elapsed.
    pub fn maybe_rescan_at(&mut self, now: Instant) -> bool {
        if self.settings.rescan_interval_secs == 0 {
            return false;
        }
        let interval = Duration::from_secs(self.settings.rescan_interval_secs);
        if now.saturating_duration_since(self.last_scan) < interval {
            return false;
        }
        self.rescan(now);
        true
    }

    /// Re-index the library. History entries for albums that disappeared are
    /// dropped; the rest stay suppressed.
    pub fn rescan(&mut self, now: Instant) {
        self.last_scan = now;
        let albums = album_index(&self.library, &self.scan);
        if albums.is_empty() {
            warn!(
                "rescan of {} found no albums, keeping the previous index",
                self.library.display()
            );
            return;
        }
        self.install(albums);
        info!(
            albums = self.albums.len(),
            tracks = self.track_count,
            history = self.window,
            "library rescanned"
        );
        self.persist();
    }

    /// Write the history to the cache file, if one is configured.
    pub fn persist(&self) {
        let Some(path) = &self.cache else {
            return;
        };
        if let Err(e) = save_history(path, &self.history) {
            warn!("cannot save recent albums to {}: {e}", path.display());
        }
    }

    fn install(&mut self, albums: Vec<Album>) {
        let known: HashSet<&PathBuf> = albums.iter().map(|a| &a.path).collect();
        self.history.retain(|p| known.contains(p));

        self.track_count = albums.iter().map(Album::track_count).sum();
        self.window = history_size(albums.len(), &self.settings);
        self.albums = albums;
        self.trim_history();
    }

    fn trim_history(&mut self) {
        while self.history.len() > self.window {
            self.history.pop_front();
        }
    }
}
