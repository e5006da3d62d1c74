use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{CoverSettings, LibrarySettings, Settings};
use crate::cover::{
    CoverCandidate, CoverChoice, CoverQuery, CoverSelector, album_tokens, collect_candidates,
};
use crate::tools::{ToolError, Toolbox, TrackGain};

use super::{Stage, StageError, StagedTrack};

/// Stages tracks into numbered slot directories under one scratch root.
pub struct TrackStager {
    root: PathBuf,
    library_root: Option<PathBuf>,
    normalize: bool,
    target_lufs: f64,
    library: LibrarySettings,
    cover: CoverSettings,
    tools: Toolbox,
}

impl TrackStager {
    pub fn new(
        root: impl Into<PathBuf>,
        library_root: Option<PathBuf>,
        normalize: bool,
        settings: &Settings,
        tools: Toolbox,
    ) -> Self {
        Self {
            root: root.into(),
            library_root,
            normalize,
            target_lufs: settings.staging.target_loudness_lufs,
            library: settings.library.clone(),
            cover: settings.cover.clone(),
            tools,
        }
    }

    fn strip_pictures(&self, audio: &Path) {
        let tags = &self.tools.tags;
        if tags.supports(audio) {
            match tags.strip_pictures(audio) {
                Ok(()) => return,
                Err(e) => debug!("tag picture strip failed for {}: {e}", audio.display()),
            }
        }
        if let Err(e) = self.tools.stripper.strip_attachments(audio) {
            warn!("cannot strip artwork from {}: {e}", audio.display());
        }
    }

    fn strip_replay_gain(&self, audio: &Path) {
        if !self.tools.tags.supports(audio) {
            return;
        }
        if let Err(e) = self.tools.tags.strip_replay_gain(audio) {
            warn!("cannot strip replay gain from {}: {e}", audio.display());
        }
    }

    fn apply_gain(&self, audio: &Path) -> Option<TrackGain> {
        if !self.normalize || !self.tools.tags.supports(audio) {
            return None;
        }
        let result = self.tools.loudness.measure(audio).and_then(|loudness| {
            let gain = TrackGain::from_loudness(self.target_lufs, loudness);
            self.tools.tags.write_track_gain(audio, &gain)?;
            Ok(gain)
        });
        match result {
            Ok(gain) => Some(gain),
            Err(e) => {
                warn!("cannot normalize {}: {e}", audio.display());
                None
            }
        }
    }

    /// Expose the winner as the canonical cover file and drop every other
    /// image from the slot directory.
    fn materialize_cover(&self, dir: &Path, winner: Option<&CoverCandidate>) -> Option<PathBuf> {
        let canonical = dir.join(&self.cover.canonical_name);
        let placed = winner.and_then(|w| match self.place_cover(&w.path, &canonical) {
            Ok(()) => Some(canonical.clone()),
            Err(e) => {
                warn!("cannot prepare cover {}: {e}", w.path.display());
                None
            }
        });

        if let Ok(entries) = fs::read_dir(dir) {
            for path in entries.filter_map(Result::ok).map(|e| e.path()) {
                if path != canonical && path.is_file() && self.library.is_image(&path) {
                    remove_stray(&path);
                }
            }
        }
        placed
    }

    fn place_cover(&self, src: &Path, canonical: &Path) -> Result<(), ToolError> {
        if src == canonical {
            return Ok(());
        }
        let is_png = src
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if is_png {
            fs::copy(src, canonical)?;
            Ok(())
        } else {
            self.tools.transcoder.to_png(src, canonical)
        }
    }

    fn choose_cover(&self, source: &Path, audio: &Path, dir: &Path) -> CoverChoice {
        let query = CoverQuery::for_track(source, self.library_root.as_deref());
        let album = album_tokens(&query.album_name, &self.library.audio_extensions);
        let sources = collect_candidates(
            &query,
            audio,
            dir,
            &self.library,
            self.tools.extractor.as_ref(),
        );
        let candidates = sources
            .into_iter()
            .map(|s| CoverCandidate::analyze(s, &album, self.tools.prober.as_ref(), &self.cover))
            .collect();

        let choice = CoverSelector::new(&self.cover).select(candidates);
        choice.discard_losing_embedded();
        choice
    }
}

impl Stage for TrackStager {
    fn stage(&mut self, slot: usize, source: &Path) -> Result<StagedTrack, StageError> {
        let dir = self.root.join(slot.to_string());
        fs::create_dir_all(&dir).map_err(|source| StageError::Slot {
            dir: dir.clone(),
            source,
        })?;

        let file_name = source.file_name().unwrap_or(source.as_os_str());
        let audio = dir.join(file_name);
        if let Err(e) = self.tools.copier.copy(source, &audio) {
            let _ = fs::remove_dir_all(&dir);
            return Err(StageError::Copy {
                path: source.to_path_buf(),
                source: e,
            });
        }

        // Embedded art has to be read before the copy is stripped.
        let choice = self.choose_cover(source, &audio, &dir);

        self.strip_pictures(&audio);
        self.strip_replay_gain(&audio);
        let gain = self.apply_gain(&audio);

        let cover = self.materialize_cover(&dir, choice.winner.as_ref());
        debug!(slot, source = %source.display(), cover = cover.is_some(), "staged");

        Ok(StagedTrack {
            slot,
            source: source.to_path_buf(),
            audio,
            dir,
            gain,
            cover,
            cover_listing: choice.listing(),
        })
    }
}

/// Drop a leftover image from a slot. Returns whether the file is gone.
pub(super) fn remove_stray(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!("cannot remove {}: {e}", path.display());
            false
        }
    }
}
