use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::tempdir;

use super::controller::{ControllerState, PlaybackController};
use super::report::{Diagnostic, DiagnosticSink};
use super::startup::{
    StartupError, build_source, check_dependencies, create_scratch_root, scratch_base,
};
use crate::cli::Mode;
use crate::config::{LibrarySettings, Settings, SpreadSettings};
use crate::library::Album;
use crate::planner::AlbumSpreadPlanner;
use crate::player::fake::FakePlayer;
use crate::scheduler::{LookaheadScheduler, TrackSource};
use crate::stage::{Stage, StageError, StagedTrack};

/// Stages by writing the source's file name into `<root>/<slot>/`.
struct SlotStager {
    root: PathBuf,
}

impl Stage for SlotStager {
    fn stage(&mut self, slot: usize, source: &Path) -> Result<StagedTrack, StageError> {
        let dir = self.root.join(slot.to_string());
        fs::create_dir_all(&dir).map_err(|e| StageError::Slot {
            dir: dir.clone(),
            source: e,
        })?;
        let audio = dir.join(source.file_name().unwrap());
        fs::write(&audio, b"audio").unwrap();
        Ok(StagedTrack {
            slot,
            source: source.to_path_buf(),
            audio,
            dir,
            gain: None,
            cover: None,
            cover_listing: vec!["[ ] no images found".to_string()],
        })
    }
}

#[derive(Clone, Default)]
struct RecordingSink(Rc<RefCell<Vec<Diagnostic>>>);

impl DiagnosticSink for RecordingSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.0.borrow_mut().push(diagnostic.clone());
    }
}

fn controller(
    scratch: &Path,
    source: TrackSource,
    player: FakePlayer,
    sink: &RecordingSink,
) -> PlaybackController<FakePlayer, SlotStager> {
    fs::create_dir_all(scratch).unwrap();
    let stager = SlotStager {
        root: scratch.to_path_buf(),
    };
    PlaybackController::new(
        player,
        LookaheadScheduler::new(stager, source, 1),
        scratch.to_path_buf(),
        Duration::ZERO,
        Box::new(sink.clone()),
    )
}

fn spread_source(count: usize) -> TrackSource {
    let albums: Vec<Album> = (0..count)
        .map(|i| {
            let path = PathBuf::from(format!("/lib/album{i:02}"));
            Album {
                tracks: vec![path.join("01.flac")],
                path,
            }
        })
        .collect();
    TrackSource::spread(AlbumSpreadPlanner::with_albums(
        Path::new("/lib"),
        albums,
        &LibrarySettings::default(),
        &SpreadSettings::default(),
        StdRng::seed_from_u64(3),
        Instant::now(),
    ))
}

#[test]
fn three_track_playlist_plays_in_order_and_cleans_up() {
    let lib = tempdir().unwrap();
    let tracks: Vec<PathBuf> = ["01 a.flac", "02 b.flac", "03 c.flac"]
        .iter()
        .map(|n| {
            let p = lib.path().join(n);
            fs::write(&p, b"x").unwrap();
            p
        })
        .collect();
    let run = tempdir().unwrap();
    let scratch = run.path().join("stageplay-1");
    let sink = RecordingSink::default();
    let player = FakePlayer::with_positions([None, Some(0), Some(1), Some(2), None]);

    let mut c = controller(&scratch, TrackSource::listed(tracks.clone()), player, &sink);
    c.run();

    assert_eq!(c.state(), ControllerState::Stopped);
    assert_eq!(
        c.player().loaded_names(),
        vec!["01 a.flac", "02 b.flac", "03 c.flac"]
    );
    assert_eq!(c.player().clears, 1);
    assert!(c.player().shut_down);

    let reports = sink.0.borrow();
    let positions: Vec<usize> = reports.iter().map(|d| d.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    let sources: Vec<PathBuf> = reports.iter().filter_map(|d| d.source.clone()).collect();
    assert_eq!(sources, tracks);
    assert!(
        reports
            .iter()
            .all(|d| d.listing == vec!["[ ] no images found".to_string()])
    );

    assert!(!scratch.exists());
    assert!(c.scheduler().staged_slots().is_empty());
}

#[test]
fn each_position_is_reported_once() {
    let run = tempdir().unwrap();
    let sink = RecordingSink::default();
    let player = FakePlayer {
        gain: Some(-6.5),
        ..FakePlayer::with_positions([Some(0), Some(0), Some(1), Some(0), Some(1)])
    };
    let source = TrackSource::listed(vec![
        PathBuf::from("/lib/a.flac"),
        PathBuf::from("/lib/b.flac"),
        PathBuf::from("/lib/c.flac"),
    ]);
    let mut c = controller(&run.path().join("s"), source, player, &sink);
    c.start();
    for _ in 0..5 {
        assert_eq!(c.tick(Instant::now()), ControllerState::Running);
    }

    let reports = sink.0.borrow();
    let positions: Vec<usize> = reports.iter().map(|d| d.position).collect();
    assert_eq!(positions, vec![0, 1]);
    assert!(reports.iter().all(|d| d.gain == Some(-6.5)));
    // Going back to 0 does not resurrect the cleaned slot.
    assert_eq!(c.scheduler().window().last_cleaned(), Some(0));
}

#[test]
fn player_exit_stops_the_loop() {
    let run = tempdir().unwrap();
    let scratch = run.path().join("s");
    let sink = RecordingSink::default();
    let player = FakePlayer {
        exit_after_polls: Some(2),
        ..FakePlayer::with_positions([Some(0)])
    };
    let source = TrackSource::listed(vec![PathBuf::from("/lib/a.flac"), PathBuf::from("/lib/b.flac")]);
    let mut c = controller(&scratch, source, player, &sink);
    c.run();

    assert_eq!(c.state(), ControllerState::Stopped);
    assert_eq!(c.player().polls, 2);
    assert!(!scratch.exists());
}

#[test]
fn unknown_position_keeps_spread_mode_running() {
    let run = tempdir().unwrap();
    let sink = RecordingSink::default();
    let player = FakePlayer::with_positions([None, None, Some(0), Some(1), None]);
    let mut c = controller(&run.path().join("s"), spread_source(60), player, &sink);
    c.start();
    for _ in 0..6 {
        assert_eq!(c.tick(Instant::now()), ControllerState::Running);
    }
    assert_eq!(c.player().loads.len(), 3);
    assert_eq!(sink.0.borrow().len(), 2);
}

#[test]
fn empty_spread_source_drains() {
    let run = tempdir().unwrap();
    let sink = RecordingSink::default();
    let mut c = controller(
        &run.path().join("s"),
        spread_source(0),
        FakePlayer::default(),
        &sink,
    );
    c.start();
    assert_eq!(c.tick(Instant::now()), ControllerState::Draining);
    c.finish();
    assert_eq!(c.state(), ControllerState::Stopped);
}

#[test]
fn bounded_source_waits_for_the_player_while_tracks_remain() {
    let run = tempdir().unwrap();
    let sink = RecordingSink::default();
    let source = TrackSource::listed(vec![PathBuf::from("/lib/a.flac"), PathBuf::from("/lib/b.flac")]);
    let mut c = controller(&run.path().join("s"), source, FakePlayer::default(), &sink);
    c.start();
    // No position yet, but b.flac is still pending.
    assert_eq!(c.tick(Instant::now()), ControllerState::Running);
    assert_eq!(c.player().loads.len(), 1);
}

#[test]
fn scratch_root_replaces_stale_leftovers() {
    let base = tempdir().unwrap();
    let stale = base.path().join("stageplay-42");
    fs::create_dir_all(stale.join("0")).unwrap();
    fs::write(stale.join("0/old.flac"), b"x").unwrap();

    let root = create_scratch_root(base.path(), 42).unwrap();
    assert_eq!(root, stale);
    assert!(root.is_dir());
    assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
}

#[test]
fn configured_scratch_dir_wins() {
    let mut settings = Settings::default();
    settings.staging.scratch_dir = Some(PathBuf::from("/srv/scratch"));
    assert_eq!(scratch_base(&settings), PathBuf::from("/srv/scratch"));
}

#[test]
fn ffmpeg_is_only_required_for_normalize() {
    let mut settings = Settings::default();
    settings.playback.player_bin = "/bin/sh".to_string();
    settings.staging.ffmpeg_bin = "stageplay-missing-ffmpeg".to_string();
    settings.staging.ffprobe_bin = "stageplay-missing-ffprobe".to_string();

    assert!(check_dependencies(&settings, false).is_ok());
    match check_dependencies(&settings, true) {
        Err(StartupError::MissingTool(bin)) => assert_eq!(bin, "stageplay-missing-ffmpeg"),
        other => panic!("unexpected {other:?}"),
    }

    settings.playback.player_bin = "stageplay-missing-mpv".to_string();
    assert!(matches!(
        check_dependencies(&settings, false),
        Err(StartupError::MissingTool(_))
    ));
}

#[test]
fn album_mode_lists_tracks_in_path_order() {
    let dir = tempdir().unwrap();
    let album = dir.path().join("Album");
    fs::create_dir_all(album.join("CD2")).unwrap();
    fs::write(album.join("02.flac"), b"x").unwrap();
    fs::write(album.join("01.flac"), b"x").unwrap();
    fs::write(album.join("CD2/01.mp3"), b"x").unwrap();
    fs::write(album.join("cover.jpg"), b"x").unwrap();

    let mode = Mode::Album {
        album: album.clone(),
        library: dir.path().to_path_buf(),
    };
    let (mut source, summary) = build_source(&mode, &Settings::default(), false).unwrap();
    assert_eq!(summary.tracks, 3);
    assert!(!summary.spread);
    assert_eq!(source.next_track(), Some(album.join("01.flac")));
    assert_eq!(source.next_track(), Some(album.join("02.flac")));
    assert_eq!(source.next_track(), Some(album.join("CD2/01.mp3")));
}

#[test]
fn empty_sources_are_fatal() {
    let dir = tempdir().unwrap();
    let mode = Mode::Album {
        album: dir.path().to_path_buf(),
        library: dir.path().to_path_buf(),
    };
    assert!(matches!(
        build_source(&mode, &Settings::default(), false),
        Err(StartupError::NoTracks)
    ));

    let list = dir.path().join("list.m3u");
    fs::write(&list, "#EXTM3U\nmissing.flac\n").unwrap();
    let mode = Mode::Playlist {
        file: list,
        library: None,
    };
    assert!(matches!(
        build_source(&mode, &Settings::default(), false),
        Err(StartupError::NoTracks)
    ));
}

#[test]
fn random_mode_switches_to_spread_at_threshold() {
    let lib = tempdir().unwrap();
    for name in ["A", "B", "C"] {
        let album = lib.path().join(name);
        fs::create_dir_all(&album).unwrap();
        fs::write(album.join("01.flac"), b"x").unwrap();
        fs::write(album.join("02.flac"), b"x").unwrap();
    }
    let mode = Mode::Random {
        library: lib.path().to_path_buf(),
    };

    let mut settings = Settings::default();
    let (source, summary) = build_source(&mode, &settings, false).unwrap();
    assert!(source.is_bounded());
    assert_eq!(summary.tracks, 6);
    assert_eq!(summary.albums, 3);

    settings.spread.threshold = 3;
    let (source, summary) = build_source(&mode, &settings, false).unwrap();
    assert!(!source.is_bounded());
    assert!(summary.spread);
    assert_eq!(summary.tracks, 6);
    assert_eq!(summary.history_window, 2);
}
