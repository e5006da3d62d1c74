use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::tempdir;

use super::*;
use crate::config::{LibrarySettings, SpreadSettings};
use crate::library::Album;

fn albums(n: usize) -> Vec<Album> {
    (0..n)
        .map(|i| {
            let path = PathBuf::from(format!("/lib/album{i:03}"));
            Album {
                tracks: vec![path.join("01.flac"), path.join("02.flac")],
                path,
            }
        })
        .collect()
}

fn planner(n: usize, seed: u64) -> AlbumSpreadPlanner<StdRng> {
    AlbumSpreadPlanner::with_albums(
        Path::new("/lib"),
        albums(n),
        &LibrarySettings::default(),
        &SpreadSettings::default(),
        StdRng::seed_from_u64(seed),
        Instant::now(),
    )
}

fn album_of(track: &Path) -> PathBuf {
    track.parent().unwrap().to_path_buf()
}

#[test]
fn history_size_stays_within_bounds() {
    let settings = SpreadSettings::default();
    for n in 50..3000 {
        let size = history_size(n, &settings);
        assert!(size >= 20, "n={n} size={size}");
        assert!(size <= 200.min(n - 1), "n={n} size={size}");
    }
    assert_eq!(history_size(50, &settings), 20);
    assert_eq!(history_size(500, &settings), 50);
    assert_eq!(history_size(5000, &settings), 200);
}

#[test]
fn history_size_never_covers_every_album() {
    let settings = SpreadSettings::default();
    assert_eq!(history_size(0, &settings), 0);
    assert_eq!(history_size(1, &settings), 0);
    assert_eq!(history_size(10, &settings), 9);
}

#[test]
fn next_never_repeats_an_album_inside_the_window() {
    let mut p = planner(60, 7);
    let window = p.history_window();
    assert_eq!(window, 20);

    let mut recent: Vec<PathBuf> = Vec::new();
    for _ in 0..2000 {
        let track = p.next().unwrap();
        let album = album_of(&track);
        let start = recent.len().saturating_sub(window);
        assert!(!recent[start..].contains(&album), "{album:?} repeated");
        recent.push(album);
        assert!(p.history().count() <= window);
    }
}

#[test]
fn small_library_falls_back_to_any_album() {
    let mut p = planner(2, 1);
    assert_eq!(p.history_window(), 1);
    let first = album_of(&p.next().unwrap());
    let second = album_of(&p.next().unwrap());
    assert_ne!(first, second);

    let mut single = planner(1, 1);
    for _ in 0..5 {
        assert!(single.next().is_some());
    }
}

#[test]
fn empty_library_produces_nothing() {
    let mut p = planner(0, 1);
    assert!(p.next().is_none());
}

#[test]
fn next_is_deterministic_for_a_seed() {
    let mut a = planner(80, 42);
    let mut b = planner(80, 42);
    for _ in 0..100 {
        assert_eq!(a.next(), b.next());
    }
}

#[test]
fn counts_reflect_index() {
    let p = planner(55, 0);
    assert_eq!(p.album_count(), 55);
    assert_eq!(p.track_count(), 110);
}

#[test]
fn seed_history_drops_unknown_and_keeps_newest() {
    let mut p = planner(60, 3);
    let mut recent: Vec<PathBuf> = (0..30)
        .map(|i| PathBuf::from(format!("/lib/album{i:03}")))
        .collect();
    recent.insert(5, PathBuf::from("/lib/gone"));
    p.seed_history(recent);

    let kept: Vec<&PathBuf> = p.history().collect();
    assert_eq!(kept.len(), 20);
    assert_eq!(kept[0], &PathBuf::from("/lib/album010"));
    assert_eq!(kept[19], &PathBuf::from("/lib/album029"));
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"x").unwrap();
}

#[test]
fn rescan_keeps_live_history_and_adds_new_albums() {
    let lib = tempdir().unwrap();
    for i in 0..4 {
        touch(&lib.path().join(format!("a{i}/01.flac")));
    }
    let settings = SpreadSettings {
        history_min: 2,
        ..SpreadSettings::default()
    };
    let start = Instant::now();
    let mut p = AlbumSpreadPlanner::new(
        lib.path(),
        &LibrarySettings::default(),
        &settings,
        StdRng::seed_from_u64(9),
        start,
    );
    assert_eq!(p.album_count(), 4);
    assert_eq!(p.history_window(), 2);

    let first = album_of(&p.next().unwrap());
    let second = album_of(&p.next().unwrap());

    fs::remove_dir_all(&first).unwrap();
    touch(&lib.path().join("a9/01.flac"));

    assert!(!p.maybe_rescan_at(start + Duration::from_secs(10)));
    assert!(p.maybe_rescan_at(start + Duration::from_secs(3600)));

    assert_eq!(p.album_count(), 4);
    let history: Vec<&PathBuf> = p.history().collect();
    assert_eq!(history, vec![&second]);

    let mut seen = HashSet::new();
    for _ in 0..50 {
        seen.insert(album_of(&p.next().unwrap()));
    }
    assert!(seen.contains(&lib.path().join("a9")));
    assert!(!seen.contains(&first));
}

#[test]
fn rescan_interval_zero_disables_rescans() {
    let settings = SpreadSettings {
        rescan_interval_secs: 0,
        ..SpreadSettings::default()
    };
    let start = Instant::now();
    let mut p = AlbumSpreadPlanner::with_albums(
        Path::new("/lib"),
        albums(60),
        &LibrarySettings::default(),
        &settings,
        StdRng::seed_from_u64(0),
        start,
    );
    assert!(!p.maybe_rescan_at(start + Duration::from_secs(1_000_000)));
}

#[test]
fn history_round_trips_through_cache_file() {
    let dir = tempdir().unwrap();
    let cache = dir.path().join("cache/recent_albums.json");

    let mut p = planner(60, 5).with_cache(cache.clone());
    for _ in 0..5 {
        p.next();
    }
    p.persist();
    let saved: Vec<PathBuf> = p.history().cloned().collect();
    assert_eq!(load_history(&cache).unwrap(), saved);

    let restored = planner(60, 6).with_cache(cache);
    let restored: Vec<PathBuf> = restored.history().cloned().collect();
    assert_eq!(restored, saved);
}

#[test]
fn unreadable_cache_is_ignored() {
    let dir = tempdir().unwrap();
    let cache = dir.path().join("recent_albums.json");
    fs::write(&cache, "not json").unwrap();

    assert!(load_history(&cache).is_err());
    let p = planner(60, 5).with_cache(cache);
    assert_eq!(p.history().count(), 0);
}

#[test]
fn missing_cache_is_empty_history() {
    let dir = tempdir().unwrap();
    assert!(load_history(&dir.path().join("none.json")).unwrap().is_empty());
}
