use super::load::{default_config_path, default_history_cache_path, resolve_config_path};
use super::schema::*;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_stageplay_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("STAGEPLAY_CONFIG_PATH", "/tmp/stageplay-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        PathBuf::from("/tmp/stageplay-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/xdg-config-home")
            .join("stageplay")
            .join("config.toml")
    );
}

#[test]
fn default_history_cache_path_falls_back_to_home_dot_cache() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CACHE_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_history_cache_path().unwrap(),
        PathBuf::from("/tmp/home-dir")
            .join(".cache")
            .join("stageplay")
            .join("recent_albums.json")
    );
}

#[test]
fn defaults_match_documented_values() {
    let s = Settings::default();
    assert_eq!(s.cover.tiny_area, 200_000);
    assert_eq!(s.cover.area_threshold_pct, 75);
    assert_eq!(s.spread.threshold, 50);
    assert_eq!((s.spread.history_min, s.spread.history_max), (20, 200));
    assert_eq!(s.spread.rescan_interval_secs, 3600);
    assert_eq!(s.playback.lookahead, 1);
    assert_eq!(s.playback.poll_interval_ms, 5_000);
    assert_eq!(s.cover.canonical_name, "cover.png");
    assert!(s.validate().is_ok());
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[cover]
tiny_area = 90000
area_threshold_pct = 80

[spread]
threshold = 10
rescan_interval_secs = 0

[playback]
player_bin = "/opt/mpv/bin/mpv"
player_args = ["--volume=60"]
lookahead = 2

[library]
audio_extensions = ["flac"]
follow_links = false
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("STAGEPLAY_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("STAGEPLAY__PLAYBACK__LOOKAHEAD");

    let s = Settings::load().unwrap();
    assert_eq!(s.cover.tiny_area, 90_000);
    assert_eq!(s.cover.area_threshold_pct, 80);
    assert_eq!(s.spread.threshold, 10);
    assert_eq!(s.spread.rescan_interval_secs, 0);
    assert_eq!(s.playback.player_bin, "/opt/mpv/bin/mpv");
    assert_eq!(s.playback.player_args, vec!["--volume=60".to_string()]);
    assert_eq!(s.playback.lookahead, 2);
    assert_eq!(s.library.audio_extensions, vec!["flac".to_string()]);
    assert!(!s.library.follow_links);
    // Untouched sections keep their defaults.
    assert_eq!(s.staging.ffmpeg_bin, "ffmpeg");
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
lookahead = 2
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("STAGEPLAY_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("STAGEPLAY__PLAYBACK__LOOKAHEAD", "3");

    let s = Settings::load().unwrap();
    assert_eq!(s.playback.lookahead, 3);
}

#[test]
fn validate_rejects_inconsistent_values() {
    let mut s = Settings::default();
    s.playback.lookahead = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.cover.area_threshold_pct = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.spread.history_min = 300;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.cover.aspect_min = 1.2;
    assert!(s.validate().is_err());
}

#[test]
fn extension_checks_are_case_insensitive() {
    let lib = LibrarySettings::default();
    assert!(lib.is_audio(Path::new("/m/a.FLAC")));
    assert!(lib.is_audio(Path::new("/m/a.opus")));
    assert!(!lib.is_audio(Path::new("/m/a.txt")));
    assert!(!lib.is_audio(Path::new("/m/noext")));
    assert!(lib.is_image(Path::new("/m/Cover.JPG")));
    assert!(lib.is_playlist(Path::new("/m/list.m3u8")));
    assert!(!lib.is_playlist(Path::new("/m/list.xspf")));
}
