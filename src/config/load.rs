use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `STAGEPLAY__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("STAGEPLAY")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.playback.lookahead == 0 {
            return Err("playback.lookahead must be >= 1".to_string());
        }
        if self.playback.poll_interval_ms == 0 {
            return Err("playback.poll_interval_ms must be >= 1".to_string());
        }
        if !(1..=100).contains(&self.cover.area_threshold_pct) {
            return Err("cover.area_threshold_pct must be within 1..=100".to_string());
        }
        if self.cover.aspect_min > self.cover.aspect_max {
            return Err("cover.aspect_min must not exceed cover.aspect_max".to_string());
        }
        if self.spread.history_min > self.spread.history_max {
            return Err("spread.history_min must not exceed spread.history_max".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `STAGEPLAY_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("STAGEPLAY_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/stageplay/config.toml`
/// or `~/.config/stageplay/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("stageplay").join("config.toml"))
}

/// `$XDG_CACHE_HOME/stageplay/recent_albums.json` or `~/.cache/stageplay/recent_albums.json`.
pub fn default_history_cache_path() -> Option<PathBuf> {
    xdg_dir("XDG_CACHE_HOME", ".cache").map(|d| d.join("stageplay").join("recent_albums.json"))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(home_fallback))
    }
}
