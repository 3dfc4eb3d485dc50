use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::block_stack::BlockStackConfig;
use crate::maze_chase::MazeChaseConfig;
use crate::persist;
use crate::snake::SnakeConfig;

pub const SETTINGS_PATH_ENV: &str = "ARCADE_SETTINGS_PATH";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSettings {
    pub master_volume: f32,
    pub sfx_volume: f32,
    pub mute_all: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            sfx_volume: 0.6,
            mute_all: false,
        }
    }
}

impl AudioSettings {
    pub fn clamp(mut self) -> Self {
        self.master_volume = clamp_unit(self.master_volume);
        self.sfx_volume = clamp_unit(self.sfx_volume);
        self
    }

    pub fn effective_sfx_gain(self) -> f32 {
        if self.mute_all {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArcadeSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Fixed RNG seed for every engine. `None` picks one per session.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Slower pacing tuned for touch play.
    #[serde(default)]
    pub touch_profile: bool,
    #[serde(default)]
    pub maze_chase: MazeChaseConfig,
    #[serde(default)]
    pub snake: SnakeConfig,
    #[serde(default)]
    pub block_stack: BlockStackConfig,
    #[serde(default)]
    pub audio: AudioSettings,
}

impl Default for ArcadeSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            seed: None,
            touch_profile: false,
            maze_chase: MazeChaseConfig::default(),
            snake: SnakeConfig::default(),
            block_stack: BlockStackConfig::default(),
            audio: AudioSettings::default(),
        }
    }
}

impl ArcadeSettings {
    /// Defaults with the touch intervals applied.
    pub fn touch() -> Self {
        Self {
            touch_profile: true,
            maze_chase: MazeChaseConfig::touch(),
            snake: SnakeConfig::touch(),
            block_stack: BlockStackConfig::touch(),
            ..Self::default()
        }
    }

    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self.maze_chase = self.maze_chase.sanitized();
        self.snake = self.snake.sanitized();
        self.block_stack = self.block_stack.sanitized();
        self.audio = self.audio.clamp();
        self
    }

    /// Engine configs with the touch profile folded in. Explicitly slowed intervals are kept.
    pub fn effective(&self) -> Self {
        let mut out = self.clone();
        if self.touch_profile {
            let touch = Self::touch();
            out.maze_chase.tick_interval_ms = out
                .maze_chase
                .tick_interval_ms
                .max(touch.maze_chase.tick_interval_ms);
            out.snake.tick_interval_ms = out.snake.tick_interval_ms.max(touch.snake.tick_interval_ms);
            out.block_stack.fall_interval_ms = out
                .block_stack
                .fall_interval_ms
                .max(touch.block_stack.fall_interval_ms);
        }
        out.sanitized()
    }
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        if let Some(explicit) = std::env::var_os(SETTINGS_PATH_ENV) {
            return Self::new(explicit);
        }
        Self::new(persist::user_file_path(
            "XDG_CONFIG_HOME",
            &[".config"],
            "settings.json",
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable files yield defaults.
    pub fn load(&self) -> ArcadeSettings {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), "settings unreadable: {err}");
                }
                return ArcadeSettings::default();
            }
        };
        match serde_json::from_slice::<ArcadeSettings>(&bytes) {
            Ok(settings) => settings.sanitized(),
            Err(err) => {
                warn!(path = %self.path.display(), "settings corrupt, using defaults: {err}");
                ArcadeSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &ArcadeSettings) -> io::Result<()> {
        persist::ensure_parent(&self.path)?;
        let bytes = persist::to_json_bytes(settings)?;
        persist::atomic_write(&self.path, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("arcade-settings-{}-{name}", std::process::id()))
            .join("settings.json")
    }

    #[test]
    fn sfx_gain_respects_mute() {
        let mut audio = AudioSettings::default();
        assert!((audio.effective_sfx_gain() - 0.6).abs() < 1e-6);
        audio.mute_all = true;
        assert_eq!(audio.effective_sfx_gain(), 0.0);
    }

    #[test]
    fn sanitized_clamps_nested_configs() {
        let settings = ArcadeSettings {
            version: 42,
            maze_chase: MazeChaseConfig {
                chase_probability: -3.0,
                ..MazeChaseConfig::default()
            },
            audio: AudioSettings {
                master_volume: 7.0,
                sfx_volume: f32::NAN,
                mute_all: false,
            },
            ..ArcadeSettings::default()
        }
        .sanitized();

        assert_eq!(settings.version, 1);
        assert_eq!(settings.maze_chase.chase_probability, 0.0);
        assert_eq!(settings.audio.master_volume, 1.0);
        assert_eq!(settings.audio.sfx_volume, 0.0);
    }

    #[test]
    fn touch_profile_slows_default_intervals() {
        let settings = ArcadeSettings {
            touch_profile: true,
            ..ArcadeSettings::default()
        }
        .effective();
        assert_eq!(settings.maze_chase.tick_interval_ms, 180);
        assert_eq!(settings.snake.tick_interval_ms, 180);
        assert_eq!(settings.block_stack.fall_interval_ms, 900);
    }

    #[test]
    fn serde_defaults_fill_missing_sections() {
        let parsed: ArcadeSettings =
            serde_json::from_str(r#"{"seed":7,"snake":{"tick_interval_ms":120}}"#)
                .expect("settings JSON should parse");
        assert_eq!(parsed.seed, Some(7));
        assert_eq!(parsed.snake.tick_interval_ms, 120);
        assert_eq!(parsed.snake.min_tick_interval_ms, 50);
        assert_eq!(parsed.maze_chase, MazeChaseConfig::default());
        assert_eq!(parsed.audio, AudioSettings::default());
    }

    #[test]
    fn store_round_trips_and_falls_back_on_corruption() {
        let path = temp_path("roundtrip");
        let store = SettingsStore::new(&path);
        assert_eq!(store.load(), ArcadeSettings::default());

        let settings = ArcadeSettings {
            seed: Some(99),
            ..ArcadeSettings::touch()
        };
        store.save(&settings).expect("save settings");
        assert_eq!(store.load(), settings);

        fs::write(&path, b"{ not json").expect("corrupt file");
        assert_eq!(store.load(), ArcadeSettings::default());

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }
}
