use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/encore/config.toml` or `~/.config/encore/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `ENCORE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub equalizer: EqualizerSettingsConfig,
    pub playback: PlaybackSettings,
    pub library: LibrarySettings,
    pub storage: StorageSettings,
    pub controls: ControlsSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Initial output volume, 0.0 to 1.0.
    pub volume: f32,
    /// Quality factor of every peaking filter in the equalizer cascade.
    pub eq_q: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            eq_q: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EqualizerSettingsConfig {
    /// Gains are clamped to `-max_gain_db..=max_gain_db`.
    pub max_gain_db: f32,
    /// Optional starting gains, lowest band first. Missing bands stay flat.
    ///
    /// Example: [3.0, 2.0, 0.0, 0.0, -1.0]
    pub preset: Vec<f32>,
}

impl Default for EqualizerSettingsConfig {
    fn default() -> Self {
        Self {
            max_gain_db: 12.0,
            preset: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Default repeat mode.
    pub repeat_mode: RepeatModeSetting,
    /// How many catalog tracks seed the playlist of a new session.
    pub initial_playlist_len: usize,
    /// Restore the saved playlist at startup instead of seeding from the catalog.
    pub restore_on_start: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat_mode: RepeatModeSetting::Off,
            initial_playlist_len: 4,
            restore_on_start: false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatModeSetting {
    #[serde(alias = "no-repeat", alias = "no_repeat", alias = "none")]
    Off,
    #[serde(
        alias = "repeatone",
        alias = "repeat_one",
        alias = "one",
        alias = "loop-one"
    )]
    RepeatOne,
    #[serde(
        alias = "repeatall",
        alias = "repeat_all",
        alias = "all",
        alias = "loop-all"
    )]
    RepeatAll,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Music directory; the first CLI argument wins over this.
    pub music_dir: Option<PathBuf>,
    /// JSON list of track records. When set, the music directory is not scanned.
    pub catalog_file: Option<PathBuf>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
    /// Artwork locator for scanned tracks.
    pub default_album_art: String,
    /// Artist used for scanned files without an artist tag.
    pub unknown_artist: String,
    /// Album used for scanned files without an album tag.
    pub unknown_album: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            music_dir: None,
            catalog_file: None,
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
            default_album_art: String::new(),
            unknown_artist: "Unknown Artist".to_string(),
            unknown_album: "Local Tracks".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding saved state. Defaults to `$XDG_DATA_HOME/encore`.
    pub data_dir: Option<PathBuf>,
    /// Key under which the playlist snapshot is saved.
    pub playlist_key: String,
}

impl StorageSettings {
    pub fn playlist_key(&self) -> &str {
        if self.playlist_key.trim().is_empty() {
            "saved_playlist"
        } else {
            self.playlist_key.trim()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
    /// Volume change per `+` / `-` press.
    pub volume_step: f32,
    /// Gain change per key press on the equalizer panel.
    pub eq_step_db: f32,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            scrub_seconds: 5,
            volume_step: 0.05,
            eq_step_db: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Keep the playlist cursor on the current track as playback moves.
    pub follow_playback: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ encore ~ ".to_string(),
            follow_playback: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log file. Defaults to `encore.log` in the data directory.
    pub file: Option<PathBuf>,
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}
