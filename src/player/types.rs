//! Small types describing the engine's state and what it reports.

use std::fmt;
use std::time::Duration;

use crate::config::RepeatModeSetting;
use crate::error::PlayerError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlayerState {
    /// No tracks in the playlist.
    Empty,
    /// A track is current but not playing.
    Paused,
    Playing,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// Stop after the last track.
    #[default]
    Off,
    /// Restart the current track when it ends.
    RepeatOne,
    /// Wrap around to the first track after the last.
    RepeatAll,
}

impl RepeatMode {
    /// Off → RepeatOne → RepeatAll → Off.
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::RepeatOne,
            RepeatMode::RepeatOne => RepeatMode::RepeatAll,
            RepeatMode::RepeatAll => RepeatMode::Off,
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RepeatMode::Off => "off",
            RepeatMode::RepeatOne => "one",
            RepeatMode::RepeatAll => "all",
        })
    }
}

impl From<RepeatModeSetting> for RepeatMode {
    fn from(value: RepeatModeSetting) -> Self {
        match value {
            RepeatModeSetting::Off => RepeatMode::Off,
            RepeatModeSetting::RepeatOne => RepeatMode::RepeatOne,
            RepeatModeSetting::RepeatAll => RepeatMode::RepeatAll,
        }
    }
}

/// What happened during a `tick`.
#[derive(Debug)]
pub enum EngineEvent {
    /// The current track finished loading.
    TrackLoaded {
        index: usize,
        duration: Option<Duration>,
    },
    /// A track ended and playback moved on to `index`.
    TrackChanged { index: usize },
    /// The final track ended with repeat off.
    Stopped,
    /// A load or deferred start failed after its command had returned.
    Failed(PlayerError),
}
