//! Playback engine: transport, skipping, repeat/shuffle and track-end handling.

mod engine;
mod types;

pub use engine::PlaybackEngine;
pub use types::{EngineEvent, PlayerState, RepeatMode};

use crate::audio::{FileDecoder, RodioOutput};

/// The engine as wired to real files and the default output device.
pub type Player = PlaybackEngine<FileDecoder, RodioOutput>;
