//! Seams between the signal chain and the platform audio stack.
//!
//! Decoding runs on a worker thread, so `MediaDecoder` must be shareable and
//! its media sendable. Output devices stay on the thread that owns the chain.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{LoadError, PlaybackError};

use super::filter::BandGains;

/// A decoded source ready to be routed to an output.
pub trait DecodedMedia: Send + 'static {
    /// Real duration, when the container reports one.
    fn duration(&self) -> Option<Duration>;
}

pub trait MediaDecoder: Send + Sync + 'static {
    type Media: DecodedMedia;

    fn decode(&self, locator: &str) -> Result<Self::Media, LoadError>;
}

pub trait OutputDevice {
    type Media;
    type Voice: Voice;

    /// Route `media` through the equalizer cascade into a new, paused voice.
    fn connect(&mut self, media: Self::Media, gains: &Arc<BandGains>)
    -> Result<Self::Voice, PlaybackError>;
}

/// One connected source → filters → sink route.
pub trait Voice {
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError>;
    fn set_volume(&mut self, volume: f32);
    fn position(&self) -> Duration;
    /// True once every sample of the source has been played.
    fn is_finished(&self) -> bool;
    /// Tear the route down; the voice is dropped right after.
    fn disconnect(&mut self);
}
