//! Error types shared by the player components.
//!
//! Every failure is returned to the caller (and ultimately shown in the
//! status line); none of them is fatal to the process.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::library::TrackId;

/// Failure to fetch or decode a media source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode '{}': {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
}

/// Failure to start or steer playback of a bound source.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no audio source is loaded")]
    NoSource,
    #[error("audio output failed: {0}")]
    Output(String),
    #[error("seek failed: {0}")]
    Seek(String),
    #[error("track duration is not known yet")]
    DurationUnknown,
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("unsupported audio format: '{locator}'")]
    UnsupportedFormat { locator: String },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("equalizer band {index} is out of range (0..{count})")]
    InvalidBand { index: usize, count: usize },

    #[error("saved playlist is corrupt: {reason}")]
    CorruptPlaylist { reason: String },

    /// Reported no-op: the playlist is left as it was.
    #[error("'{0}' is already in the playlist")]
    DuplicateTrack(TrackId),

    #[error("no track with id '{0}' in the catalog")]
    UnknownTrack(TrackId),

    #[error("no saved playlist found")]
    NoSavedPlaylist,

    #[error("storage error: {0}")]
    Storage(#[from] io::Error),

    #[error("failed to encode playlist: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlayerError>;
