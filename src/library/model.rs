use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Duration shown for a track until its media has been loaded once.
pub const PLACEHOLDER_DURATION: &str = "0:00";

/// Opaque track identity.
///
/// Serialized as a string; numeric ids from older playlist snapshots are
/// accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TrackId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}

/// A playable item with its display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    /// Formatted as `M:SS`.
    #[serde(default = "placeholder_duration")]
    pub duration: String,
    /// Media locator, resolved against the music directory.
    #[serde(alias = "src")]
    pub source: String,
    #[serde(default)]
    pub album_art: String,
}

fn placeholder_duration() -> String {
    PLACEHOLDER_DURATION.to_string()
}

impl Track {
    /// `Artist - Title`, or just the title when the artist is blank.
    pub fn display(&self) -> String {
        let artist = self.artist.trim();
        if artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", artist, self.title)
        }
    }
}

/// Format `d` as `M:SS`, truncating partial seconds.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
