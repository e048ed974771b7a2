use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use super::model::{Track, TrackId};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse catalog '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The ordered list of tracks known to this session.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Catalog {
    /// Build a catalog, keeping the first track for any repeated id.
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        let mut seen: HashSet<TrackId> = HashSet::new();
        let mut kept = Vec::with_capacity(tracks.len());
        for track in tracks {
            if seen.insert(track.id.clone()) {
                kept.push(track);
            } else {
                warn!(id = %track.id, "duplicate catalog id, keeping the first entry");
            }
        }
        Self { tracks: kept }
    }

    /// Read a JSON list of track records.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let tracks: Vec<Track> =
            serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), count = tracks.len(), "loaded catalog file");
        Ok(Self::from_tracks(tracks))
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The first `n` tracks, used to seed a new session's playlist.
    pub fn head(&self, n: usize) -> Vec<Track> {
        self.tracks.iter().take(n).cloned().collect()
    }
}
