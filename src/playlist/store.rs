use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{PlayerError, Result};
use crate::library::{Track, TrackId, format_duration};

/// The session's ordered, id-unique list of tracks.
#[derive(Debug, Clone, Default)]
pub struct PlaylistStore {
    tracks: Vec<Track>,
    favorites: HashSet<TrackId>,
}

impl PlaylistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a playlist, skipping repeated ids.
    pub fn from_tracks(tracks: impl IntoIterator<Item = Track>) -> Self {
        let mut store = Self::new();
        for track in tracks {
            if let Err(e) = store.add(track) {
                warn!(error = %e, "skipping seed track");
            }
        }
        store
    }

    /// Append `track`, returning its index.
    pub fn add(&mut self, track: Track) -> Result<usize> {
        if self.contains(&track.id) {
            return Err(PlayerError::DuplicateTrack(track.id));
        }
        debug!(id = %track.id, "track added to playlist");
        self.tracks.push(track);
        Ok(self.tracks.len() - 1)
    }

    /// Remove the track with `id`, returning the index it had.
    pub fn remove(&mut self, id: &TrackId) -> Option<usize> {
        let index = self.position(id)?;
        self.tracks.remove(index);
        self.favorites.remove(id);
        debug!(%id, index, "track removed from playlist");
        Some(index)
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.favorites.clear();
    }

    /// JSON snapshot of the tracks in order.
    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.tracks)?)
    }

    /// Replace the contents with a snapshot produced by `serialize`.
    ///
    /// On any error the current contents are kept.
    pub fn restore(&mut self, blob: &str) -> Result<usize> {
        let tracks: Vec<Track> =
            serde_json::from_str(blob).map_err(|e| PlayerError::CorruptPlaylist {
                reason: e.to_string(),
            })?;

        let mut seen = HashSet::with_capacity(tracks.len());
        if let Some(dup) = tracks.iter().find(|t| !seen.insert(&t.id)) {
            return Err(PlayerError::CorruptPlaylist {
                reason: format!("track id '{}' appears more than once", dup.id),
            });
        }

        self.favorites.retain(|id| seen.contains(id));
        self.tracks = tracks;
        Ok(self.tracks.len())
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn position(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.position(id).is_some()
    }

    /// Flip the favorite mark of a playlist track; returns the new mark.
    pub fn toggle_favorite(&mut self, id: &TrackId) -> Result<bool> {
        if !self.contains(id) {
            return Err(PlayerError::UnknownTrack(id.clone()));
        }
        if self.favorites.remove(id) {
            Ok(false)
        } else {
            self.favorites.insert(id.clone());
            Ok(true)
        }
    }

    pub fn is_favorite(&self, id: &TrackId) -> bool {
        self.favorites.contains(id)
    }

    /// Record the real duration of a track once its media is known.
    pub fn resolve_duration(&mut self, id: &TrackId, duration: Duration) -> bool {
        let formatted = format_duration(duration);
        match self.tracks.iter_mut().find(|t| &t.id == id) {
            Some(track) if track.duration != formatted => {
                track.duration = formatted;
                true
            }
            _ => false,
        }
    }
}
