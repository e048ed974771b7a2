use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::audio::{AudioSignalChain, ChainEvent, LoadToken, MediaDecoder, OutputDevice};
use crate::config::Settings;
use crate::equalizer::{EqualizerController, EqualizerSettings};
use crate::error::{PlaybackError, PlayerError, Result};
use crate::library::{Catalog, Track, TrackId};
use crate::playlist::{KeyValueStore, PlaylistStore};

use super::types::{EngineEvent, PlayerState, RepeatMode};

/// The playback state machine.
///
/// Owns the signal chain, the session playlist and the equalizer; the UI
/// talks to it through plain commands and queries.
pub struct PlaybackEngine<D, O>
where
    D: MediaDecoder,
    O: OutputDevice<Media = D::Media>,
{
    chain: AudioSignalChain<D, O>,
    playlist: PlaylistStore,
    equalizer: EqualizerController,
    catalog: Catalog,
    store: Box<dyn KeyValueStore>,
    playlist_key: String,
    rng: StdRng,

    state: PlayerState,
    /// Valid whenever the playlist is non-empty.
    current: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
    /// Load issued for the current track, and the track it was issued for.
    loading: Option<(LoadToken, TrackId)>,
    position: Duration,
    duration: Option<Duration>,
    /// Failures from commands that otherwise succeeded, handed out by the next tick.
    queued: Vec<EngineEvent>,
}

impl<D, O> PlaybackEngine<D, O>
where
    D: MediaDecoder,
    O: OutputDevice<Media = D::Media>,
{
    /// Build a session: seed the playlist from the catalog and load its first track.
    pub fn new(
        mut chain: AudioSignalChain<D, O>,
        catalog: Catalog,
        store: Box<dyn KeyValueStore>,
        settings: &Settings,
    ) -> Self {
        let equalizer =
            EqualizerController::with_preset(settings.equalizer.max_gain_db, &settings.equalizer.preset);
        equalizer.apply_all(&mut chain);
        chain.set_volume(settings.audio.volume);

        let playlist =
            PlaylistStore::from_tracks(catalog.head(settings.playback.initial_playlist_len));

        let mut engine = Self {
            chain,
            playlist,
            equalizer,
            catalog,
            store,
            playlist_key: settings.storage.playlist_key().to_string(),
            rng: StdRng::from_entropy(),
            state: PlayerState::Empty,
            current: None,
            shuffle: settings.playback.shuffle,
            repeat: settings.playback.repeat_mode.into(),
            loading: None,
            position: Duration::ZERO,
            duration: None,
            queued: Vec::new(),
        };

        if !engine.playlist.is_empty() {
            if let Err(e) = engine.enter_playlist(0) {
                engine.settle_rejected_load(e);
            }
        }
        info!(
            tracks = engine.playlist.len(),
            catalog = engine.catalog.len(),
            "playback engine ready"
        );
        engine
    }

    /// Make shuffle picks reproducible.
    #[cfg(test)]
    pub fn seed_shuffle(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    // ---- transport ----

    pub fn play(&mut self) -> Result<()> {
        let current = match (self.state, self.current) {
            (PlayerState::Playing, _) => return Ok(()),
            (PlayerState::Empty, _) | (_, None) => return Err(PlaybackError::NoSource.into()),
            (PlayerState::Paused, Some(current)) => current,
        };

        // The track played out, failed to load or lost its route.
        if !self.chain.is_playable() {
            self.load_index(current)?;
        }

        self.chain.play()?;
        self.state = PlayerState::Playing;
        debug!(index = current, "playing");
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state == PlayerState::Playing {
            self.chain.pause();
            self.state = PlayerState::Paused;
            debug!("paused");
        }
    }

    pub fn play_pause(&mut self) -> Result<()> {
        match self.state {
            PlayerState::Playing => {
                self.pause();
                Ok(())
            }
            _ => self.play(),
        }
    }

    /// Skip forward. Shuffle picks any index, the current one included.
    pub fn next(&mut self) -> Result<()> {
        let current = self.current.ok_or(PlaybackError::NoSource)?;
        let index = self.following(current);
        self.switch_to(index, self.state == PlayerState::Playing)
    }

    /// Skip back. Shuffle picks any index, the current one included.
    pub fn previous(&mut self) -> Result<()> {
        let current = self.current.ok_or(PlaybackError::NoSource)?;
        let len = self.playlist.len();
        let index = if self.shuffle {
            self.rng.gen_range(0..len)
        } else {
            (current + len - 1) % len
        };
        self.switch_to(index, self.state == PlayerState::Playing)
    }

    /// Load and play the playlist entry at `index`.
    pub fn play_at(&mut self, index: usize) -> Result<()> {
        if index >= self.playlist.len() {
            return Err(PlaybackError::NoSource.into());
        }
        self.switch_to(index, true)
    }

    /// Seek to `fraction` (0..=1) of the current track.
    pub fn seek_fraction(&mut self, fraction: f64) -> Result<Duration> {
        if self.state == PlayerState::Empty {
            return Err(PlaybackError::NoSource.into());
        }
        let duration = self.duration.ok_or(PlaybackError::DurationUnknown)?;
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        self.seek_to(duration.mul_f64(fraction))
    }

    pub fn seek_to(&mut self, position: Duration) -> Result<Duration> {
        if self.state == PlayerState::Empty {
            return Err(PlaybackError::NoSource.into());
        }
        let applied = self.chain.seek(position)?;
        self.position = applied;
        Ok(applied)
    }

    /// Move the playhead by `seconds`, backwards when negative.
    pub fn seek_relative(&mut self, seconds: f64) -> Result<Duration> {
        let target = (self.position.as_secs_f64() + seconds).max(0.0);
        self.seek_to(Duration::from_secs_f64(target))
    }

    /// Returns the volume actually applied.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.chain.set_volume(volume);
        self.chain.volume()
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        self.repeat = self.repeat.cycle();
        self.repeat
    }

    // ---- playlist ----

    /// Append the catalog track `id` to the playlist.
    ///
    /// The first track added to an empty playlist becomes current. If it
    /// cannot be loaded the add still stands and the failure is reported by
    /// the next `tick`.
    pub fn add_track(&mut self, id: &TrackId) -> Result<usize> {
        let track = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| PlayerError::UnknownTrack(id.clone()))?;
        let index = self.playlist.add(track)?;
        info!(%id, index, "added to playlist");

        if self.current.is_none() {
            if let Err(e) = self.enter_playlist(index) {
                self.settle_rejected_load(e);
            }
        }
        Ok(index)
    }

    /// Remove `id` from the playlist; returns whether it was there.
    pub fn remove_track(&mut self, id: &TrackId) -> Result<bool> {
        let Some(removed) = self.playlist.remove(id) else {
            return Ok(false);
        };
        info!(%id, index = removed, "removed from playlist");

        if self.playlist.is_empty() {
            self.stop();
            return Ok(true);
        }
        let Some(current) = self.current else {
            return Ok(true);
        };

        if removed < current {
            self.current = Some(current - 1);
        } else if removed == current {
            let index = current.min(self.playlist.len() - 1);
            let resume = self.state == PlayerState::Playing;
            self.current = Some(index);
            if let Err(e) = self.switch_to(index, resume) {
                self.settle_rejected_load(e);
            }
        }
        Ok(true)
    }

    /// Empty the playlist and stop playback.
    pub fn clear_playlist(&mut self) {
        self.playlist.clear();
        self.stop();
        info!("playlist cleared");
    }

    pub fn save_playlist(&mut self) -> Result<usize> {
        let blob = self.playlist.serialize()?;
        self.store.set(&self.playlist_key, &blob)?;
        info!(key = %self.playlist_key, tracks = self.playlist.len(), "playlist saved");
        Ok(self.playlist.len())
    }

    /// Replace the playlist with the saved snapshot.
    ///
    /// The current track stays current when the snapshot still contains it.
    /// Otherwise the first entry becomes current, paused.
    pub fn restore_playlist(&mut self) -> Result<usize> {
        let blob = self
            .store
            .get(&self.playlist_key)?
            .ok_or(PlayerError::NoSavedPlaylist)?;
        let previous = self.current_track().map(|t| t.id.clone());
        let count = self.playlist.restore(&blob)?;
        info!(key = %self.playlist_key, tracks = count, "playlist restored");

        if self.playlist.is_empty() {
            self.stop();
            return Ok(0);
        }
        match previous.and_then(|id| self.playlist.position(&id)) {
            Some(index) => self.current = Some(index),
            None => {
                let resume = self.state == PlayerState::Playing;
                self.current = Some(0);
                self.state = PlayerState::Paused;
                if let Err(e) = self.switch_to(0, resume) {
                    self.settle_rejected_load(e);
                }
            }
        }
        Ok(count)
    }

    pub fn toggle_favorite(&mut self, id: &TrackId) -> Result<bool> {
        self.playlist.toggle_favorite(id)
    }

    // ---- equalizer ----

    pub fn set_eq_band(&mut self, index: usize, gain_db: f32) -> Result<f32> {
        self.equalizer.set_band_gain(index, gain_db, &mut self.chain)
    }

    pub fn adjust_eq_band(&mut self, index: usize, delta_db: f32) -> Result<f32> {
        self.equalizer.adjust_band_gain(index, delta_db, &mut self.chain)
    }

    pub fn reset_eq(&mut self) {
        self.equalizer.reset(&mut self.chain);
    }

    // ---- events ----

    /// Fold finished loads and playback progress into the engine's state.
    pub fn tick(&mut self) -> Vec<EngineEvent> {
        let mut events = std::mem::take(&mut self.queued);
        for event in self.chain.poll() {
            self.handle(event, &mut events);
        }
        events
    }

    /// Like `tick`, but first blocks until the pending load resolves.
    pub fn wait_for_load(&mut self, timeout: Duration) -> Vec<EngineEvent> {
        let mut events = std::mem::take(&mut self.queued);
        for event in self.chain.wait_for_load(timeout) {
            self.handle(event, &mut events);
        }
        events
    }

    fn handle(&mut self, event: ChainEvent, out: &mut Vec<EngineEvent>) {
        match event {
            ChainEvent::Loaded { token, duration } => {
                let Some((expected, id)) = self.loading.clone() else {
                    return;
                };
                if token != expected {
                    return;
                }
                self.duration = duration;
                if let Some(d) = duration {
                    self.playlist.resolve_duration(&id, d);
                }
                if let Some(index) = self.current {
                    out.push(EngineEvent::TrackLoaded { index, duration });
                }
            }
            ChainEvent::LoadFailed { error, .. } => {
                if self.state == PlayerState::Playing {
                    self.state = PlayerState::Paused;
                }
                out.push(EngineEvent::Failed(error.into()));
            }
            ChainEvent::PlaybackFailed { error, .. } => {
                if self.state == PlayerState::Playing {
                    self.state = PlayerState::Paused;
                }
                out.push(EngineEvent::Failed(error.into()));
            }
            ChainEvent::TimeUpdate { position, duration } => {
                self.position = position;
                if duration.is_some() {
                    self.duration = duration;
                }
            }
            ChainEvent::Ended { .. } => self.on_track_end(out),
        }
    }

    fn on_track_end(&mut self, out: &mut Vec<EngineEvent>) {
        let Some(current) = self.current else {
            return;
        };
        let is_last = current + 1 >= self.playlist.len();
        let repeat = self.repeat;
        let next = match repeat {
            RepeatMode::RepeatOne => Some(current),
            RepeatMode::RepeatAll => Some(self.following(current)),
            RepeatMode::Off if !is_last => Some(self.following(current)),
            RepeatMode::Off => None,
        };

        match next {
            Some(index) => match self.switch_to(index, true) {
                Ok(()) => out.push(EngineEvent::TrackChanged { index }),
                Err(e) => {
                    self.state = PlayerState::Paused;
                    out.push(EngineEvent::Failed(e));
                }
            },
            None => {
                self.state = PlayerState::Paused;
                if let Some(d) = self.duration {
                    self.position = d;
                }
                info!("reached the end of the playlist");
                out.push(EngineEvent::Stopped);
            }
        }
    }

    // ---- internals ----

    fn following(&mut self, current: usize) -> usize {
        let len = self.playlist.len();
        if self.shuffle {
            self.rng.gen_range(0..len)
        } else {
            (current + 1) % len
        }
    }

    /// Start loading the track at `index` and make it current.
    ///
    /// A rejected locator leaves everything as it was.
    fn load_index(&mut self, index: usize) -> Result<()> {
        let track = self
            .playlist
            .get(index)
            .cloned()
            .ok_or(PlaybackError::NoSource)?;
        let token = self.chain.load(&track.source)?;

        self.current = Some(index);
        self.loading = Some((token, track.id));
        self.position = Duration::ZERO;
        self.duration = None;
        if self.state == PlayerState::Empty {
            self.state = PlayerState::Paused;
        }
        debug!(index, source = %track.source, "track loading");
        Ok(())
    }

    fn switch_to(&mut self, index: usize, resume: bool) -> Result<()> {
        self.load_index(index)?;
        if resume {
            self.chain.play()?;
            self.state = PlayerState::Playing;
        } else if self.state == PlayerState::Playing {
            self.state = PlayerState::Paused;
        }
        Ok(())
    }

    /// The playlist just gained its first track at `index`.
    fn enter_playlist(&mut self, index: usize) -> Result<()> {
        self.current = Some(index);
        self.state = PlayerState::Paused;
        self.load_index(index)
    }

    /// The playlist already changed under a new current track that would not
    /// load. Silence whatever the chain still holds and stay on that track,
    /// paused, so the next `play` retries it.
    fn settle_rejected_load(&mut self, error: PlayerError) {
        warn!(index = ?self.current, %error, "current track could not be loaded");
        self.chain.stop();
        self.loading = None;
        self.state = PlayerState::Paused;
        self.position = Duration::ZERO;
        self.duration = None;
        self.queued.push(EngineEvent::Failed(error));
    }

    fn stop(&mut self) {
        self.chain.stop();
        self.current = None;
        self.loading = None;
        self.state = PlayerState::Empty;
        self.position = Duration::ZERO;
        self.duration = None;
    }

    // ---- queries ----

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.playlist.get(i))
    }

    pub fn playlist(&self) -> &PlaylistStore {
        &self.playlist
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn equalizer(&self) -> &EqualizerSettings {
        self.equalizer.settings()
    }

    pub fn max_gain_db(&self) -> f32 {
        self.equalizer.max_gain_db()
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.chain.volume()
    }

    pub fn is_loading(&self) -> bool {
        self.chain.is_loading()
    }

    #[cfg(test)]
    pub fn chain(&self) -> &AudioSignalChain<D, O> {
        &self.chain
    }
}
