//! Source binding and routing through the equalizer cascade.
//!
//! Each `load` issues a fresh `LoadToken` and decodes on a worker thread.
//! Only the outcome carrying the latest token is bound; anything older is
//! dropped on arrival. The route to the output is built at most once per
//! bound source and torn down before the next source is bound.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::equalizer::GainTarget;
use crate::error::{LoadError, PlaybackError, PlayerError};

use super::backend::{DecodedMedia, MediaDecoder, OutputDevice, Voice};
use super::filter::BandGains;
use super::format::AudioFormat;

/// Identifies one `load` request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadToken(u64);

/// Notifications produced by `AudioSignalChain::poll`.
#[derive(Debug)]
pub enum ChainEvent {
    /// The latest load finished decoding and is bound.
    Loaded {
        token: LoadToken,
        duration: Option<Duration>,
    },
    LoadFailed {
        token: LoadToken,
        error: LoadError,
    },
    /// A start requested while the source was still loading failed.
    PlaybackFailed {
        token: LoadToken,
        error: PlaybackError,
    },
    TimeUpdate {
        position: Duration,
        duration: Option<Duration>,
    },
    /// Reported once per bound source.
    Ended { token: LoadToken },
}

struct LoadOutcome<M> {
    token: LoadToken,
    result: Result<M, LoadError>,
}

struct PendingLoad {
    token: LoadToken,
    locator: String,
    play_requested: bool,
}

struct BoundSource<M, V> {
    token: LoadToken,
    locator: String,
    duration: Option<Duration>,
    /// Held until the route is built, then owned by the voice.
    media: Option<M>,
    voice: Option<V>,
    playing: bool,
    ended: bool,
}

pub struct AudioSignalChain<D, O>
where
    D: MediaDecoder,
    O: OutputDevice<Media = D::Media>,
{
    decoder: Arc<D>,
    output: O,
    gains: Arc<BandGains>,
    volume: f32,
    last_token: u64,
    pending: Option<PendingLoad>,
    bound: Option<BoundSource<D::Media, O::Voice>>,
    /// The source the cascade is currently routed for.
    connected_for: Option<LoadToken>,
    /// Set by the first `connect_for_output`; later sources connect on bind.
    output_requested: bool,
    outcomes_tx: Sender<LoadOutcome<D::Media>>,
    outcomes_rx: Receiver<LoadOutcome<D::Media>>,
}

impl<D, O> AudioSignalChain<D, O>
where
    D: MediaDecoder,
    O: OutputDevice<Media = D::Media>,
{
    pub fn new(decoder: D, output: O, eq_q: f32) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::channel();
        Self {
            decoder: Arc::new(decoder),
            output,
            gains: Arc::new(BandGains::new(eq_q)),
            volume: 1.0,
            last_token: 0,
            pending: None,
            bound: None,
            connected_for: None,
            output_requested: false,
            outcomes_tx,
            outcomes_rx,
        }
    }

    /// Start loading `locator`, superseding whatever was loaded or loading.
    ///
    /// Unrecognized extensions are rejected before anything changes.
    pub fn load(&mut self, locator: &str) -> Result<LoadToken, PlayerError> {
        if AudioFormat::from_locator(locator).is_none() {
            return Err(PlayerError::UnsupportedFormat {
                locator: locator.to_string(),
            });
        }

        self.release();
        self.last_token += 1;
        let token = LoadToken(self.last_token);
        self.pending = Some(PendingLoad {
            token,
            locator: locator.to_string(),
            play_requested: false,
        });

        let decoder = Arc::clone(&self.decoder);
        let tx = self.outcomes_tx.clone();
        let owned = locator.to_string();
        thread::spawn(move || {
            let result = decoder.decode(&owned);
            // The chain may already be gone; there is nobody left to tell.
            let _ = tx.send(LoadOutcome { token, result });
        });

        debug!(token = token.0, locator, "loading source");
        Ok(token)
    }

    /// Build the source → filters → output route.
    ///
    /// Idempotent for a given source. Before any source is bound the request
    /// is remembered and honored as soon as a load completes.
    pub fn connect_for_output(&mut self) -> Result<(), PlaybackError> {
        self.output_requested = true;

        let Some(bound) = self.bound.as_mut() else {
            return Ok(());
        };
        if self.connected_for == Some(bound.token) {
            return Ok(());
        }
        let Some(media) = bound.media.take() else {
            return Err(PlaybackError::NoSource);
        };

        let mut voice = self.output.connect(media, &self.gains)?;
        voice.set_volume(self.volume);
        bound.voice = Some(voice);
        self.connected_for = Some(bound.token);
        debug!(token = bound.token.0, locator = %bound.locator, "connected output route");
        Ok(())
    }

    /// Start or resume the bound source.
    ///
    /// While a load is pending the request is recorded; a later failure to
    /// start is reported as `ChainEvent::PlaybackFailed`.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        if let Some(pending) = self.pending.as_mut() {
            pending.play_requested = true;
            return Ok(());
        }
        if self.bound.is_none() {
            return Err(PlaybackError::NoSource);
        }

        self.connect_for_output()?;
        let bound = self.bound.as_mut().ok_or(PlaybackError::NoSource)?;
        let voice = bound.voice.as_mut().ok_or(PlaybackError::NoSource)?;
        voice.play()?;
        bound.playing = true;
        Ok(())
    }

    pub fn pause(&mut self) {
        if let Some(pending) = self.pending.as_mut() {
            pending.play_requested = false;
        }
        if let Some(bound) = self.bound.as_mut() {
            if let Some(voice) = bound.voice.as_mut() {
                voice.pause();
            }
            bound.playing = false;
        }
    }

    /// Jump to `position`, clamped to the source's duration.
    pub fn seek(&mut self, position: Duration) -> Result<Duration, PlaybackError> {
        if self.pending.is_some() {
            return Err(PlaybackError::DurationUnknown);
        }
        let duration = self
            .bound
            .as_ref()
            .ok_or(PlaybackError::NoSource)?
            .duration
            .ok_or(PlaybackError::DurationUnknown)?;
        let target = position.min(duration);

        self.connect_for_output()?;
        let bound = self.bound.as_mut().ok_or(PlaybackError::NoSource)?;
        let voice = bound.voice.as_mut().ok_or(PlaybackError::NoSource)?;
        voice.seek(target)?;
        Ok(target)
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(voice) = self.bound.as_mut().and_then(|b| b.voice.as_mut()) {
            voice.set_volume(self.volume);
        }
    }

    /// Disconnect and forget the current source and any pending load.
    pub fn stop(&mut self) {
        if self.pending.is_some() || self.bound.is_some() {
            info!("stopping output");
        }
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut bound) = self.bound.take() {
            if let Some(mut voice) = bound.voice.take() {
                voice.disconnect();
                debug!(token = bound.token.0, "disconnected output route");
            }
        }
        self.connected_for = None;
        self.pending = None;
    }

    /// Drain finished loads and report progress of the bound source.
    pub fn poll(&mut self) -> Vec<ChainEvent> {
        let mut events = Vec::new();
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            self.accept(outcome, &mut events);
        }
        self.observe(&mut events);
        events
    }

    /// Block until the pending load resolves or `timeout` passes, then poll.
    pub fn wait_for_load(&mut self, timeout: Duration) -> Vec<ChainEvent> {
        let mut events = Vec::new();
        let deadline = Instant::now() + timeout;
        while self.pending.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.outcomes_rx.recv_timeout(remaining) {
                Ok(outcome) => self.accept(outcome, &mut events),
                Err(_) => break,
            }
        }
        events.extend(self.poll());
        events
    }

    fn accept(&mut self, outcome: LoadOutcome<D::Media>, events: &mut Vec<ChainEvent>) {
        let LoadOutcome { token, result } = outcome;
        let current = self.pending.as_ref().is_some_and(|p| p.token == token);
        if !current {
            debug!(token = token.0, "dropping superseded load");
            return;
        }
        let Some(pending) = self.pending.take() else {
            return;
        };

        match result {
            Ok(media) => {
                let duration = media.duration();
                self.bound = Some(BoundSource {
                    token,
                    locator: pending.locator,
                    duration,
                    media: Some(media),
                    voice: None,
                    playing: false,
                    ended: false,
                });
                events.push(ChainEvent::Loaded { token, duration });

                if self.output_requested || pending.play_requested {
                    if let Err(error) = self.connect_for_output() {
                        warn!(token = token.0, %error, "failed to connect output");
                        events.push(ChainEvent::PlaybackFailed { token, error });
                        return;
                    }
                }
                if pending.play_requested {
                    if let Err(error) = self.play() {
                        warn!(token = token.0, %error, "deferred start failed");
                        events.push(ChainEvent::PlaybackFailed { token, error });
                    }
                }
            }
            Err(error) => {
                warn!(token = token.0, locator = %pending.locator, %error, "load failed");
                events.push(ChainEvent::LoadFailed { token, error });
            }
        }
    }

    fn observe(&mut self, events: &mut Vec<ChainEvent>) {
        let Some(bound) = self.bound.as_mut() else {
            return;
        };
        if !bound.playing {
            return;
        }
        let Some(voice) = bound.voice.as_ref() else {
            return;
        };

        if voice.is_finished() {
            bound.playing = false;
            bound.ended = true;
            events.push(ChainEvent::Ended { token: bound.token });
        } else {
            events.push(ChainEvent::TimeUpdate {
                position: voice.position(),
                duration: bound.duration,
            });
        }
    }

    #[cfg(test)]
    pub fn gains(&self) -> &Arc<BandGains> {
        &self.gains
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn position(&self) -> Duration {
        self.bound
            .as_ref()
            .and_then(|b| b.voice.as_ref())
            .map(|v| v.position())
            .unwrap_or(Duration::ZERO)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.bound.as_ref().and_then(|b| b.duration)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// True when `play` has something to start or resume.
    pub fn is_playable(&self) -> bool {
        self.pending.is_some()
            || self
                .bound
                .as_ref()
                .is_some_and(|b| !b.ended && (b.media.is_some() || b.voice.is_some()))
    }

    /// True after the bound source played to its end.
    #[cfg(test)]
    pub fn has_ended(&self) -> bool {
        self.bound.as_ref().is_some_and(|b| b.ended)
    }

    #[cfg(test)]
    pub fn connected_for(&self) -> Option<LoadToken> {
        self.connected_for
    }

    #[cfg(test)]
    pub fn bound_token(&self) -> Option<LoadToken> {
        self.bound.as_ref().map(|b| b.token)
    }

    #[cfg(test)]
    pub fn bound_locator(&self) -> Option<&str> {
        self.bound.as_ref().map(|b| b.locator.as_str())
    }
}

impl<D, O> GainTarget for AudioSignalChain<D, O>
where
    D: MediaDecoder,
    O: OutputDevice<Media = D::Media>,
{
    /// Live cascades pick the value up on their next frame; unconnected
    /// sources get it when they are routed.
    fn set_gain(&mut self, band: usize, gain_db: f32) {
        self.gains.set(band, gain_db);
    }
}
