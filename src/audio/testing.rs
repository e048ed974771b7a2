//! In-memory decoder and output used by unit tests in place of rodio.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{LoadError, PlaybackError};

use super::backend::{DecodedMedia, MediaDecoder, OutputDevice, Voice};
use super::chain::AudioSignalChain;
use super::filter::BandGains;

pub(crate) const LOAD_TIMEOUT: Duration = Duration::from_secs(5);
pub(crate) const DEFAULT_DURATION: Duration = Duration::from_secs(180);

#[derive(Debug)]
pub(crate) struct FakeMedia {
    pub locator: String,
    pub duration: Option<Duration>,
}

impl DecodedMedia for FakeMedia {
    fn duration(&self) -> Option<Duration> {
        self.duration
    }
}

#[derive(Default)]
struct DecoderScript {
    failing: HashSet<String>,
    durations: HashMap<String, Option<Duration>>,
    gates: HashMap<String, Receiver<()>>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeDecoder {
    script: Arc<Mutex<DecoderScript>>,
}

impl FakeDecoder {
    pub fn fail(&self, locator: &str) {
        self.script.lock().unwrap().failing.insert(locator.to_string());
    }

    pub fn set_duration(&self, locator: &str, duration: Option<Duration>) {
        self.script
            .lock()
            .unwrap()
            .durations
            .insert(locator.to_string(), duration);
    }

    /// Hold the next decode of `locator` until the returned sender fires or drops.
    pub fn gate(&self, locator: &str) -> Sender<()> {
        let (tx, rx) = mpsc::channel();
        self.script
            .lock()
            .unwrap()
            .gates
            .insert(locator.to_string(), rx);
        tx
    }
}

impl MediaDecoder for FakeDecoder {
    type Media = FakeMedia;

    fn decode(&self, locator: &str) -> Result<FakeMedia, LoadError> {
        let gate = self.script.lock().unwrap().gates.remove(locator);
        if let Some(gate) = gate {
            let _ = gate.recv();
        }

        let script = self.script.lock().unwrap();
        if script.failing.contains(locator) {
            return Err(LoadError::Decode {
                path: locator.into(),
                reason: "scripted failure".into(),
            });
        }
        let duration = script
            .durations
            .get(locator)
            .copied()
            .unwrap_or(Some(DEFAULT_DURATION));
        Ok(FakeMedia {
            locator: locator.to_string(),
            duration,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ActiveVoice {
    pub locator: String,
    pub playing: bool,
    pub volume: f32,
    pub position: Duration,
    pub finished: bool,
}

#[derive(Debug, Default)]
struct OutputLog {
    connects: Vec<String>,
    disconnects: usize,
    fail_connect: bool,
    fail_play: bool,
    active: Option<ActiveVoice>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeOutput {
    log: Arc<Mutex<OutputLog>>,
}

impl FakeOutput {
    pub fn connects(&self) -> Vec<String> {
        self.log.lock().unwrap().connects.clone()
    }

    pub fn disconnects(&self) -> usize {
        self.log.lock().unwrap().disconnects
    }

    pub fn active(&self) -> Option<ActiveVoice> {
        self.log.lock().unwrap().active.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.active().is_some_and(|v| v.playing)
    }

    pub fn fail_connect(&self, fail: bool) {
        self.log.lock().unwrap().fail_connect = fail;
    }

    pub fn fail_play(&self, fail: bool) {
        self.log.lock().unwrap().fail_play = fail;
    }

    /// Pretend the active voice played its last sample.
    pub fn finish(&self) {
        if let Some(v) = self.log.lock().unwrap().active.as_mut() {
            v.finished = true;
            v.playing = false;
        }
    }

    pub fn advance(&self, position: Duration) {
        if let Some(v) = self.log.lock().unwrap().active.as_mut() {
            v.position = position;
        }
    }
}

impl OutputDevice for FakeOutput {
    type Media = FakeMedia;
    type Voice = FakeVoice;

    fn connect(
        &mut self,
        media: FakeMedia,
        _gains: &Arc<BandGains>,
    ) -> Result<FakeVoice, PlaybackError> {
        let mut log = self.log.lock().unwrap();
        if log.fail_connect {
            return Err(PlaybackError::Output("scripted connect failure".into()));
        }
        log.connects.push(media.locator.clone());
        log.active = Some(ActiveVoice {
            locator: media.locator,
            playing: false,
            volume: 1.0,
            position: Duration::ZERO,
            finished: false,
        });
        Ok(FakeVoice {
            log: Arc::clone(&self.log),
        })
    }
}

pub(crate) struct FakeVoice {
    log: Arc<Mutex<OutputLog>>,
}

impl FakeVoice {
    fn with_active<R>(&self, f: impl FnOnce(&mut ActiveVoice) -> R) -> Option<R> {
        self.log.lock().unwrap().active.as_mut().map(f)
    }
}

impl Voice for FakeVoice {
    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.log.lock().unwrap().fail_play {
            return Err(PlaybackError::Output("scripted play failure".into()));
        }
        self.with_active(|v| v.playing = true);
        Ok(())
    }

    fn pause(&mut self) {
        self.with_active(|v| v.playing = false);
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        self.with_active(|v| v.position = position);
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.with_active(|v| v.volume = volume);
    }

    fn position(&self) -> Duration {
        self.with_active(|v| v.position).unwrap_or(Duration::ZERO)
    }

    fn is_finished(&self) -> bool {
        self.with_active(|v| v.finished).unwrap_or(true)
    }

    fn disconnect(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.disconnects += 1;
        log.active = None;
    }
}

pub(crate) type FakeChain = AudioSignalChain<FakeDecoder, FakeOutput>;

/// A chain over fakes, plus handles to script and inspect them.
pub(crate) fn fake_chain() -> (FakeChain, FakeDecoder, FakeOutput) {
    let decoder = FakeDecoder::default();
    let output = FakeOutput::default();
    let chain = AudioSignalChain::new(decoder.clone(), output.clone(), 1.0);
    (chain, decoder, output)
}
