//! The rodio-backed decoder and output device used by the real player.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lofty::prelude::*;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::debug;

use crate::error::{LoadError, PlaybackError};

use super::backend::{DecodedMedia, MediaDecoder, OutputDevice, Voice};
use super::filter::{BandGains, EqualizerSource};

/// Decodes locators as files below a root directory.
#[derive(Debug, Clone)]
pub struct FileDecoder {
    root: PathBuf,
}

impl FileDecoder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, locator: &str) -> PathBuf {
        let path = Path::new(locator);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

pub struct DecodedFile {
    source: Decoder<BufReader<File>>,
    duration: Option<Duration>,
}

impl DecodedMedia for DecodedFile {
    fn duration(&self) -> Option<Duration> {
        self.duration
    }
}

/// Container duration from the tags, for formats rodio cannot size up front.
fn tagged_duration(path: &Path) -> Option<Duration> {
    let tagged = lofty::read_from_path(path).ok()?;
    let d = tagged.properties().duration();
    (!d.is_zero()).then_some(d)
}

impl MediaDecoder for FileDecoder {
    type Media = DecodedFile;

    fn decode(&self, locator: &str) -> Result<DecodedFile, LoadError> {
        let path = self.resolve(locator);
        let file = File::open(&path).map_err(|source| LoadError::Open {
            path: path.clone(),
            source,
        })?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| LoadError::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let duration = source.total_duration().or_else(|| tagged_duration(&path));
        debug!(path = %path.display(), ?duration, "decoded source");
        Ok(DecodedFile { source, duration })
    }
}

/// The default system output stream.
pub struct RodioOutput {
    stream: OutputStream,
}

impl RodioOutput {
    pub fn open() -> Result<Self, PlaybackError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlaybackError::Output(e.to_string()))?;
        // rodio prints to stderr when the stream drops, which garbles the TUI.
        stream.log_on_drop(false);
        Ok(Self { stream })
    }
}

impl OutputDevice for RodioOutput {
    type Media = DecodedFile;
    type Voice = RodioVoice;

    fn connect(
        &mut self,
        media: DecodedFile,
        gains: &Arc<BandGains>,
    ) -> Result<RodioVoice, PlaybackError> {
        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        sink.append(EqualizerSource::new(media.source, Arc::clone(gains)));
        Ok(RodioVoice { sink })
    }
}

pub struct RodioVoice {
    sink: Sink,
}

impl Voice for RodioVoice {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        self.sink
            .try_seek(position)
            .map_err(|e| PlaybackError::Seek(e.to_string()))
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    fn disconnect(&mut self) {
        self.sink.stop();
    }
}
