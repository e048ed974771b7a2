//! The ten-band peaking filter cascade.
//!
//! `EqualizerSource` is a `rodio::Source` adapter that runs every sample of
//! its inner source through one biquad per band, with a separate filter state
//! per channel. Gains live in a shared `BandGains` cell written by the UI
//! thread and read by rodio's mixer thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use biquad::{Biquad as _, Coefficients, DirectForm1, ToHertz, Type};
use rodio::source::SeekError;
use rodio::{ChannelCount, Sample, SampleRate, Source};
use tracing::warn;

pub const BAND_COUNT: usize = 10;

/// Center frequencies, lowest band first.
pub const BAND_FREQUENCIES_HZ: [f32; BAND_COUNT] = [
    32.0, 64.0, 125.0, 250.0, 500.0, 1_000.0, 2_000.0, 4_000.0, 8_000.0, 16_000.0,
];

const BYPASS: Coefficients<f32> = Coefficients {
    a1: 0.0,
    a2: 0.0,
    b0: 1.0,
    b1: 0.0,
    b2: 0.0,
};

/// Per-band gains shared between the controller and live filter cascades.
#[derive(Debug)]
pub struct BandGains {
    gains: [AtomicU32; BAND_COUNT],
    generation: AtomicU64,
    q: f32,
}

impl BandGains {
    pub fn new(q: f32) -> Self {
        Self {
            gains: std::array::from_fn(|_| AtomicU32::new(0.0f32.to_bits())),
            generation: AtomicU64::new(0),
            q,
        }
    }

    /// Store `gain_db` for `band`; out-of-range bands are ignored.
    pub fn set(&self, band: usize, gain_db: f32) {
        if let Some(cell) = self.gains.get(band) {
            cell.store(gain_db.to_bits(), Ordering::Relaxed);
            self.generation.fetch_add(1, Ordering::Release);
        }
    }

    pub fn gain(&self, band: usize) -> f32 {
        self.gains
            .get(band)
            .map(|cell| f32::from_bits(cell.load(Ordering::Relaxed)))
            .unwrap_or(0.0)
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> [f32; BAND_COUNT] {
        std::array::from_fn(|band| self.gain(band))
    }

    /// Bumped on every `set`; filters recompute coefficients when it moves.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn q(&self) -> f32 {
        self.q
    }
}

fn peaking_coefficients(sample_rate: f32, center_hz: f32, gain_db: f32, q: f32) -> Coefficients<f32> {
    // A flat band is the identity; a band at or past Nyquist cannot be realized.
    if gain_db == 0.0 || center_hz * 2.0 >= sample_rate {
        return BYPASS;
    }
    Coefficients::<f32>::from_params(
        Type::PeakingEQ(gain_db),
        sample_rate.hz(),
        center_hz.hz(),
        q,
    )
    .unwrap_or_else(|e| {
        warn!(center_hz, sample_rate, error = ?e, "peaking filter rejected, bypassing band");
        BYPASS
    })
}

fn band_coefficients(sample_rate: SampleRate, gains: &BandGains) -> [Coefficients<f32>; BAND_COUNT] {
    std::array::from_fn(|band| {
        peaking_coefficients(
            sample_rate as f32,
            BAND_FREQUENCIES_HZ[band],
            gains.gain(band),
            gains.q(),
        )
    })
}

fn build_cascades(
    channels: ChannelCount,
    coefficients: &[Coefficients<f32>; BAND_COUNT],
) -> Vec<Vec<DirectForm1<f32>>> {
    (0..channels.max(1))
        .map(|_| {
            coefficients
                .iter()
                .map(|c| DirectForm1::<f32>::new(*c))
                .collect()
        })
        .collect()
}

pub struct EqualizerSource<S> {
    inner: S,
    gains: Arc<BandGains>,
    channels: ChannelCount,
    sample_rate: SampleRate,
    generation: u64,
    cascades: Vec<Vec<DirectForm1<f32>>>,
    channel: usize,
}

impl<S: Source> EqualizerSource<S> {
    pub fn new(inner: S, gains: Arc<BandGains>) -> Self {
        let channels = inner.channels();
        let sample_rate = inner.sample_rate();
        let generation = gains.generation();
        let cascades = build_cascades(channels, &band_coefficients(sample_rate, &gains));
        Self {
            inner,
            gains,
            channels,
            sample_rate,
            generation,
            cascades,
            channel: 0,
        }
    }

    /// Called at frame boundaries: follow format changes and gain updates.
    fn refresh(&mut self) {
        let channels = self.inner.channels();
        let sample_rate = self.inner.sample_rate();
        let generation = self.gains.generation();

        if channels != self.channels || sample_rate != self.sample_rate {
            self.channels = channels;
            self.sample_rate = sample_rate;
            self.generation = generation;
            self.cascades = build_cascades(channels, &band_coefficients(sample_rate, &self.gains));
        } else if generation != self.generation {
            self.generation = generation;
            let coefficients = band_coefficients(sample_rate, &self.gains);
            for cascade in &mut self.cascades {
                for (filter, c) in cascade.iter_mut().zip(coefficients.iter()) {
                    filter.update_coefficients(*c);
                }
            }
        }
    }
}

impl<S: Source> Iterator for EqualizerSource<S> {
    type Item = Sample;

    #[inline]
    fn next(&mut self) -> Option<Sample> {
        if self.channel == 0 {
            self.refresh();
        }

        let sample = self.inner.next()?;
        let out = match self.cascades.get_mut(self.channel) {
            Some(cascade) => cascade.iter_mut().fold(sample, |x, filter| filter.run(x)),
            None => sample,
        };
        self.channel = (self.channel + 1) % self.cascades.len().max(1);
        Some(out)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S: Source> Source for EqualizerSource<S> {
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> ChannelCount {
        self.inner.channels()
    }

    fn sample_rate(&self) -> SampleRate {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.inner.try_seek(pos)?;
        // Filters restart from silence at the new position.
        self.cascades = build_cascades(
            self.channels,
            &band_coefficients(self.sample_rate, &self.gains),
        );
        self.channel = 0;
        Ok(())
    }
}
