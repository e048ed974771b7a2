//! User-facing equalizer state.
//!
//! The controller owns the ten band gains the UI shows and forwards every
//! change to a `GainTarget` (the signal chain). It does not care whether
//! anything is playing.

use tracing::debug;

use crate::audio::{BAND_COUNT, BAND_FREQUENCIES_HZ};
use crate::error::{PlayerError, Result};

/// Anything that can apply a band gain to live audio.
pub trait GainTarget {
    fn set_gain(&mut self, band: usize, gain_db: f32);
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Band {
    pub frequency_hz: f32,
    pub gain_db: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EqualizerSettings {
    pub bands: [Band; BAND_COUNT],
}

impl Default for EqualizerSettings {
    fn default() -> Self {
        Self {
            bands: std::array::from_fn(|i| Band {
                frequency_hz: BAND_FREQUENCIES_HZ[i],
                gain_db: 0.0,
            }),
        }
    }
}

impl EqualizerSettings {
    pub fn gains(&self) -> [f32; BAND_COUNT] {
        std::array::from_fn(|i| self.bands[i].gain_db)
    }
}

/// Short axis label for a band, e.g. `"125"` or `"2k"`.
pub fn band_label(frequency_hz: f32) -> String {
    if frequency_hz >= 1_000.0 {
        format!("{}k", frequency_hz / 1_000.0)
    } else {
        format!("{frequency_hz}")
    }
}

#[derive(Debug, Clone)]
pub struct EqualizerController {
    settings: EqualizerSettings,
    max_gain_db: f32,
}

impl EqualizerController {
    pub fn new(max_gain_db: f32) -> Self {
        Self {
            settings: EqualizerSettings::default(),
            max_gain_db: max_gain_db.abs(),
        }
    }

    /// A controller whose leading bands start at `preset`; extra values are ignored.
    pub fn with_preset(max_gain_db: f32, preset: &[f32]) -> Self {
        let mut eq = Self::new(max_gain_db);
        for (band, gain) in eq.settings.bands.iter_mut().zip(preset) {
            band.gain_db = gain.clamp(-eq.max_gain_db, eq.max_gain_db);
        }
        eq
    }

    pub fn max_gain_db(&self) -> f32 {
        self.max_gain_db
    }

    /// Set one band, clamping to the allowed range, and push it to `target`.
    ///
    /// Returns the gain actually applied.
    pub fn set_band_gain(
        &mut self,
        index: usize,
        gain_db: f32,
        target: &mut impl GainTarget,
    ) -> Result<f32> {
        let band = self
            .settings
            .bands
            .get_mut(index)
            .ok_or(PlayerError::InvalidBand {
                index,
                count: BAND_COUNT,
            })?;

        let applied = if gain_db.is_nan() {
            0.0
        } else {
            gain_db.clamp(-self.max_gain_db, self.max_gain_db)
        };
        band.gain_db = applied;
        target.set_gain(index, applied);
        debug!(band = index, gain_db = applied, "equalizer band set");
        Ok(applied)
    }

    /// Nudge a band by `delta_db`, clamped like `set_band_gain`.
    pub fn adjust_band_gain(
        &mut self,
        index: usize,
        delta_db: f32,
        target: &mut impl GainTarget,
    ) -> Result<f32> {
        let current = self
            .settings
            .bands
            .get(index)
            .map(|b| b.gain_db)
            .ok_or(PlayerError::InvalidBand {
                index,
                count: BAND_COUNT,
            })?;
        self.set_band_gain(index, current + delta_db, target)
    }

    pub fn settings(&self) -> &EqualizerSettings {
        &self.settings
    }

    /// Flatten every band.
    pub fn reset(&mut self, target: &mut impl GainTarget) {
        for band in &mut self.settings.bands {
            band.gain_db = 0.0;
        }
        self.apply_all(target);
    }

    /// Push the whole curve to `target`.
    pub fn apply_all(&self, target: &mut impl GainTarget) {
        for (index, band) in self.settings.bands.iter().enumerate() {
            target.set_gain(index, band.gain_db);
        }
    }
}
