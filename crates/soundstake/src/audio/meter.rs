//! Spectral onset meter
//!
//! `SpectralMeter` turns per-frame frequency magnitudes into a smoothed
//! scalar onset value plus a fixed band array for visualization. Analysis is
//! restricted to a sub-band of bins; energy and flux deviations above slow
//! EMA baselines drive the onset. Read-only with respect to playback — the
//! meter never influences scoring.

use crate::config::audio::{
    BAND_BASELINE_DECAY, BAND_GAIN, BAND_SMOOTHING, ENERGY_BASELINE_DECAY, METER_BANDS,
    ONSET_ENERGY_GAIN, ONSET_FLUX_GAIN, ONSET_SMOOTHING, SUB_BAND_HIGH, SUB_BAND_LOW,
    SUB_BAND_WIDTH,
};

/// Onset meter state, recomputed every analysis frame
#[derive(Clone)]
pub struct SpectralMeter {
    onset: f32,
    bands: [f32; METER_BANDS],
    energy_baseline: f32,
    band_baselines: [f32; METER_BANDS],
    prev_bins: [f32; SUB_BAND_WIDTH],
}

impl Default for SpectralMeter {
    fn default() -> Self {
        Self {
            onset: 0.0,
            bands: [0.0; METER_BANDS],
            energy_baseline: 0.0,
            band_baselines: [0.0; METER_BANDS],
            prev_bins: [0.0; SUB_BAND_WIDTH],
        }
    }
}

impl SpectralMeter {
    /// Create a new meter with zeroed state
    pub fn new() -> Self {
        Self::default()
    }

    /// Smoothed onset value in [0, 1]
    pub fn onset(&self) -> f32 {
        self.onset
    }

    /// Per-band onset values in [0, 1]
    pub fn bands(&self) -> &[f32; METER_BANDS] {
        &self.bands
    }

    /// Feed one frame of normalized bin magnitudes (one value per bin,
    /// each in [0, 1]). Frames shorter than the analyzed sub-band are ignored.
    pub fn process_frame(&mut self, bins: &[f32]) {
        if bins.len() < SUB_BAND_HIGH {
            return;
        }
        let sub = &bins[SUB_BAND_LOW..SUB_BAND_HIGH];
        let len = sub.len() as f32;

        let energy = sub.iter().sum::<f32>() / len;
        let flux = sub
            .iter()
            .zip(self.prev_bins.iter())
            .map(|(&cur, &prev)| (cur - prev).max(0.0))
            .sum::<f32>()
            / len;

        // Onset is measured against the baseline from previous frames,
        // then the baseline absorbs this frame.
        let raw = ((energy - self.energy_baseline) * ONSET_ENERGY_GAIN
            + flux * ONSET_FLUX_GAIN)
            .clamp(0.0, 1.0);
        self.onset = self.onset * ONSET_SMOOTHING + raw * (1.0 - ONSET_SMOOTHING);
        self.energy_baseline = self.energy_baseline * ENERGY_BASELINE_DECAY
            + energy * (1.0 - ENERGY_BASELINE_DECAY);

        let group = SUB_BAND_WIDTH / METER_BANDS;
        for (i, chunk) in sub.chunks_exact(group).take(METER_BANDS).enumerate() {
            let band_energy = chunk.iter().sum::<f32>() / group as f32;
            let rise = ((band_energy - self.band_baselines[i]) * BAND_GAIN).clamp(0.0, 1.0);
            self.bands[i] = self.bands[i] * BAND_SMOOTHING + rise * (1.0 - BAND_SMOOTHING);
            self.band_baselines[i] = self.band_baselines[i] * BAND_BASELINE_DECAY
                + band_energy * (1.0 - BAND_BASELINE_DECAY);
        }

        self.prev_bins.copy_from_slice(sub);
    }

    /// Reset meter, bands, and all baselines to zero
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::audio::SPECTRUM_BINS;

    fn silence() -> Vec<f32> {
        vec![0.0; SPECTRUM_BINS]
    }

    fn uniform(level: f32) -> Vec<f32> {
        vec![level; SPECTRUM_BINS]
    }

    #[test]
    fn default_is_zeroed() {
        let meter = SpectralMeter::new();
        assert_eq!(meter.onset(), 0.0);
        assert!(meter.bands().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn band_count_matches_config() {
        let meter = SpectralMeter::new();
        assert_eq!(meter.bands().len(), METER_BANDS);
    }

    #[test]
    fn silence_keeps_meter_at_zero() {
        let mut meter = SpectralMeter::new();
        for _ in 0..100 {
            meter.process_frame(&silence());
        }
        assert_eq!(meter.onset(), 0.0);
        assert!(meter.bands().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn loud_frame_after_silence_raises_onset() {
        let mut meter = SpectralMeter::new();
        for _ in 0..20 {
            meter.process_frame(&silence());
        }
        meter.process_frame(&uniform(0.8));
        assert!(
            meter.onset() > 0.1,
            "onset should respond to an energy jump: {}",
            meter.onset()
        );
    }

    #[test]
    fn loud_frame_raises_all_bands() {
        let mut meter = SpectralMeter::new();
        meter.process_frame(&uniform(0.9));
        assert!(
            meter.bands().iter().all(|&b| b > 0.0),
            "uniform energy should raise every band"
        );
    }

    #[test]
    fn steady_signal_onset_decays_as_baseline_adapts() {
        let mut meter = SpectralMeter::new();
        meter.process_frame(&uniform(0.5));
        let initial = meter.onset();
        for _ in 0..300 {
            meter.process_frame(&uniform(0.5));
        }
        assert!(
            meter.onset() < initial,
            "baseline should absorb a steady signal: initial {} final {}",
            initial,
            meter.onset()
        );
        assert!(meter.onset() < 0.05);
    }

    #[test]
    fn onset_clamped_to_one() {
        let mut meter = SpectralMeter::new();
        for _ in 0..50 {
            meter.process_frame(&uniform(1.0));
            assert!(meter.onset() <= 1.0);
            assert!(meter.onset() >= 0.0);
        }
    }

    #[test]
    fn bands_clamped_to_unit_range() {
        let mut meter = SpectralMeter::new();
        for _ in 0..50 {
            meter.process_frame(&uniform(1.0));
            for (i, &b) in meter.bands().iter().enumerate() {
                assert!((0.0..=1.0).contains(&b), "band {} = {}", i, b);
            }
        }
    }

    #[test]
    fn energy_drop_does_not_go_negative() {
        let mut meter = SpectralMeter::new();
        for _ in 0..50 {
            meter.process_frame(&uniform(0.9));
        }
        for _ in 0..50 {
            meter.process_frame(&silence());
        }
        assert!(meter.onset() >= 0.0);
        assert!(meter.bands().iter().all(|&b| b >= 0.0));
    }

    #[test]
    fn localized_energy_raises_matching_band_most() {
        let mut meter = SpectralMeter::new();
        // Energy only in the first band's bins of the sub-band
        let group = SUB_BAND_WIDTH / METER_BANDS;
        let mut bins = silence();
        for bin in bins.iter_mut().skip(SUB_BAND_LOW).take(group) {
            *bin = 0.9;
        }
        meter.process_frame(&bins);
        let bands = meter.bands();
        assert!(bands[0] > 0.0);
        for (i, &b) in bands.iter().enumerate().skip(1) {
            assert!(bands[0] > b, "band 0 ({}) should exceed band {} ({})", bands[0], i, b);
        }
    }

    #[test]
    fn energy_outside_sub_band_is_ignored() {
        let mut meter = SpectralMeter::new();
        let mut bins = silence();
        // Only near-DC and near-Nyquist bins carry energy
        for bin in bins.iter_mut().take(SUB_BAND_LOW) {
            *bin = 1.0;
        }
        for bin in bins.iter_mut().skip(SUB_BAND_HIGH) {
            *bin = 1.0;
        }
        for _ in 0..10 {
            meter.process_frame(&bins);
        }
        assert_eq!(meter.onset(), 0.0);
        assert!(meter.bands().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn short_frame_is_ignored() {
        let mut meter = SpectralMeter::new();
        meter.process_frame(&[0.9; SUB_BAND_HIGH - 1]);
        assert_eq!(meter.onset(), 0.0);
        assert!(meter.bands().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn reset_zeroes_values_and_baselines() {
        let mut meter = SpectralMeter::new();
        for _ in 0..20 {
            meter.process_frame(&uniform(0.7));
        }
        meter.reset();
        assert_eq!(meter.onset(), 0.0);
        assert!(meter.bands().iter().all(|&b| b == 0.0));
        // A fresh loud frame after reset behaves as if from a cold start:
        // the baseline no longer remembers the earlier loud signal.
        let mut fresh = SpectralMeter::new();
        let mut bins = uniform(0.7);
        meter.process_frame(&bins);
        fresh.process_frame(&bins);
        assert!((meter.onset() - fresh.onset()).abs() < 1e-6);
        bins = uniform(0.2);
        meter.process_frame(&bins);
        fresh.process_frame(&bins);
        assert!((meter.onset() - fresh.onset()).abs() < 1e-6);
    }

    #[test]
    fn flux_spike_registers_without_net_energy_change() {
        // Shift energy between two halves of the sub-band: the mean energy
        // is unchanged but the per-bin increases produce flux.
        let mut meter = SpectralMeter::new();
        let half = SUB_BAND_LOW + SUB_BAND_WIDTH / 2;
        let mut a = silence();
        for bin in a.iter_mut().take(half).skip(SUB_BAND_LOW) {
            *bin = 0.4;
        }
        let mut b = silence();
        for bin in b.iter_mut().take(SUB_BAND_HIGH).skip(half) {
            *bin = 0.4;
        }
        // Let the baseline settle on pattern `a`
        for _ in 0..200 {
            meter.process_frame(&a);
        }
        let settled = meter.onset();
        meter.process_frame(&b);
        assert!(
            meter.onset() > settled + 0.05,
            "flux should register a spectral shift: settled {} now {}",
            settled,
            meter.onset()
        );
    }

    #[test]
    fn onset_is_smoothed_across_frames() {
        // A single loud frame must not saturate the smoothed onset in one step
        let mut meter = SpectralMeter::new();
        meter.process_frame(&uniform(1.0));
        assert!(meter.onset() < 0.5, "one frame should be smoothed: {}", meter.onset());
        meter.process_frame(&uniform(1.0));
        let second = meter.onset();
        assert!(second > 0.3, "sustained attack should build up: {}", second);
    }
}
