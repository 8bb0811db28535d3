//! Audio analysis source
//!
//! `AnalyzingSource` wraps any `rodio::Source<Item=f32>`, mixes frames to
//! mono, and runs a windowed FFT per analysis frame, feeding normalized bin
//! magnitudes to the shared `SpectralMeter`.

use std::num::NonZero;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rodio::Source;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::config::audio::{BIN_GAIN, FFT_SIZE, SPECTRUM_BINS};

use super::types::AudioAnalysis;

/// Wrapper source that captures samples for the onset meter
pub struct AnalyzingSource<S> {
    inner: S,
    analysis: Arc<Mutex<AudioAnalysis>>,
    window: Vec<f32>,
    frame_acc: f32,
    frame_fill: u16,
    channels: NonZero<u16>,
    sample_rate: NonZero<u32>,
    fft_planner: FftPlanner<f32>,
    local_sample_count: u64,
}

impl<S> AnalyzingSource<S>
where
    S: Source<Item = f32>,
{
    /// Create a new analyzing wrapper around the given source
    pub fn new(source: S, analysis: Arc<Mutex<AudioAnalysis>>) -> Self {
        let channels = source.channels();
        let sample_rate = source.sample_rate();
        Self {
            inner: source,
            analysis,
            window: Vec::with_capacity(FFT_SIZE),
            frame_acc: 0.0,
            frame_fill: 0,
            channels,
            sample_rate,
            fft_planner: FftPlanner::new(),
            local_sample_count: 0,
        }
    }

    fn process_window(&mut self) {
        let fft = self.fft_planner.plan_fft_forward(FFT_SIZE);
        let mut fft_input: Vec<Complex<f32>> = self
            .window
            .iter()
            .take(FFT_SIZE)
            .enumerate()
            .map(|(i, &s)| {
                // Hann window
                let window =
                    0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / FFT_SIZE as f32).cos());
                Complex::new(s * window, 0.0)
            })
            .collect();

        fft.process(&mut fft_input);

        let fft_norm = 1.0 / FFT_SIZE as f32;
        let mut bins = [0.0f32; SPECTRUM_BINS];
        for (bin, item) in bins.iter_mut().zip(fft_input.iter()) {
            let mag = item.norm() * fft_norm;
            *bin = (mag * BIN_GAIN).sqrt().min(1.0);
        }

        if let Ok(mut analysis) = self.analysis.lock() {
            analysis.meter.process_frame(&bins);
            analysis.sample_count = self.local_sample_count;
        }

        self.window.clear();
    }
}

impl<S> Iterator for AnalyzingSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.inner.next()?;
        self.local_sample_count += 1;

        self.frame_acc += sample;
        self.frame_fill += 1;
        if self.frame_fill == self.channels.get() {
            self.window.push(self.frame_acc / self.channels.get() as f32);
            self.frame_acc = 0.0;
            self.frame_fill = 0;

            if self.window.len() >= FFT_SIZE {
                self.process_window();
            }
        }

        Some(sample)
    }
}

impl<S> Source for AnalyzingSource<S>
where
    S: Source<Item = f32>,
{
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> NonZero<u16> {
        self.channels
    }

    fn sample_rate(&self) -> NonZero<u32> {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}
