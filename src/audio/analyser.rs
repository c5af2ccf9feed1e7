use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

pub const DEFAULT_FFT_SIZE: usize = 1024;
pub const DEFAULT_SMOOTHING: f32 = 0.8;
pub const MIN_DB: f32 = -100.0;
pub const MAX_DB: f32 = -30.0;

/// Turns the latest block of time-domain samples into byte-range magnitudes.
///
/// Blackman window, magnitude scaled by `1 / fft_size`, exponential smoothing
/// across calls, then decibels mapped from `[MIN_DB, MAX_DB]` onto 0..=255.
pub struct SpectrumAnalyser {
    fft_size: usize,
    smoothing: f32,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    fft_buf: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl SpectrumAnalyser {
    /// `fft_size` is rounded up to a power of two within 32..=32768.
    /// A non-finite `smoothing` falls back to [`DEFAULT_SMOOTHING`].
    pub fn new(fft_size: usize, smoothing: f32) -> Self {
        let smoothing = if smoothing.is_finite() {
            smoothing.clamp(0.0, 0.99)
        } else {
            DEFAULT_SMOOTHING
        };
        let n = fft_size.clamp(32, 32_768).next_power_of_two();
        let window = (0..n)
            .map(|i| {
                let x = i as f32 / n as f32;
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            })
            .collect::<Vec<_>>();
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);
        Self {
            fft_size: n,
            smoothing,
            window,
            fft,
            fft_buf: vec![Complex { re: 0.0, im: 0.0 }; n],
            smoothed: vec![0.0; n / 2],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    /// `samples` holds the most recent `fft_size` samples, oldest first. A
    /// shorter slice is treated as zero-padded at the front.
    pub fn analyse(&mut self, samples: &[f32], out: &mut [f32]) {
        let n = self.fft_size;
        let pad = n.saturating_sub(samples.len());
        let start = samples.len().saturating_sub(n);
        for i in 0..n {
            let s = if i < pad { 0.0 } else { samples[start + i - pad] };
            self.fft_buf[i].re = s * self.window[i];
            self.fft_buf[i].im = 0.0;
        }

        self.fft.process(&mut self.fft_buf);

        let tau = self.smoothing;
        let scale = 1.0 / n as f32;
        let db_range = MAX_DB - MIN_DB;
        for (k, slot) in self.smoothed.iter_mut().enumerate() {
            let c = self.fft_buf[k];
            let mag = (c.re * c.re + c.im * c.im).sqrt() * scale;
            *slot = tau * *slot + (1.0 - tau) * mag;
            if let Some(o) = out.get_mut(k) {
                *o = db_to_byte(*slot, db_range);
            }
        }
        let filled = self.smoothed.len().min(out.len());
        out[filled..].fill(0.0);
    }

    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }
}

fn db_to_byte(mag: f32, db_range: f32) -> f32 {
    if mag <= 0.0 {
        return 0.0;
    }
    let db = 20.0 * mag.log10();
    (255.0 / db_range * (db - MIN_DB)).clamp(0.0, 255.0).floor()
}
