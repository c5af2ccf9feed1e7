use super::SpectrumSource;

/// Deterministic spectrum generator: a quiet noise floor with a kick every
/// `60 / bpm` seconds, advancing one `1 / fps` step per pull.
///
/// Used by the headless benchmark and handy for driving the player without
/// audio hardware.
pub struct PulseSource {
    bins: usize,
    bpm: f32,
    fps: f32,
    step: u64,
    rng: fastrand::Rng,
}

impl PulseSource {
    pub fn new(bins: usize, bpm: f32, fps: f32, seed: u64) -> Self {
        Self {
            bins: bins.max(1),
            bpm: bpm.clamp(1.0, 600.0),
            fps: fps.clamp(1.0, 1000.0),
            step: 0,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    fn level(&self) -> f32 {
        let t = self.step as f32 / self.fps;
        let period = 60.0 / self.bpm;
        let phase = (t / period).fract();
        // Fast attack, exponential release.
        0.08 + 0.8 * (-phase * 14.0).exp()
    }
}

impl SpectrumSource for PulseSource {
    fn label(&self) -> String {
        format!("pulse {:.0} bpm", self.bpm)
    }

    fn bin_count(&self) -> usize {
        self.bins
    }

    fn frequency_data(&mut self, out: &mut [f32]) {
        let level = self.level();
        let n = out.len().max(1) as f32;
        for (i, v) in out.iter_mut().enumerate() {
            // Energy leans toward the low bins, like a kick drum.
            let tilt = 1.0 - 0.6 * (i as f32 / n);
            let jitter = 0.9 + self.rng.f32() * 0.2;
            *v = (level * tilt * jitter * 255.0).clamp(0.0, 255.0);
        }
        self.step += 1;
    }
}
