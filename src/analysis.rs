use crate::audio::SpectrumSource;

/// Number of frames averaged into `mean_flux`.
pub const FLUX_WINDOW: usize = 4;
/// Lowest value the adaptive threshold may decay to.
pub const THRESHOLD_FLOOR: f32 = 1.025;
/// Divisor applied to the per-frame threshold decay.
const THRESHOLD_DECAY_DIV: f32 = 1.5;

/// Per-frame onset measurement handed to scenes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OnsetResult {
    /// Mean normalized magnitude of the current snapshot, 0..1.
    pub flux: f32,
    /// Mean of the last [`FLUX_WINDOW`] flux values, 0..1.
    pub mean_flux: f32,
    /// True on the single frame that closes a detected peak.
    pub event: bool,
}

/// Fixed-size FIFO of recent flux values.
#[derive(Debug, Clone)]
struct FluxWindow {
    vals: [f32; FLUX_WINDOW],
    len: usize,
    pos: usize,
}

impl FluxWindow {
    fn new() -> Self {
        Self {
            vals: [0.0; FLUX_WINDOW],
            len: 0,
            pos: 0,
        }
    }

    fn push(&mut self, v: f32) {
        self.vals[self.pos] = v;
        self.pos = (self.pos + 1) % FLUX_WINDOW;
        if self.len < FLUX_WINDOW {
            self.len += 1;
        }
    }

    fn mean(&self) -> f32 {
        if self.len == 0 {
            return 0.0;
        }
        // Before the window fills, the live values sit in 0..len.
        let sum: f32 = self.vals[..self.len].iter().sum();
        sum / self.len as f32
    }
}

/// Self-normalizing peak detector over a stream of frequency snapshots.
///
/// Holds the adaptive threshold, the peak latch and the flux window. It does
/// not know where snapshots come from; see [`OnsetAnalyzer`] for the pulling
/// variant.
#[derive(Debug, Clone)]
pub struct OnsetDetector {
    threshold: f32,
    peaking: bool,
    window: FluxWindow,
    last: OnsetResult,
}

impl Default for OnsetDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl OnsetDetector {
    pub fn new() -> Self {
        Self {
            threshold: THRESHOLD_FLOOR,
            peaking: false,
            window: FluxWindow::new(),
            last: OnsetResult::default(),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_peaking(&self) -> bool {
        self.peaking
    }

    pub fn last(&self) -> OnsetResult {
        self.last
    }

    /// Feed one snapshot of byte-range magnitudes (0..=255) taken `dt`
    /// seconds after the previous one.
    ///
    /// A snapshot that is empty or starts with a non-finite value is treated
    /// as "audio graph not ready": nothing changes and the previous result is
    /// returned.
    pub fn process(&mut self, spectrum: &[f32], dt: f32) -> OnsetResult {
        match spectrum.first() {
            Some(v) if v.is_finite() => {}
            _ => return self.last,
        }

        let flux = normalized_flux(spectrum);
        self.window.push(flux);
        let mean_flux = self.window.mean();

        let mut event = false;
        if mean_flux > 0.0 {
            let ratio = flux / mean_flux;
            if flux > mean_flux * self.threshold {
                // Ratchet the bar up to the current peak height.
                self.threshold = ratio;
                self.peaking = true;
            } else {
                event = self.peaking;
                self.peaking = false;
            }
            self.threshold = decay_threshold(self.threshold, ratio, dt.max(0.0));
        }

        self.last = OnsetResult {
            flux,
            mean_flux,
            event,
        };
        self.last
    }
}

fn normalized_flux(spectrum: &[f32]) -> f32 {
    let mut acc = 0.0f32;
    let mut n = 0usize;
    for &s in spectrum {
        // Non-finite bins past the first are treated as silence.
        let s = if s.is_finite() { s.clamp(0.0, 255.0) } else { 0.0 };
        acc += s / 255.0;
        n += 1;
    }
    (acc / n.max(1) as f32).clamp(0.0, 1.0)
}

fn decay_threshold(threshold: f32, ratio: f32, dt: f32) -> f32 {
    if ratio <= 0.0 {
        // Unbounded decay term: the bar drops straight to the floor.
        return THRESHOLD_FLOOR;
    }
    let decayed = threshold - (dt * threshold) / ratio / THRESHOLD_DECAY_DIV;
    decayed.max(THRESHOLD_FLOOR)
}

/// Onset detector bound to a pull-based spectrum source.
pub struct OnsetAnalyzer {
    source: Box<dyn SpectrumSource>,
    snapshot: Vec<f32>,
    detector: OnsetDetector,
}

impl OnsetAnalyzer {
    pub fn new(source: Box<dyn SpectrumSource>) -> Self {
        let bins = source.bin_count().max(1);
        Self {
            source,
            snapshot: vec![0.0; bins],
            detector: OnsetDetector::new(),
        }
    }

    /// Pull the current snapshot from the source and run one detector step.
    pub fn update(&mut self, dt: f32) -> OnsetResult {
        let bins = self.source.bin_count().max(1);
        if self.snapshot.len() != bins {
            self.snapshot.resize(bins, 0.0);
        }
        self.source.frequency_data(&mut self.snapshot);
        self.detector.process(&self.snapshot, dt)
    }

    pub fn detector(&self) -> &OnsetDetector {
        &self.detector
    }

    pub fn source(&self) -> &dyn SpectrumSource {
        &*self.source
    }

    pub fn source_mut(&mut self) -> &mut dyn SpectrumSource {
        &mut *self.source
    }
}
