use super::{write_not_ready, SpectrumAnalyser, SpectrumSource};
use anyhow::{anyhow, Context};
use std::path::Path;
use std::time::{Duration, Instant};

/// WAV file played silently against the wall clock.
///
/// The file is decoded to mono up front; each pull analyses the window that
/// ends at the current playhead.
pub struct WavSource {
    samples: Vec<f32>,
    sample_rate_hz: u32,
    looping: bool,
    started: Instant,
    analyser: SpectrumAnalyser,
    name: String,
    finished: bool,
}

impl WavSource {
    pub fn open(path: &Path, looping: bool, analyser: SpectrumAnalyser) -> anyhow::Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .with_context(|| format!("open wav {}", path.display()))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .context("decode float samples")?,
            hound::SampleFormat::Int => {
                let full_scale = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / full_scale))
                    .collect::<Result<_, _>>()
                    .context("decode integer samples")?
            }
        };

        let mono = interleaved
            .chunks(channels)
            .map(|frame| (frame.iter().sum::<f32>() / channels as f32).clamp(-1.0, 1.0))
            .collect::<Vec<_>>();
        if mono.is_empty() {
            return Err(anyhow!("wav {} contains no samples", path.display()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        tracing::info!(file = %name, sample_rate_hz = spec.sample_rate, frames = mono.len(), "wav loaded");

        Ok(Self::from_samples(name, mono, spec.sample_rate, looping, analyser))
    }

    pub fn from_samples(
        name: impl Into<String>,
        samples: Vec<f32>,
        sample_rate_hz: u32,
        looping: bool,
        analyser: SpectrumAnalyser,
    ) -> Self {
        Self {
            samples,
            sample_rate_hz: sample_rate_hz.max(1),
            looping,
            started: Instant::now(),
            analyser,
            name: name.into(),
            finished: false,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate_hz as f64)
    }

    /// Move the playhead to `t` from the start of the file.
    pub fn seek(&mut self, t: Duration) {
        let now = Instant::now();
        self.started = now.checked_sub(t).unwrap_or(now);
        self.finished = false;
        self.analyser.reset();
    }

    fn playhead(&self) -> usize {
        let secs = self.started.elapsed().as_secs_f64();
        (secs * self.sample_rate_hz as f64) as usize
    }
}

impl SpectrumSource for WavSource {
    fn label(&self) -> String {
        format!("file: {}", self.name)
    }

    fn bin_count(&self) -> usize {
        self.analyser.bin_count()
    }

    fn frequency_data(&mut self, out: &mut [f32]) {
        let len = self.samples.len();
        let mut pos = self.playhead();
        if pos >= len {
            if !self.looping {
                self.finished = true;
                write_not_ready(out);
                return;
            }
            pos %= len;
        }

        let n = self.analyser.fft_size();
        if pos < n && !(self.looping && self.started.elapsed() >= self.duration()) {
            // Not one full window played yet.
            write_not_ready(out);
            return;
        }

        if pos >= n {
            self.analyser.analyse(&self.samples[pos - n..pos], out);
        } else {
            // Wrapped loop: stitch the tail of the file onto the head.
            let mut window = Vec::with_capacity(n);
            let tail = n - pos;
            window.extend_from_slice(&self.samples[len.saturating_sub(tail)..]);
            window.extend_from_slice(&self.samples[..pos]);
            self.analyser.analyse(&window, out);
        }
    }

    fn failure(&self) -> Option<String> {
        if self.finished {
            Some(format!("{} finished", self.name))
        } else {
            None
        }
    }
}
