mod analyser;
mod mic;
mod synth;
mod wav;

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait};
use std::io::{self, Write};

pub use analyser::{SpectrumAnalyser, DEFAULT_FFT_SIZE, DEFAULT_SMOOTHING, MAX_DB, MIN_DB};
pub use mic::MicSource;
pub use synth::PulseSource;
pub use wav::WavSource;

/// Pull-based provider of frequency snapshots.
///
/// `frequency_data` fills `out` with byte-range (0..=255) magnitudes, one per
/// bin, sampled at the moment of the call. A source that is not ready yet
/// writes a non-finite value into bin 0.
pub trait SpectrumSource {
    fn label(&self) -> String;
    fn bin_count(&self) -> usize;
    fn frequency_data(&mut self, out: &mut [f32]);
    /// A fatal problem with the underlying stream, if one was reported.
    fn failure(&self) -> Option<String> {
        None
    }
}

pub fn list_input_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .context("enumerate input devices")?;

    let mut out = io::stdout();
    writeln!(out, "Input devices:")?;
    for dev in devices {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        writeln!(out, "  - {}", name)?;
    }
    Ok(())
}

/// Mark a snapshot as "not ready".
pub(crate) fn write_not_ready(out: &mut [f32]) {
    out.fill(0.0);
    if let Some(first) = out.first_mut() {
        *first = f32::NAN;
    }
}
