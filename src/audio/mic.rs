use super::{write_not_ready, SpectrumAnalyser, SpectrumSource};
use anyhow::{anyhow, Context};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use std::sync::{Arc, Mutex};

/// Live microphone capture.
///
/// The cpal callback only pushes mono samples into a ring; all analysis runs
/// on the caller's thread when a snapshot is pulled. Dropping the source
/// drops the stream, which stops capture.
pub struct MicSource {
    _stream: cpal::Stream,
    cons: ringbuf::HeapCons<f32>,
    history: Vec<f32>,
    ordered: Vec<f32>,
    write_pos: usize,
    filled: usize,
    analyser: SpectrumAnalyser,
    failure: Arc<Mutex<Option<String>>>,
    device_name: String,
    pub sample_rate_hz: u32,
}

impl MicSource {
    pub fn open(device_query: Option<&str>, analyser: SpectrumAnalyser) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = select_input_device(&host, device_query)?;
        let device_name = device.name().unwrap_or_else(|_| "<unknown>".to_string());
        let supported = device
            .default_input_config()
            .context("get default input config")?;
        let sample_rate_hz = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.clone().into();

        // One second of headroom between frames is plenty at any sane fps.
        let rb = HeapRb::<f32>::new((sample_rate_hz as usize).max(analyser.fft_size()));
        let (mut prod, cons) = rb.split();

        let failure = Arc::new(Mutex::new(None));
        let failure_for_cb = Arc::clone(&failure);
        let err_fn = move |err: cpal::StreamError| {
            tracing::warn!(error = %err, "audio stream error");
            if let Ok(mut slot) = failure_for_cb.lock() {
                slot.get_or_insert_with(|| err.to_string());
            }
        };

        let stream = match supported.sample_format() {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            fmt => return Err(anyhow!("unsupported sample format: {fmt:?}")),
        };

        stream.play().context("start input stream")?;
        tracing::info!(device = %device_name, sample_rate_hz, channels, "microphone attached");

        let n = analyser.fft_size();
        Ok(Self {
            _stream: stream,
            cons,
            history: vec![0.0; n],
            ordered: vec![0.0; n],
            write_pos: 0,
            filled: 0,
            analyser,
            failure,
            device_name,
            sample_rate_hz,
        })
    }

    fn drain(&mut self) {
        let n = self.history.len();
        while let Some(s) = self.cons.try_pop() {
            self.history[self.write_pos] = s;
            self.write_pos = (self.write_pos + 1) % n;
            if self.filled < n {
                self.filled += 1;
            }
        }
    }
}

impl SpectrumSource for MicSource {
    fn label(&self) -> String {
        format!("mic: {}", self.device_name)
    }

    fn bin_count(&self) -> usize {
        self.analyser.bin_count()
    }

    fn frequency_data(&mut self, out: &mut [f32]) {
        self.drain();
        if self.filled == 0 {
            write_not_ready(out);
            return;
        }
        let n = self.history.len();
        for i in 0..n {
            self.ordered[i] = self.history[(self.write_pos + i) % n];
        }
        self.analyser.analyse(&self.ordered, out);
    }

    fn failure(&self) -> Option<String> {
        self.failure.lock().ok().and_then(|slot| slot.clone())
    }
}

impl Drop for MicSource {
    fn drop(&mut self) {
        tracing::info!(device = %self.device_name, "microphone detached");
    }
}

fn select_input_device(
    host: &cpal::Host,
    device_query: Option<&str>,
) -> anyhow::Result<cpal::Device> {
    let devices = host
        .input_devices()
        .context("enumerate input devices")?
        .collect::<Vec<_>>();

    let want = device_query.map(|s| s.to_lowercase());
    if let Some(want) = want.as_deref() {
        if let Some(dev) = devices.iter().find(|d| {
            d.name()
                .map(|n| n.to_lowercase().contains(want))
                .unwrap_or(false)
        }) {
            return Ok(dev.clone());
        }
        return Err(anyhow!("no input device matching: {want}"));
    }

    host.default_input_device()
        .ok_or_else(|| anyhow!("no default input device found"))
}

fn push_interleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    prod: &mut ringbuf::HeapProd<f32>,
) {
    let channels = channels.max(1);
    for frame in data.chunks(channels) {
        let mut acc = 0.0f32;
        for s in frame {
            acc += (*s).to_float_sample();
        }
        let mono = (acc / channels as f32).clamp(-1.0, 1.0);
        let _ = prod.try_push(mono);
    }
}
