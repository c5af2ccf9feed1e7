use std::f32::consts::TAU;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

struct Args {
    out: PathBuf,
    sample_rate: u32,
    bpm: f32,
}

fn parse_args() -> Args {
    let mut args = Args {
        out: PathBuf::from("assets/test/click_track_120bpm.wav"),
        sample_rate: 44_100,
        bpm: 120.0,
    };

    let mut it = std::env::args().skip(1);
    while let Some(k) = it.next() {
        let v = it.next();
        match (k.as_str(), v) {
            ("--out", Some(p)) => args.out = PathBuf::from(p),
            ("--sample-rate", Some(v)) => {
                if let Ok(sr) = v.parse::<u32>() {
                    args.sample_rate = sr.clamp(8_000, 192_000);
                }
            }
            ("--bpm", Some(v)) => {
                if let Ok(bpm) = v.parse::<f32>() {
                    args.bpm = bpm.clamp(30.0, 300.0);
                }
            }
            _ => {}
        }
    }
    args
}

fn main() -> Result<()> {
    let args = parse_args();
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }

    let samples = make_fixture(args.sample_rate, args.bpm);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: args.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&args.out, spec)
        .with_context(|| format!("create {}", args.out.display()))?;
    for s in &samples {
        writer.write_sample(to_i16(*s))?;
    }
    writer
        .finalize()
        .with_context(|| format!("finalize {}", args.out.display()))?;

    println!("generated: {}", args.out.display());
    println!(
        "sample_rate={}Hz bpm={:.0} duration={:.2}s samples={}",
        args.sample_rate,
        args.bpm,
        samples.len() as f32 / args.sample_rate as f32,
        samples.len()
    );
    Ok(())
}

/// Silence, a click track, a sustained pad (no onsets), then silence.
fn make_fixture(sr: u32, bpm: f32) -> Vec<f32> {
    let mut out = Vec::new();
    push_silence(&mut out, sr, 1.0);

    let beat = 60.0 / bpm;
    for i in 0..32 {
        let accent = if i % 4 == 0 { 1.0 } else { 0.7 };
        push_click(&mut out, sr, 0.03, 58.0, accent);
        push_silence(&mut out, sr, (beat - 0.03).max(0.0));
    }

    push_pad(&mut out, sr, 6.0);
    push_silence(&mut out, sr, 1.0);
    out
}

fn push_silence(out: &mut Vec<f32>, sr: u32, seconds: f32) {
    let n = (seconds.max(0.0) * sr as f32).round() as usize;
    out.resize(out.len() + n, 0.0);
}

fn push_click(out: &mut Vec<f32>, sr: u32, seconds: f32, freq: f32, amp: f32) {
    let n = (seconds.max(0.0) * sr as f32).round() as usize;
    for i in 0..n {
        let t = i as f32 / sr as f32;
        let env = (1.0 - t / seconds.max(1e-5)).max(0.0).powf(2.4);
        let body = (TAU * freq * t).sin();
        let snap = (TAU * 2_400.0 * t).sin() * 0.3;
        out.push((body + snap) * env * amp * 0.9);
    }
}

fn push_pad(out: &mut Vec<f32>, sr: u32, seconds: f32) {
    let n = (seconds.max(0.0) * sr as f32).round() as usize;
    for i in 0..n {
        let t = i as f32 / sr as f32;
        let a = (TAU * 110.0 * t).sin() * 0.4;
        let b = (TAU * 165.0 * t).sin() * 0.25;
        let c = (TAU * 220.0 * t + (t * 0.3).sin()).sin() * 0.15;
        out.push((a + b + c) * 0.6);
    }
}

fn to_i16(x: f32) -> i16 {
    (x.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
