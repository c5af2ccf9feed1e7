use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::audio::{DEFAULT_FFT_SIZE, DEFAULT_SMOOTHING};

#[derive(Parser, Debug, Clone)]
#[command(name = "beatscope", version, about = "Beat-reactive 3D scenes in the terminal")]
pub struct Config {
    #[arg(long, value_enum, default_value_t = SourceKind::Mic)]
    pub source: SourceKind,

    /// WAV file to play when `--source file`.
    #[arg(long)]
    pub file: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub loop_file: bool,

    /// Input device name filter (case-insensitive substring).
    #[arg(long)]
    pub device: Option<String>,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,

    #[arg(long, default_value_t = false)]
    pub list_scenes: bool,

    /// Initial scene, by name or index.
    #[arg(long)]
    pub scene: Option<String>,

    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, default_value_t = DEFAULT_FFT_SIZE)]
    pub fft_size: usize,

    #[arg(long, default_value_t = DEFAULT_SMOOTHING)]
    pub smoothing: f32,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    #[value(alias = "microphone", alias = "input")]
    Mic,
    #[value(alias = "wav")]
    File,
    #[value(alias = "off")]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(alias = "ansi", alias = "text")]
    Ascii,
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
}

impl Config {
    /// True for commands that print and exit without taking over the terminal.
    pub fn is_listing(&self) -> bool {
        self.list_devices || self.list_scenes
    }

    /// Frame budget in seconds; `--fps 0` is treated as 1.
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.fps.clamp(1, 240) as f64)
    }
}
