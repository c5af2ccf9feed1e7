//! Wireframe heightfield whose vertices are displaced by the signal.

use super::{clamp_dt, EventGate, LINE_PALETTES};
use crate::analysis::OnsetResult;
use crate::visual::{lerp_rgb, Camera, Scene, Surface};

const GRID_W: usize = 28;
const GRID_D: usize = 22;
const CELL: f32 = 0.45;
const AMP_BASE: f32 = 0.05;
const AMP_SCALE: f32 = 0.6;
const SCROLL_BASE: f32 = 0.5;
const SCROLL_SCALE: f32 = 3.0;
const EVENT_COOLDOWN: f32 = 0.12;

pub struct WaveTerrain {
    // Flat vertex grid (x, z), row-major by depth.
    grid: Vec<[f32; 2]>,

    phase: f32,
    amplitude: f32,
    scroll_speed: f32,
    palette_index: usize,
    gate: EventGate,
}

impl Default for WaveTerrain {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveTerrain {
    pub fn new() -> Self {
        Self {
            grid: Vec::new(),
            phase: 0.0,
            amplitude: AMP_BASE,
            scroll_speed: SCROLL_BASE,
            palette_index: 2,
            gate: EventGate::new(EVENT_COOLDOWN),
        }
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn palette_index(&self) -> usize {
        self.palette_index
    }

    fn build(&mut self) {
        let half = (GRID_W - 1) as f32 * CELL * 0.5;
        self.grid = (0..GRID_D)
            .flat_map(|r| {
                (0..GRID_W).map(move |c| [c as f32 * CELL - half, 1.0 + r as f32 * CELL])
            })
            .collect();
    }

    fn height(&self, x: f32, z: f32) -> f32 {
        let a = (x * 1.3 + self.phase).sin();
        let b = (z * 0.9 - self.phase * 0.7).cos();
        let c = ((x + z) * 0.55 + self.phase * 1.3).sin() * 0.5;
        self.amplitude * (a * b + c)
    }
}

impl Scene for WaveTerrain {
    fn name(&self) -> &'static str {
        "Wave Terrain"
    }

    fn update(&mut self, dt: f32, audio: &OnsetResult) {
        let dt = clamp_dt(dt);
        self.amplitude = AMP_BASE + audio.flux * AMP_SCALE;
        self.scroll_speed = SCROLL_BASE + audio.mean_flux * SCROLL_SCALE;
        self.phase = (self.phase + self.scroll_speed * dt).rem_euclid(std::f32::consts::TAU * 20.0);
        if self.gate.step(dt, audio.event) {
            self.palette_index = (self.palette_index + 1) % LINE_PALETTES.len();
        }
    }

    fn render(&self, surface: &mut Surface) {
        let (bg, ink) = LINE_PALETTES[self.palette_index];
        surface.fill(bg);
        if self.grid.is_empty() || surface.is_empty() {
            return;
        }
        let (w, h) = (surface.width(), surface.height());
        let cam = Camera {
            pos: [0.0, 1.6, -0.6],
            pitch: -0.42,
            ..Camera::default()
        };
        let far = 1.0 + GRID_D as f32 * CELL;

        let projected = self
            .grid
            .iter()
            .map(|&[x, z]| cam.project([x, self.height(x, z), z], w, h))
            .collect::<Vec<_>>();

        for r in 0..GRID_D {
            for c in 0..GRID_W {
                let i = r * GRID_W + c;
                let Some((x0, y0, _)) = projected[i] else {
                    continue;
                };
                let fade = (1.0 - self.grid[i][1] / far).clamp(0.1, 1.0);
                let crest = (self.height(self.grid[i][0], self.grid[i][1]) / (self.amplitude * 1.5))
                    .clamp(-1.0, 1.0)
                    * 0.5
                    + 0.5;
                let rgb = lerp_rgb(ink, [255, 255, 255], crest * 0.4);
                if c + 1 < GRID_W {
                    if let Some((x1, y1, _)) = projected[i + 1] {
                        surface.line(x0, y0, x1, y1, rgb, fade);
                    }
                }
                if r + 1 < GRID_D {
                    if let Some((x1, y1, _)) = projected[i + GRID_W] {
                        surface.line(x0, y0, x1, y1, rgb, fade * 0.7);
                    }
                }
            }
        }
    }

    fn resize(&mut self, surface: &mut Surface) {
        if self.grid.is_empty() {
            self.build();
        }
        self.render(surface);
    }

    fn dispose(&mut self) {
        self.grid = Vec::new();
    }

    fn is_disposed(&self) -> bool {
        self.grid.is_empty()
    }
}
