//! Square grid tunnel scrolling toward the viewer.
//!
//! Scroll speed follows `mean_flux`, line glow follows `flux`, and each
//! (debounced) beat advances the palette.

use super::{clamp_dt, EventGate, LINE_PALETTES};
use crate::analysis::OnsetResult;
use crate::visual::{scale_rgb, Camera, Scene, Surface};

const SPEED_BASE: f32 = 1.2;
const SPEED_SCALE: f32 = 9.0;
const GLOW_BASE: f32 = 0.35;
const GLOW_SCALE: f32 = 0.65;
const EVENT_COOLDOWN: f32 = 0.12;
const ROLL_RATE: f32 = 0.15;

const RING_SPACING: f32 = 0.8;
const NEAR_Z: f32 = 0.3;
const DEPTH: f32 = 24.0;
const RAILS_PER_SIDE: usize = 4;

pub struct GridTunnel {
    // Resources, rebuilt by `resize` after `dispose`.
    rails: Vec<[f32; 2]>,
    ring_count: usize,

    scroll: f32,
    speed: f32,
    glow: f32,
    roll: f32,
    palette_index: usize,
    gate: EventGate,
}

impl Default for GridTunnel {
    fn default() -> Self {
        Self::new()
    }
}

impl GridTunnel {
    pub fn new() -> Self {
        Self {
            rails: Vec::new(),
            ring_count: 0,
            scroll: 0.0,
            speed: SPEED_BASE,
            glow: GLOW_BASE,
            roll: 0.0,
            palette_index: 0,
            gate: EventGate::new(EVENT_COOLDOWN),
        }
    }

    pub fn scroll_speed(&self) -> f32 {
        self.speed
    }

    pub fn glow(&self) -> f32 {
        self.glow
    }

    pub fn palette_index(&self) -> usize {
        self.palette_index
    }

    fn build(&mut self) {
        // Points around the unit square, walked corner to corner.
        let corners = [[-1.0f32, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
        self.rails.clear();
        for side in 0..4 {
            let a = corners[side];
            let b = corners[(side + 1) % 4];
            for k in 0..RAILS_PER_SIDE {
                let t = k as f32 / RAILS_PER_SIDE as f32;
                self.rails.push([a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]);
            }
        }
        self.ring_count = (DEPTH / RING_SPACING).ceil() as usize;
    }

    fn rotate(&self, p: [f32; 2]) -> [f32; 2] {
        let (s, c) = self.roll.sin_cos();
        [p[0] * c - p[1] * s, p[0] * s + p[1] * c]
    }
}

impl Scene for GridTunnel {
    fn name(&self) -> &'static str {
        "Grid Tunnel"
    }

    fn update(&mut self, dt: f32, audio: &OnsetResult) {
        let dt = clamp_dt(dt);
        self.speed = SPEED_BASE + audio.mean_flux * SPEED_SCALE;
        self.glow = GLOW_BASE + audio.flux * GLOW_SCALE;
        self.scroll = (self.scroll + self.speed * dt).rem_euclid(RING_SPACING);
        self.roll = (self.roll + ROLL_RATE * dt).rem_euclid(std::f32::consts::TAU);

        if self.gate.step(dt, audio.event) {
            self.palette_index = (self.palette_index + 1) % LINE_PALETTES.len();
        }
    }

    fn render(&self, surface: &mut Surface) {
        let (bg, ink) = LINE_PALETTES[self.palette_index];
        surface.fill(bg);
        if self.rails.is_empty() || surface.is_empty() {
            return;
        }

        let (w, h) = (surface.width(), surface.height());
        let cam = Camera::default();
        let ink = scale_rgb(ink, self.glow);

        // Cross-section rings.
        for i in 0..self.ring_count {
            let z = NEAR_Z + i as f32 * RING_SPACING - self.scroll;
            if z <= NEAR_Z * 0.5 {
                continue;
            }
            let fade = (1.0 - z / DEPTH).clamp(0.0, 1.0);
            let mut prev: Option<(f32, f32)> = None;
            let mut first: Option<(f32, f32)> = None;
            for p in &self.rails {
                let q = self.rotate(*p);
                let Some((sx, sy, _)) = cam.project([q[0], q[1], z], w, h) else {
                    prev = None;
                    continue;
                };
                if let Some((px, py)) = prev {
                    surface.line(px, py, sx, sy, ink, fade);
                }
                first.get_or_insert((sx, sy));
                prev = Some((sx, sy));
            }
            if let (Some((px, py)), Some((fx, fy))) = (prev, first) {
                surface.line(px, py, fx, fy, ink, fade);
            }
        }

        // Longitudinal rails.
        for p in &self.rails {
            let q = self.rotate(*p);
            let near = cam.project([q[0], q[1], NEAR_Z], w, h);
            let far = cam.project([q[0], q[1], DEPTH], w, h);
            if let (Some((x0, y0, _)), Some((x1, y1, _))) = (near, far) {
                surface.line(x0, y0, x1, y1, ink, 0.45);
            }
        }
    }

    fn resize(&mut self, surface: &mut Surface) {
        if self.rails.is_empty() {
            self.build();
        }
        self.render(surface);
    }

    fn dispose(&mut self) {
        self.rails = Vec::new();
        self.ring_count = 0;
    }

    fn is_disposed(&self) -> bool {
        self.rails.is_empty()
    }
}
