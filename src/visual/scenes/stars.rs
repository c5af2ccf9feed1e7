//! Star field flying at the viewer.

use super::{clamp_dt, EventGate};
use crate::analysis::OnsetResult;
use crate::visual::{hsv_to_rgb, Camera, Scene, Surface};

const STAR_COUNT: usize = 420;
const SPEED_BASE: f32 = 0.4;
const SPEED_SCALE: f32 = 6.0;
const BRIGHT_BASE: f32 = 0.4;
const BRIGHT_SCALE: f32 = 0.6;
const EVENT_COOLDOWN: f32 = 0.1;
const HUE_STEP: f32 = 0.17;

const NEAR_Z: f32 = 0.2;
const FAR_Z: f32 = 12.0;
const SPREAD: f32 = 5.0;
/// Seconds of travel drawn as a streak behind each star.
const STREAK_TIME: f32 = 0.05;

pub struct StarField {
    stars: Vec<[f32; 3]>,
    rng: fastrand::Rng,

    speed: f32,
    brightness: f32,
    hue: f32,
    gate: EventGate,
}

impl StarField {
    pub fn new(seed: u64) -> Self {
        Self {
            stars: Vec::new(),
            rng: fastrand::Rng::with_seed(seed),
            speed: SPEED_BASE,
            brightness: BRIGHT_BASE,
            hue: 0.58,
            gate: EventGate::new(EVENT_COOLDOWN),
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn hue(&self) -> f32 {
        self.hue
    }

    /// Positions in world space; empty while disposed.
    pub fn stars(&self) -> &[[f32; 3]] {
        &self.stars
    }

    fn spawn(rng: &mut fastrand::Rng, z: f32) -> [f32; 3] {
        [
            (rng.f32() * 2.0 - 1.0) * SPREAD,
            (rng.f32() * 2.0 - 1.0) * SPREAD,
            z,
        ]
    }

    fn build(&mut self) {
        let rng = &mut self.rng;
        self.stars = (0..STAR_COUNT)
            .map(|_| {
                let z = NEAR_Z + rng.f32() * (FAR_Z - NEAR_Z);
                Self::spawn(rng, z)
            })
            .collect();
    }
}

impl Scene for StarField {
    fn name(&self) -> &'static str {
        "Star Field"
    }

    fn update(&mut self, dt: f32, audio: &OnsetResult) {
        // Clamped so a stalled frame cannot teleport the whole field.
        let dt = clamp_dt(dt);
        self.speed = SPEED_BASE + audio.mean_flux * SPEED_SCALE;
        self.brightness = BRIGHT_BASE + audio.flux * BRIGHT_SCALE;
        if self.gate.step(dt, audio.event) {
            self.hue = (self.hue + HUE_STEP).rem_euclid(1.0);
        }

        let step = self.speed * dt;
        let rng = &mut self.rng;
        for star in &mut self.stars {
            star[2] -= step;
            if star[2] < NEAR_Z {
                // Recycle at the far plane, keeping the overshoot.
                let z = FAR_Z - (NEAR_Z - star[2]).min(FAR_Z - NEAR_Z);
                *star = Self::spawn(rng, z);
            }
        }
    }

    fn render(&self, surface: &mut Surface) {
        surface.fill([0, 0, 0]);
        if self.stars.is_empty() || surface.is_empty() {
            return;
        }
        let (w, h) = (surface.width(), surface.height());
        let cam = Camera::default();
        let streak = self.speed * STREAK_TIME;

        for (i, star) in self.stars.iter().enumerate() {
            let Some((x0, y0, depth)) = cam.project(*star, w, h) else {
                continue;
            };
            let tail = [star[0], star[1], star[2] + streak];
            let (x1, y1) = cam
                .project(tail, w, h)
                .map(|(x, y, _)| (x, y))
                .unwrap_or((x0, y0));
            let near = (1.0 - depth / FAR_Z).clamp(0.0, 1.0);
            let hue = self.hue + (i % 7) as f32 * 0.015;
            let rgb = hsv_to_rgb(hue, 0.35 + near * 0.4, 1.0);
            let alpha = (near * near * self.brightness * 1.6).clamp(0.0, 1.0);
            surface.line(x1, y1, x0, y0, rgb, alpha);
        }
    }

    fn resize(&mut self, surface: &mut Surface) {
        if self.stars.is_empty() {
            self.build();
        }
        self.render(surface);
    }

    fn dispose(&mut self) {
        self.stars = Vec::new();
    }

    fn is_disposed(&self) -> bool {
        self.stars.is_empty()
    }
}
