//! Glowing orbs circled by an orbiting camera.

use super::{clamp_dt, EventGate};
use crate::analysis::OnsetResult;
use crate::visual::{hsv_to_rgb, scale_rgb, Camera, Scene, Surface};

const ORB_COUNT: usize = 28;
const ORBIT_BASE: f32 = 0.25;
const ORBIT_SCALE: f32 = 2.5;
const RADIUS_SCALE: f32 = 1.4;
const EVENT_COOLDOWN: f32 = 0.15;
/// Colour approach rate toward the beat-picked target, applied as
/// `1 - exp(-rate * dt)` per frame.
const COLOR_RATE: f32 = 9.0;
const CAMERA_DISTANCE: f32 = 6.5;

#[derive(Debug, Clone, Copy)]
struct Orb {
    pos: [f32; 3],
    radius: f32,
    tint: f32,
}

pub struct OrbField {
    orbs: Vec<Orb>,
    rng: fastrand::Rng,

    angle: f32,
    direction: f32,
    orbit_speed: f32,
    radius_scale: f32,
    color: [f32; 3],
    target: [f32; 3],
    gate: EventGate,
}

impl OrbField {
    pub fn new(seed: u64) -> Self {
        let target = [0.35, 0.55, 1.0];
        Self {
            orbs: Vec::new(),
            rng: fastrand::Rng::with_seed(seed),
            angle: 0.0,
            direction: 1.0,
            orbit_speed: ORBIT_BASE,
            radius_scale: 1.0,
            color: target,
            target,
            gate: EventGate::new(EVENT_COOLDOWN),
        }
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn orbit_speed(&self) -> f32 {
        self.orbit_speed
    }

    pub fn radius_scale(&self) -> f32 {
        self.radius_scale
    }

    pub fn target_color(&self) -> [f32; 3] {
        self.target
    }

    fn build(&mut self) {
        self.orbs.clear();
        for i in 0..ORB_COUNT {
            // Spread on a loose sphere shell.
            let u = self.rng.f32() * 2.0 - 1.0;
            let theta = self.rng.f32() * std::f32::consts::TAU;
            let r = 1.5 + self.rng.f32() * 1.8;
            let s = (1.0 - u * u).sqrt();
            self.orbs.push(Orb {
                pos: [r * s * theta.cos(), r * u * 0.7, r * s * theta.sin()],
                radius: 0.12 + (i % 5) as f32 * 0.05,
                tint: self.rng.f32(),
            });
        }
    }

    fn pick_target(&mut self) {
        let hue = self.rng.f32();
        let c = hsv_to_rgb(hue, 0.75, 1.0);
        self.target = [c[0] as f32 / 255.0, c[1] as f32 / 255.0, c[2] as f32 / 255.0];
    }
}

impl Scene for OrbField {
    fn name(&self) -> &'static str {
        "Orb Field"
    }

    fn update(&mut self, dt: f32, audio: &OnsetResult) {
        let dt = clamp_dt(dt);
        if self.gate.step(dt, audio.event) {
            self.direction = -self.direction;
            self.pick_target();
        }

        self.orbit_speed = ORBIT_BASE + audio.mean_flux * ORBIT_SCALE;
        self.radius_scale = 1.0 + audio.flux * RADIUS_SCALE;
        self.angle = (self.angle + self.direction * self.orbit_speed * dt)
            .rem_euclid(std::f32::consts::TAU);

        let k = 1.0 - (-COLOR_RATE * dt).exp();
        for c in 0..3 {
            self.color[c] += (self.target[c] - self.color[c]) * k;
        }
    }

    fn render(&self, surface: &mut Surface) {
        surface.fill([2, 2, 8]);
        if self.orbs.is_empty() || surface.is_empty() {
            return;
        }
        let (w, h) = (surface.width(), surface.height());
        let (sa, ca) = self.angle.sin_cos();
        let cam = Camera {
            pos: [-sa * CAMERA_DISTANCE, 0.8, -ca * CAMERA_DISTANCE],
            yaw: self.angle,
            pitch: -0.12,
            ..Camera::default()
        };

        let mut placed = self
            .orbs
            .iter()
            .filter_map(|o| cam.project(o.pos, w, h).map(|p| (p, o)))
            .collect::<Vec<_>>();
        // Far to near so closer orbs paint over.
        placed.sort_by(|a, b| b.0 .2.partial_cmp(&a.0 .2).unwrap_or(std::cmp::Ordering::Equal));

        let base = [
            (self.color[0] * 255.0) as u8,
            (self.color[1] * 255.0) as u8,
            (self.color[2] * 255.0) as u8,
        ];
        let px_per_unit = h as f32 / (cam.fov_y * 0.5).tan() * 0.5;
        for ((sx, sy, depth), orb) in placed {
            let r = orb.radius * self.radius_scale * px_per_unit / depth;
            let shade = 0.55 + orb.tint * 0.45;
            let fade = (1.4 - depth / (CAMERA_DISTANCE * 2.0)).clamp(0.2, 1.0);
            surface.disc(sx, sy, r * 1.8, scale_rgb(base, shade * 0.25), fade);
            surface.disc(sx, sy, r, scale_rgb(base, shade), fade);
        }
    }

    fn resize(&mut self, surface: &mut Surface) {
        if self.orbs.is_empty() {
            self.build();
        }
        self.render(surface);
    }

    fn dispose(&mut self) {
        self.orbs = Vec::new();
    }

    fn is_disposed(&self) -> bool {
        self.orbs.is_empty()
    }
}
