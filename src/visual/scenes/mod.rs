mod orbs;
mod stars;
mod terrain;
mod tunnel;

use super::Scene;

pub use orbs::OrbField;
pub use stars::StarField;
pub use terrain::WaveTerrain;
pub use tunnel::GridTunnel;

/// Longest step any scene integrates in one frame. Larger gaps (a stalled
/// terminal, a suspended process) are treated as this long.
pub const MAX_SCENE_DT: f32 = 0.1;

pub fn make_scenes() -> Vec<Box<dyn Scene>> {
    vec![
        Box::new(GridTunnel::new()),
        Box::new(OrbField::new(0x0b5e_55ed)),
        Box::new(StarField::new(0x5747_a125)),
        Box::new(WaveTerrain::new()),
    ]
}

pub(crate) fn clamp_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_SCENE_DT)
    } else {
        0.0
    }
}

/// Debounce for beat events: two events closer than `cooldown` seconds
/// collapse into one.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EventGate {
    cooldown: f32,
    since: f32,
}

impl EventGate {
    pub(crate) fn new(cooldown: f32) -> Self {
        Self {
            cooldown,
            since: cooldown,
        }
    }

    /// Advance the clock by `dt` and report whether `event` passes.
    pub(crate) fn step(&mut self, dt: f32, event: bool) -> bool {
        self.since += dt;
        if event && self.since >= self.cooldown {
            self.since = 0.0;
            true
        } else {
            false
        }
    }
}

/// Background and ink colour pairs shared by the line-art scenes.
pub(crate) const LINE_PALETTES: [([u8; 3], [u8; 3]); 5] = [
    ([4, 2, 14], [255, 60, 200]),
    ([0, 8, 12], [40, 230, 255]),
    ([10, 4, 0], [255, 170, 30]),
    ([2, 10, 4], [90, 255, 120]),
    ([8, 8, 10], [235, 235, 255]),
];
