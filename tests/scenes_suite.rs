use beatscope::analysis::OnsetResult;
use beatscope::visual::{
    hsv_to_rgb, make_scenes, Camera, GridTunnel, OrbField, Scene, StarField, Surface, WaveTerrain,
    MAX_SCENE_DT,
};

const DT: f32 = 1.0 / 60.0;

fn audio(flux: f32, mean_flux: f32, event: bool) -> OnsetResult {
    OnsetResult {
        flux,
        mean_flux,
        event,
    }
}

fn lit_pixels(s: &Surface) -> usize {
    s.pixels()
        .chunks_exact(4)
        .filter(|px| px[0] > 40 || px[1] > 40 || px[2] > 40)
        .count()
}

// ── Contract shared by every scene ──────────────────────────────────────────

#[test]
fn render_is_idempotent_for_every_scene() {
    for mut scene in make_scenes() {
        let mut a = Surface::new(64, 40);
        let mut b = Surface::new(64, 40);
        scene.resize(&mut a);
        for i in 0..30 {
            scene.update(DT, &audio(0.3, 0.2, i % 10 == 0));
        }
        scene.render(&mut a);
        scene.render(&mut b);
        scene.render(&mut b);
        assert_eq!(a.pixels(), b.pixels(), "{} drew different frames", scene.name());
    }
}

#[test]
fn every_scene_draws_something_after_resize() {
    for mut scene in make_scenes() {
        let mut s = Surface::new(80, 48);
        scene.resize(&mut s);
        scene.update(DT, &audio(0.6, 0.4, false));
        scene.render(&mut s);
        assert!(lit_pixels(&s) > 0, "{} rendered nothing", scene.name());
    }
}

#[test]
fn dispose_then_resize_rebuilds() {
    for mut scene in make_scenes() {
        let mut s = Surface::new(32, 20);
        assert!(scene.is_disposed(), "{} built too early", scene.name());
        scene.resize(&mut s);
        assert!(!scene.is_disposed());
        scene.dispose();
        assert!(scene.is_disposed());

        // Updating and drawing a disposed scene is harmless.
        scene.update(DT, &audio(0.5, 0.5, true));
        scene.render(&mut s);

        scene.resize(&mut s);
        assert!(!scene.is_disposed(), "{} did not rebuild", scene.name());
    }
}

#[test]
fn empty_surface_is_tolerated() {
    for mut scene in make_scenes() {
        let mut s = Surface::new(0, 0);
        scene.resize(&mut s);
        scene.update(DT, &audio(1.0, 1.0, true));
        scene.render(&mut s);
        assert!(s.pixels().is_empty());
    }
}

#[test]
fn non_finite_dt_does_not_poison_state() {
    for mut scene in make_scenes() {
        let mut s = Surface::new(32, 20);
        scene.resize(&mut s);
        scene.update(f32::NAN, &audio(0.2, 0.2, false));
        scene.update(f32::INFINITY, &audio(0.2, 0.2, false));
        scene.update(-1.0, &audio(0.2, 0.2, false));
        scene.render(&mut s);
        assert!(lit_pixels(&s) > 0, "{} went blank", scene.name());
    }
}

// ── Flux mapping ────────────────────────────────────────────────────────────

#[test]
fn tunnel_maps_flux_to_speed_and_glow() {
    let mut t = GridTunnel::new();
    t.update(DT, &audio(0.0, 0.0, false));
    assert!((t.scroll_speed() - 1.2).abs() < 1e-5);
    assert!((t.glow() - 0.35).abs() < 1e-5);

    t.update(DT, &audio(1.0, 0.5, false));
    assert!((t.scroll_speed() - (1.2 + 0.5 * 9.0)).abs() < 1e-4);
    assert!((t.glow() - 1.0).abs() < 1e-5);
}

#[test]
fn orbs_map_flux_to_orbit_and_radius() {
    let mut o = OrbField::new(1);
    o.update(DT, &audio(0.5, 0.4, false));
    assert!((o.orbit_speed() - (0.25 + 0.4 * 2.5)).abs() < 1e-5);
    assert!((o.radius_scale() - (1.0 + 0.5 * 1.4)).abs() < 1e-5);
}

#[test]
fn stars_map_flux_to_speed() {
    let mut s = StarField::new(1);
    s.update(DT, &audio(0.1, 0.5, false));
    assert!((s.speed() - (0.4 + 0.5 * 6.0)).abs() < 1e-5);
}

#[test]
fn terrain_maps_flux_to_amplitude() {
    let mut w = WaveTerrain::new();
    w.update(DT, &audio(0.5, 0.0, false));
    assert!((w.amplitude() - (0.05 + 0.5 * 0.6)).abs() < 1e-5);
}

#[test]
fn louder_flux_lights_more_of_the_tunnel() {
    let mut quiet = GridTunnel::new();
    let mut loud = GridTunnel::new();
    let mut a = Surface::new(96, 64);
    let mut b = Surface::new(96, 64);
    quiet.resize(&mut a);
    loud.resize(&mut b);
    quiet.update(DT, &audio(0.0, 0.0, false));
    loud.update(DT, &audio(1.0, 0.0, false));
    quiet.render(&mut a);
    loud.render(&mut b);

    let sum = |s: &Surface| s.pixels().iter().map(|&v| v as u64).sum::<u64>();
    assert!(sum(&b) > sum(&a));
}

// ── Beat reactions and debounce ─────────────────────────────────────────────

#[test]
fn tunnel_palette_advances_once_per_cooldown() {
    let mut t = GridTunnel::new();
    assert_eq!(t.palette_index(), 0);
    t.update(DT, &audio(0.5, 0.3, true));
    assert_eq!(t.palette_index(), 1);

    // Second event inside the 0.12 s window is swallowed.
    t.update(DT, &audio(0.5, 0.3, true));
    assert_eq!(t.palette_index(), 1);

    for _ in 0..10 {
        t.update(DT, &audio(0.5, 0.3, false));
    }
    t.update(DT, &audio(0.5, 0.3, true));
    assert_eq!(t.palette_index(), 2);
}

#[test]
fn orbs_flip_direction_on_beat() {
    let mut o = OrbField::new(3);
    assert_eq!(o.direction(), 1.0);
    let before = o.target_color();
    o.update(DT, &audio(0.5, 0.3, true));
    assert_eq!(o.direction(), -1.0);
    assert_ne!(o.target_color(), before);

    o.update(DT, &audio(0.5, 0.3, true));
    assert_eq!(o.direction(), -1.0, "debounced");
}

#[test]
fn stars_hue_steps_on_beat() {
    let mut s = StarField::new(3);
    let hue = s.hue();
    s.update(DT, &audio(0.2, 0.2, false));
    assert_eq!(s.hue(), hue);
    s.update(DT, &audio(0.2, 0.2, true));
    assert!((s.hue() - hue).abs() > 0.01);
}

#[test]
fn terrain_palette_advances_on_beat() {
    let mut w = WaveTerrain::new();
    let start = w.palette_index();
    w.update(DT, &audio(0.2, 0.2, true));
    assert_ne!(w.palette_index(), start);
}

// ── Step clamping ───────────────────────────────────────────────────────────

#[test]
fn long_frames_are_clamped_to_max_step() {
    let mut s = StarField::new(9);
    let mut surface = Surface::new(32, 20);
    s.resize(&mut surface);
    let before = s.stars().to_vec();

    s.update(5.0, &audio(0.0, 0.0, false));
    let step = 0.4 * MAX_SCENE_DT;
    let moved_by_step = s
        .stars()
        .iter()
        .zip(&before)
        .filter(|(a, b)| ((b[2] - a[2]) - step).abs() < 1e-4)
        .count();
    // Everything not recycled at the near plane moved exactly one clamped step.
    assert!(moved_by_step > before.len() * 9 / 10, "moved {moved_by_step}");
}

// ── Surface helpers ─────────────────────────────────────────────────────────

#[test]
fn surface_blend_saturates_and_ignores_out_of_bounds() {
    let mut s = Surface::new(4, 4);
    s.fill([200, 10, 0]);
    s.blend(1, 1, [100, 100, 100], 1.0);
    assert_eq!(s.pixel(1, 1), Some([255, 110, 100]));
    s.blend(-1, 2, [255, 255, 255], 1.0);
    s.blend(4, 0, [255, 255, 255], 1.0);
    assert_eq!(s.pixel(4, 0), None);
    assert_eq!(s.pixel(0, 2), Some([200, 10, 0]));
}

#[test]
fn camera_culls_points_behind_it() {
    let cam = Camera::default();
    assert!(cam.project([0.0, 0.0, -1.0], 64, 32).is_none());
    let (sx, sy, depth) = cam.project([0.0, 0.0, 5.0], 64, 32).expect("in front");
    assert!((sx - 32.0).abs() < 1.0 && (sy - 16.0).abs() < 1.0);
    assert!((depth - 5.0).abs() < 1e-4);
}

#[test]
fn hsv_primaries() {
    assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [255, 0, 0]);
    assert_eq!(hsv_to_rgb(1.0 / 3.0, 1.0, 1.0), [0, 255, 0]);
    assert_eq!(hsv_to_rgb(0.5, 0.0, 0.0), [0, 0, 0]);
}
