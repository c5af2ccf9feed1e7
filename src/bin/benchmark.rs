use std::time::Instant;

use anyhow::Result;
use beatscope::audio::PulseSource;
use beatscope::player::{FrameOutcome, Player};
use beatscope::visual::{make_scenes, SceneRegistry};

struct Args {
    frames: usize,
    w: usize,
    h: usize,
    bpm: f32,
    ci_smoke: bool,
    max_ms: f64,
}

fn parse_args() -> Args {
    let mut args = Args {
        frames: 240,
        w: 160,
        h: 88,
        bpm: 128.0,
        ci_smoke: false,
        max_ms: 20.0,
    };

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
                i += 2;
            }
            ("--w", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.w = n.max(8);
                }
                i += 2;
            }
            ("--h", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.h = n.max(8);
                }
                i += 2;
            }
            ("--bpm", Some(x)) => {
                if let Ok(n) = x.parse::<f32>() {
                    args.bpm = n;
                }
                i += 2;
            }
            ("--max-ms", Some(x)) => {
                if let Ok(n) = x.parse::<f64>() {
                    args.max_ms = n.max(0.1);
                }
                i += 2;
            }
            ("--ci-smoke", _) => {
                args.ci_smoke = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    args
}

fn percentile(sorted_ms: &[f64], p: f64) -> f64 {
    if sorted_ms.is_empty() {
        return 0.0;
    }
    let idx = ((sorted_ms.len() - 1) as f64 * p).round() as usize;
    sorted_ms[idx.min(sorted_ms.len() - 1)]
}

fn main() -> Result<()> {
    let args = parse_args();
    let scene_count = make_scenes().len();
    let dt = 1.0 / 60.0;

    println!(
        "scene benchmark: scenes={} frames/scene={} size={}x{} bpm={:.0}",
        scene_count, args.frames, args.w, args.h, args.bpm
    );

    let mut failures = Vec::<String>::new();
    for idx in 0..scene_count {
        let registry = SceneRegistry::with_start(make_scenes(), idx)?;
        let mut player = Player::new(registry, args.w, args.h);
        player.attach(Box::new(PulseSource::new(512, args.bpm, 60.0, 0x5eed + idx as u64)));
        let name = player.registry().current_name();

        let mut frame_ms = Vec::with_capacity(args.frames);
        let mut lit = 0usize;
        let mut beats = 0usize;
        for _ in 0..args.frames {
            let start = Instant::now();
            let outcome = player.frame(dt);
            frame_ms.push(start.elapsed().as_secs_f64() * 1000.0);
            if let FrameOutcome::Rendered(r) = outcome {
                beats += usize::from(r.event);
            }
            if player
                .surface()
                .pixels()
                .chunks_exact(4)
                .any(|px| px[0] != 0 || px[1] != 0 || px[2] != 0)
            {
                lit += 1;
            }
        }

        let mean = frame_ms.iter().sum::<f64>() / frame_ms.len().max(1) as f64;
        frame_ms.sort_by(|a, b| a.total_cmp(b));
        let p95 = percentile(&frame_ms, 0.95);
        println!(
            "{:>2}. {:<14} mean {:>7.3} ms  p95 {:>7.3} ms  lit={:>3}/{}  beats={}",
            idx, name, mean, p95, lit, args.frames, beats
        );

        if args.ci_smoke {
            if lit == 0 {
                failures.push(format!("{name}: never drew anything"));
            }
            if p95 > args.max_ms {
                failures.push(format!("{name}: p95 {p95:.3} ms > {:.3}", args.max_ms));
            }
        }
        player.shutdown();
    }

    if args.ci_smoke {
        if !failures.is_empty() {
            eprintln!("CI smoke: FAIL");
            for f in &failures {
                eprintln!("  {f}");
            }
            anyhow::bail!("ci smoke failed");
        }
        println!("CI smoke: PASS (max_ms={:.3})", args.max_ms);
    }
    Ok(())
}
