use crate::audio::{MicSource, SpectrumAnalyser, SpectrumSource, WavSource};
use crate::config::{Config, RendererMode, SourceKind};
use crate::player::{FrameOutcome, Player};
use crate::prefs::{prefs_storage_path, AppPrefs};
use crate::render::{pixel_multipliers, AsciiRenderer, Frame, HalfBlockRenderer, Renderer};
use crate::terminal::TerminalGuard;
use crate::visual::{find_scene, make_scenes, SceneRegistry};
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::BufWriter;
use std::time::{Duration, Instant};

/// How long the HUD beat marker stays lit after an event.
const BEAT_HOLD: f32 = 0.15;
const BEAT_MARKER: &str = "BEAT";

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let prefs_path = prefs_storage_path();
    let mut prefs = AppPrefs::load(prefs_path.as_deref()).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "ignoring unreadable prefs");
        AppPrefs::default()
    });

    let registry = build_registry(&cfg, &prefs)?;

    let mut renderer: Box<dyn Renderer> = match cfg.renderer {
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Ascii => Box::new(AsciiRenderer::new()),
    };
    let (px_w_mul, px_h_mul) = pixel_multipliers(&*renderer);

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());

    let mut last_size = crossterm::terminal::size().context("get terminal size")?;
    if last_size.1 < 2 || last_size.0 < 4 {
        return Err(anyhow::anyhow!(
            "terminal too small (need at least 4x2, got {}x{})",
            last_size.0,
            last_size.1
        ));
    }

    let mut show_hud = true;
    let mut show_help = false;
    let mut hud_rows = hud_rows_for_size(last_size, show_hud);
    let (w, h) = surface_size(last_size, px_w_mul, px_h_mul, hud_rows);
    let mut player = Player::new(registry, w, h);

    let mut status: Option<String> = None;
    match open_source(&cfg, cfg.source) {
        Ok(Some(source)) => player.attach(source),
        Ok(None) => status = Some("started without a source".to_string()),
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "audio source unavailable");
            status = Some(format!("{err:#}"));
        }
    }

    let mut last_frame = Instant::now();
    let mut fps = FpsCounter::new();
    let mut beat_hold = 0.0f32;
    let frame_budget = cfg.frame_interval();

    loop {
        let now = Instant::now();

        // Drain input events (non-blocking).
        let mut quit = false;
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    let old_hud = show_hud;
                    match handle_key(k.code, k.modifiers, &mut player, &mut show_hud, &mut show_help) {
                        KeyAction::Quit => quit = true,
                        KeyAction::AttachSource => {
                            let kind = match cfg.source {
                                SourceKind::None => SourceKind::Mic,
                                other => other,
                            };
                            match player.reattach(|| open_source(&cfg, kind)) {
                                Ok(true) => status = None,
                                Ok(false) => {}
                                Err(err) => {
                                    tracing::warn!(error = %format!("{err:#}"), "audio source unavailable");
                                    status = Some(format!("{err:#}"));
                                }
                            }
                        }
                        KeyAction::Detach => {
                            player.detach();
                            status = Some("source detached".to_string());
                        }
                        KeyAction::None => {}
                    }
                    if show_hud != old_hud {
                        hud_rows = hud_rows_for_size(last_size, show_hud);
                        let (w, h) = surface_size(last_size, px_w_mul, px_h_mul, hud_rows);
                        player.resize(w, h);
                    }
                }
                Event::Resize(c, r) => {
                    last_size = (c, r);
                    hud_rows = hud_rows_for_size(last_size, show_hud);
                    let (w, h) = surface_size(last_size, px_w_mul, px_h_mul, hud_rows);
                    player.resize(w, h);
                }
                _ => {}
            }
        }
        if quit {
            break;
        }

        // Size check once per frame (resize events can be missed in some terminals).
        let sz = crossterm::terminal::size()?;
        if sz != last_size {
            last_size = sz;
            hud_rows = hud_rows_for_size(last_size, show_hud);
            let (w, h) = surface_size(last_size, px_w_mul, px_h_mul, hud_rows);
            player.resize(w, h);
        }

        let dt = now.duration_since(last_frame).as_secs_f32().max(1e-6);
        last_frame = now;

        match player.frame(dt) {
            FrameOutcome::Rendered(result) => {
                beat_hold = if result.event {
                    BEAT_HOLD
                } else {
                    (beat_hold - dt).max(0.0)
                };
            }
            FrameOutcome::SourceLost(msg) => {
                status = Some(format!("audio source lost: {msg}"));
                beat_hold = 0.0;
            }
            FrameOutcome::Idle => beat_hold = 0.0,
        }

        let (term_cols, term_rows) = last_size;
        let beat_on = beat_hold > 0.0;
        let hud = if show_hud {
            build_hud(term_cols as usize, &player, beat_on, fps.fps(), renderer.name())
        } else {
            String::new()
        };
        let target_hud_rows = hud_rows_for_text(term_rows, show_hud, &hud);
        if target_hud_rows != hud_rows {
            hud_rows = target_hud_rows;
            let (w, h) = surface_size(last_size, px_w_mul, px_h_mul, hud_rows);
            player.resize(w, h);
        }
        let visual_rows = term_rows.saturating_sub(hud_rows).max(1);

        let idle_text = player.is_idle().then(|| idle_popup_text(status.as_deref()));
        let overlay = if show_help {
            Some(help_popup_text())
        } else {
            idle_text.as_deref()
        };

        let surface = player.surface();
        let frame = Frame {
            term_cols,
            term_rows,
            visual_rows,
            pixel_width: surface.width(),
            pixel_height: surface.height(),
            pixels_rgba: surface.pixels(),
            hud: &hud,
            hud_rows,
            hud_highlight: beat_on.then_some(BEAT_MARKER),
            overlay,
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;
        fps.tick();

        // Frame pacing.
        let elapsed = now.elapsed();
        if elapsed < frame_budget {
            std::thread::sleep(frame_budget - elapsed);
        }
    }

    prefs.last_scene = Some(player.registry().current_name().to_string());
    if let Err(err) = prefs.save(prefs_path.as_deref()) {
        tracing::warn!(error = %err, "could not save prefs");
    }
    player.shutdown();
    Ok(())
}

/// Scenes in registry order, starting from `--scene`, else the last-used
/// scene, else the first one.
pub fn build_registry(cfg: &Config, prefs: &AppPrefs) -> anyhow::Result<SceneRegistry> {
    let scenes = make_scenes();
    let names = scenes.iter().map(|s| s.name()).collect::<Vec<_>>();
    let requested = cfg.scene.as_deref().and_then(|q| {
        let found = find_scene(&names, q);
        if found.is_none() {
            tracing::warn!(scene = q, "unknown scene, ignoring");
        }
        found
    });
    let start = requested
        .or_else(|| prefs.last_scene.as_deref().and_then(|q| find_scene(&names, q)))
        .unwrap_or(0);
    Ok(SceneRegistry::with_start(scenes, start)?)
}

/// Open the input named by `kind`. `SourceKind::None` yields no source.
pub fn open_source(cfg: &Config, kind: SourceKind) -> anyhow::Result<Option<Box<dyn SpectrumSource>>> {
    let analyser = SpectrumAnalyser::new(cfg.fft_size, cfg.smoothing);
    match kind {
        SourceKind::Mic => {
            let mic = MicSource::open(cfg.device.as_deref(), analyser)
                .with_context(|| format!("open microphone (device={:?})", cfg.device))?;
            Ok(Some(Box::new(mic)))
        }
        SourceKind::File => {
            let path = cfg
                .file
                .as_deref()
                .context("--source file needs --file <path>")?;
            let wav = WavSource::open(path, cfg.loop_file, analyser)?;
            Ok(Some(Box::new(wav)))
        }
        SourceKind::None => Ok(None),
    }
}

pub fn print_scene_list() {
    let scenes = make_scenes();
    for (i, scene) in scenes.iter().enumerate() {
        println!("{i}: {}", scene.name());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    None,
    Quit,
    AttachSource,
    Detach,
}

fn handle_key(
    code: KeyCode,
    mods: KeyModifiers,
    player: &mut Player,
    show_hud: &mut bool,
    show_help: &mut bool,
) -> KeyAction {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return KeyAction::Quit;
    }
    match code {
        KeyCode::Esc if *show_help => *show_help = false,
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return KeyAction::Quit,
        KeyCode::Left => {
            player.prev_scene();
        }
        KeyCode::Right => {
            player.next_scene();
        }
        KeyCode::Char(c @ '1'..='9') => {
            // Out-of-range digits are ignored by the registry.
            player.set_scene(c as usize - '1' as usize);
        }
        KeyCode::Char('s') | KeyCode::Char('S') => return KeyAction::AttachSource,
        KeyCode::Char('d') | KeyCode::Char('D') => return KeyAction::Detach,
        KeyCode::Char('h') | KeyCode::Char('H') => *show_hud = !*show_hud,
        KeyCode::Char('?') | KeyCode::F(1) => *show_help = !*show_help,
        _ => {}
    }
    KeyAction::None
}

fn surface_size(size: (u16, u16), px_w_mul: usize, px_h_mul: usize, hud_rows: u16) -> (usize, usize) {
    let (cols, rows) = size;
    let visual_rows = rows.saturating_sub(hud_rows).max(1);
    (
        (cols as usize).saturating_mul(px_w_mul),
        (visual_rows as usize).saturating_mul(px_h_mul),
    )
}

fn hud_rows_for_size(size: (u16, u16), show_hud: bool) -> u16 {
    if !show_hud {
        return 0;
    }
    let rows = size.1;
    if rows <= 1 {
        return 0;
    }
    (rows - 1).min(2)
}

fn hud_rows_for_text(term_rows: u16, show_hud: bool, hud: &str) -> u16 {
    if !show_hud {
        return 0;
    }
    let wanted = hud.lines().count() as u16;
    wanted.min(term_rows.saturating_sub(1))
}

fn build_hud(cols: usize, player: &Player, beat_on: bool, fps: f32, renderer_name: &str) -> String {
    let registry = player.registry();
    let result = player.last_result();
    let source = player.source_label().unwrap_or("none");
    let threshold = player
        .threshold()
        .map(|t| format!("{t:>5.3}"))
        .unwrap_or_else(|| "  -  ".to_string());
    let logical_lines = [
        format!(
            "{} [{}/{}] | Src: {} | flux {:>5.3} | mean {:>5.3} | thr {} | {} | FPS {:>4.1} | {}",
            registry.current_name(),
            registry.current_index() + 1,
            registry.len(),
            source,
            result.flux,
            result.mean_flux,
            threshold,
            if beat_on { BEAT_MARKER } else { "    " },
            fps,
            renderer_name,
        ),
        "Keys: ←/→ scene | 1-9 pick | s source | d detach | h HUD | ? help | q quit".to_string(),
    ];

    logical_lines
        .iter()
        .flat_map(|l| hard_wrap_line(l, cols.max(1)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn hard_wrap_line(line: &str, width: usize) -> Vec<String> {
    let chars = line.chars().collect::<Vec<_>>();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

fn idle_popup_text(status: Option<&str>) -> String {
    let mut text = String::from("No audio source\n");
    if let Some(status) = status {
        text.push_str(status);
        text.push('\n');
    }
    text.push_str("s  attach source\nq  quit");
    text
}

fn help_popup_text() -> &'static str {
    "beatscope keys\n\
←/→  previous/next scene\n\
1-9  jump to scene\n\
s  attach (or restart) the audio source\n\
d  detach the audio source\n\
h  show/hide HUD\n\
? or F1  toggle this help\n\
q or esc  quit"
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = self.frames as f32 / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
