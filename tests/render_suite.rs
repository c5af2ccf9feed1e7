use beatscope::render::{
    draw_overlay_popup, pixel_multipliers, AsciiRenderer, Frame, HalfBlockRenderer, Renderer,
};

/// Build a solid-color RGBA pixel buffer.
fn solid_pixels(w: usize, h: usize, r: u8, g: u8, b: u8) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 4];
    for px in buf.chunks_exact_mut(4) {
        px[0] = r;
        px[1] = g;
        px[2] = b;
        px[3] = 255;
    }
    buf
}

/// Horizontal ramp from black to white.
fn ramp_pixels(w: usize, h: usize) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 4];
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) * 4;
            let t = (x * 255 / w.saturating_sub(1).max(1)) as u8;
            buf[i] = t;
            buf[i + 1] = t;
            buf[i + 2] = t;
            buf[i + 3] = 255;
        }
    }
    buf
}

fn make_frame<'a>(
    cols: u16,
    visual_rows: u16,
    pw: usize,
    ph: usize,
    pixels: &'a [u8],
    sync: bool,
) -> Frame<'a> {
    Frame {
        term_cols: cols,
        term_rows: visual_rows + 1,
        visual_rows,
        pixel_width: pw,
        pixel_height: ph,
        pixels_rgba: pixels,
        hud: "Grid Tunnel [1/4] | flux 0.420 | BEAT",
        hud_rows: 1,
        hud_highlight: None,
        overlay: None,
        sync_updates: sync,
    }
}

fn render_to_string(r: &mut dyn Renderer, frame: &Frame<'_>) -> String {
    let mut out = Vec::new();
    r.render(frame, &mut out).expect("render");
    String::from_utf8(out).expect("utf8 output")
}

// ── Half-block renderer ─────────────────────────────────────────────────────

#[test]
fn halfblock_renders_two_pixels_per_cell() {
    let cols = 8u16;
    let rows = 4u16;
    let (mx, my) = pixel_multipliers(&HalfBlockRenderer::new());
    assert_eq!((mx, my), (1, 2));
    let pixels = ramp_pixels(cols as usize * mx, rows as usize * my);
    let frame = make_frame(cols, rows, cols as usize * mx, rows as usize * my, &pixels, true);
    let s = render_to_string(&mut HalfBlockRenderer::new(), &frame);

    assert!(s.starts_with("\x1b[?2026h"), "missing sync-begin");
    assert!(s.contains("\x1b[?2026l"), "missing sync-end");
    assert!(s.contains("\x1b[H"), "missing home cursor");
    assert!(s.contains("\x1b[?7l") && s.contains("\x1b[?7h"), "autowrap not toggled");
    assert_eq!(s.matches('\u{2580}').count(), cols as usize * rows as usize);
    assert!(s.contains("38;2;") && s.contains("48;2;"), "missing colour escapes");
    assert!(s.contains("Grid Tunnel [1/4]"), "HUD text missing");
}

#[test]
fn halfblock_does_not_scroll_past_last_row() {
    let pixels = solid_pixels(4, 6, 10, 20, 30);
    let frame = make_frame(4, 3, 4, 6, &pixels, false);
    let s = render_to_string(&mut HalfBlockRenderer::new(), &frame);
    assert_eq!(s.matches("\r\n").count(), 2);
}

#[test]
fn halfblock_skips_dimension_mismatch() {
    let pixels = solid_pixels(4, 4, 100, 100, 100);
    let frame = make_frame(4, 4, 4, 4, &pixels, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).expect("render");
    assert!(out.is_empty(), "expected empty output for dimension mismatch");
}

#[test]
fn halfblock_skips_short_pixel_buffer() {
    let pixels = solid_pixels(4, 3, 100, 100, 100);
    let frame = make_frame(4, 2, 4, 4, &pixels, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).expect("render");
    assert!(out.is_empty());
}

#[test]
fn halfblock_resets_color_cache_each_frame() {
    let mut renderer = HalfBlockRenderer::new();

    let red = solid_pixels(4, 4, 255, 0, 0);
    let s1 = render_to_string(&mut renderer, &make_frame(4, 2, 4, 4, &red, false));
    assert!(s1.contains("38;2;255;0;0"));

    let red_again = render_to_string(&mut renderer, &make_frame(4, 2, 4, 4, &red, false));
    assert!(red_again.contains("38;2;255;0;0"), "cache leaked across frames");
}

// ── ASCII renderer ──────────────────────────────────────────────────────────

#[test]
fn ascii_renders_solid_frame() {
    let cols = 10u16;
    let rows = 5u16;
    let pixels = solid_pixels(cols as usize, rows as usize, 200, 200, 200);
    let frame = make_frame(cols, rows, cols as usize, rows as usize, &pixels, false);
    let s = render_to_string(&mut AsciiRenderer::new(), &frame);
    assert!(s.contains("\x1b[H"), "missing home cursor");
    assert!(s.contains("38;2;200;200;200"), "missing FG color");
    // One colour escape is enough for a uniform frame.
    assert_eq!(s.matches("38;2;200;200;200").count(), 1);
    assert!(!s.contains("\x1b[?2026h"), "sync disabled");
}

#[test]
fn ascii_maps_luma_to_ramp() {
    let cols = 16u16;
    let pixels = ramp_pixels(cols as usize, 1);
    let frame = make_frame(cols, 1, cols as usize, 1, &pixels, false);
    let s = render_to_string(&mut AsciiRenderer::new(), &frame);
    assert!(s.contains('@'), "white should use the densest glyph");
    assert!(!s.contains("38;2;0;0;0m"), "black cells need no colour");
}

#[test]
fn ascii_skips_zero_size() {
    let pixels = solid_pixels(1, 1, 0, 0, 0);
    let frame = make_frame(0, 0, 0, 0, &pixels, false);
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).expect("render");
    assert!(out.is_empty(), "expected empty output for zero-size frame");
}

#[test]
fn renderer_names() {
    assert_eq!(AsciiRenderer::new().name(), "ascii");
    assert_eq!(HalfBlockRenderer::new().name(), "halfblock");
    assert_eq!(pixel_multipliers(&AsciiRenderer::new()), (1, 1));
}

// ── HUD and overlay ─────────────────────────────────────────────────────────

#[test]
fn beat_marker_is_highlighted() {
    let pixels = solid_pixels(40, 5, 30, 30, 30);
    let mut frame = make_frame(40, 5, 40, 5, &pixels, false);
    frame.hud_highlight = Some("BEAT");
    let s = render_to_string(&mut AsciiRenderer::new(), &frame);
    assert!(s.contains("\x1b[1m\x1b[38;2;255;244;176mBEAT"), "highlight missing");

    frame.hud_highlight = None;
    let plain = render_to_string(&mut AsciiRenderer::new(), &frame);
    assert!(plain.contains("BEAT") && !plain.contains("255;244;176"));
}

#[test]
fn hud_is_truncated_to_terminal_width() {
    let pixels = solid_pixels(8, 2, 0, 0, 0);
    let mut frame = make_frame(8, 2, 8, 2, &pixels, false);
    frame.hud = "0123456789abcdef";
    let s = render_to_string(&mut AsciiRenderer::new(), &frame);
    assert!(s.contains("01234567"));
    assert!(!s.contains("89ab"));
}

#[test]
fn overlay_popup_is_drawn_over_the_frame() {
    let cols = 40u16;
    let rows = 20u16;
    let pixels = solid_pixels(cols as usize, rows as usize, 50, 50, 50);
    let mut frame = make_frame(cols, rows, cols as usize, rows as usize, &pixels, false);
    frame.overlay = Some("No audio source\ns  attach source");
    let s = render_to_string(&mut AsciiRenderer::new(), &frame);
    assert!(s.contains("No audio source"), "overlay title missing");
    assert!(s.contains("s  attach source"), "overlay body missing");
    assert!(s.contains("+---"), "overlay border missing");
}

fn popup_to_string(cols: u16, rows: u16, text: &str) -> String {
    let mut out = Vec::new();
    draw_overlay_popup(&mut out, cols, rows, text).expect("popup");
    String::from_utf8(out).expect("utf8 output")
}

#[test]
fn popup_title_sits_in_the_top_border() {
    let s = popup_to_string(40, 10, "Help\nq  quit");
    assert!(s.contains("+- \x1b[1m\x1b[38;2;255;236;160mHelp"), "title not in border: {s:?}");
    // Inner width is the body width (7), so the bottom border is 9 dashes.
    assert!(s.contains(&format!("+{}+", "-".repeat(9))));
    assert!(s.contains("| q  quit |"));
}

#[test]
fn popup_wraps_long_lines_at_spaces() {
    let s = popup_to_string(16, 12, "Idle\nattach a source with s");
    // At most 12 inner columns; the box shrinks to the widest wrapped line.
    assert!(s.contains("| attach a    |"), "{s:?}");
    assert!(s.contains("| source with |"), "{s:?}");
    assert!(s.contains("| s           |"), "{s:?}");
}

#[test]
fn popup_is_skipped_when_blank_or_too_small() {
    assert!(popup_to_string(40, 10, "  \n ").is_empty());
    assert!(popup_to_string(6, 10, "Help").is_empty());
    assert!(popup_to_string(40, 3, "Help").is_empty());
}
