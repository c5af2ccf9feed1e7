mod ascii;
mod halfblock;

pub use ascii::AsciiRenderer;
pub use halfblock::HalfBlockRenderer;

use std::io::Write;

/// Everything a painter needs to put one frame on the terminal.
pub struct Frame<'a> {
    pub term_cols: u16,
    pub term_rows: u16,
    pub visual_rows: u16,
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub pixels_rgba: &'a [u8],
    pub hud: &'a str,
    pub hud_rows: u16,
    /// Substring of the HUD painted in the accent colour (the beat marker).
    pub hud_highlight: Option<&'a str>,
    pub overlay: Option<&'a str>,
    pub sync_updates: bool,
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

/// Pixels per terminal cell for each painter, as (x, y).
pub fn pixel_multipliers(renderer: &dyn Renderer) -> (usize, usize) {
    match renderer.name() {
        "halfblock" => (1, 2),
        _ => (1, 1),
    }
}

pub(crate) fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 54 + g as u32 * 183 + b as u32 * 19) >> 8) as u8
}

pub(crate) fn write_fg_rgb(out: &mut dyn Write, r: u8, g: u8, b: u8) -> std::io::Result<()> {
    write!(out, "\x1b[38;2;{};{};{}m", r, g, b)
}

/// Validate frame geometry and emit the common frame prologue.
///
/// Returns `None` (writing nothing) when the frame is empty or its pixel
/// buffer does not match `cols * px_w` by `visual_rows * px_h`.
pub(crate) fn text_frame_begin(
    frame: &Frame<'_>,
    px_w: usize,
    px_h: usize,
    out: &mut dyn Write,
) -> anyhow::Result<Option<(usize, usize, usize, usize)>> {
    let cols = frame.term_cols as usize;
    let visual_rows = frame.visual_rows as usize;
    let w = frame.pixel_width;
    let h = frame.pixel_height;

    if cols == 0 || visual_rows == 0 || w == 0 || h == 0 {
        return Ok(None);
    }
    if w != cols.saturating_mul(px_w) || h != visual_rows.saturating_mul(px_h) {
        // Internal mismatch; avoid panics.
        return Ok(None);
    }
    if frame.pixels_rgba.len() < w.saturating_mul(h).saturating_mul(4) {
        return Ok(None);
    }

    if frame.sync_updates {
        out.write_all(b"\x1b[?2026h")?;
    }
    // Home, reset, and disable autowrap while painting full-width rows.
    out.write_all(b"\x1b[H\x1b[0m\x1b[?7l")?;
    Ok(Some((cols, visual_rows, w, h)))
}

/// HUD, overlay, autowrap restore, sync end, flush.
pub(crate) fn text_frame_end(
    frame: &Frame<'_>,
    cols: usize,
    visual_rows: usize,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    write_hud(frame, cols, visual_rows, out)?;

    if let Some(text) = frame.overlay {
        draw_overlay_popup(out, frame.term_cols, frame.term_rows, text)?;
    }

    out.write_all(b"\x1b[?7h")?;
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026l")?;
    }
    out.flush()?;
    Ok(())
}

fn write_hud(
    frame: &Frame<'_>,
    cols: usize,
    visual_rows: usize,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut hud_lines = frame.hud.lines();
    for i in 0..(frame.hud_rows as usize) {
        write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", visual_rows + i + 1)?;
        let Some(line) = hud_lines.next() else {
            continue;
        };
        let line = truncate_chars(line, cols);
        match frame.hud_highlight.and_then(|hl| line.find(hl).map(|at| (hl, at))) {
            Some((hl, at)) if !hl.is_empty() => {
                out.write_all(line[..at].as_bytes())?;
                write!(out, "\x1b[1m\x1b[38;2;255;244;176m{}\x1b[0m", hl)?;
                out.write_all(line[at + hl.len()..].as_bytes())?;
            }
            _ => out.write_all(line.as_bytes())?,
        }
    }
    Ok(())
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

const POPUP_TEXT: &[u8] = b"\x1b[0m\x1b[38;2;236;242;255m\x1b[48;2;10;14;24m";
const POPUP_TITLE: &str = "\x1b[1m\x1b[38;2;255;236;160m";

/// Overlay text split into a title (first line) and word-wrapped body.
struct Popup<'a> {
    title: &'a str,
    body: Vec<String>,
}

impl<'a> Popup<'a> {
    fn parse(text: &'a str, max_width: usize) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }
        let mut lines = text.lines();
        let title = lines.next().unwrap_or_default().trim();
        let body = lines.flat_map(|l| wrap_line(l, max_width)).collect();
        Some(Self { title, body })
    }

    /// Inner width: the widest body line, or the title plus its border gap.
    fn width(&self) -> usize {
        let title = self.title.chars().count();
        self.body
            .iter()
            .map(|l| l.chars().count())
            .chain(std::iter::once(title + usize::from(title > 0)))
            .max()
            .unwrap_or(0)
    }
}

/// Break `line` at the last space that fits in `max` chars, or mid-word when
/// there is none. Interior spacing is kept so key columns stay aligned.
fn wrap_line(line: &str, max: usize) -> Vec<String> {
    let mut rest = line.trim_end();
    let mut out = Vec::new();
    while rest.chars().count() > max {
        let cut = rest.char_indices().nth(max).map_or(rest.len(), |(i, _)| i);
        let split = rest[..cut].rfind(' ').filter(|&i| i > 0).unwrap_or(cut);
        out.push(rest[..split].trim_end().to_string());
        rest = rest[split..].trim_start();
    }
    out.push(rest.to_string());
    out
}

/// Centred box over the picture. The title sits in the top border:
///
/// ```text
/// +- Title ------+
/// | body line    |
/// +--------------+
/// ```
pub fn draw_overlay_popup(
    out: &mut dyn Write,
    term_cols: u16,
    term_rows: u16,
    text: &str,
) -> anyhow::Result<()> {
    let cols = term_cols as usize;
    let rows = term_rows as usize;
    if cols < 8 || rows < 4 {
        return Ok(());
    }
    let max_inner = cols - 4;
    let Some(popup) = Popup::parse(text, max_inner) else {
        return Ok(());
    };

    let inner = popup.width().clamp(1, max_inner);
    let body_rows = popup.body.len().min(rows - 2);
    let left = (cols - (inner + 4)) / 2 + 1;
    let top = (rows - (body_rows + 2)) / 2 + 1;
    let title = truncate_chars(popup.title, inner.saturating_sub(1));

    out.write_all(POPUP_TEXT)?;
    write!(out, "\x1b[{top};{left}H+")?;
    let mut used = 0;
    if !title.is_empty() {
        write!(out, "- {POPUP_TITLE}{title}\x1b[22m\x1b[38;2;236;242;255m ")?;
        used = title.chars().count() + 3;
    }
    write!(out, "{}+", "-".repeat(inner + 2 - used))?;

    for (i, line) in popup.body.iter().take(body_rows).enumerate() {
        let line = truncate_chars(line, inner);
        write!(out, "\x1b[{};{left}H| {line:<inner$} |", top + 1 + i)?;
    }
    write!(out, "\x1b[{};{left}H+{}+", top + body_rows + 1, "-".repeat(inner + 2))?;
    out.write_all(b"\x1b[0m")?;
    Ok(())
}
