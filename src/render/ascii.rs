use crate::render::{luma_u8, text_frame_begin, text_frame_end, write_fg_rgb, Frame, Renderer};
use std::io::Write;

/// Dark to bright, ASCII only.
const RAMP: &[u8] = b" .'`:-=+*cox%#&@";

/// One surface pixel per cell, drawn as a luminance glyph in its own colour.
pub struct AsciiRenderer {
    last_fg: Option<(u8, u8, u8)>,
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self { last_fg: None }
    }
}

pub(crate) fn glyph_for(r: u8, g: u8, b: u8) -> u8 {
    let l = luma_u8(r, g, b) as usize;
    RAMP[l * (RAMP.len() - 1) / 255]
}

impl Renderer for AsciiRenderer {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, visual_rows, w, _h)) = text_frame_begin(frame, 1, 1, out)? else {
            return Ok(());
        };
        self.last_fg = None;
        out.write_all(b"\x1b[48;2;0;0;0m")?;

        let px = frame.pixels_rgba;
        let mut line = Vec::with_capacity(cols * 4);
        for y in 0..visual_rows {
            if y > 0 {
                out.write_all(b"\r\n")?;
            }
            line.clear();
            for x in 0..cols {
                let i = (y * w + x) * 4;
                let fg = (px[i], px[i + 1], px[i + 2]);
                let ch = glyph_for(fg.0, fg.1, fg.2);
                // Blank cells never need a colour change.
                if ch != b' ' && self.last_fg != Some(fg) {
                    out.write_all(&line)?;
                    line.clear();
                    write_fg_rgb(out, fg.0, fg.1, fg.2)?;
                    self.last_fg = Some(fg);
                }
                line.push(ch);
            }
            out.write_all(&line)?;
        }

        text_frame_end(frame, cols, visual_rows, out)
    }
}
