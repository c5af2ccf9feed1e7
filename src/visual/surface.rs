/// Shared RGBA8 framebuffer lent to the active scene each frame.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    w: usize,
    h: usize,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(w: usize, h: usize) -> Self {
        let mut s = Self::default();
        s.resize(w, h);
        s
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        let n = w.saturating_mul(h).saturating_mul(4);
        self.pixels.resize(n, 0);
        self.pixels.fill(0);
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Width over height; 1.0 for an empty surface.
    pub fn aspect(&self) -> f32 {
        if self.h == 0 {
            1.0
        } else {
            self.w as f32 / self.h as f32
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn clear(&mut self) {
        self.fill([0, 0, 0]);
    }

    pub fn fill(&mut self, rgb: [u8; 3]) {
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = rgb[0];
            px[1] = rgb[1];
            px[2] = rgb[2];
            px[3] = 255;
        }
    }

    /// Multiply every pixel by `k` (0..1).
    pub fn dim(&mut self, k: f32) {
        let k = k.clamp(0.0, 1.0);
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = (px[0] as f32 * k) as u8;
            px[1] = (px[1] as f32 * k) as u8;
            px[2] = (px[2] as f32 * k) as u8;
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.w || y >= self.h {
            return None;
        }
        let i = (y * self.w + x) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    pub fn put(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x >= self.w || y >= self.h {
            return;
        }
        let i = (y * self.w + x) * 4;
        self.pixels[i] = rgb[0];
        self.pixels[i + 1] = rgb[1];
        self.pixels[i + 2] = rgb[2];
        self.pixels[i + 3] = 255;
    }

    /// Additive-ish blend: `dst + src * alpha`, saturating.
    pub fn blend(&mut self, x: isize, y: isize, rgb: [u8; 3], alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.w || y as usize >= self.h {
            return;
        }
        let a = alpha.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let i = (y as usize * self.w + x as usize) * 4;
        for c in 0..3 {
            let v = self.pixels[i + c] as f32 + rgb[c] as f32 * a;
            self.pixels[i + c] = v.min(255.0) as u8;
        }
        self.pixels[i + 3] = 255;
    }

    /// Anti-alias-free line from (x0, y0) to (x1, y1) in pixel space.
    pub fn line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, rgb: [u8; 3], alpha: f32) {
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return;
        }
        let dx = x1 - x0;
        let dy = y1 - y0;
        let steps = dx.abs().max(dy.abs()).ceil();
        // Guard against degenerate projections blowing up the loop.
        let limit = ((self.w + self.h) * 4) as f32;
        let steps = steps.min(limit).max(1.0) as usize;
        for s in 0..=steps {
            let t = s as f32 / steps as f32;
            let x = (x0 + dx * t).round() as isize;
            let y = (y0 + dy * t).round() as isize;
            self.blend(x, y, rgb, alpha);
        }
    }

    /// Filled disc with a soft edge.
    pub fn disc(&mut self, cx: f32, cy: f32, r: f32, rgb: [u8; 3], alpha: f32) {
        if !(cx.is_finite() && cy.is_finite() && r.is_finite()) || r <= 0.0 {
            return;
        }
        let x0 = (cx - r - 1.0).floor().max(0.0) as isize;
        let y0 = (cy - r - 1.0).floor().max(0.0) as isize;
        let x1 = (cx + r + 1.0).ceil().min(self.w as f32) as isize;
        let y1 = (cy + r + 1.0).ceil().min(self.h as f32) as isize;
        for y in y0..y1 {
            for x in x0..x1 {
                let ddx = x as f32 + 0.5 - cx;
                let ddy = y as f32 + 0.5 - cy;
                let d = (ddx * ddx + ddy * ddy).sqrt();
                let edge = smoothstep(r, r - 1.5, d);
                if edge > 0.0 {
                    self.blend(x, y, rgb, alpha * edge);
                }
            }
        }
    }
}

/// Pinhole camera looking down +z, used to place 3D points on a surface.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub pos: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y: f32,
    pub near: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: [0.0, 0.0, 0.0],
            yaw: 0.0,
            pitch: 0.0,
            fov_y: 70f32.to_radians(),
            near: 0.05,
        }
    }
}

impl Camera {
    /// Returns pixel coordinates and view depth, or `None` behind the camera.
    pub fn project(&self, p: [f32; 3], w: usize, h: usize) -> Option<(f32, f32, f32)> {
        let x = p[0] - self.pos[0];
        let y = p[1] - self.pos[1];
        let z = p[2] - self.pos[2];

        let (sy, cy) = self.yaw.sin_cos();
        let xr = x * cy - z * sy;
        let zr = x * sy + z * cy;
        let (sp, cp) = self.pitch.sin_cos();
        let yr = y * cp - zr * sp;
        let zr = y * sp + zr * cp;

        if zr <= self.near {
            return None;
        }
        let f = 1.0 / (self.fov_y * 0.5).tan();
        let aspect = if h == 0 { 1.0 } else { w as f32 / h as f32 };
        let ndc_x = xr * f / (zr * aspect);
        let ndc_y = yr * f / zr;
        let sx = (ndc_x * 0.5 + 0.5) * w as f32;
        let sy = (0.5 - ndc_y * 0.5) * h as f32;
        Some((sx, sy, zr))
    }
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn lerp_rgb(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t) as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t) as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t) as u8,
    ]
}

pub fn scale_rgb(c: [u8; 3], k: f32) -> [u8; 3] {
    let k = k.max(0.0);
    [
        (c[0] as f32 * k).min(255.0) as u8,
        (c[1] as f32 * k).min(255.0) as u8,
        (c[2] as f32 * k).min(255.0) as u8,
    ]
}

pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let h = h.rem_euclid(1.0) * 6.0;
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);
    let i = h.floor();
    let f = h - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match i as i32 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}
