use serde::{Deserialize, Serialize};

use crate::surface::SurfaceSize;

pub type Color = [u8; 4];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_size(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x
            && px < self.x.saturating_add(self.w)
            && py >= self.y
            && py < self.y.saturating_add(self.h)
    }

    /// A `w` x `h` rect centred inside `outer` (clamped to fit).
    pub fn centered_in(outer: SurfaceSize, w: u32, h: u32) -> Self {
        let w = w.min(outer.width);
        let h = h.min(outer.height);
        Self {
            x: (outer.width - w) / 2,
            y: (outer.height - h) / 2,
            w,
            h,
        }
    }

    /// Shrinks the rect by `by` pixels on every side, saturating at zero size.
    pub fn shrink(&self, by: u32) -> Self {
        Self {
            x: self.x.saturating_add(by),
            y: self.y.saturating_add(by),
            w: self.w.saturating_sub(by.saturating_mul(2)),
            h: self.h.saturating_sub(by.saturating_mul(2)),
        }
    }
}

/// Unified 2D drawing interface.
///
/// Engines only talk to this trait; they never know whether pixels end up in a window or in a
/// test buffer.
pub trait Renderer2d {
    fn size(&self) -> SurfaceSize;

    /// Opaque fill.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Alpha-blended rect over existing content (alpha is applied to `color`'s RGB).
    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8);

    fn rect_outline(&mut self, rect: Rect, color: Color) {
        if rect.w == 0 || rect.h == 0 {
            return;
        }
        self.fill_rect(Rect::new(rect.x, rect.y, rect.w, 1), color);
        self.fill_rect(Rect::new(rect.x, rect.y + rect.h - 1, rect.w, 1), color);
        self.fill_rect(Rect::new(rect.x, rect.y, 1, rect.h), color);
        self.fill_rect(Rect::new(rect.x + rect.w - 1, rect.y, 1, rect.h), color);
    }

    /// Filled circle centred on (`cx`, `cy`), drawn as one horizontal span per row.
    fn fill_disc(&mut self, cx: u32, cy: u32, radius: u32, color: Color) {
        let r = radius as i64;
        for dy in -r..=r {
            let y = cy as i64 + dy;
            if y < 0 {
                continue;
            }
            let half = ((r * r - dy * dy) as f64).sqrt().floor() as i64;
            let x0 = (cx as i64 - half).max(0);
            let x1 = cx as i64 + half;
            if x1 < x0 {
                continue;
            }
            self.fill_rect(
                Rect::new(x0 as u32, y as u32, (x1 - x0 + 1) as u32, 1),
                color,
            );
        }
    }

    fn clear(&mut self, color: Color) {
        let s = self.size();
        self.fill_rect(Rect::from_size(s.width, s.height), color);
    }
}

/// Darkens the whole surface, used behind paused / game-over / win states.
pub fn dim_surface(gfx: &mut dyn Renderer2d, alpha: u8) {
    let s = gfx.size();
    gfx.blend_rect(Rect::from_size(s.width, s.height), [0, 0, 0, 255], alpha);
}

/// CPU renderer that draws into an RGBA frame buffer.
pub struct CpuRenderer<'a> {
    frame: &'a mut [u8],
    size: SurfaceSize,
}

impl<'a> CpuRenderer<'a> {
    pub fn new(frame: &'a mut [u8], size: SurfaceSize) -> Self {
        Self { frame, size }
    }

    /// Clips `rect` to the surface and returns (byte offset of first pixel, row bytes, rows,
    /// stride), or `None` when nothing is visible or the buffer is too small.
    fn clipped_span(&self, rect: Rect) -> Option<(usize, usize, u32, usize)> {
        let width = self.size.width;
        let height = self.size.height;

        let max_x = rect.x.saturating_add(rect.w).min(width);
        let max_y = rect.y.saturating_add(rect.h).min(height);
        if rect.x >= max_x || rect.y >= max_y {
            return None;
        }
        if self.frame.len() < self.size.rgba_len() || self.size.is_empty() {
            return None;
        }

        let stride = width as usize * 4;
        let start = rect.y as usize * stride + rect.x as usize * 4;
        let row_bytes = (max_x - rect.x) as usize * 4;
        Some((start, row_bytes, max_y - rect.y, stride))
    }
}

impl Renderer2d for CpuRenderer<'_> {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some((mut row_start, row_bytes, rows, stride)) = self.clipped_span(rect) else {
            return;
        };

        for _ in 0..rows {
            let row = &mut self.frame[row_start..row_start + row_bytes];
            for px in row.chunks_exact_mut(4) {
                px.copy_from_slice(&color);
            }
            row_start += stride;
        }
    }

    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8) {
        if alpha == 0 {
            return;
        }
        if alpha == 255 {
            self.fill_rect(rect, color);
            return;
        }
        let Some((mut row_start, row_bytes, rows, stride)) = self.clipped_span(rect) else {
            return;
        };

        let a = alpha as u32;
        let inv = 255u32 - a;
        for _ in 0..rows {
            let row = &mut self.frame[row_start..row_start + row_bytes];
            for px in row.chunks_exact_mut(4) {
                for c in 0..3 {
                    px[c] = ((px[c] as u32 * inv + color[c] as u32 * a + 127) / 255) as u8;
                }
                px[3] = 255;
            }
            row_start += stride;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        [frame[i], frame[i + 1], frame[i + 2], frame[i + 3]]
    }

    #[test]
    fn fill_rect_clips_to_surface() {
        let size = SurfaceSize::new(4, 4);
        let mut frame = vec![0u8; size.rgba_len()];
        let mut gfx = CpuRenderer::new(&mut frame, size);
        gfx.fill_rect(Rect::new(2, 2, 10, 10), [9, 9, 9, 255]);

        assert_eq!(pixel(&frame, 4, 3, 3), [9, 9, 9, 255]);
        assert_eq!(pixel(&frame, 4, 1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn blend_rect_mixes_halfway() {
        let size = SurfaceSize::new(1, 1);
        let mut frame = vec![0, 0, 0, 255];
        let mut gfx = CpuRenderer::new(&mut frame, size);
        gfx.blend_rect(Rect::from_size(1, 1), [255, 255, 255, 255], 128);
        assert_eq!(pixel(&frame, 1, 0, 0), [128, 128, 128, 255]);
    }

    #[test]
    fn disc_covers_centre_but_not_corners() {
        let size = SurfaceSize::new(9, 9);
        let mut frame = vec![0u8; size.rgba_len()];
        let mut gfx = CpuRenderer::new(&mut frame, size);
        gfx.fill_disc(4, 4, 3, [1, 2, 3, 255]);

        assert_eq!(pixel(&frame, 9, 4, 4), [1, 2, 3, 255]);
        assert_eq!(pixel(&frame, 9, 4, 1), [1, 2, 3, 255]);
        assert_eq!(pixel(&frame, 9, 1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn outline_leaves_interior_untouched() {
        let size = SurfaceSize::new(5, 5);
        let mut frame = vec![0u8; size.rgba_len()];
        let mut gfx = CpuRenderer::new(&mut frame, size);
        gfx.rect_outline(Rect::from_size(5, 5), [7, 7, 7, 255]);
        assert_eq!(pixel(&frame, 5, 0, 0), [7, 7, 7, 255]);
        assert_eq!(pixel(&frame, 5, 4, 2), [7, 7, 7, 255]);
        assert_eq!(pixel(&frame, 5, 2, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn centered_rect_is_clamped() {
        let r = Rect::centered_in(SurfaceSize::new(448, 496), 220, 440);
        assert_eq!(r, Rect::new(114, 28, 220, 440));
        let big = Rect::centered_in(SurfaceSize::new(10, 10), 50, 5);
        assert_eq!(big, Rect::new(0, 2, 10, 5));
    }
}
