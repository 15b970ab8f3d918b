use crate::rect::PixelRect;

/// An RGBA pixel buffer, 4 bytes per pixel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Create a new buffer filled with black (opaque).
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk[3] = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width, self.height)
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Copy tightly packed RGBA rows into `rect`.
    pub fn write_rect(&mut self, rect: &PixelRect, rgba: &[u8]) {
        debug_assert_eq!(rgba.len(), rect.pixel_count() * 4);
        debug_assert!(rect.x + rect.width <= self.width && rect.y + rect.height <= self.height);
        let row_bytes = rect.width as usize * 4;
        for row in 0..rect.height {
            let src_start = row as usize * row_bytes;
            let dst_start = self.offset(rect.x, rect.y + row);
            self.pixels[dst_start..dst_start + row_bytes]
                .copy_from_slice(&rgba[src_start..src_start + row_bytes]);
        }
    }

    /// Draw the buffer onto itself offset by `(dx, dy)`, replacing what was there.
    ///
    /// `dx > 0` moves content right, `dy > 0` moves it down. Pixels the
    /// shifted image does not cover keep their previous (now stale) values.
    pub fn shift(&mut self, dx: i32, dy: i32) {
        if dx == 0 && dy == 0 {
            return;
        }
        let w = self.width as i64;
        let h = self.height as i64;
        let (dx, dy) = (dx as i64, dy as i64);

        let x_start = dx.max(0);
        let x_end = (w + dx).min(w);
        if x_start >= x_end || dy.abs() >= h {
            return;
        }
        let row_bytes = (x_end - x_start) as usize * 4;
        let src_x = (x_start - dx) as u32;
        let dst_x = x_start as u32;

        // Walk away from the direction of travel so no source row is
        // overwritten before it is read.
        let rows: Box<dyn Iterator<Item = i64>> = if dy > 0 {
            Box::new((dy..h).rev())
        } else {
            Box::new(0..h + dy)
        };
        for dst_y in rows {
            let src_y = dst_y - dy;
            let src = self.offset(src_x, src_y as u32);
            let dst = self.offset(dst_x, dst_y as u32);
            self.pixels.copy_within(src..src + row_bytes, dst);
        }
    }

    /// Copy `src_rect` of `source` into `dst_rect` of `self` without scaling.
    ///
    /// The copied extent is the overlap of both rectangles' sizes, clipped
    /// to both buffers.
    pub fn copy_from(&mut self, source: &PixelBuffer, src_rect: PixelRect, dst_rect: PixelRect) {
        let w = src_rect
            .width
            .min(dst_rect.width)
            .min(source.width.saturating_sub(src_rect.x))
            .min(self.width.saturating_sub(dst_rect.x));
        let h = src_rect
            .height
            .min(dst_rect.height)
            .min(source.height.saturating_sub(src_rect.y))
            .min(self.height.saturating_sub(dst_rect.y));
        if w == 0 || h == 0 {
            return;
        }
        let row_bytes = w as usize * 4;
        for row in 0..h {
            let src = source.offset(src_rect.x, src_rect.y + row);
            let dst = self.offset(dst_rect.x, dst_rect.y + row);
            self.pixels[dst..dst + row_bytes].copy_from_slice(&source.pixels[src..src + row_bytes]);
        }
    }
}

/// The visible surface: receives blits out of an offscreen buffer.
pub trait Presenter {
    fn present(&mut self, source: &PixelBuffer, src_rect: PixelRect, dst_rect: PixelRect);
}

/// A plain buffer can stand in for the visible surface.
impl Presenter for PixelBuffer {
    fn present(&mut self, source: &PixelBuffer, src_rect: PixelRect, dst_rect: PixelRect) {
        self.copy_from(source, src_rect, dst_rect);
    }
}
