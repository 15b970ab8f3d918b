/// Rows computed per cooperative slice.
pub const CHUNK_ROWS: u32 = 32;

/// An axis-aligned rectangle in buffer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// Pixel x of the top-left corner.
    pub x: u32,
    /// Pixel y of the top-left corner.
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of pixels in this rectangle.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersect a signed rectangle with `[0, bound_w) × [0, bound_h)`.
    ///
    /// Returns `None` when nothing of it lies inside the bounds.
    pub fn clamped(
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        bound_w: u32,
        bound_h: u32,
    ) -> Option<Self> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width.max(0)).min(bound_w as i64);
        let y1 = (y + height.max(0)).min(bound_h as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self::new(
            x0 as u32,
            y0 as u32,
            (x1 - x0) as u32,
            (y1 - y0) as u32,
        ))
    }

    /// Move by `(dx, dy)` and clip to the bounds.
    pub fn translated(&self, dx: i32, dy: i32, bound_w: u32, bound_h: u32) -> Option<Self> {
        Self::clamped(
            self.x as i64 + dx as i64,
            self.y as i64 + dy as i64,
            self.width as i64,
            self.height as i64,
            bound_w,
            bound_h,
        )
    }

    /// Split off up to `rows` rows from the top, shrinking `self`.
    pub fn take_rows(&mut self, rows: u32) -> Option<Self> {
        if self.is_empty() {
            return None;
        }
        let h = rows.max(1).min(self.height);
        let slice = Self::new(self.x, self.y, self.width, h);
        self.y += h;
        self.height -= h;
        Some(slice)
    }
}
