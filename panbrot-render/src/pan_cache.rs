//! Oversized pixel cache that serves pans by shifting and patching.
//!
//! The cache holds a rendering `cache_factor` times the viewport in each
//! axis, centered on a stamped plane point. A pure pan translates the
//! buffer in place and only the strips uncovered by the translation are
//! recomputed. Any change to size, pixel ratio, zoom or iteration budget
//! throws the buffer away.

use serde::{Deserialize, Serialize};
use tracing::debug;

use panbrot_core::{Complex, PixelSurfaceSize, ViewState};

use crate::buffer::{PixelBuffer, Presenter};
use crate::rect::{PixelRect, CHUNK_ROWS};
use crate::renderer::PlaneMapping;

/// Tuning constants for the pan cache.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache size as a multiple of the viewport, per axis.
    pub cache_factor: u32,
    /// A pan moving more than this fraction of the cache in either axis
    /// refills the whole cache instead of patching.
    pub large_pan_fraction: f64,
    /// Rows computed per render slice.
    pub chunk_rows: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_factor: 2,
            large_pan_fraction: 0.45,
            chunk_rows: CHUNK_ROWS,
        }
    }
}

/// The buffer plus the parameters it was rendered for.
#[derive(Debug)]
pub struct CacheState {
    pub buffer: PixelBuffer,
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f64,
    pub zoom: f64,
    pub max_iter: u32,
    pub center_x: f64,
    pub center_y: f64,
}

impl CacheState {
    pub fn center(&self) -> Complex {
        Complex::new(self.center_x, self.center_y)
    }
}

/// What a pan did to the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheUpdate {
    /// The pan rounds to no whole pixel; the cache is served as is.
    Unchanged,
    /// The pan was too large to patch. The center was restamped and the
    /// whole buffer needs recomputing.
    Refill,
    /// The buffer was shifted by `(dx, dy)`; `rects` are the exposed strips,
    /// already clipped and non-empty.
    Patch { dx: i32, dy: i32, rects: Vec<PixelRect> },
}

#[derive(Debug, Default)]
pub struct PanCache {
    config: CacheConfig,
    state: Option<CacheState>,
}

impl PanCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn state(&self) -> Option<&CacheState> {
        self.state.as_ref()
    }

    pub fn buffer(&self) -> Option<&PixelBuffer> {
        self.state.as_ref().map(|s| &s.buffer)
    }

    pub fn buffer_mut(&mut self) -> Option<&mut PixelBuffer> {
        self.state.as_mut().map(|s| &mut s.buffer)
    }

    /// Drop the buffer; the next [`ensure`](Self::ensure) always resets.
    pub fn invalidate(&mut self) {
        if self.state.take().is_some() {
            debug!("Pan cache invalidated");
        }
    }

    /// Cache dimensions required for a viewport.
    pub fn required_size(&self, surface: &PixelSurfaceSize) -> (u32, u32) {
        let factor = self.config.cache_factor.max(1);
        (
            surface.width.saturating_mul(factor),
            surface.height.saturating_mul(factor),
        )
    }

    /// Make sure the cache matches `surface` and the zoom and budget of `view`.
    ///
    /// Returns `true` when a fresh buffer was allocated; the caller must then
    /// render the whole of it. A matching cache is left untouched, whatever
    /// its center.
    pub fn ensure(&mut self, surface: &PixelSurfaceSize, view: &ViewState) -> bool {
        let (width, height) = self.required_size(surface);

        if let Some(state) = &self.state {
            let compatible = state.width == width
                && state.height == height
                && state.device_pixel_ratio == surface.device_pixel_ratio
                && state.zoom == view.zoom
                && state.max_iter == view.max_iter;
            if compatible {
                return false;
            }
        }

        debug!(
            width,
            height,
            dpr = surface.device_pixel_ratio,
            zoom = view.zoom,
            max_iter = view.max_iter,
            "Pan cache reset"
        );
        self.state = Some(CacheState {
            buffer: PixelBuffer::new(width, height),
            width,
            height,
            device_pixel_ratio: surface.device_pixel_ratio,
            zoom: view.zoom,
            max_iter: view.max_iter,
            center_x: view.center_x,
            center_y: view.center_y,
        });
        true
    }

    /// Bring the cache to `next`'s center when only the center moved.
    ///
    /// Returns `None` when there is no cache or its zoom or budget differ
    /// from `next`; [`ensure`](Self::ensure) handles those cases.
    pub fn reconcile_pan(
        &mut self,
        surface: &PixelSurfaceSize,
        next: &ViewState,
    ) -> Option<CacheUpdate> {
        let fraction = self.config.large_pan_fraction;
        let state = self.state.as_mut()?;
        if state.zoom != next.zoom || state.max_iter != next.max_iter {
            return None;
        }

        let scale = surface.pixel_scale(next.zoom);
        let dx = round_half_up((state.center_x - next.center_x) / scale);
        let dy = round_half_up((state.center_y - next.center_y) / scale);

        let too_large = !dx.is_finite()
            || !dy.is_finite()
            || dx.abs() > state.width as f64 * fraction
            || dy.abs() > state.height as f64 * fraction;
        if too_large {
            debug!(dx, dy, "Pan too large to patch, refilling cache");
            state.center_x = next.center_x;
            state.center_y = next.center_y;
            return Some(CacheUpdate::Refill);
        }

        if dx == 0.0 && dy == 0.0 {
            return Some(CacheUpdate::Unchanged);
        }

        // Both are bounded by the cache size here.
        let (dx, dy) = (dx as i32, dy as i32);
        state.buffer.shift(dx, dy);
        state.center_x = next.center_x;
        state.center_y = next.center_y;

        let rects = exposed_strips(dx, dy, state.width, state.height);
        debug!(dx, dy, strips = rects.len(), "Pan cache shifted");
        Some(CacheUpdate::Patch { dx, dy, rects })
    }

    /// Pixel-to-plane mapping for the current buffer.
    pub fn mapping(&self, surface: &PixelSurfaceSize) -> Option<PlaneMapping> {
        let state = self.state.as_ref()?;
        Some(PlaneMapping::new(
            state.center(),
            surface.pixel_scale(state.zoom),
            state.width,
            state.height,
        ))
    }

    pub fn full_rect(&self) -> Option<PixelRect> {
        self.state.as_ref().map(|s| s.buffer.bounds())
    }

    /// The centered sub-rectangle of the cache that the viewport shows.
    pub fn viewport_rect(&self, surface: &PixelSurfaceSize) -> Option<PixelRect> {
        let state = self.state.as_ref()?;
        Some(PixelRect::new(
            state.width.saturating_sub(surface.width) / 2,
            state.height.saturating_sub(surface.height) / 2,
            surface.width.min(state.width),
            surface.height.min(state.height),
        ))
    }

    /// Blit the visible part of the cache onto `presenter`.
    ///
    /// Returns `false` when there is nothing to show yet.
    pub fn present<P: Presenter + ?Sized>(
        &self,
        surface: &PixelSurfaceSize,
        presenter: &mut P,
    ) -> bool {
        let (Some(state), Some(src)) = (self.state.as_ref(), self.viewport_rect(surface)) else {
            return false;
        };
        presenter.present(&state.buffer, src, viewport_target(surface));
        true
    }
}

/// Destination rectangle covering the whole visible surface.
pub fn viewport_target(surface: &PixelSurfaceSize) -> PixelRect {
    PixelRect::new(0, 0, surface.width, surface.height)
}

/// Strips left uncovered after shifting a `width × height` buffer by `(dx, dy)`.
///
/// A vertical strip on the side the content moved away from, then a
/// horizontal one; empty strips are dropped.
pub fn exposed_strips(dx: i32, dy: i32, width: u32, height: u32) -> Vec<PixelRect> {
    let (w, h) = (width as i64, height as i64);
    let (dx, dy) = (dx as i64, dy as i64);
    let mut strips = Vec::with_capacity(2);

    if dx > 0 {
        strips.extend(PixelRect::clamped(0, 0, dx, h, width, height));
    } else if dx < 0 {
        strips.extend(PixelRect::clamped(w + dx, 0, -dx, h, width, height));
    }

    if dy > 0 {
        strips.extend(PixelRect::clamped(0, 0, w, dy, width, height));
    } else if dy < 0 {
        strips.extend(PixelRect::clamped(0, h + dy, w, -dy, width, height));
    }

    strips
}

/// Round to nearest with halves going up, as pixel snapping does on screen.
#[inline]
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}
