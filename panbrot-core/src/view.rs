use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// Horizontal span of the plane covered by the short side of the surface at
/// `zoom = 1`.
pub const UNIT_SPAN: f64 = 4.0;

/// The authoritative view: which point of the plane sits at the center of the
/// surface, how far in we are, and how many iterations each pixel may spend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub center_x: f64,
    pub center_y: f64,
    pub zoom: f64,
    pub max_iter: u32,
}

impl ViewState {
    /// Start-up view: the whole set, slightly right of center.
    pub const DEFAULT: Self = Self {
        center_x: -0.5,
        center_y: 0.0,
        zoom: 1.0,
        max_iter: 600,
    };

    pub fn new(center: Complex, zoom: f64, max_iter: u32) -> crate::Result<Self> {
        if zoom <= 0.0 || !zoom.is_finite() {
            return Err(CoreError::InvalidZoom(zoom));
        }
        if max_iter < 1 {
            return Err(CoreError::InvalidMaxIterations(max_iter));
        }
        Ok(Self {
            center_x: center.re,
            center_y: center.im,
            zoom,
            max_iter,
        })
    }

    #[inline]
    pub fn center(&self) -> Complex {
        Complex::new(self.center_x, self.center_y)
    }

    pub fn with_center(self, center: Complex) -> Self {
        Self {
            center_x: center.re,
            center_y: center.im,
            ..self
        }
    }

    /// Return a copy zoomed about the current center.
    pub fn zoomed(self, factor: f64) -> Self {
        Self {
            zoom: self.zoom * factor,
            ..self
        }
    }

    /// Return a copy with a different iteration budget (floored to 1).
    pub fn with_max_iter(self, max_iter: u32) -> Self {
        Self {
            max_iter: max_iter.max(1),
            ..self
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Plane units per device pixel.
///
/// The short side of the surface spans [`UNIT_SPAN`] / `zoom`. Sides below one
/// pixel are floored to one so a collapsed surface never divides by zero.
#[inline]
pub fn scale_for(zoom: f64, pixel_w: f64, pixel_h: f64) -> f64 {
    UNIT_SPAN / (zoom * pixel_w.min(pixel_h).max(1.0))
}

/// A position on the visible surface in layout units, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Device-pixel size of the visible surface.
///
/// Pointer positions arrive in layout units; the device pixel ratio converts
/// between the two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelSurfaceSize {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f64,
}

impl PixelSurfaceSize {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidSurface {
                reason: format!("dimensions must be > 0, got {width}×{height}"),
            });
        }
        if device_pixel_ratio <= 0.0 || !device_pixel_ratio.is_finite() {
            return Err(CoreError::InvalidSurface {
                reason: format!("device pixel ratio must be positive, got {device_pixel_ratio}"),
            });
        }
        Ok(Self {
            width,
            height,
            device_pixel_ratio,
        })
    }

    /// Snap a layout-size notification to whole device pixels.
    ///
    /// Layout sizes are floored to whole units (at least 1) before the ratio
    /// is applied, so sub-unit layout jitter never produces a new size.
    pub fn from_layout(content_width: f64, content_height: f64, device_pixel_ratio: f64) -> Self {
        let dpr = if device_pixel_ratio > 0.0 && device_pixel_ratio.is_finite() {
            device_pixel_ratio
        } else {
            1.0
        };
        let layout_w = content_width.floor().max(1.0);
        let layout_h = content_height.floor().max(1.0);
        Self {
            width: ((layout_w * dpr).floor() as u32).max(1),
            height: ((layout_h * dpr).floor() as u32).max(1),
            device_pixel_ratio: dpr,
        }
    }

    pub fn layout_width(&self) -> f64 {
        self.width as f64 / self.device_pixel_ratio
    }

    pub fn layout_height(&self) -> f64 {
        self.height as f64 / self.device_pixel_ratio
    }

    /// Center of the surface in layout units.
    pub fn layout_center(&self) -> Point {
        Point::new(self.layout_width() / 2.0, self.layout_height() / 2.0)
    }

    /// Plane units per device pixel at `zoom`.
    #[inline]
    pub fn pixel_scale(&self, zoom: f64) -> f64 {
        scale_for(zoom, self.width as f64, self.height as f64)
    }

    /// Plane units per layout unit at `zoom`.
    #[inline]
    pub fn layout_scale(&self, zoom: f64) -> f64 {
        self.pixel_scale(zoom) * self.device_pixel_ratio
    }
}

/// Map a surface position (layout units) to the plane under `view`.
pub fn screen_to_complex(surface: &PixelSurfaceSize, at: Point, view: &ViewState) -> Complex {
    let scale = surface.layout_scale(view.zoom);
    let mid = surface.layout_center();
    Complex::new(
        (at.x - mid.x) * scale + view.center_x,
        (at.y - mid.y) * scale + view.center_y,
    )
}

/// Place `anchor` under the surface position `at` at the given zoom.
///
/// Every zoom interaction funnels through here; `base` supplies the
/// iteration budget.
pub fn anchor_view(
    surface: &PixelSurfaceSize,
    anchor: Complex,
    at: Point,
    zoom: f64,
    base: &ViewState,
) -> ViewState {
    let scale = surface.layout_scale(zoom);
    let mid = surface.layout_center();
    ViewState {
        center_x: anchor.re - (at.x - mid.x) * scale,
        center_y: anchor.im - (at.y - mid.y) * scale,
        zoom,
        max_iter: base.max_iter,
    }
}

/// Zoom by `factor` keeping the plane point under `at` fixed on screen.
pub fn zoom_at_anchor(
    surface: &PixelSurfaceSize,
    at: Point,
    view: &ViewState,
    factor: f64,
) -> ViewState {
    let anchor = screen_to_complex(surface, at, view);
    anchor_view(surface, anchor, at, view.zoom * factor, view)
}
