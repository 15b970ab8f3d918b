//! Pointer gesture recognition.
//!
//! Raw pointer events go in, new [`ViewState`]s come out. The machine never
//! touches pixels; it only needs the surface geometry to convert screen
//! distances into plane distances.
//!
//! ```text
//! Idle ──1 pointer──▶ Panning ──last up──▶ Idle
//!   └────2 pointers──▶ Pinching ──1 left──▶ Panning
//!                          └─────0 left──▶ Idle
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::complex::Complex;
use crate::view::{
    anchor_view, screen_to_complex, zoom_at_anchor, PixelSurfaceSize, Point, ViewState,
};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    #[default]
    Mouse,
    Touch,
    Pen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    #[default]
    Primary,
    Secondary,
    Middle,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

/// One pointer-down / move / up / cancel notification.
///
/// `position` is in layout units relative to the surface's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub id: PointerId,
    pub position: Point,
    pub kind: DeviceKind,
    pub button: Button,
    pub modifiers: Modifiers,
    pub time: Instant,
}

impl PointerEvent {
    /// A primary-button event with no modifiers held.
    pub fn new(id: u32, position: Point, kind: DeviceKind, time: Instant) -> Self {
        Self {
            id: PointerId(id),
            position,
            kind,
            button: Button::Primary,
            modifiers: Modifiers::default(),
            time,
        }
    }

    pub fn with_button(self, button: Button) -> Self {
        Self { button, ..self }
    }

    pub fn with_modifiers(self, modifiers: Modifiers) -> Self {
        Self { modifiers, ..self }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds that separate taps from drags and pinches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Layout units a single pointer may wander before a press becomes a pan.
    pub pan_dead_zone: f64,
    /// Layout units of spread or midpoint travel that make a pinch "moved".
    pub pinch_move_threshold: f64,
    /// A still two-finger touch shorter than this is a zoom-out tap.
    pub two_finger_tap_ms: u64,
    /// Zoom factor applied by taps (inverse for zoom-out taps).
    pub tap_zoom_factor: f64,
    /// Lower bound on zoom while pinching.
    pub min_pinch_zoom: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pan_dead_zone: 3.0,
            pinch_move_threshold: 8.0,
            two_finger_tap_ms: 280,
            tap_zoom_factor: 1.8,
            min_pinch_zoom: 0.05,
        }
    }
}

impl GestureConfig {
    fn two_finger_tap_window(&self) -> Duration {
        Duration::from_millis(self.two_finger_tap_ms)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureMode {
    Idle,
    Panning,
    Pinching,
}

/// Single-pointer pan bookkeeping.
#[derive(Debug, Clone, Copy, Default)]
struct DragState {
    active: bool,
    pointer: Option<PointerId>,
    moved: bool,
    start: Point,
    start_center: Complex,
    start_zoom: f64,
}

/// Two-pointer pinch bookkeeping, sampled once when the second finger lands.
#[derive(Debug, Clone, Copy)]
struct PinchState {
    start_distance: f64,
    start_mid: Point,
    start_view: ViewState,
    anchor: Complex,
    started_at: Option<Instant>,
    moved: bool,
}

impl Default for PinchState {
    fn default() -> Self {
        Self {
            start_distance: 1.0,
            start_mid: Point::default(),
            start_view: ViewState::DEFAULT,
            anchor: Complex::ZERO,
            started_at: None,
            moved: false,
        }
    }
}

/// Turns pointer events into view updates.
///
/// Every handler receives the current view and returns `Some(next)` when the
/// gesture changes it. The caller owns the view and applies the update.
#[derive(Debug, Clone)]
pub struct GestureMachine {
    config: GestureConfig,
    /// Tracked pointers in press order; the first two drive a pinch.
    pointers: Vec<(PointerId, Point)>,
    mode: GestureMode,
    drag: DragState,
    pinch: PinchState,
}

impl Default for GestureMachine {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureMachine {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            pointers: Vec::with_capacity(2),
            mode: GestureMode::Idle,
            drag: DragState::default(),
            pinch: PinchState::default(),
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    /// `true` while a pan or pinch holds the surface (for cursor styling).
    pub fn is_dragging(&self) -> bool {
        self.mode != GestureMode::Idle
    }

    pub fn pointer_down(
        &mut self,
        event: &PointerEvent,
        surface: &PixelSurfaceSize,
        view: &ViewState,
    ) -> Option<ViewState> {
        if event.kind == DeviceKind::Mouse && event.button != Button::Primary {
            trace!(button = ?event.button, "Ignoring non-primary mouse press");
            return None;
        }

        self.track(event.id, event.position);

        match self.pointers.len() {
            2 => self.begin_pinch(surface, view, event.time),
            1 => {
                self.mode = GestureMode::Panning;
                self.drag = DragState {
                    active: true,
                    pointer: Some(event.id),
                    moved: false,
                    start: event.position,
                    start_center: view.center(),
                    start_zoom: view.zoom,
                };
                debug!(pointer = event.id.0, "Pan started");
            }
            n => trace!(pointers = n, "Extra pointer tracked"),
        }
        None
    }

    pub fn pointer_move(
        &mut self,
        event: &PointerEvent,
        surface: &PixelSurfaceSize,
        view: &ViewState,
    ) -> Option<ViewState> {
        if !self.track_existing(event.id, event.position) {
            return None;
        }

        match self.mode {
            GestureMode::Pinching if self.pointers.len() >= 2 => Some(self.pinch_to(surface, view)),
            GestureMode::Panning => self.pan_to(event, surface, view),
            _ => None,
        }
    }

    pub fn pointer_up(
        &mut self,
        event: &PointerEvent,
        surface: &PixelSurfaceSize,
        view: &ViewState,
    ) -> Option<ViewState> {
        // A pointer may lift without ever having moved; its last position
        // must still be the release point.
        self.track_existing(event.id, event.position);

        let was_pinch = self.mode == GestureMode::Pinching;
        let was_two_fingers = self.pointers.len() == 2;
        let pair = self.first_pair();
        let pinch_moved = self.pinch.moved;
        let pinch_elapsed = self
            .pinch
            .started_at
            .map(|t| event.time.saturating_duration_since(t));

        self.pointers.retain(|(id, _)| *id != event.id);

        let mut update = None;

        if was_pinch && was_two_fingers && !pinch_moved {
            if let (Some((a, b)), Some(elapsed)) = (pair, pinch_elapsed) {
                if elapsed < self.config.two_finger_tap_window() {
                    let mid = a.midpoint(b);
                    debug!(x = mid.x, y = mid.y, ?elapsed, "Two-finger tap");
                    update = Some(zoom_at_anchor(
                        surface,
                        mid,
                        view,
                        1.0 / self.config.tap_zoom_factor,
                    ));
                }
            }
        }

        if was_pinch {
            if self.pointers.len() >= 2 {
                if self.first_pair() != pair {
                    self.rebase_pinch(surface, update.as_ref().unwrap_or(view));
                }
                return update;
            }
            self.end_pinch(update.as_ref().unwrap_or(view));
            return update;
        }

        if !self.drag.active || self.drag.pointer != Some(event.id) {
            if self.pointers.is_empty() {
                self.mode = GestureMode::Idle;
            }
            return None;
        }

        let did_drag = self.drag.moved;
        self.drag = DragState::default();
        self.mode = if self.pointers.is_empty() {
            GestureMode::Idle
        } else {
            GestureMode::Panning
        };

        if did_drag {
            debug!(pointer = event.id.0, "Pan finished");
            return None;
        }

        let factor = if event.kind == DeviceKind::Mouse && event.modifiers.shift {
            1.0 / self.config.tap_zoom_factor
        } else {
            self.config.tap_zoom_factor
        };
        debug!(
            x = event.position.x,
            y = event.position.y,
            factor,
            "Tap zoom"
        );
        Some(zoom_at_anchor(surface, event.position, view, factor))
    }

    /// Cancellation ends a pointer exactly like a release.
    pub fn pointer_cancel(
        &mut self,
        event: &PointerEvent,
        surface: &PixelSurfaceSize,
        view: &ViewState,
    ) -> Option<ViewState> {
        self.pointer_up(event, surface, view)
    }

    /// Secondary-button / context-menu activation: zoom out around `at`.
    pub fn secondary_action(
        &self,
        at: Point,
        surface: &PixelSurfaceSize,
        view: &ViewState,
    ) -> ViewState {
        zoom_at_anchor(surface, at, view, 1.0 / self.config.tap_zoom_factor)
    }

    // -- internals --

    fn track(&mut self, id: PointerId, at: Point) {
        if !self.track_existing(id, at) {
            self.pointers.push((id, at));
        }
    }

    fn track_existing(&mut self, id: PointerId, at: Point) -> bool {
        match self.pointers.iter_mut().find(|(p, _)| *p == id) {
            Some(entry) => {
                entry.1 = at;
                true
            }
            None => false,
        }
    }

    fn first_pair(&self) -> Option<(Point, Point)> {
        match self.pointers.as_slice() {
            [(_, a), (_, b), ..] => Some((*a, *b)),
            _ => None,
        }
    }

    /// Spread and midpoint of the first two pointers; zero spread is floored to 1.
    fn pair_metrics(&self) -> Option<(f64, Point)> {
        self.first_pair()
            .map(|(a, b)| (a.distance(b).max(1.0), a.midpoint(b)))
    }

    fn begin_pinch(&mut self, surface: &PixelSurfaceSize, view: &ViewState, now: Instant) {
        let Some((distance, mid)) = self.pair_metrics() else {
            return;
        };
        self.mode = GestureMode::Pinching;
        self.pinch = PinchState {
            start_distance: distance,
            start_mid: mid,
            start_view: *view,
            anchor: screen_to_complex(surface, mid, view),
            started_at: Some(now),
            moved: false,
        };
        self.drag.active = false;
        debug!(distance, x = mid.x, y = mid.y, "Pinch started");
    }

    /// Resample the pinch from a new leading pair without moving the view.
    /// The gesture already had more than two fingers, so it can no longer
    /// end as a tap.
    fn rebase_pinch(&mut self, surface: &PixelSurfaceSize, view: &ViewState) {
        let Some((distance, mid)) = self.pair_metrics() else {
            return;
        };
        self.pinch = PinchState {
            start_distance: distance,
            start_mid: mid,
            start_view: *view,
            anchor: screen_to_complex(surface, mid, view),
            started_at: self.pinch.started_at,
            moved: true,
        };
        debug!(distance, x = mid.x, y = mid.y, "Pinch pair changed");
    }

    fn pinch_to(&mut self, surface: &PixelSurfaceSize, view: &ViewState) -> ViewState {
        let Some((distance, mid)) = self.pair_metrics() else {
            return *view;
        };

        let threshold = self.config.pinch_move_threshold;
        if (distance - self.pinch.start_distance).abs() > threshold
            || mid.distance(self.pinch.start_mid) > threshold
        {
            self.pinch.moved = true;
        }

        let ratio = distance / self.pinch.start_distance.max(1.0);
        let zoom = (self.pinch.start_view.zoom * ratio).max(self.config.min_pinch_zoom);
        trace!(zoom, x = mid.x, y = mid.y, "Pinch update");

        // The anchor sampled at pinch start stays under the live midpoint.
        anchor_view(surface, self.pinch.anchor, mid, zoom, view)
    }

    fn pan_to(
        &mut self,
        event: &PointerEvent,
        surface: &PixelSurfaceSize,
        view: &ViewState,
    ) -> Option<ViewState> {
        let drag = &mut self.drag;
        if !drag.active || drag.pointer != Some(event.id) {
            return None;
        }

        let dx = event.position.x - drag.start.x;
        let dy = event.position.y - drag.start.y;
        if !drag.moved && dx.hypot(dy) > self.config.pan_dead_zone {
            drag.moved = true;
        }
        if !drag.moved {
            return None;
        }

        let scale = surface.layout_scale(drag.start_zoom);
        Some(view.with_center(Complex::new(
            drag.start_center.re - dx * scale,
            drag.start_center.im - dy * scale,
        )))
    }

    /// Leave a pinch once fewer than two pointers remain.
    ///
    /// A surviving finger keeps panning from where it is, but lifting it is
    /// not a tap.
    fn end_pinch(&mut self, view: &ViewState) {
        match self.pointers.first() {
            Some(&(id, at)) => {
                self.mode = GestureMode::Panning;
                self.drag = DragState {
                    active: true,
                    pointer: Some(id),
                    moved: true,
                    start: at,
                    start_center: view.center(),
                    start_zoom: view.zoom,
                };
                debug!(pointer = id.0, "Pinch ended, panning with remaining pointer");
            }
            None => {
                self.mode = GestureMode::Idle;
                self.drag = DragState::default();
                debug!("Pinch ended");
            }
        }
        self.pinch.started_at = None;
    }
}
