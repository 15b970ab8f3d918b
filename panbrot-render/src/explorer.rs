//! Top-level controller: owns the view, the gesture machine, the pan cache
//! and the in-flight render job.
//!
//! The host feeds it input and resize notifications and calls
//! [`Explorer::frame`] once per display refresh. Each frame reconciles any
//! pending change against the cache, runs at most one render slice and
//! presents the visible part of the cache.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use panbrot_core::{
    GestureConfig, GestureMachine, PixelSurfaceSize, Point, PointerEvent, ViewState,
};

use crate::buffer::{PixelBuffer, Presenter};
use crate::pan_cache::{viewport_target, CacheConfig, CacheUpdate, PanCache};
use crate::rect::PixelRect;
use crate::renderer::{RenderGeneration, RenderJob, SliceOutcome};

/// Controller settings: gesture thresholds, cache tuning and the button and
/// slider behavior a host UI exposes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub gestures: GestureConfig,
    pub cache: CacheConfig,
    /// Zoom factor of the zoom-in / zoom-out buttons.
    pub button_zoom_factor: f64,
    pub min_iterations: u32,
    pub max_iterations: u32,
    /// Slider granularity for [`Explorer::step_iterations`].
    pub iteration_step: u32,
    pub default_view: ViewState,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            gestures: GestureConfig::default(),
            cache: CacheConfig::default(),
            button_zoom_factor: 1.6,
            min_iterations: 100,
            max_iterations: 2000,
            iteration_step: 50,
            default_view: ViewState::DEFAULT,
        }
    }
}

/// Whether the host should schedule another frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Nothing left to compute until the next input.
    Idle,
    /// Render slices are still queued.
    Busy,
}

pub struct Explorer {
    config: ExplorerConfig,
    view: ViewState,
    surface: Option<PixelSurfaceSize>,
    gestures: GestureMachine,
    cache: PanCache,
    generation: RenderGeneration,
    job: Option<RenderJob>,
    /// View or surface changed since the last reconciliation.
    dirty: bool,
}

impl Explorer {
    pub fn new(config: ExplorerConfig) -> Self {
        let view = config.default_view;
        Self {
            gestures: GestureMachine::new(config.gestures),
            cache: PanCache::new(config.cache),
            config,
            view,
            surface: None,
            generation: RenderGeneration::new(),
            job: None,
            dirty: true,
        }
    }

    // -- accessors --

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn surface(&self) -> Option<&PixelSurfaceSize> {
        self.surface.as_ref()
    }

    pub fn gestures(&self) -> &GestureMachine {
        &self.gestures
    }

    pub fn cache(&self) -> &PanCache {
        &self.cache
    }

    /// `true` while a pan or pinch is in progress.
    pub fn is_dragging(&self) -> bool {
        self.gestures.is_dragging()
    }

    /// `true` while render slices are queued.
    pub fn is_rendering(&self) -> bool {
        self.job.as_ref().is_some_and(|job| !job.is_finished())
    }

    /// Pixels done and total for the newest render.
    pub fn progress(&self) -> (usize, usize) {
        self.generation.progress()
    }

    /// One-line summary of the view for a heads-up display.
    pub fn status_line(&self) -> String {
        let mut line = format!(
            "center {:.10} | zoom {:.4}x | iterations {}",
            self.view.center(),
            self.view.zoom,
            self.view.max_iter
        );
        if self.is_rendering() {
            let (done, total) = self.progress();
            let pct = if total == 0 {
                100.0
            } else {
                done as f64 * 100.0 / total as f64
            };
            line.push_str(&format!(" | rendering {pct:.0}%"));
        }
        line
    }

    // -- surface --

    /// Apply a layout-size notification.
    ///
    /// The size is snapped to whole device pixels first, so jitter below one
    /// pixel is ignored. Returns `true` when the surface actually changed.
    pub fn resize(&mut self, content_width: f64, content_height: f64, device_pixel_ratio: f64) -> bool {
        let next = PixelSurfaceSize::from_layout(content_width, content_height, device_pixel_ratio);
        if self.surface == Some(next) {
            return false;
        }
        debug!(
            width = next.width,
            height = next.height,
            dpr = next.device_pixel_ratio,
            "Surface resized"
        );
        self.surface = Some(next);
        self.dirty = true;
        true
    }

    // -- input --

    pub fn pointer_down(&mut self, event: &PointerEvent) {
        let Some(surface) = self.surface else { return };
        let next = self.gestures.pointer_down(event, &surface, &self.view);
        self.apply(next);
    }

    pub fn pointer_move(&mut self, event: &PointerEvent) {
        let Some(surface) = self.surface else { return };
        let next = self.gestures.pointer_move(event, &surface, &self.view);
        self.apply(next);
    }

    pub fn pointer_up(&mut self, event: &PointerEvent) {
        let Some(surface) = self.surface else { return };
        let next = self.gestures.pointer_up(event, &surface, &self.view);
        self.apply(next);
    }

    pub fn pointer_cancel(&mut self, event: &PointerEvent) {
        let Some(surface) = self.surface else { return };
        let next = self.gestures.pointer_cancel(event, &surface, &self.view);
        self.apply(next);
    }

    /// Secondary-button activation: zoom out around `at`.
    pub fn context_menu(&mut self, at: Point) {
        let Some(surface) = self.surface else { return };
        let next = self.gestures.secondary_action(at, &surface, &self.view);
        self.apply(Some(next));
    }

    // -- buttons and slider --

    pub fn zoom_in(&mut self) {
        self.apply(Some(self.view.zoomed(self.config.button_zoom_factor)));
    }

    pub fn zoom_out(&mut self) {
        self.apply(Some(self.view.zoomed(1.0 / self.config.button_zoom_factor)));
    }

    pub fn reset_view(&mut self) {
        self.apply(Some(self.config.default_view));
    }

    /// Set the iteration budget. Any positive value is accepted.
    pub fn set_max_iter(&mut self, max_iter: u32) {
        self.apply(Some(self.view.with_max_iter(max_iter)));
    }

    /// Move the budget by whole slider steps, clamped to the slider range.
    pub fn step_iterations(&mut self, steps: i32) {
        let step = i64::from(self.config.iteration_step) * i64::from(steps);
        let lo = i64::from(self.config.min_iterations.max(1));
        let hi = i64::from(self.config.max_iterations).max(lo);
        let next = (i64::from(self.view.max_iter) + step).clamp(lo, hi);
        self.set_max_iter(next as u32);
    }

    /// Replace the view wholesale. Views with a non-finite center or a
    /// non-positive zoom are ignored.
    pub fn set_view(&mut self, view: ViewState) {
        let valid = view.zoom > 0.0
            && view.zoom.is_finite()
            && view.center_x.is_finite()
            && view.center_y.is_finite();
        if !valid {
            debug!(?view, "Ignoring invalid view");
            return;
        }
        self.apply(Some(view.with_max_iter(view.max_iter)));
    }

    /// Stop all rendering. The cache is dropped since its content may be
    /// incomplete; the next view or size change renders from scratch.
    ///
    /// A change made before the cancel and not yet reconciled is kept, so
    /// the next frame still renders it.
    pub fn cancel_render(&mut self) {
        self.generation.advance();
        if self.job.take().is_some() {
            info!("Render cancelled");
        }
        self.cache.invalidate();
    }

    fn apply(&mut self, next: Option<ViewState>) {
        if let Some(next) = next {
            if next != self.view {
                self.view = next;
                self.dirty = true;
            }
        }
    }

    // -- frame loop --

    /// Run one display refresh worth of work against `presenter`.
    pub fn frame<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> FrameStatus {
        let Some(surface) = self.surface else {
            return FrameStatus::Idle;
        };

        if self.dirty {
            self.dirty = false;
            self.reconcile(&surface);
            self.cache.present(&surface, presenter);
        }

        let Some(job) = self.job.as_mut() else {
            return FrameStatus::Idle;
        };
        let (Some(src), Some(buffer)) = (self.cache.viewport_rect(&surface), self.cache.buffer_mut())
        else {
            self.job = None;
            return FrameStatus::Idle;
        };
        let dst = viewport_target(&surface);

        match job.step(buffer, &self.generation, |cache| presenter.present(cache, src, dst)) {
            SliceOutcome::Continue => FrameStatus::Busy,
            SliceOutcome::Finished | SliceOutcome::Superseded => {
                self.job = None;
                FrameStatus::Idle
            }
        }
    }

    /// Drive [`frame`](Self::frame) until no work is left.
    pub fn settle<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> usize {
        let mut frames = 1;
        while self.frame(presenter) == FrameStatus::Busy {
            frames += 1;
        }
        frames
    }

    /// Copy of the currently visible pixels.
    pub fn snapshot(&self) -> Option<PixelBuffer> {
        let surface = self.surface?;
        let mut visible = PixelBuffer::new(surface.width, surface.height);
        self.cache.present(&surface, &mut visible).then_some(visible)
    }

    fn reconcile(&mut self, surface: &PixelSurfaceSize) {
        if self.cache.ensure(surface, &self.view) {
            self.start_full_render(surface);
            return;
        }

        match self.cache.reconcile_pan(surface, &self.view) {
            Some(CacheUpdate::Refill) => self.start_full_render(surface),
            Some(CacheUpdate::Patch { dx, dy, rects }) => {
                // Work the superseded job had not reached moves with the
                // content, after the freshly exposed strips.
                let carried: Vec<PixelRect> = match (&self.job, self.cache.state()) {
                    (Some(job), Some(state)) => job
                        .remaining()
                        .filter_map(|r| r.translated(dx, dy, state.width, state.height))
                        .collect(),
                    _ => Vec::new(),
                };
                if !carried.is_empty() {
                    debug!(rects = carried.len(), "Carrying unfinished work across pan");
                }
                self.start_render(surface, rects.into_iter().chain(carried));
            }
            Some(CacheUpdate::Unchanged) | None => {}
        }
    }

    fn start_full_render(&mut self, surface: &PixelSurfaceSize) {
        let full = self.cache.full_rect();
        self.start_render(surface, full);
    }

    fn start_render(&mut self, surface: &PixelSurfaceSize, rects: impl IntoIterator<Item = PixelRect>) {
        let Some(mapping) = self.cache.mapping(surface) else {
            return;
        };
        self.job = Some(RenderJob::start(
            &self.generation,
            rects,
            mapping,
            self.view.max_iter,
            self.config.cache.chunk_rows,
        ));
    }
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new(ExplorerConfig::default())
    }
}
