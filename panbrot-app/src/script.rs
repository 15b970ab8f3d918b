//! Scripted input sessions.
//!
//! A script is a JSON array of steps replayed in order against an
//! [`Explorer`], with this host standing in for the windowing system: it
//! forwards input, and it calls `frame` where a display refresh would.
//!
//! ```json
//! [
//!   { "step": "resize", "width": 800, "height": 600 },
//!   { "step": "down", "id": 1, "x": 400, "y": 300 },
//!   { "step": "up", "id": 1, "x": 400, "y": 300, "at_ms": 90 },
//!   { "step": "settle" }
//! ]
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use panbrot_core::{Button, DeviceKind, Modifiers, Point, PointerEvent};
use panbrot_render::{Explorer, FrameStatus, PixelBuffer};

fn one() -> f64 {
    1.0
}

/// A pointer sample. `at_ms` is measured from the start of the replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerStep {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub kind: DeviceKind,
    #[serde(default)]
    pub button: Button,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub at_ms: u64,
}

impl PointerStep {
    fn event(&self, base: Instant) -> PointerEvent {
        PointerEvent::new(
            self.id,
            Point::new(self.x, self.y),
            self.kind,
            base + Duration::from_millis(self.at_ms),
        )
        .with_button(self.button)
        .with_modifiers(self.modifiers)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Layout-size notification.
    Resize {
        width: f64,
        height: f64,
        #[serde(default = "one")]
        dpr: f64,
    },
    Down(PointerStep),
    Move(PointerStep),
    Up(PointerStep),
    Cancel(PointerStep),
    ContextMenu { x: f64, y: f64 },
    ZoomIn,
    ZoomOut,
    Reset,
    /// Set the budget outright, or move it by slider steps.
    Iterations {
        #[serde(default)]
        value: Option<u32>,
        #[serde(default)]
        steps: i32,
    },
    /// Run up to `count` frames, stopping early when idle.
    Frames { count: u32 },
    /// Run frames until no render work is left.
    Settle,
}

/// Parse a script from JSON text.
pub fn parse(json: &str) -> Result<Vec<ScriptStep>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Drives an [`Explorer`] the way a host event loop would.
pub struct Replay {
    explorer: Explorer,
    visible: PixelBuffer,
    base: Instant,
    frames: usize,
}

impl Replay {
    pub fn new(explorer: Explorer) -> Self {
        let visible = visible_for(&explorer);
        Self {
            explorer,
            visible,
            base: Instant::now(),
            frames: 0,
        }
    }

    pub fn explorer(&self) -> &Explorer {
        &self.explorer
    }

    pub fn visible(&self) -> &PixelBuffer {
        &self.visible
    }

    /// Frames run so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn resize(&mut self, width: f64, height: f64, dpr: f64) {
        if self.explorer.resize(width, height, dpr) {
            self.visible = visible_for(&self.explorer);
        }
    }

    pub fn run(&mut self, steps: &[ScriptStep]) {
        for step in steps {
            self.apply(step);
        }
    }

    pub fn apply(&mut self, step: &ScriptStep) {
        trace!(?step, "Replaying step");
        match step {
            ScriptStep::Resize { width, height, dpr } => self.resize(*width, *height, *dpr),
            ScriptStep::Down(p) => self.explorer.pointer_down(&p.event(self.base)),
            ScriptStep::Move(p) => self.explorer.pointer_move(&p.event(self.base)),
            ScriptStep::Up(p) => self.explorer.pointer_up(&p.event(self.base)),
            ScriptStep::Cancel(p) => self.explorer.pointer_cancel(&p.event(self.base)),
            ScriptStep::ContextMenu { x, y } => self.explorer.context_menu(Point::new(*x, *y)),
            ScriptStep::ZoomIn => self.explorer.zoom_in(),
            ScriptStep::ZoomOut => self.explorer.zoom_out(),
            ScriptStep::Reset => self.explorer.reset_view(),
            ScriptStep::Iterations { value, steps } => {
                if let Some(value) = value {
                    self.explorer.set_max_iter(*value);
                }
                if *steps != 0 {
                    self.explorer.step_iterations(*steps);
                }
            }
            ScriptStep::Frames { count } => {
                for _ in 0..*count {
                    if self.frame() == FrameStatus::Idle {
                        break;
                    }
                }
            }
            ScriptStep::Settle => self.settle(),
        }
    }

    pub fn frame(&mut self) -> FrameStatus {
        self.frames += 1;
        self.explorer.frame(&mut self.visible)
    }

    pub fn settle(&mut self) {
        let frames = self.explorer.settle(&mut self.visible);
        self.frames += frames;
        debug!(frames, "Settled");
    }
}

fn visible_for(explorer: &Explorer) -> PixelBuffer {
    match explorer.surface() {
        Some(s) => PixelBuffer::new(s.width, s.height),
        None => PixelBuffer::new(1, 1),
    }
}
