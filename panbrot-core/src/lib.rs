pub mod complex;
pub mod error;
pub mod escape;
pub mod gesture;
pub mod view;

// Re-export primary types for convenience.
pub use complex::Complex;
pub use error::CoreError;
pub use escape::{escape_time, Escape, ESCAPE_RADIUS_SQ};
pub use gesture::{
    Button, DeviceKind, GestureConfig, GestureMachine, GestureMode, Modifiers, PointerEvent,
    PointerId,
};
pub use view::{
    anchor_view, scale_for, screen_to_complex, zoom_at_anchor, PixelSurfaceSize, Point, ViewState,
};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
