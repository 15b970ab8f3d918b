pub mod buffer;
pub mod color;
pub mod error;
pub mod explorer;
pub mod export;
pub mod pan_cache;
pub mod rect;
pub mod renderer;

pub use buffer::{PixelBuffer, Presenter};
pub use color::{colorize, colorize_rgba, hsl_to_rgb, smooth_iteration, INTERIOR_COLOR};
pub use error::RenderError;
pub use explorer::{Explorer, ExplorerConfig, FrameStatus};
pub use export::{encode_png, export_png, SnapshotMetadata};
pub use pan_cache::{CacheConfig, CacheState, CacheUpdate, PanCache};
pub use rect::{PixelRect, CHUNK_ROWS};
pub use renderer::{compute_rect, PlaneMapping, RenderGeneration, RenderJob, SliceOutcome};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
