use thiserror::Error;

/// Errors raised when constructing core view types from untrusted input.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid max iterations: {0} (must be >= 1)")]
    InvalidMaxIterations(u32),

    #[error("invalid zoom: {0} (must be positive and finite)")]
    InvalidZoom(f64),

    #[error("invalid surface: {reason}")]
    InvalidSurface { reason: String },
}
