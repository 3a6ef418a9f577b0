use thiserror::Error;

/// Top-level error type for the page preparation pipeline.
///
/// Every failure is scoped to a single page invocation; none of these
/// variants leave shared pipeline state corrupted.
#[derive(Debug, Error)]
pub enum PrepError {
    /// No accelerated rendering surface could be obtained (or it was lost
    /// mid-invocation). Depending on deployment policy this triggers the
    /// CPU fallback path or a hard failure.
    #[error("acceleration unavailable: {0}")]
    AccelerationUnavailable(String),

    /// A filter program failed to compile. Fatal for the invocation.
    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),

    /// Zero or inconsistent page dimensions, rejected before any
    /// allocation happens.
    #[error("invalid page dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// A page-sized buffer could not be allocated. The input bitmap has
    /// already been released by the time this surfaces.
    #[error("allocation failed: {0}")]
    OutOfMemory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PrepError>;
