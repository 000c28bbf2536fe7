//! Error types for parallax_gpu

use parallax_core::ParallaxError;
use thiserror::Error;

/// Error type for renderer operations
#[derive(Error, Debug)]
pub enum RendererError {
    /// No adapter matched the request
    #[error("no suitable GPU adapter found")]
    AdapterNotFound,

    /// Failed to request GPU device
    #[error("failed to request GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// WGSL failed to parse or validate
    #[error("shader `{label}` is invalid: {message}")]
    Shader { label: String, message: String },

    /// A layer samples a texture that was never uploaded
    #[error("texture `{0}` has no content")]
    MissingTexture(&'static str),

    /// Reading a render target back to the CPU failed
    #[error("readback failed: {0}")]
    Readback(String),

    /// Error from the core model
    #[error(transparent)]
    Core(#[from] ParallaxError),
}

/// Result type for parallax_gpu operations
pub type Result<T> = std::result::Result<T, RendererError>;
