//! Error types for parallax_core

use thiserror::Error;

/// Construction-time errors of the layered player.
///
/// Per-frame operations never fail; everything that can go wrong is caught
/// when the player or its configuration is built.
#[derive(Error, Debug)]
pub enum ParallaxError {
    /// A decoded image was empty or its pixel buffer did not match its size
    #[error("invalid media `{slot}`: {reason}")]
    InvalidMedia { slot: String, reason: String },

    /// A configuration value is outside its valid range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to parse a TOML configuration
    #[error("configuration parse failed: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Failed to read a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for parallax_core operations
pub type Result<T> = std::result::Result<T, ParallaxError>;
