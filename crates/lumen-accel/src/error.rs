//! Error types for accelerator configuration.
//!
//! Building and querying never fail; errors only arise while turning
//! user-supplied configuration into build parameters.

use thiserror::Error;

/// Errors that can occur while loading or validating accelerator settings.
#[derive(Error, Debug)]
pub enum AccelError {
    /// Split method name not recognized.
    #[error("unknown BVH split method \"{0}\" (expected sah, middle, equal or hlbvh)")]
    UnknownSplitMethod(String),

    /// Accelerator name not recognized.
    #[error("unknown accelerator \"{0}\" (expected bvh or kdtree)")]
    UnknownAccelerator(String),

    /// A build parameter is out of range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in configuration.
        name: &'static str,
        /// What is wrong with the value.
        reason: String,
    },

    /// Configuration text is not valid TOML for the expected schema.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Reading a configuration file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for accelerator configuration.
pub type Result<T> = std::result::Result<T, AccelError>;
