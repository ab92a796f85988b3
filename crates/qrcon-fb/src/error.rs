//! Framebuffer front-end error types

use std::io;
use thiserror::Error;

/// Result type for framebuffer and log-capture operations
pub type FbResult<T> = Result<T, FbError>;

/// Errors from the display and log-capture layer
#[derive(Error, Debug)]
pub enum FbError {
    /// Framebuffer device not present
    #[error("framebuffer device not found: {0}")]
    DeviceNotFound(String),

    /// Device or sysfs I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Opening the device was denied
    #[error("permission denied opening {0}. Run as root or join the 'video' group.")]
    PermissionDenied(String),

    /// Memory mapping the framebuffer failed
    #[error("mmap of {device} failed: {reason}")]
    MmapFailed { device: String, reason: String },

    /// Sysfs geometry attributes missing or malformed
    #[error("bad framebuffer geometry: {0}")]
    InvalidGeometry(String),

    /// Unsupported pixel depth
    #[error("unsupported pixel depth: {0} bytes per pixel")]
    UnsupportedDepth(u32),

    /// Configuration file problem
    #[error("configuration error: {0}")]
    Config(String),

    /// Core encoder or fitter failure
    #[error(transparent)]
    Core(#[from] qrcon_core::QrError),
}
