//! Encoder and fitter error types

use thiserror::Error;

/// Result type for encoder and fitter operations
pub type Result<T> = std::result::Result<T, QrError>;

/// Errors that can occur while encoding a symbol or fitting a payload
#[derive(Error, Debug)]
pub enum QrError {
    /// QR version outside 1..=40
    #[error("invalid QR version {0}, must be 1-40")]
    InvalidVersion(usize),

    /// Image buffer cannot hold a V40 bitmap
    #[error("image buffer too small: {got} bytes, need at least {need}")]
    ImageBufferTooSmall { got: usize, need: usize },

    /// Scratch buffer cannot hold the encoded message
    #[error("message buffer too small: {got} bytes, need at least {need}")]
    MessageBufferTooSmall { got: usize, need: usize },

    /// Input length exceeds what the buffer can describe
    #[error("input length {len} exceeds buffer size {size}")]
    InputTooLong { len: usize, size: usize },

    /// Segments don't fit in the requested version
    #[error("data ({data_bits} bits) exceeds version {version} capacity ({capacity_bits} bits)")]
    CapacityExceeded {
        version: usize,
        data_bits: usize,
        capacity_bits: usize,
    },

    /// The symbol capacity leaves no room for a frame header
    #[error("version {version} leaves no room for a payload frame")]
    FrameCapacityTooSmall { version: usize },

    /// No input prefix compressed small enough to fit the symbol
    #[error("no input prefix fits a version {version} symbol")]
    NothingFits { version: usize },

    /// The deterministic final compression pass exceeded the capacity
    /// recorded during the search
    #[error("final compression pass produced {got} bytes, capacity is {capacity}")]
    FinalPassOverflow { got: usize, capacity: usize },

    /// The compressor could not be set up
    #[error("compressor setup failed: {0}")]
    Compressor(#[from] std::io::Error),

    /// The frame sink refused the rendered symbol
    #[error("frame sink error: {0}")]
    Sink(String),
}
