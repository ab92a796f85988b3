//! Payload Fitter
//!
//! Finds the largest prefix of a source buffer whose compressed frame fits
//! inside one QR symbol. The frame is an 8-byte header (magic plus the
//! uncompressed length, both little endian) followed by a ZSTD frame of
//! exactly that many input bytes. Scanners concatenate decompressed frames
//! across symbols to recover the stream.
//!
//! The fit is a binary search over the uncompressed prefix length: the
//! compressed size is not strictly monotonic in the input length, but it is
//! close enough that the search lands on a maximal fitting prefix in
//! `O(log n)` compressor calls. A final deterministic pass recompresses the
//! winning prefix so the emitted bytes always match the recorded length.
//!
//! ## Example
//!
//! ```rust
//! use qrcon_core::{FrameFitter, Version};
//!
//! let mut fitter = FrameFitter::new(Version::new(10).unwrap(), 3).unwrap();
//! let log = vec![b'A'; 4096];
//! let mut dst = vec![0u8; 4096];
//! let fitted = fitter.fit(&log, &mut dst).unwrap();
//! assert!(fitted.consumed > 0);
//! assert_eq!(&dst[..4], &[0x44, 0x54, 0x53, 0x5A]);
//! ```

use crate::encoder;
use crate::error::{QrError, Result};
use crate::version::Version;

/// Frame magic, "ZSTD" when the header is read little endian.
pub const FRAME_MAGIC: u32 = 0x5A53_5444;

/// Magic plus 32-bit uncompressed length.
pub const FRAME_HEADER_SIZE: usize = 8;

/// One fitted frame: how many bytes it occupies and how much input it
/// consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FittedFrame {
    /// Total frame length, header included.
    pub frame_len: usize,
    /// Source bytes folded into this frame.
    pub consumed: usize,
}

/// Compresses source prefixes into single-symbol frames, reusing one
/// compression context across calls.
pub struct FrameFitter {
    version: Version,
    level: i32,
    compressor: zstd::bulk::Compressor<'static>,
}

impl FrameFitter {
    /// Create a fitter for `version`. The level is clamped to ZSTD's 1..=22.
    pub fn new(version: Version, level: i32) -> Result<FrameFitter> {
        let level = level.clamp(1, 22);
        let compressor = zstd::bulk::Compressor::new(level)?;
        Ok(FrameFitter {
            version,
            level,
            compressor,
        })
    }

    /// Target symbol version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Compression level in use.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Fit the largest possible prefix of `src` into `dst` as one frame.
    ///
    /// On success the frame occupies `dst[..frame_len]` and `consumed`
    /// source bytes are covered; the caller advances its cursor by that
    /// much. On failure `dst` contents are unspecified and nothing was
    /// consumed.
    pub fn fit(&mut self, src: &[u8], dst: &mut [u8]) -> Result<FittedFrame> {
        let capacity = encoder::max_data_size(self.version, 0).min(dst.len());
        if capacity <= FRAME_HEADER_SIZE {
            return Err(QrError::FrameCapacityTooSmall {
                version: self.version.number(),
            });
        }

        // Search for the longest prefix whose frame fits the capacity. A
        // compressor error means the scratch region was too small for that
        // prefix, which folds into the same "does not fit" outcome.
        let mut lo = 1usize;
        let mut hi = src.len();
        let mut best_k = 0usize;
        let mut best_size = 0usize;
        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            match self
                .compressor
                .compress_to_buffer(&src[..mid], &mut dst[FRAME_HEADER_SIZE..capacity])
            {
                Ok(size) if FRAME_HEADER_SIZE + size <= capacity => {
                    best_k = mid;
                    best_size = size;
                    lo = mid + 1;
                }
                Ok(_) | Err(_) => hi = mid - 1,
            }
        }
        if best_k == 0 {
            return Err(QrError::NothingFits {
                version: self.version.number(),
            });
        }

        // The search scratch overlapped the destination and the last probe
        // may not have targeted best_k, so recompress deterministically.
        let size = self
            .compressor
            .compress_to_buffer(&src[..best_k], &mut dst[FRAME_HEADER_SIZE..capacity])
            .map_err(|_| QrError::FinalPassOverflow {
                got: 0,
                capacity,
            })?;
        if FRAME_HEADER_SIZE + size > capacity {
            return Err(QrError::FinalPassOverflow {
                got: FRAME_HEADER_SIZE + size,
                capacity,
            });
        }
        if size != best_size {
            tracing::debug!(best_size, size, "final pass size differs, still fits");
        }

        dst[..4].copy_from_slice(&FRAME_MAGIC.to_le_bytes());
        dst[4..8].copy_from_slice(&(best_k as u32).to_le_bytes());

        tracing::debug!(
            consumed = best_k,
            frame_len = FRAME_HEADER_SIZE + size,
            capacity,
            level = self.level,
            "frame fitted"
        );
        Ok(FittedFrame {
            frame_len: FRAME_HEADER_SIZE + size,
            consumed: best_k,
        })
    }
}
