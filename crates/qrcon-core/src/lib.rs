//! # QR Console Core
//!
//! This crate turns a captured kernel log into a sequence of QR symbols so
//! a camera can recover the log when no serial, USB or persistent-store
//! channel is available. It is the algorithmic core of the qrcon project:
//! everything here works on caller-supplied buffers with no allocation on
//! the encode path, so the same routines can run from a panic notifier.
//!
//! ## Pipeline
//!
//! ```text
//! log bytes → FrameFitter → [header | ZSTD frame] → segment encoder
//!           → Reed-Solomon + interleave → matrix painter → 1 bpp bitmap
//! ```
//!
//! Two subsystems carry the real work:
//!
//! - **The symbol encoder**: a Model-2 QR encoder for a caller-chosen
//!   version (1-40) at error-correction level Low with the checkerboard
//!   mask, including a numeric mode that repacks arbitrary bytes 13 bits at
//!   a time into decimal digits for URL-safe payloads.
//! - **The payload fitter**: a binary search for the largest log prefix
//!   whose compressed frame fits one symbol, driven in a loop that drains
//!   the whole buffer symbol by symbol.
//!
//! ## Example
//!
//! ```rust
//! use qrcon_core::{encoder, Version};
//!
//! let version = Version::new(3).unwrap();
//! let mut data = vec![0u8; encoder::MIN_IMAGE_BUF];
//! let mut tmp = vec![0u8; encoder::MIN_MSG_BUF];
//!
//! let msg = b"oops: kernel BUG at lib/list_debug.c:28";
//! data[..msg.len()].copy_from_slice(msg);
//! let width = encoder::generate(None, &mut data, msg.len(), version, &mut tmp).unwrap();
//! assert_eq!(width, 29);
//! ```

pub mod drain;
pub mod encode;
pub mod encoder;
pub mod error;
pub mod fitter;
pub mod gf256;
pub mod image;
pub mod segment;
pub mod version;

pub use drain::{DrainStats, FrameSink, LogDrainer, SKIP_SIZE};
pub use encode::EncodedMsg;
pub use encoder::{generate, max_data_size, MIN_IMAGE_BUF, MIN_MSG_BUF};
pub use error::{QrError, Result};
pub use fitter::{FittedFrame, FrameFitter, FRAME_HEADER_SIZE, FRAME_MAGIC};
pub use image::QrImage;
pub use segment::Segment;
pub use version::Version;
