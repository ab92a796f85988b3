//! Symbol Generation Entry Points
//!
//! Ties segments, message encoding and matrix painting together behind two
//! calls: a capacity query and a generator that turns a payload buffer into
//! a packed bitmap in place.
//!
//! ## Example
//!
//! ```rust
//! use qrcon_core::{encoder, Version};
//!
//! let v1 = Version::new(1).unwrap();
//! assert_eq!(encoder::max_data_size(v1, 0), 16);
//!
//! let mut data = vec![0u8; encoder::MIN_IMAGE_BUF];
//! let mut tmp = vec![0u8; encoder::MIN_MSG_BUF];
//! data[..6].copy_from_slice(b"HELLO\n");
//! let width = encoder::generate(None, &mut data, 6, v1, &mut tmp).unwrap();
//! assert_eq!(width, 21);
//! ```

use crate::encode::EncodedMsg;
use crate::error::{QrError, Result};
use crate::image::QrImage;
use crate::segment::Segment;
use crate::version::Version;

/// Smallest payload/image buffer accepted: a V40 bitmap needs
/// `ceil(177 / 8) * 177` bytes.
pub const MIN_IMAGE_BUF: usize = 4071;

/// Smallest scratch buffer accepted: a V40 message needs
/// `2956 + 30 * 25` bytes for data plus parity.
pub const MIN_MSG_BUF: usize = 3706;

/// Byte-mode capacity of a symbol.
///
/// With `url_len == 0` this is the data capacity minus the three bytes of
/// single-segment overhead (4-bit mode, 16-bit count, 4-bit terminator).
/// With a URL, both segment headers are subtracted and the numeric-mode
/// expansion of the payload is accounted for; returns 0 when the URL alone
/// exhausts the symbol.
pub fn max_data_size(version: Version, url_len: usize) -> usize {
    let max_data = version.max_data();

    if url_len > 0 {
        // Binary segment (URL) 4 + 16 bits, numeric segment 4 + 12 bits,
        // rounded up to 5 bytes of overhead.
        if url_len + 5 >= max_data {
            0
        } else {
            // 13 payload bits become 40 symbol bits: keep 39/40.
            (max_data - url_len - 5) * 39 / 40
        }
    } else {
        max_data - 3
    }
}

/// Generate a QR symbol in place.
///
/// The first `data_len` bytes of `data` are the payload. With a `url`, the
/// symbol carries a binary segment for the URL followed by the payload as a
/// numeric segment; otherwise the payload is a single binary segment. The
/// bitmap (1 bit per module, rows padded to byte boundaries, high bit
/// first) overwrites `data`, and `tmp` receives the encoded message.
///
/// Both buffers must be sized for V40 regardless of the requested version,
/// so the same buffers can serve any symbol. Returns the symbol width.
pub fn generate(
    url: Option<&str>,
    data: &mut [u8],
    data_len: usize,
    version: Version,
    tmp: &mut [u8],
) -> Result<u8> {
    if data.len() < MIN_IMAGE_BUF {
        return Err(QrError::ImageBufferTooSmall {
            got: data.len(),
            need: MIN_IMAGE_BUF,
        });
    }
    if tmp.len() < MIN_MSG_BUF {
        return Err(QrError::MessageBufferTooSmall {
            got: tmp.len(),
            need: MIN_MSG_BUF,
        });
    }
    if data_len > data.len() {
        return Err(QrError::InputTooLong {
            len: data_len,
            size: data.len(),
        });
    }

    let em = {
        let payload = &data[..data_len];
        match url {
            Some(url) => {
                let segments = [&Segment::Binary(url.as_bytes()), &Segment::Numeric(payload)];
                EncodedMsg::new(&segments, version, tmp)?
            }
            None => EncodedMsg::new(&[&Segment::Binary(payload)], version, tmp)?,
        }
    };

    let image = QrImage::new(&em, data)?;
    tracing::debug!(
        version = version.number(),
        width = image.width(),
        payload_len = data_len,
        "symbol generated"
    );
    Ok(image.width())
}
