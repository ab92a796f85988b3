//! Message Encoding and Error Correction
//!
//! Packs segments into the data codeword region of a caller-supplied buffer,
//! appends terminator and padding, computes Reed-Solomon parity per block,
//! and exposes the whole message in the interleaved byte order the matrix
//! painter consumes.
//!
//! Buffer layout: `max_data` data bytes first (group-1 blocks then group-2
//! blocks, contiguous), then the parity of every block back to back. Nothing
//! is allocated; the only scratch is a fixed-size stack array per block.

use crate::error::{QrError, Result};
use crate::gf256::{EXP_TABLE, LOG_TABLE};
use crate::segment::{Segment, MODE_STOP};
use crate::version::Version;

/// Largest ECC codeword count of any version at level Low.
const MAX_EC_SIZE: usize = 30;
/// Largest data block size of any version at level Low.
const MAX_BLK_SIZE: usize = 123;

/// Padding bytes, applied alternately after the terminator.
const PADDING: [u8; 2] = [236, 17];

/// An encoded message: segment bits, padding, and Reed-Solomon parity laid
/// out in a borrowed buffer.
#[derive(Debug)]
pub struct EncodedMsg<'a> {
    data: &'a mut [u8],
    ec_size: usize,
    g1_blocks: usize,
    g2_blocks: usize,
    g1_blk_size: usize,
    g2_blk_size: usize,
    poly: &'static [u8],
    version: Version,
}

impl<'a> EncodedMsg<'a> {
    /// Encode `segments` for `version` into `data`.
    ///
    /// Fails if the segments plus terminator exceed the version's capacity,
    /// or if the buffer is smaller than data plus parity for this version.
    pub fn new(
        segments: &[&Segment<'_>],
        version: Version,
        data: &'a mut [u8],
    ) -> Result<EncodedMsg<'a>> {
        let total_bits: usize = segments.iter().map(|s| s.total_size_bits(version)).sum();
        let capacity_bits = version.max_data() * 8;
        if total_bits + 4 > capacity_bits {
            return Err(QrError::CapacityExceeded {
                version: version.number(),
                data_bits: total_bits,
                capacity_bits,
            });
        }

        let ec_size = version.ec_size();
        let g1_blocks = version.g1_blocks();
        let g2_blocks = version.g2_blocks();
        let g1_blk_size = version.g1_blk_size();
        let needed = version.max_data() + ec_size * (g1_blocks + g2_blocks);
        if data.len() < needed {
            return Err(QrError::MessageBufferTooSmall {
                got: data.len(),
                need: needed,
            });
        }

        data.fill(0);

        let mut em = EncodedMsg {
            data,
            ec_size,
            g1_blocks,
            g2_blocks,
            g1_blk_size,
            g2_blk_size: g1_blk_size + 1,
            poly: version.poly(),
            version,
        };
        em.add_segments(segments);
        em.compute_error_code();
        tracing::debug!(
            version = version.number(),
            data_bits = total_bits,
            capacity_bits,
            "message encoded"
        );
        Ok(em)
    }

    /// Version the message was encoded for.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Total codeword count, data plus parity.
    pub fn total_len(&self) -> usize {
        self.version.max_data() + self.ec_size * (self.g1_blocks + self.g2_blocks)
    }

    /// Push `len_bits` bits of `number` at the bit offset, advancing it.
    /// A push spans at most three bytes (offset 0..8, width up to 16).
    fn push(&mut self, offset: &mut usize, (number, len_bits): (u16, usize)) {
        let byte_off = *offset / 8;
        let bit_off = *offset % 8;
        let b = bit_off + len_bits;

        match (bit_off, b) {
            (0, 0..=8) => {
                self.data[byte_off] = (number << (8 - b)) as u8;
            }
            (0, _) => {
                self.data[byte_off] = (number >> (b - 8)) as u8;
                self.data[byte_off + 1] = (number << (16 - b)) as u8;
            }
            (_, 0..=8) => {
                self.data[byte_off] |= (number << (8 - b)) as u8;
            }
            (_, 9..=16) => {
                self.data[byte_off] |= (number >> (b - 8)) as u8;
                self.data[byte_off + 1] = (number << (16 - b)) as u8;
            }
            _ => {
                self.data[byte_off] |= (number >> (b - 8)) as u8;
                self.data[byte_off + 1] = (number >> (b - 16)) as u8;
                self.data[byte_off + 2] = (number << (24 - b)) as u8;
            }
        }
        *offset += len_bits;
    }

    fn add_segments(&mut self, segments: &[&Segment<'_>]) {
        let mut offset: usize = 0;

        for segment in segments {
            self.push(&mut offset, segment.header());
            self.push(&mut offset, segment.length_field(self.version));
            for bits in segment.iter() {
                self.push(&mut offset, bits);
            }
        }
        self.push(&mut offset, (MODE_STOP, 4));

        // The buffer is pre-zeroed, so rounding up to the next byte is the
        // zero-bit pad; the rest of the data area alternates 0xEC / 0x11.
        let pad_offset = offset.div_ceil(8);
        for i in pad_offset..self.version.max_data() {
            self.data[i] = PADDING[(i & 1) ^ (pad_offset & 1)];
        }
    }

    /// Reed-Solomon parity for one block: polynomial long division with the
    /// generator held as log-domain coefficients.
    fn error_code_for_block(&mut self, offset: usize, size: usize, ec_offset: usize) {
        let mut tmp = [0u8; MAX_BLK_SIZE + MAX_EC_SIZE];

        tmp[..size].copy_from_slice(&self.data[offset..offset + size]);
        for i in 0..size {
            let lead = tmp[i] as usize;
            if lead == 0 {
                continue;
            }
            let log_lead = LOG_TABLE[lead] as usize;
            for (t, &p) in tmp[i + 1..].iter_mut().zip(self.poly.iter()) {
                *t ^= EXP_TABLE[(p as usize + log_lead) % 255];
            }
        }
        self.data[ec_offset..ec_offset + self.ec_size]
            .copy_from_slice(&tmp[size..size + self.ec_size]);
    }

    fn compute_error_code(&mut self) {
        let mut offset = 0;
        let mut ec_offset = self.g1_blocks * self.g1_blk_size + self.g2_blocks * self.g2_blk_size;

        for _ in 0..self.g1_blocks {
            self.error_code_for_block(offset, self.g1_blk_size, ec_offset);
            offset += self.g1_blk_size;
            ec_offset += self.ec_size;
        }
        for _ in 0..self.g2_blocks {
            self.error_code_for_block(offset, self.g2_blk_size, ec_offset);
            offset += self.g2_blk_size;
            ec_offset += self.ec_size;
        }
    }

    /// Iterate over the codewords in the interleaved order the symbol wants.
    pub fn iter(&self) -> InterleavedIter<'a, '_> {
        InterleavedIter {
            em: self,
            offset: 0,
        }
    }
}

/// Yields message bytes in canonical QR interleaving: one byte from each
/// block in turn, the extra trailing column of group-2 blocks, then the
/// parity columns across all blocks.
pub struct InterleavedIter<'a, 'b> {
    em: &'b EncodedMsg<'a>,
    offset: usize,
}

impl Iterator for InterleavedIter<'_, '_> {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        let em = self.em;
        let blocks = em.g1_blocks + em.g2_blocks;
        let g1_end = em.g1_blocks * em.g1_blk_size;
        let g2_end = g1_end + em.g2_blocks * em.g2_blk_size;
        let ec_end = g2_end + em.ec_size * blocks;

        if self.offset >= ec_end {
            return None;
        }

        let offset = if self.offset < em.g1_blk_size * blocks {
            // Columns shared by every block.
            let blk = self.offset % blocks;
            let blk_off = self.offset / blocks;
            if blk < em.g1_blocks {
                blk * em.g1_blk_size + blk_off
            } else {
                g1_end + (blk - em.g1_blocks) * em.g2_blk_size + blk_off
            }
        } else if self.offset < g2_end {
            // The final byte of each group-2 block.
            let blk2 = self.offset - blocks * em.g1_blk_size;
            g1_end + blk2 * em.g2_blk_size + em.g2_blk_size - 1
        } else {
            // Parity columns.
            let ec_offset = self.offset - g2_end;
            let blk = ec_offset % blocks;
            let blk_off = ec_offset / blocks;
            g2_end + blk * em.ec_size + blk_off
        };
        self.offset += 1;
        Some(em.data[offset])
    }
}
