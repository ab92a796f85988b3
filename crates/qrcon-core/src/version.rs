//! QR Version Parameter Tables
//!
//! Static per-version parameters for Model-2 QR symbols at error-correction
//! level Low: Reed-Solomon block layout and generator polynomial, alignment
//! pattern grid coordinates, version-information words, and format-information
//! words. All values are embedded constants; nothing is derived at runtime.
//!
//! ## Example
//!
//! ```rust
//! use qrcon_core::Version;
//!
//! let v = Version::new(10).unwrap();
//! assert_eq!(v.width(), 57);
//! assert_eq!(v.max_data(), 274);
//! assert!(Version::new(41).is_none());
//! ```

// Generator polynomials for the ECC sizes used at level Low, as log-domain
// coefficients (exponents of alpha), highest degree first, monic term omitted.
const P7: [u8; 7] = [87, 229, 146, 149, 238, 102, 21];
const P10: [u8; 10] = [251, 67, 46, 61, 118, 70, 64, 94, 32, 45];
const P15: [u8; 15] = [
    8, 183, 61, 91, 202, 37, 51, 58, 58, 237, 140, 124, 5, 99, 105,
];
const P18: [u8; 18] = [
    215, 234, 158, 94, 184, 97, 118, 170, 79, 187, 152, 148, 252, 179, 5, 98, 96, 153,
];
const P20: [u8; 20] = [
    17, 60, 79, 50, 61, 163, 26, 187, 202, 180, 221, 225, 83, 239, 156, 164, 212, 212, 188, 190,
];
const P22: [u8; 22] = [
    210, 171, 247, 242, 93, 230, 14, 109, 221, 53, 200, 74, 8, 172, 98, 80, 219, 134, 160, 105,
    165, 231,
];
const P24: [u8; 24] = [
    229, 121, 135, 48, 211, 117, 251, 126, 159, 180, 169, 152, 192, 226, 228, 218, 111, 0, 117,
    232, 87, 96, 227, 21,
];
const P26: [u8; 26] = [
    173, 125, 158, 2, 103, 182, 118, 17, 145, 201, 111, 28, 165, 53, 161, 21, 245, 142, 13, 102,
    48, 227, 153, 145, 218, 70,
];
const P28: [u8; 28] = [
    168, 223, 200, 104, 224, 234, 108, 180, 110, 190, 195, 147, 205, 27, 232, 201, 21, 43, 245, 87,
    42, 195, 212, 119, 242, 37, 9, 123,
];
const P30: [u8; 30] = [
    41, 173, 145, 152, 216, 31, 179, 182, 50, 48, 110, 86, 239, 96, 222, 125, 42, 173, 226, 193,
    224, 130, 156, 37, 251, 216, 238, 40, 192, 180,
];

/// Generator polynomial selector. The variant names carry the polynomial
/// degree, which is also the per-block ECC codeword count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GenPoly {
    P7,
    P10,
    P15,
    P18,
    P20,
    P22,
    P24,
    P26,
    P28,
    P30,
}

impl GenPoly {
    /// Log-domain coefficients of the polynomial.
    pub(crate) fn coeffs(self) -> &'static [u8] {
        match self {
            GenPoly::P7 => &P7,
            GenPoly::P10 => &P10,
            GenPoly::P15 => &P15,
            GenPoly::P18 => &P18,
            GenPoly::P20 => &P20,
            GenPoly::P22 => &P22,
            GenPoly::P24 => &P24,
            GenPoly::P26 => &P26,
            GenPoly::P28 => &P28,
            GenPoly::P30 => &P30,
        }
    }
}

/// Per-version block layout for level Low:
/// generator polynomial, group-1 block count, group-2 block count,
/// group-1 block size. Group-2 blocks are one byte larger.
struct VersionParameter(GenPoly, u8, u8, u8);

const VPARAM: [VersionParameter; 40] = [
    VersionParameter(GenPoly::P7, 1, 0, 19),    // V1
    VersionParameter(GenPoly::P10, 1, 0, 34),   // V2
    VersionParameter(GenPoly::P15, 1, 0, 55),   // V3
    VersionParameter(GenPoly::P20, 1, 0, 80),   // V4
    VersionParameter(GenPoly::P26, 1, 0, 108),  // V5
    VersionParameter(GenPoly::P18, 2, 0, 68),   // V6
    VersionParameter(GenPoly::P20, 2, 0, 78),   // V7
    VersionParameter(GenPoly::P24, 2, 0, 97),   // V8
    VersionParameter(GenPoly::P30, 2, 0, 116),  // V9
    VersionParameter(GenPoly::P18, 2, 2, 68),   // V10
    VersionParameter(GenPoly::P20, 4, 0, 81),   // V11
    VersionParameter(GenPoly::P24, 2, 2, 92),   // V12
    VersionParameter(GenPoly::P26, 4, 0, 107),  // V13
    VersionParameter(GenPoly::P30, 3, 1, 115),  // V14
    VersionParameter(GenPoly::P22, 5, 1, 87),   // V15
    VersionParameter(GenPoly::P24, 5, 1, 98),   // V16
    VersionParameter(GenPoly::P28, 1, 5, 107),  // V17
    VersionParameter(GenPoly::P30, 5, 1, 120),  // V18
    VersionParameter(GenPoly::P28, 3, 4, 113),  // V19
    VersionParameter(GenPoly::P28, 3, 5, 107),  // V20
    VersionParameter(GenPoly::P28, 4, 4, 116),  // V21
    VersionParameter(GenPoly::P28, 2, 7, 111),  // V22
    VersionParameter(GenPoly::P30, 4, 5, 121),  // V23
    VersionParameter(GenPoly::P30, 6, 4, 117),  // V24
    VersionParameter(GenPoly::P26, 8, 4, 106),  // V25
    VersionParameter(GenPoly::P28, 10, 2, 114), // V26
    VersionParameter(GenPoly::P30, 8, 4, 122),  // V27
    VersionParameter(GenPoly::P30, 3, 10, 117), // V28
    VersionParameter(GenPoly::P30, 7, 7, 116),  // V29
    VersionParameter(GenPoly::P30, 5, 10, 115), // V30
    VersionParameter(GenPoly::P30, 13, 3, 115), // V31
    VersionParameter(GenPoly::P30, 17, 0, 115), // V32
    VersionParameter(GenPoly::P30, 17, 1, 115), // V33
    VersionParameter(GenPoly::P30, 13, 6, 115), // V34
    VersionParameter(GenPoly::P30, 12, 7, 121), // V35
    VersionParameter(GenPoly::P30, 6, 14, 121), // V36
    VersionParameter(GenPoly::P30, 17, 4, 122), // V37
    VersionParameter(GenPoly::P30, 4, 18, 122), // V38
    VersionParameter(GenPoly::P30, 20, 4, 117), // V39
    VersionParameter(GenPoly::P30, 19, 6, 118), // V40
];

/// Alignment pattern center coordinates per version. Centers are the cross
/// product of each list with itself; any center overlapping a finder is
/// skipped by the painter. Explicit slice lengths, no terminator value.
const ALIGNMENT_PATTERNS: [&[u8]; 40] = [
    &[],
    &[6, 18],
    &[6, 22],
    &[6, 26],
    &[6, 30],
    &[6, 34],
    &[6, 22, 38],
    &[6, 24, 42],
    &[6, 26, 46],
    &[6, 28, 50],
    &[6, 30, 54],
    &[6, 32, 58],
    &[6, 34, 62],
    &[6, 26, 46, 66],
    &[6, 26, 48, 70],
    &[6, 26, 50, 74],
    &[6, 30, 54, 78],
    &[6, 30, 56, 82],
    &[6, 30, 58, 86],
    &[6, 34, 62, 90],
    &[6, 28, 50, 72, 94],
    &[6, 26, 50, 74, 98],
    &[6, 30, 54, 78, 102],
    &[6, 28, 54, 80, 106],
    &[6, 32, 58, 84, 110],
    &[6, 30, 58, 86, 114],
    &[6, 34, 62, 90, 118],
    &[6, 26, 50, 74, 98, 122],
    &[6, 30, 54, 78, 102, 126],
    &[6, 26, 52, 78, 104, 130],
    &[6, 30, 56, 82, 108, 134],
    &[6, 34, 60, 86, 112, 138],
    &[6, 30, 58, 86, 114, 142],
    &[6, 34, 62, 90, 118, 146],
    &[6, 30, 54, 78, 102, 126, 150],
    &[6, 24, 50, 76, 102, 128, 154],
    &[6, 28, 54, 80, 106, 132, 158],
    &[6, 32, 58, 84, 110, 136, 162],
    &[6, 26, 54, 82, 110, 138, 166],
    &[6, 30, 58, 86, 114, 142, 170],
];

/// Precomputed 18-bit version-information words for versions 7-40.
const VERSION_INFORMATION: [u32; 34] = [
    0b00_0111_1100_1001_0100,
    0b00_1000_0101_1011_1100,
    0b00_1001_1010_1001_1001,
    0b00_1010_0100_1101_0011,
    0b00_1011_1011_1111_0110,
    0b00_1100_0111_0110_0010,
    0b00_1101_1000_0100_0111,
    0b00_1110_0110_0000_1101,
    0b00_1111_1001_0010_1000,
    0b01_0000_1011_0111_1000,
    0b01_0001_0100_0101_1101,
    0b01_0010_1010_0001_0111,
    0b01_0011_0101_0011_0010,
    0b01_0100_1001_1010_0110,
    0b01_0101_0110_1000_0011,
    0b01_0110_1000_1100_1001,
    0b01_0111_0111_1110_1100,
    0b01_1000_1110_1100_0100,
    0b01_1001_0001_1110_0001,
    0b01_1010_1111_1010_1011,
    0b01_1011_0000_1000_1110,
    0b01_1100_1100_0001_1010,
    0b01_1101_0011_0011_1111,
    0b01_1110_1101_0111_0101,
    0b01_1111_0010_0101_0000,
    0b10_0000_1001_1101_0101,
    0b10_0001_0110_1111_0000,
    0b10_0010_1000_1011_1010,
    0b10_0011_0111_1001_1111,
    0b10_0100_1011_0000_1011,
    0b10_0101_0100_0010_1110,
    0b10_0110_1010_0110_0100,
    0b10_0111_0101_0100_0001,
    0b10_1000_1100_0110_1001,
];

/// Precomputed 15-bit format-information words for level Low, indexed by
/// mask pattern. Only mask 0 is ever drawn.
pub(crate) const FORMAT_INFOS_QR_L: [u16; 8] = [
    0x77c4, 0x72f3, 0x7daa, 0x789d, 0x662f, 0x6318, 0x6c41, 0x6976,
];

/// A QR symbol version, 1 to 40. Determines the symbol width and every
/// block-layout parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version(usize);

impl Version {
    /// Create a version, or `None` outside 1..=40.
    pub fn new(v: usize) -> Option<Version> {
        (1..=40).contains(&v).then_some(Version(v))
    }

    /// Version number, 1..=40.
    pub fn number(&self) -> usize {
        self.0
    }

    /// Symbol width in modules: `4 * version + 17`.
    pub fn width(&self) -> u8 {
        (self.0 as u8) * 4 + 17
    }

    /// Data codeword capacity in bytes, before error correction is added.
    pub fn max_data(&self) -> usize {
        self.g1_blk_size() * self.g1_blocks() + (self.g1_blk_size() + 1) * self.g2_blocks()
    }

    /// ECC codewords per block.
    pub fn ec_size(&self) -> usize {
        VPARAM[self.0 - 1].0.coeffs().len()
    }

    pub(crate) fn g1_blocks(&self) -> usize {
        VPARAM[self.0 - 1].1 as usize
    }

    pub(crate) fn g2_blocks(&self) -> usize {
        VPARAM[self.0 - 1].2 as usize
    }

    pub(crate) fn g1_blk_size(&self) -> usize {
        VPARAM[self.0 - 1].3 as usize
    }

    pub(crate) fn alignment_pattern(&self) -> &'static [u8] {
        ALIGNMENT_PATTERNS[self.0 - 1]
    }

    pub(crate) fn poly(&self) -> &'static [u8] {
        VPARAM[self.0 - 1].0.coeffs()
    }

    /// 18-bit version-information word, or 0 for versions 1-6 which carry
    /// no version pattern.
    pub(crate) fn version_info(&self) -> u32 {
        if self.0 >= 7 {
            VERSION_INFORMATION[self.0 - 7]
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gf256::{self, EXP_TABLE, LOG_TABLE};

    #[test]
    fn test_version_range() {
        assert!(Version::new(0).is_none());
        assert!(Version::new(41).is_none());
        assert_eq!(Version::new(1).unwrap().number(), 1);
        assert_eq!(Version::new(40).unwrap().number(), 40);
    }

    #[test]
    fn test_width() {
        for v in 1..=40 {
            assert_eq!(Version::new(v).unwrap().width() as usize, 4 * v + 17);
        }
    }

    #[test]
    fn test_max_data_known_values() {
        assert_eq!(Version::new(1).unwrap().max_data(), 19);
        assert_eq!(Version::new(2).unwrap().max_data(), 34);
        assert_eq!(Version::new(5).unwrap().max_data(), 108);
        assert_eq!(Version::new(10).unwrap().max_data(), 274);
        assert_eq!(Version::new(20).unwrap().max_data(), 861);
        assert_eq!(Version::new(40).unwrap().max_data(), 2956);
    }

    #[test]
    fn test_ec_size_matches_poly_degree() {
        assert_eq!(Version::new(1).unwrap().ec_size(), 7);
        assert_eq!(Version::new(40).unwrap().ec_size(), 30);
        for v in 1..=40 {
            let version = Version::new(v).unwrap();
            assert_eq!(version.ec_size(), version.poly().len());
        }
    }

    #[test]
    fn test_alignment_coordinates_in_range() {
        for v in 1..=40 {
            let version = Version::new(v).unwrap();
            let width = version.width();
            for &c in version.alignment_pattern() {
                assert!(c >= 6 && c <= width - 7, "V{v} center {c} out of range");
            }
        }
    }

    #[test]
    fn test_version_info() {
        assert_eq!(Version::new(6).unwrap().version_info(), 0);
        assert_eq!(Version::new(7).unwrap().version_info(), 0x07C94);
        assert_eq!(Version::new(40).unwrap().version_info(), 0x28C69);
    }

    #[test]
    fn test_format_info_mask0() {
        assert_eq!(FORMAT_INFOS_QR_L[0], 0x77c4);
    }

    /// Every embedded polynomial must be the log-domain coefficient list of
    /// `prod_{i=0}^{n-1} (x - alpha^i)`, recomputed here from field first
    /// principles.
    #[test]
    fn test_generator_polynomials() {
        for poly in [
            GenPoly::P7,
            GenPoly::P10,
            GenPoly::P15,
            GenPoly::P18,
            GenPoly::P20,
            GenPoly::P22,
            GenPoly::P24,
            GenPoly::P26,
            GenPoly::P28,
            GenPoly::P30,
        ] {
            let coeffs = poly.coeffs();
            let n = coeffs.len();

            // Build the generator in the normal domain, highest degree first.
            let mut gen = vec![1u8];
            for i in 0..n {
                let root = EXP_TABLE[i];
                let mut next = vec![0u8; gen.len() + 1];
                for (j, &g) in gen.iter().enumerate() {
                    next[j] ^= g;
                    next[j + 1] ^= gf256::mul(g, root);
                }
                gen = next;
            }

            assert_eq!(gen[0], 1, "generator must be monic");
            for (j, &c) in coeffs.iter().enumerate() {
                let expect = LOG_TABLE[gen[j + 1] as usize];
                assert_eq!(c, expect, "poly degree {n} coefficient {j}");
            }
        }
    }
}
