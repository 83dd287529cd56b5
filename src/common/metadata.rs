use std::fmt::{Display, Error, Formatter};
use std::ops::{Deref, Not};
use std::str::FromStr;

use super::codec::Mode;
use super::error::{QRError, QRResult};
use super::mask::MaskPattern;

// Color
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Color {
    Dark,
    Light,
}

impl Not for Color {
    type Output = Self;
    fn not(self) -> Self::Output {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl Color {
    pub fn select<T>(&self, dark: T, light: T) -> T {
        match self {
            Self::Dark => dark,
            Self::Light => light,
        }
    }
}

impl From<bool> for Color {
    fn from(dark: bool) -> Self {
        if dark {
            Self::Dark
        } else {
            Self::Light
        }
    }
}

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub enum ECLevel {
    L = 0,
    #[default]
    M = 1,
    Q = 2,
    H = 3,
}

impl ECLevel {
    // 2 bit indicator stored in format info
    pub const fn format_bits(self) -> u32 {
        match self {
            Self::L => 0b01,
            Self::M => 0b00,
            Self::Q => 0b11,
            Self::H => 0b10,
        }
    }

    pub fn from_format_bits(bits: u32) -> Self {
        debug_assert!(bits < 4, "Invalid ec level bits: {bits}");
        match bits & 0b11 {
            0b01 => Self::L,
            0b00 => Self::M,
            0b11 => Self::Q,
            _ => Self::H,
        }
    }

    // Coerces anything outside L/M/Q/H to the default level
    pub fn from_char_or_default(c: char) -> Self {
        let mut buf = [0; 4];
        c.encode_utf8(&mut buf).parse().unwrap_or_default()
    }
}

impl FromStr for ECLevel {
    type Err = QRError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "L" | "l" => Ok(Self::L),
            "M" | "m" => Ok(Self::M),
            "Q" | "q" => Ok(Self::Q),
            "H" | "h" => Ok(Self::H),
            _ => Err(QRError::InvalidECLevel),
        }
    }
}

impl Display for ECLevel {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{self:?}")
    }
}


// Version
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub struct Version(u8);

impl Deref for Version {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self.0)
    }
}

impl Version {
    pub const MIN: Version = Version(1);
    pub const MAX: Version = Version(40);

    pub fn new(version: usize) -> QRResult<Self> {
        match version {
            1..=40 => Ok(Self(version as u8)),
            _ => Err(QRError::InvalidVersion),
        }
    }

    pub fn all() -> impl Iterator<Item = Version> {
        (*Self::MIN..=*Self::MAX).map(Version)
    }

    pub const fn width(self) -> usize {
        self.0 as usize * 4 + 17
    }

    // Modules left for codewords and remainder bits once function patterns,
    // format & version info are drawn
    pub fn raw_data_modules(self) -> usize {
        let v = self.0 as usize;
        let mut res = (16 * v + 128) * v + 64;
        if v >= 2 {
            let align_cnt = v / 7 + 2;
            res -= (25 * align_cnt - 10) * align_cnt - 55;
            if v >= 7 {
                res -= 36;
            }
        }
        res
    }

    pub fn total_codewords(self) -> usize {
        self.raw_data_modules() >> 3
    }

    pub fn remainder_bits(self) -> usize {
        self.raw_data_modules() & 7
    }

    pub fn ecc_per_block(self, ecl: ECLevel) -> usize {
        ECC_PER_BLOCK[ecl as usize][self.0 as usize] as usize
    }

    pub fn block_count(self, ecl: ECLevel) -> usize {
        EC_BLOCK_COUNT[ecl as usize][self.0 as usize] as usize
    }

    pub fn data_codewords(self, ecl: ECLevel) -> usize {
        self.total_codewords() - self.ecc_per_block(ecl) * self.block_count(ecl)
    }

    pub fn data_bit_capacity(self, ecl: ECLevel) -> usize {
        self.data_codewords(ecl) << 3
    }

    // Returns (block1_size, block1_count, block2_size, block2_count) in data codewords.
    // Group 2 blocks hold exactly one codeword more than group 1 blocks
    pub fn data_codewords_per_block(self, ecl: ECLevel) -> (usize, usize, usize, usize) {
        let total = self.total_codewords();
        let blocks = self.block_count(ecl);
        let ecc = self.ecc_per_block(ecl);

        let block1_size = total / blocks - ecc;
        let block2_count = total % blocks;
        let block1_count = blocks - block2_count;
        let block2_size = if block2_count > 0 { block1_size + 1 } else { 0 };

        (block1_size, block1_count, block2_size, block2_count)
    }

    pub const fn mode_bits(self) -> usize {
        4
    }

    pub fn char_cnt_bits(self, mode: Mode) -> usize {
        let tier = match self.0 {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        };
        match mode {
            Mode::Numeric => [10, 12, 14][tier],
            Mode::Alphanumeric => [9, 11, 13][tier],
            Mode::Byte => [8, 16, 16][tier],
            Mode::Kanji => [8, 10, 12][tier],
        }
    }

    // Max number of chars a single segment of the mode can carry
    pub fn char_capacity(self, ecl: ECLevel, mode: Mode) -> usize {
        let len_bits = self.char_cnt_bits(mode);
        let bits = self.data_bit_capacity(ecl) - self.mode_bits() - len_bits;
        let cap = match mode {
            Mode::Numeric => {
                let rem = match bits % 10 {
                    0..=3 => 0,
                    4..=6 => 1,
                    _ => 2,
                };
                bits / 10 * 3 + rem
            }
            Mode::Alphanumeric => bits / 11 * 2 + usize::from(bits % 11 >= 6),
            Mode::Byte => bits / 8,
            Mode::Kanji => bits / 13,
        };
        cap.min((1 << len_bits) - 1)
    }

    pub fn alignment_pattern(self) -> &'static [i16] {
        ALIGNMENT_PATTERN_POSITIONS[self.0 as usize - 1]
    }

    // 18 bit version info: 6 bit version followed by a 12 bit BCH remainder
    pub fn info(self) -> u32 {
        debug_assert!(self.0 >= 7, "Version info is only drawn from version 7: {}", self.0);
        let ver = self.0 as u32;
        ver << VERSION_ERROR_BIT_LEN | bch_remainder(ver, VERSION_GENERATOR, VERSION_ERROR_BIT_LEN)
    }
}


// Metadata
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Metadata {
    pub version: Option<Version>,
    pub ec_level: ECLevel,
    pub mode: Option<Mode>,
    pub mask: Option<MaskPattern>,
}

impl Metadata {
    pub fn new(
        version: Option<Version>,
        ec_level: ECLevel,
        mode: Option<Mode>,
        mask: Option<MaskPattern>,
    ) -> Self {
        Self { version, ec_level, mode, mask }
    }
}

impl Display for Metadata {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        let or_auto = |v: Option<String>| v.unwrap_or_else(|| "Auto".to_string());
        write!(
            f,
            "Metadata {{ Version: {}, Ec level: {}, Mode: {}, Mask: {} }}",
            or_auto(self.version.map(|v| v.to_string())),
            self.ec_level,
            or_auto(self.mode.map(|m| m.to_string())),
            or_auto(self.mask.map(|m| m.to_string())),
        )
    }
}


// Format info
//------------------------------------------------------------------------------

// 15 bit format info: ec level & mask pattern followed by a 10 bit BCH remainder,
// xored with the format mask
pub fn format_info(ecl: ECLevel, mask: MaskPattern) -> u32 {
    let data = ecl.format_bits() << 3 | *mask as u32;
    let rem = bch_remainder(data, FORMAT_GENERATOR, FORMAT_ERROR_BIT_LEN);
    (data << FORMAT_ERROR_BIT_LEN | rem) ^ FORMAT_MASK
}

// Reverses format_info, accepting words within FORMAT_ERROR_CAPACITY bit flips of a valid one
pub fn parse_format_info(info: u32) -> QRResult<(ECLevel, MaskPattern)> {
    let (best, dist) = (0..32u32)
        .map(|data| {
            let ecl = ECLevel::from_format_bits(data >> 3);
            let mask = MaskPattern::from_bits(data & 0b111);
            let dist = (format_info(ecl, mask) ^ info).count_ones();
            ((ecl, mask), dist)
        })
        .min_by_key(|(_, dist)| *dist)
        .ok_or(QRError::InvalidFormatInfo)?;

    if dist > FORMAT_ERROR_CAPACITY {
        return Err(QRError::InvalidFormatInfo);
    }
    Ok(best)
}

// Remainder of data·x^ec_len divided by the generator, in GF(2)
fn bch_remainder(data: u32, generator: u32, ec_len: usize) -> u32 {
    let gen_len = 32 - generator.leading_zeros();
    let mut rem = data << ec_len;
    while rem >> ec_len != 0 {
        let shift = (32 - rem.leading_zeros()) - gen_len;
        rem ^= generator << shift;
    }
    rem
}


// Global constants
//------------------------------------------------------------------------------

pub const FORMAT_INFO_BIT_LEN: usize = 15;
pub const FORMAT_ERROR_BIT_LEN: usize = 10;
pub const FORMAT_ERROR_CAPACITY: u32 = 3;
pub const FORMAT_GENERATOR: u32 = 0b101_0011_0111;
pub const FORMAT_MASK: u32 = 0b101_0100_0001_0010;

pub const VERSION_INFO_BIT_LEN: usize = 18;
pub const VERSION_ERROR_BIT_LEN: usize = 12;
pub const VERSION_GENERATOR: u32 = 0b1_1111_0010_0101;

// Format info coordinates, most significant bit first. Negative values wrap
// around from the bottom/right edge.
pub static FORMAT_INFO_COORDS_QR_MAIN: [(i16, i16); FORMAT_INFO_BIT_LEN] = [
    (8, 0),
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 7),
    (8, 8),
    (7, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
    (0, 8),
];

pub static FORMAT_INFO_COORDS_QR_SIDE: [(i16, i16); FORMAT_INFO_BIT_LEN] = [
    (-1, 8),
    (-2, 8),
    (-3, 8),
    (-4, 8),
    (-5, 8),
    (-6, 8),
    (-7, 8),
    (8, -8),
    (8, -7),
    (8, -6),
    (8, -5),
    (8, -4),
    (8, -3),
    (8, -2),
    (8, -1),
];

// Version info coordinates, most significant bit first
pub static VERSION_INFO_COORDS_TR: [(i16, i16); VERSION_INFO_BIT_LEN] = [
    (5, -9),
    (5, -10),
    (5, -11),
    (4, -9),
    (4, -10),
    (4, -11),
    (3, -9),
    (3, -10),
    (3, -11),
    (2, -9),
    (2, -10),
    (2, -11),
    (1, -9),
    (1, -10),
    (1, -11),
    (0, -9),
    (0, -10),
    (0, -11),
];

pub static VERSION_INFO_COORDS_BL: [(i16, i16); VERSION_INFO_BIT_LEN] = [
    (-9, 5),
    (-10, 5),
    (-11, 5),
    (-9, 4),
    (-10, 4),
    (-11, 4),
    (-9, 3),
    (-10, 3),
    (-11, 3),
    (-9, 2),
    (-10, 2),
    (-11, 2),
    (-9, 1),
    (-10, 1),
    (-11, 1),
    (-9, 0),
    (-10, 0),
    (-11, 0),
];

// Indexed by [ec level][version], index 0 is unused so versions stay 1-based
static ECC_PER_BLOCK: [[u8; 41]; 4] = [
    [
        0, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
    [
        0, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ],
    [
        0, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
    [
        0, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
];

static EC_BLOCK_COUNT: [[u8; 41]; 4] = [
    [
        0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12, 13,
        14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ],
    [
        0, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ],
    [
        0, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29,
        34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ],
    [
        0, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ],
];

static ALIGNMENT_PATTERN_POSITIONS: [&[i16]; 40] = [
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
