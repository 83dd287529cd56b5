use std::borrow::Cow;
use std::fmt::{Display, Error, Formatter};
use std::str::FromStr;

use encoding_rs::SHIFT_JIS;

use crate::common::error::{QRError, QRResult};

// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Mode {
    Numeric = 0b0001,
    Alphanumeric = 0b0010,
    Byte = 0b0100,
    Kanji = 0b1000,
}

impl Mode {
    #[inline]
    fn numeric_digit(char: u8) -> u16 {
        debug_assert!(char.is_ascii_digit(), "Invalid numeric data: {char}");
        (char - b'0') as u16
    }

    #[inline]
    fn alphanumeric_digit(char: u8) -> u16 {
        match char {
            b'0'..=b'9' => (char - b'0') as u16,
            b'A'..=b'Z' => (char - b'A' + 10) as u16,
            b' ' => 36,
            b'$' => 37,
            b'%' => 38,
            b'*' => 39,
            b'+' => 40,
            b'-' => 41,
            b'.' => 42,
            b'/' => 43,
            b':' => 44,
            _ => unreachable!("Invalid alphanumeric {char}"),
        }
    }

    // Shift JIS double byte code within one of the two kanji bands
    fn kanji_code(char: char) -> Option<u16> {
        let mut buf = [0; 4];
        let (bytes, _, had_errors) = SHIFT_JIS.encode(char.encode_utf8(&mut buf));
        if had_errors || bytes.len() != 2 {
            return None;
        }
        let code = (bytes[0] as u16) << 8 | bytes[1] as u16;
        matches!(code, 0x8140..=0x9FFC | 0xE040..=0xEBBF).then_some(code)
    }

    pub fn contains(&self, char: char) -> bool {
        match self {
            Self::Numeric => char.is_ascii_digit(),
            Self::Alphanumeric => {
                matches!(char, '0'..='9' | 'A'..='Z' | ' ' | '$' | '%' | '*' | '+' | '-' | '.' | '/' | ':')
            }
            Self::Byte => (char as u32) <= 0xFF,
            Self::Kanji => Self::kanji_code(char).is_some(),
        }
    }

    /// First mode in precedence order (numeric, alphanumeric, byte, kanji) able
    /// to hold every char.
    ///
    /// Content that no single mode holds, such as Latin-1 mixed with kanji or
    /// characters outside both sets, is a deliberate departure from defaulting
    /// to alphanumeric: alphanumeric cannot represent it, so it is sent as UTF-8
    /// in byte mode instead.
    pub fn classify(data: &str) -> Self {
        MODES.iter().copied().find(|m| data.chars().all(|c| m.contains(c))).unwrap_or(Self::Byte)
    }

    // Bytes fed to the bit writer: ASCII for numeric & alphanumeric, ISO-8859-1
    // (or UTF-8 when not representable) for byte, Shift JIS pairs for kanji
    pub fn payload<'a>(&self, data: &'a str) -> QRResult<Cow<'a, [u8]>> {
        match self {
            Self::Numeric | Self::Alphanumeric => {
                if !data.chars().all(|c| self.contains(c)) {
                    return Err(QRError::InvalidChar);
                }
                Ok(Cow::Borrowed(data.as_bytes()))
            }
            Self::Byte => {
                if data.is_ascii() || !data.chars().all(|c| self.contains(c)) {
                    Ok(Cow::Borrowed(data.as_bytes()))
                } else {
                    Ok(Cow::Owned(data.chars().map(|c| c as u8).collect()))
                }
            }
            Self::Kanji => {
                let mut res = Vec::with_capacity(data.len());
                for c in data.chars() {
                    let code = Self::kanji_code(c).ok_or(QRError::InvalidChar)?;
                    res.extend(code.to_be_bytes());
                }
                Ok(Cow::Owned(res))
            }
        }
    }

    pub fn encode_chunk(&self, data: &[u8]) -> u16 {
        let len = data.len();
        match self {
            Self::Numeric => {
                debug_assert!(len <= 3, "Data is too long for numeric conversion: {len}");
                data.iter().fold(0_u16, |n, b| n * 10 + Self::numeric_digit(*b))
            }
            Self::Alphanumeric => {
                debug_assert!(len <= 2, "Data is too long for alphanumeric conversion: {len}");
                data.iter().fold(0_u16, |n, b| n * 45 + Self::alphanumeric_digit(*b))
            }
            Self::Byte => {
                debug_assert!(len == 1, "Data is too long for byte conversion: {len}");
                data[0] as u16
            }
            Self::Kanji => {
                debug_assert!(len == 2, "Kanji chunk must be a Shift JIS pair: {len}");
                let code = (data[0] as u16) << 8 | data[1] as u16;
                let offset = if code <= 0x9FFC { code - 0x8140 } else { code - 0xC140 };
                (offset >> 8) * 0xC0 + (offset & 0xFF)
            }
        }
    }

    // Payload bytes packed into one bit group
    pub fn group_len(&self) -> usize {
        match self {
            Self::Numeric => 3,
            Self::Alphanumeric | Self::Kanji => 2,
            Self::Byte => 1,
        }
    }

    // Number of chars the payload bytes represent
    pub fn char_count(&self, payload_len: usize) -> usize {
        match self {
            Self::Kanji => payload_len / 2,
            _ => payload_len,
        }
    }

    pub fn encoded_len(&self, len: usize) -> usize {
        match *self {
            Self::Numeric => (len * 10).div_ceil(3),
            Self::Alphanumeric => (len * 11).div_ceil(2),
            Self::Byte => len * 8,
            Self::Kanji => (len / 2) * 13,
        }
    }
}

impl FromStr for Mode {
    type Err = QRError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "numeric" | "n" => Ok(Self::Numeric),
            "alphanumeric" | "alnum" | "a" => Ok(Self::Alphanumeric),
            "byte" | "b" => Ok(Self::Byte),
            "kanji" | "k" => Ok(Self::Kanji),
            _ => Err(QRError::InvalidMode),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{self:?}")
    }
}


// Segment
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment<'a> {
    pub mode: Mode,
    pub mode_bits: usize,     // Bit len of mode
    pub len_bits: usize,      // Bit len of char count
    pub data: Cow<'a, [u8]>, // Mode payload bytes
}

impl<'a> Segment<'a> {
    pub fn new(mode: Mode, mode_bits: usize, len_bits: usize, data: Cow<'a, [u8]>) -> Self {
        Self { mode, mode_bits, len_bits, data }
    }

    pub fn char_count(&self) -> usize {
        self.mode.char_count(self.data.len())
    }

    pub fn bit_len(&self) -> usize {
        let encoded_bits = self.mode.encoded_len(self.data.len());
        self.mode_bits + self.len_bits + encoded_bits
    }
}

#[cfg(test)]
mod segment_tests {
    use std::borrow::Cow;

    use test_case::test_case;

    use super::{Mode, Segment};
    use crate::common::Version;

    fn segment(ver: usize, mode: Mode, data: &str) -> Segment {
        let ver = Version::new(ver).unwrap();
        let data = mode.payload(data).unwrap();
        Segment::new(mode, ver.mode_bits(), ver.char_cnt_bits(mode), data)
    }

    #[test_case(1, "123", 24)]
    #[test_case(1, "45", 21)]
    #[test_case(1, "6", 18)]
    #[test_case(10, "123", 26)]
    #[test_case(10, "45", 23)]
    #[test_case(27, "123", 28)]
    #[test_case(27, "6", 22)]
    fn test_bit_len_numeric(ver: usize, data: &str, exp: usize) {
        assert_eq!(segment(ver, Mode::Numeric, data).bit_len(), exp);
    }

    #[test_case(1, "AZ", 24)]
    #[test_case(1, "-", 19)]
    #[test_case(10, "AZ", 26)]
    #[test_case(27, "-", 23)]
    fn test_bit_len_alphanumeric(ver: usize, data: &str, exp: usize) {
        assert_eq!(segment(ver, Mode::Alphanumeric, data).bit_len(), exp);
    }

    #[test_case(1, "a", 20)]
    #[test_case(10, "ab", 36)]
    #[test_case(27, "abc", 44)]
    fn test_bit_len_byte(ver: usize, data: &str, exp: usize) {
        assert_eq!(segment(ver, Mode::Byte, data).bit_len(), exp);
    }

    #[test]
    fn test_bit_len_kanji() {
        let seg = segment(1, Mode::Kanji, "点茗");
        assert_eq!(seg.char_count(), 2);
        assert_eq!(seg.bit_len(), 4 + 8 + 26);
    }

    #[test]
    fn test_borrowed_payload() {
        let seg = segment(1, Mode::Numeric, "01234567");
        assert!(matches!(seg.data, Cow::Borrowed(_)));
        assert_eq!(seg.char_count(), 8);
    }
}

// Global constants
//------------------------------------------------------------------------------

pub static PADDING_CODEWORDS: [u8; 2] = [0b1110_1100, 0b0001_0001];

// Precedence order for classification
pub static MODES: [Mode; 4] = [Mode::Numeric, Mode::Alphanumeric, Mode::Byte, Mode::Kanji];
