pub use encode::*;

// Encoder
//------------------------------------------------------------------------------

pub mod encode {
    use tracing::debug;

    use crate::common::codec::{Mode, Segment};
    use crate::common::error::{QRError, QRResult};
    use crate::common::metadata::{ECLevel, Version};
    use crate::common::BitStream;

    use super::writer::{pad_remaining_capacity, push_segment, push_terminator};

    // Encodes data into the smallest version able to hold it
    pub fn encode(
        data: &str,
        ecl: ECLevel,
        mode: Option<Mode>,
    ) -> QRResult<(BitStream, Version, Mode)> {
        let seg = build_segment(data, Version::MIN, mode)?;
        let ver = find_version(seg.char_count(), ecl, seg.mode)?;
        let mode = seg.mode;
        let seg = Segment::new(mode, ver.mode_bits(), ver.char_cnt_bits(mode), seg.data);
        Ok((write_segment(seg, ver, ecl), ver, mode))
    }

    pub fn encode_with_version(
        data: &str,
        ver: Version,
        ecl: ECLevel,
        mode: Option<Mode>,
    ) -> QRResult<(BitStream, Mode)> {
        let seg = build_segment(data, ver, mode)?;
        if seg.char_count() > ver.char_capacity(ecl, seg.mode) {
            return Err(QRError::DataTooLong);
        }
        let mode = seg.mode;
        Ok((write_segment(seg, ver, ecl), mode))
    }

    // Single segment in the explicit mode or the classified one
    fn build_segment(data: &str, ver: Version, mode: Option<Mode>) -> QRResult<Segment> {
        let mode = mode.unwrap_or_else(|| Mode::classify(data));
        let payload = mode.payload(data)?;
        Ok(Segment::new(mode, ver.mode_bits(), ver.char_cnt_bits(mode), payload))
    }

    // Smallest version whose char capacity for the mode fits the char count
    pub fn find_version(char_cnt: usize, ecl: ECLevel, mode: Mode) -> QRResult<Version> {
        Version::all().find(|v| char_cnt <= v.char_capacity(ecl, mode)).ok_or(QRError::DataTooLong)
    }

    fn write_segment(seg: Segment, ver: Version, ecl: ECLevel) -> BitStream {
        let bcap = ver.data_bit_capacity(ecl);
        debug_assert!(
            seg.bit_len() <= bcap,
            "Segment exceeds capacity: Segment {}, Capacity {bcap}",
            seg.bit_len()
        );
        debug!(
            "Writing {:?} segment: {} chars, {} bits of {bcap}",
            seg.mode,
            seg.char_count(),
            seg.bit_len()
        );

        let mut bs = BitStream::new(bcap);
        push_segment(seg, &mut bs);
        push_terminator(&mut bs);
        pad_remaining_capacity(&mut bs);
        bs
    }

    #[cfg(test)]
    mod encode_tests {
        use test_case::test_case;

        use super::{encode, encode_with_version, find_version, ECLevel, Mode, QRError, Version};

        #[test_case("", ECLevel::L, 1, Mode::Numeric)]
        #[test_case("01234567", ECLevel::M, 1, Mode::Numeric)]
        #[test_case("HELLO WORLD", ECLevel::Q, 1, Mode::Alphanumeric)]
        #[test_case("Hello, world!", ECLevel::L, 1, Mode::Byte)]
        #[test_case("点茗", ECLevel::H, 1, Mode::Kanji)]
        #[test_case(&"1".repeat(42), ECLevel::L, 2, Mode::Numeric)]
        #[test_case(&"A".repeat(4296), ECLevel::L, 40, Mode::Alphanumeric)]
        #[test_case(&"a".repeat(2953), ECLevel::L, 40, Mode::Byte)]
        fn test_encode(data: &str, ecl: ECLevel, exp_ver: usize, exp_mode: Mode) {
            let (bs, ver, mode) = encode(data, ecl, None).unwrap();
            assert_eq!(*ver as usize, exp_ver);
            assert_eq!(mode, exp_mode);
            assert_eq!(bs.len(), ver.data_bit_capacity(ecl));
        }

        #[test]
        fn test_encode_hello_world() {
            let (bs, ver, _) = encode("HELLO WORLD", ECLevel::Q, None).unwrap();
            assert_eq!(*ver, 1);
            assert_eq!(bs.data(), &[32, 91, 11, 120, 209, 114, 220, 77, 67, 64, 236, 17, 236]);
        }

        #[test]
        fn test_encode_numeric() {
            let (bs, _, _) = encode("01234567", ECLevel::M, None).unwrap();
            let mut exp: Vec<u8> = vec![0x10, 0x20, 0x0C, 0x56, 0x61, 0x80];
            exp.extend([0xEC, 0x11].iter().cycle().take(10));
            assert_eq!(bs.data(), exp);
        }

        #[test]
        fn test_encode_empty() {
            let (bs, ver, mode) = encode("", ECLevel::L, None).unwrap();
            assert_eq!((*ver, mode), (1, Mode::Numeric));
            let mut exp: Vec<u8> = vec![0b00010000, 0b00000000, 0b00000000];
            exp.extend([0xEC, 0x11].iter().cycle().take(16));
            assert_eq!(bs.data(), exp);
        }

        #[test]
        fn test_encode_explicit_mode() {
            let (_, _, mode) = encode("12345", ECLevel::M, Some(Mode::Byte)).unwrap();
            assert_eq!(mode, Mode::Byte);
            let res = encode("12a45", ECLevel::M, Some(Mode::Numeric));
            assert_eq!(res.err(), Some(QRError::InvalidChar));
        }

        #[test]
        fn test_encode_overflow() {
            let data = "a".repeat(2954);
            assert_eq!(encode(&data, ECLevel::L, None).err(), Some(QRError::DataTooLong));
            let data = "1".repeat(3058);
            assert_eq!(encode(&data, ECLevel::H, None).err(), Some(QRError::DataTooLong));
        }

        #[test]
        fn test_encode_with_version() {
            let ver = Version::new(9).unwrap();
            let (bs, mode) = encode_with_version(&"!".repeat(230), ver, ECLevel::L, None).unwrap();
            assert_eq!(mode, Mode::Byte);
            assert_eq!(bs.len(), ver.data_bit_capacity(ECLevel::L));

            let res = encode_with_version(&"!".repeat(231), ver, ECLevel::L, None);
            assert_eq!(res.err(), Some(QRError::DataTooLong));
        }

        #[test]
        fn test_find_version() {
            assert_eq!(find_version(17, ECLevel::L, Mode::Byte), Ok(Version::new(1).unwrap()));
            assert_eq!(find_version(18, ECLevel::L, Mode::Byte), Ok(Version::new(2).unwrap()));
            assert_eq!(find_version(7089, ECLevel::L, Mode::Numeric), Ok(Version::MAX));
            assert_eq!(find_version(7090, ECLevel::L, Mode::Numeric), Err(QRError::DataTooLong));
        }
    }
}

// Writer for encoded data
//------------------------------------------------------------------------------

pub(super) mod writer {
    use crate::common::codec::{Segment, PADDING_CODEWORDS};
    use crate::common::BitStream;

    pub fn push_segment(seg: Segment, out: &mut BitStream) {
        push_header(&seg, out);
        push_data(&seg, out);
    }

    // Mode indicator followed by the character count
    fn push_header(seg: &Segment, out: &mut BitStream) {
        let char_cnt = seg.char_count();
        debug_assert!(
            char_cnt >> seg.len_bits == 0,
            "Char count overflows its indicator: Count {char_cnt}, Bits {}",
            seg.len_bits
        );
        out.push_bits(seg.mode as u8, seg.mode_bits);
        out.push_bits(char_cnt as u16, seg.len_bits);
    }

    // Payload packed group by group, a short final group takes fewer bits
    fn push_data(seg: &Segment, out: &mut BitStream) {
        let mode = seg.mode;
        for group in seg.data.chunks(mode.group_len()) {
            out.push_bits(mode.encode_chunk(group), mode.encoded_len(group.len()));
        }
    }

    // Up to 4 zero bits, cut short at capacity
    pub fn push_terminator(out: &mut BitStream) {
        out.push_bits(0u8, out.remaining().min(4));
    }

    // Zero bits up to the next byte boundary, then alternating pad codewords
    pub fn pad_remaining_capacity(out: &mut BitStream) {
        out.push_bits(0u8, (8 - out.len() % 8) % 8);
        let pads = PADDING_CODEWORDS.iter().copied().cycle().take(out.remaining() / 8);
        out.extend(&pads.collect::<Vec<_>>());
    }

}
