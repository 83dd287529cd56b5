mod qr;

pub use qr::{Module, QR};

use std::ops::Deref;

use tracing::{debug, info, warn};

use crate::common::{
    codec::{encode, encode_with_version, Mode},
    ec::ecc,
    error::QRResult,
    mask::{apply_best_mask, MaskPattern},
    metadata::{ECLevel, Metadata, Version},
    BitStream,
};

#[derive(Debug, Clone)]
pub struct QRBuilder<'a> {
    data: &'a str,
    version: Option<Version>,
    ec_level: ECLevel,
    mode: Option<Mode>,
    mask: Option<MaskPattern>,
}

impl<'a> QRBuilder<'a> {
    pub fn new(data: &'a str) -> Self {
        Self { data, version: None, ec_level: ECLevel::M, mode: None, mask: None }
    }

    pub fn data(&mut self, data: &'a str) -> &mut Self {
        self.data = data;
        self
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    /// Sets the version from a raw number. Anything outside 1..=40 falls back
    /// to automatic selection.
    pub fn version_number(&mut self, version: usize) -> &mut Self {
        self.version = match Version::new(version) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Version {version} is out of range, selecting version automatically");
                None
            }
        };
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    /// Sets the level from its letter. Unknown letters fall back to M.
    pub fn ec_level_char(&mut self, ec_level: char) -> &mut Self {
        if !"LMQHlmqh".contains(ec_level) {
            warn!("Unknown ec level {ec_level:?}, using {}", ECLevel::default());
        }
        self.ec_level = ECLevel::from_char_or_default(ec_level);
        self
    }

    pub fn mode(&mut self, mode: Mode) -> &mut Self {
        self.mode = Some(mode);
        self
    }

    pub fn unset_mode(&mut self) -> &mut Self {
        self.mode = None;
        self
    }

    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    pub fn unset_mask(&mut self) -> &mut Self {
        self.mask = None;
        self
    }

    /// Sets the mask from a raw number. Anything outside 0..=7 falls back to
    /// the penalty search.
    pub fn mask_number(&mut self, mask: u8) -> &mut Self {
        self.mask = match MaskPattern::new(mask) {
            Ok(m) => Some(m),
            Err(_) => {
                warn!("Mask {mask} is out of range, selecting mask automatically");
                None
            }
        };
        self
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::new(self.version, self.ec_level, self.mode, self.mask)
    }
}


impl QRBuilder<'_> {
    pub fn build(&self) -> QRResult<QR> {
        info!("Generating QR {}", self.metadata());

        // Encode data into the requested or smallest fitting version
        let (encoded_data, version, mode) = match self.version {
            Some(v) => {
                let (encoded_data, mode) =
                    encode_with_version(self.data, v, self.ec_level, self.mode)?;
                (encoded_data, v, mode)
            }
            None => encode(self.data, self.ec_level, self.mode)?,
        };
        debug!("Encoded {} bits as {mode} in version {version}", encoded_data.len());

        let total_codewords = version.total_codewords();
        let data_len = version.data_codewords(self.ec_level);

        // Compute error correction codewords, then interleave both into the payload
        let (data_blocks, ecc_blocks) =
            Self::compute_ecc(encoded_data.data(), version, self.ec_level);
        debug!(
            "Split into {} blocks with {} ec codewords each",
            data_blocks.len(),
            version.ecc_per_block(self.ec_level)
        );
        let mut payload = BitStream::new(total_codewords << 3);
        payload.extend(&Self::interleave(&data_blocks));
        payload.extend(&Self::interleave(&ecc_blocks));

        let mut qr = QR::new(version, self.ec_level, mode);
        qr.draw_all_function_patterns();
        qr.draw_encoding_region(payload);

        let mask = match self.mask {
            Some(m) => {
                qr.apply_mask(m);
                m
            }
            None => apply_best_mask(&mut qr),
        };

        let total_modules = version.width() * version.width();
        let dark_modules = qr.count_dark_modules();
        info!("Generated QR {}", qr.metadata());
        info!(
            "Data capacity: {data_len}, Error capacity: {}, Mask: {mask}, Dark modules: {dark_modules} ({}%)",
            Self::ec_capacity(version, self.ec_level),
            dark_modules * 100 / total_modules
        );

        Ok(qr)
    }

    // ECC: Error Correction Codeword generator
    fn compute_ecc(data: &[u8], version: Version, ec_level: ECLevel) -> (Vec<&[u8]>, Vec<Vec<u8>>) {
        let data_blocks = Self::blockify(data, version, ec_level);

        let ecc_size_per_block = version.ecc_per_block(ec_level);
        let ecc_blocks = data_blocks.iter().map(|b| ecc(b, ecc_size_per_block)).collect::<Vec<_>>();

        (data_blocks, ecc_blocks)
    }

    pub(crate) fn blockify(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<&[u8]> {
        let (block1_size, block1_count, block2_size, block2_count) =
            version.data_codewords_per_block(ec_level);

        let total_blocks = block1_count + block2_count;
        let total_block1_size = block1_size * block1_count;
        let total_size = total_block1_size + block2_size * block2_count;

        debug_assert!(
            total_size == data.len(),
            "Data len doesn't match total size of blocks: Data len {}, Total block size {}",
            data.len(),
            total_size
        );

        let mut data_blocks = Vec::with_capacity(total_blocks);
        data_blocks.extend(data[..total_block1_size].chunks(block1_size));
        if block2_size > 0 {
            data_blocks.extend(data[total_block1_size..].chunks(block2_size));
        }
        data_blocks
    }

    /// Number of codeword errors the symbol can correct. Small symbols reserve
    /// a few codewords for misdecode protection.
    pub fn ec_capacity(version: Version, ec_level: ECLevel) -> usize {
        let p = match (*version, ec_level) {
            (1, ECLevel::L) => 3,
            (2, ECLevel::L) | (1, ECLevel::M) => 2,
            (1, _) | (3, ECLevel::L) => 1,
            _ => 0,
        };

        let ec_bytes = version.block_count(ec_level) * version.ecc_per_block(ec_level);

        (ec_bytes - p) / 2
    }

    pub fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
        let max_block_size = blocks.iter().map(|b| b.len()).max().unwrap_or(0);
        let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
        let mut res = Vec::with_capacity(total_size);
        for i in 0..max_block_size {
            for b in blocks {
                if i < b.len() {
                    res.push(b[i]);
                }
            }
        }
        res
    }
}

#[cfg(test)]
mod builder_tests {
    use test_case::test_case;

    use super::QRBuilder;
    use crate::common::{ECLevel, MaskPattern, Mode, QRError, Version};

    #[test]
    fn test_add_ec_simple() {
        let msg = b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11";
        let expected_ecc = [b"\xc4\x23\x27\x77\xeb\xd7\xe7\xe2\x5d\x17"];
        let (_, ecc) = QRBuilder::compute_ecc(msg, Version::new(1).unwrap(), ECLevel::M);
        assert_eq!(&*ecc, expected_ecc);
    }

    #[test]
    fn test_add_ec_complex() {
        let msg = b"CUF\x86W&U\xc2w2\x06\x12\x06g&\xf6\xf6B\x07v\x86\xf2\x07&V\x16\xc6\xc7\x92\x06\
                    \xb6\xe6\xf7w2\x07v\x86W&R\x06\x86\x972\x07F\xf7vV\xc2\x06\x972\x10\xec\x11\xec\
                    \x11\xec\x11\xec";
        let expected_ec = [
            b"\xd5\xc7\x0b\x2d\x73\xf7\xf1\xdf\xe5\xf8\x9a\x75\x9a\x6f\x56\xa1\x6f\x27",
            b"\x57\xcc\x60\x3c\xca\xb6\x7c\x9d\xc8\x86\x1b\x81\xd1\x11\xa3\xa3\x78\x85",
            b"\x94\x74\xb1\xd4\x4c\x85\x4b\xf2\xee\x4c\xc3\xe6\xbd\x0a\x6c\xf0\xc0\x8d",
            b"\xeb\x9f\x05\xad\x18\x93\x3b\x21\x6a\x28\xff\xac\x52\x02\x83\x20\xb2\xec",
        ];
        let (data, ecc) = QRBuilder::compute_ecc(msg, Version::new(5).unwrap(), ECLevel::Q);
        assert_eq!(data.iter().map(|b| b.len()).collect::<Vec<_>>(), [15, 15, 16, 16]);
        assert_eq!(&*ecc, &expected_ec[..]);
    }

    #[test]
    fn test_interleave() {
        let blocks = vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9, 0]];
        let interleaved = QRBuilder::interleave(&blocks);
        let exp_interleaved = vec![1, 4, 7, 2, 5, 8, 3, 6, 9, 0];
        assert_eq!(interleaved, exp_interleaved);
    }

    #[test_case(1, ECLevel::L, 2)]
    #[test_case(1, ECLevel::M, 4)]
    #[test_case(1, ECLevel::H, 8)]
    #[test_case(3, ECLevel::L, 7)]
    #[test_case(5, ECLevel::Q, 36)]
    #[test_case(40, ECLevel::H, 1215)]
    fn test_ec_capacity(ver: usize, ecl: ECLevel, exp: usize) {
        assert_eq!(QRBuilder::ec_capacity(Version::new(ver).unwrap(), ecl), exp);
    }

    #[test]
    fn test_hello_world() {
        let qr = QRBuilder::new("HELLO WORLD").ec_level(ECLevel::Q).build().unwrap();
        assert_eq!(qr.version(), Version::new(1).unwrap());
        assert_eq!(qr.mode(), Mode::Alphanumeric);
        assert_eq!(qr.mask(), Some(MaskPattern::new(0).unwrap()));
        assert_eq!(
            qr.to_debug_str(),
            "\n\
             fffffffFmdDDDFfffffff\n\
             fFFFFFfFmDDdDFfFFFFFf\n\
             fFfffFfFmDDddFfFfffFf\n\
             fFfffFfFmDDDDFfFfffFf\n\
             fFfffFfFmDdDDFfFfffFf\n\
             fFFFFFfFMDdDDFfFFFFFf\n\
             fffffffFfFfFfFfffffff\n\
             FFFFFFFFmDDDDFFFFFFFF\n\
             MmmMmMfmMDDDdMmMmmmmm\n\
             DdDDDDFDddddDDDDdDDDd\n\
             DDddDdfdDddDDDdDddDDD\n\
             DddDddFdDDddDdDdDdddD\n\
             dDDDdDfDdDdddDdddDdDd\n\
             FFFFFFFFfdDdDDdDDDdDd\n\
             fffffffFmDdDDDDdDddDD\n\
             fFFFFFfFMdDddDddDdDDD\n\
             fFfffFfFmDdDDDddddddd\n\
             fFfffFfFMdDdDdDdDDDdD\n\
             fFfffFfFmDDdDdddDdDDd\n\
             fFFFFFfFmDddddDDDdDdd\n\
             fffffffFMDDdDdddDDDDd\n"
        );
    }

    #[test]
    fn test_empty_data() {
        let qr = QRBuilder::new("").ec_level(ECLevel::L).build().unwrap();
        assert_eq!(qr.version(), Version::new(1).unwrap());
        assert_eq!(qr.mode(), Mode::Numeric);
        assert_eq!(qr.width(), 21);
    }

    #[test]
    fn test_explicit_mode_mismatch() {
        let res = QRBuilder::new("hello").mode(Mode::Numeric).build();
        assert_eq!(res.err(), Some(QRError::InvalidChar));
    }

    #[test]
    fn test_builder_data_overflow() {
        let data = "1234567890".repeat(306);
        let res =
            QRBuilder::new(&data).version(Version::new(40).unwrap()).ec_level(ECLevel::H).build();
        assert_eq!(res.err(), Some(QRError::DataTooLong));
        let res = QRBuilder::new(&data).ec_level(ECLevel::H).build();
        assert_eq!(res.err(), Some(QRError::DataTooLong));
    }

    #[test]
    fn test_explicit_version_too_small() {
        let res = QRBuilder::new("Hello, world! Hello!").version(Version::new(1).unwrap()).build();
        assert_eq!(res.err(), Some(QRError::DataTooLong));
    }

    #[test_case("Hello, world!🌎".to_string(), 1, ECLevel::L)]
    #[test_case("TEST".to_string(), 1, ECLevel::M)]
    #[test_case("12345".to_string(), 1, ECLevel::Q)]
    #[test_case("OK".to_string(), 1, ECLevel::H)]
    #[test_case("B3@j🎮#Z%8v🍣K!🔑3zC^8📖&r💾F9*🔐b6🌼".repeat(3), 7, ECLevel::L)]
    #[test_case("A11111111111111".repeat(11), 7, ECLevel::M)]
    #[test_case("aAAAAAA1111111111111AAAAAAa".repeat(3), 7, ECLevel::Q)]
    #[test_case("1234567890".repeat(15), 7, ECLevel::H)]
    #[test_case("B3@j🎮#Z%8v🍣K!🔑3zC^8📖&r💾F9*🔐b6🌼".repeat(4), 10, ECLevel::L)]
    #[test_case("A11111111111111".repeat(20), 10, ECLevel::M)]
    #[test_case("aAAAAAAAAA1111111111111111AAAAAAAAAAa".repeat(4), 10, ECLevel::Q)]
    #[test_case("1234567890".repeat(28), 10, ECLevel::H)]
    #[test_case("B3@j🎮#Z%8v🍣K!🔑3zC^8📖&r💾F9*🔐b6🌼".repeat(22), 27, ECLevel::L)]
    #[test_case("A111111111111111".repeat(100), 27, ECLevel::M)]
    #[test_case("aAAAAAAAAA111111111111111111AAAAAAAAAAa".repeat(20), 27, ECLevel::Q)]
    #[test_case("1234567890".repeat(145), 27, ECLevel::H)]
    #[test_case("B3@j🎮#Z%8v🍣K!🔑3zC^8📖&r💾F9*🔐b6🌼".repeat(57), 40, ECLevel::L)]
    #[test_case("A111111111111111".repeat(97), 40, ECLevel::M)]
    #[test_case("aAAAAAAAAA111111111111111111AAAAAAAAAAa".repeat(42), 40, ECLevel::Q)]
    #[test_case("1234567890".repeat(305), 40, ECLevel::H)]
    fn test_builder(data: String, version: usize, ec_level: ECLevel) {
        let qr = QRBuilder::new(&data)
            .version(Version::new(version).unwrap())
            .ec_level(ec_level)
            .build()
            .unwrap();
        let gray = qr.render(6);
        let (w, h) = (gray.width() as usize, gray.height() as usize);

        let mut img = rqrr::PreparedImage::prepare_from_greyscale(w, h, |x, y| {
            gray.get_pixel(x as u32, y as u32).0[0]
        });
        let grids = img.detect_grids();
        assert_eq!(grids.len(), 1);
        let (meta, content) = grids[0].decode().unwrap();

        assert_eq!(version, meta.version.0 as usize);
        assert_eq!(qr.mask().map(|m| *m as usize), Some(meta.mask as usize));
        assert_eq!(data, content);
    }
}
