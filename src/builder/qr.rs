use std::ops::Deref;
use std::path::Path;

use image::{GrayImage, ImageResult, Luma, Rgb, RgbImage};

use crate::common::codec::Mode;
use crate::common::iter::EncRegionIter;
use crate::common::mask::MaskPattern;
use crate::common::metadata::*;
use crate::common::BitStream;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Module {
    Empty,
    Func(Color),
    Version(Color),
    Format(Color),
    Data(Color),
}

// Unset modules read as light
impl Deref for Module {
    type Target = Color;
    fn deref(&self) -> &Color {
        match self {
            Module::Empty => &Color::Light,
            Module::Func(clr)
            | Module::Version(clr)
            | Module::Format(clr)
            | Module::Data(clr) => clr,
        }
    }
}

#[cfg(test)]
impl Module {
    fn debug_char(self) -> char {
        let (dark, light) = match self {
            Module::Empty => return '.',
            Module::Func(_) => ('f', 'F'),
            Module::Version(_) => ('v', 'V'),
            Module::Format(_) => ('m', 'M'),
            Module::Data(_) => ('d', 'D'),
        };
        self.select(dark, light)
    }
}

#[derive(Debug, Clone)]
pub struct QR {
    grid: Vec<Module>,
    w: usize,
    ver: Version,
    ecl: ECLevel,
    mode: Mode,
    mask: Option<MaskPattern>,
}

// QR type for builder
//------------------------------------------------------------------------------

impl QR {
    pub fn new(ver: Version, ecl: ECLevel, mode: Mode) -> Self {
        let w = ver.width();
        Self { grid: vec![Module::Empty; w * w], w, ver, ecl, mode, mask: None }
    }

    pub fn grid(&self) -> &[Module] {
        &self.grid
    }

    pub fn version(&self) -> Version {
        self.ver
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ecl
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn mask(&self) -> Option<MaskPattern> {
        self.mask
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::new(Some(self.ver), self.ecl, Some(self.mode), self.mask)
    }

    pub fn is_dark(&self, r: usize, c: usize) -> bool {
        debug_assert!(r < self.w && c < self.w, "Coordinate out of bounds: Row {r}, Col {c}");
        *self.grid[r * self.w + c] == Color::Dark
    }

    /// Row-major grid of modules, `true` for dark.
    pub fn to_bools(&self) -> Vec<Vec<bool>> {
        let dark_row =
            |row: &[Module]| -> Vec<bool> { row.iter().map(|m| **m == Color::Dark).collect() };
        self.grid.chunks(self.w).map(dark_row).collect()
    }

    pub fn count_dark_modules(&self) -> usize {
        self.grid.iter().filter(|&m| matches!(**m, Color::Dark)).count()
    }

    // One char per module, f/v/m/d for function, version, format and data
    // modules, uppercase when light and '.' when unset
    #[cfg(test)]
    pub fn to_debug_str(&self) -> String {
        let mut res = String::from("\n");
        for row in self.grid.chunks(self.w) {
            res.extend(row.iter().map(|m| m.debug_char()));
            res.push('\n');
        }
        res
    }

    // Negative coordinates count back from the bottom/right edge
    fn index(&self, r: i16, c: i16) -> usize {
        let w = self.w as i16;
        debug_assert!((-w..w).contains(&r), "Row out of bounds: Row {r}, Width {w}");
        debug_assert!((-w..w).contains(&c), "Column out of bounds: Col {c}, Width {w}");
        (r.rem_euclid(w) * w + c.rem_euclid(w)) as usize
    }

    pub fn get(&self, r: i16, c: i16) -> Module {
        self.grid[self.index(r, c)]
    }

    pub fn set(&mut self, r: i16, c: i16, module: Module) {
        let i = self.index(r, c);
        self.grid[i] = module;
    }
}


// Finder patterns
//------------------------------------------------------------------------------

impl QR {
    // Finders in the top left, top right and bottom left corners, plus the dark
    // module beside the bottom left separator at row 4v + 9
    fn draw_finder_patterns(&mut self) {
        let far = self.w as i16 - 7;
        for (r, c) in [(0, 0), (0, far), (far, 0)] {
            self.draw_finder_pattern_at(r, c);
        }
        self.set(-8, 8, Module::Func(Color::Dark));
    }

    // Colours the 9x9 square around the finder whose top left module is at
    // (r0, c0) by ring distance from its centre: rings 0, 1 and 3 are dark,
    // ring 2 is light and ring 4 is the separator. The separator is clipped at
    // the symbol edge.
    fn draw_finder_pattern_at(&mut self, r0: i16, c0: i16) {
        let last = self.w as i16 - 1;
        for r in (r0 - 1).max(0)..=(r0 + 7).min(last) {
            for c in (c0 - 1).max(0)..=(c0 + 7).min(last) {
                let ring = (r - r0 - 3).abs().max((c - c0 - 3).abs());
                self.set(r, c, Module::Func(Color::from(ring != 2 && ring != 4)));
            }
        }
    }
}


// Timing patterns
//------------------------------------------------------------------------------

impl QR {
    // Row 6 and column 6 between the separators, dark on even indices
    fn draw_timing_patterns(&mut self) {
        let w = self.w as i16;
        for i in 8..w - 8 {
            let module = Module::Func(Color::from(i % 2 == 0));
            self.set(6, i, module);
            self.set(i, 6, module);
        }
    }
}


// Alignment patterns
//------------------------------------------------------------------------------

impl QR {
    // Every pairing of the version's centre coordinates, except the centres a
    // finder already covers
    fn draw_alignment_patterns(&mut self) {
        let centres = self.ver.alignment_pattern();
        for &r in centres {
            for &c in centres {
                if self.get(r, c) == Module::Empty {
                    self.draw_alignment_pattern_at(r, c);
                }
            }
        }
    }

    // 5x5 with a dark centre, a light ring 1 and a dark ring 2
    fn draw_alignment_pattern_at(&mut self, r: i16, c: i16) {
        for dr in -2..=2i16 {
            for dc in -2..=2i16 {
                let ring = dr.abs().max(dc.abs());
                self.set(r + dr, c + dc, Module::Func(Color::from(ring != 1)));
            }
        }
    }
}

#[cfg(test)]
mod alignment_pattern_tests {
    use crate::builder::QR;
    use crate::common::codec::Mode;
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_alignment_pattern_1() {
        let mut qr = QR::new(Version::new(1).unwrap(), ECLevel::L, Mode::Byte);
        qr.draw_alignment_patterns();
        assert!(qr.grid().iter().all(|m| *m == crate::builder::Module::Empty));
    }

    #[test]
    fn test_alignment_pattern_3() {
        let mut qr = QR::new(Version::new(3).unwrap(), ECLevel::L, Mode::Byte);
        qr.draw_finder_patterns();
        qr.draw_alignment_patterns();
        assert_eq!(
            qr.to_debug_str(),
            "\n\
             fffffffF.............Ffffffff\n\
             fFFFFFfF.............FfFFFFFf\n\
             fFfffFfF.............FfFfffFf\n\
             fFfffFfF.............FfFfffFf\n\
             fFfffFfF.............FfFfffFf\n\
             fFFFFFfF.............FfFFFFFf\n\
             fffffffF.............Ffffffff\n\
             FFFFFFFF.............FFFFFFFF\n\
             .............................\n\
             .............................\n\
             .............................\n\
             .............................\n\
             .............................\n\
             .............................\n\
             .............................\n\
             .............................\n\
             .............................\n\
             .............................\n\
             .............................\n\
             .............................\n\
             ....................fffff....\n\
             FFFFFFFFf...........fFFFf....\n\
             fffffffF............fFfFf....\n\
             fFFFFFfF............fFFFf....\n\
             fFfffFfF............fffff....\n\
             fFfffFfF.....................\n\
             fFfffFfF.....................\n\
             fFFFFFfF.....................\n\
             fffffffF.....................\n"
        );
    }

    #[test]
    fn test_alignment_pattern_7() {
        let mut qr = QR::new(Version::new(7).unwrap(), ECLevel::L, Mode::Byte);
        qr.draw_finder_patterns();
        qr.draw_alignment_patterns();
        assert_eq!(
            qr.to_debug_str(),
            "\n\
             fffffffF.............................Ffffffff\n\
             fFFFFFfF.............................FfFFFFFf\n\
             fFfffFfF.............................FfFfffFf\n\
             fFfffFfF.............................FfFfffFf\n\
             fFfffFfF............fffff............FfFfffFf\n\
             fFFFFFfF............fFFFf............FfFFFFFf\n\
             fffffffF............fFfFf............Ffffffff\n\
             FFFFFFFF............fFFFf............FFFFFFFF\n\
             ....................fffff....................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             ....fffff...........fffff...........fffff....\n\
             ....fFFFf...........fFFFf...........fFFFf....\n\
             ....fFfFf...........fFfFf...........fFfFf....\n\
             ....fFFFf...........fFFFf...........fFFFf....\n\
             ....fffff...........fffff...........fffff....\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             .............................................\n\
             ....................fffff...........fffff....\n\
             FFFFFFFFf...........fFFFf...........fFFFf....\n\
             fffffffF............fFfFf...........fFfFf....\n\
             fFFFFFfF............fFFFf...........fFFFf....\n\
             fFfffFfF............fffff...........fffff....\n\
             fFfffFfF.....................................\n\
             fFfffFfF.....................................\n\
             fFFFFFfF.....................................\n\
             fffffffF.....................................\n"
        );
    }
}

// All function patterns
//------------------------------------------------------------------------------

impl QR {
    // Alignment before timing: a centre counts as taken only under a finder.
    // Centres sit on even indices, so modules shared with timing agree.
    pub(crate) fn draw_all_function_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_alignment_patterns();
        self.draw_timing_patterns();
    }
}


// Format & version info
//------------------------------------------------------------------------------

impl QR {
    fn reserve_format_area(&mut self) {
        self.draw_format_info((1 << FORMAT_INFO_BIT_LEN) - 1);
    }

    fn draw_format_info(&mut self, info: u32) {
        let copies = [&FORMAT_INFO_COORDS_QR_MAIN[..], &FORMAT_INFO_COORDS_QR_SIDE[..]];
        self.draw_info(info, &copies, Module::Format);
    }

    fn draw_version_info(&mut self) {
        if *self.ver < 7 {
            return;
        }
        let copies = [&VERSION_INFO_COORDS_BL[..], &VERSION_INFO_COORDS_TR[..]];
        self.draw_info(self.ver.info(), &copies, Module::Version);
    }

    // Writes `info` onto every copy, its most significant bit on the first coordinate
    fn draw_info(&mut self, info: u32, copies: &[&[(i16, i16)]], kind: fn(Color) -> Module) {
        for coords in copies {
            let top = coords.len() - 1;
            for (i, &(r, c)) in coords.iter().enumerate() {
                let bit = (info >> (top - i)) & 1 == 1;
                self.set(r, c, kind(Color::from(bit)));
            }
        }
    }

    fn read_info(&self, coords: &[(i16, i16)]) -> u32 {
        coords.iter().fold(0, |acc, &(r, c)| (acc << 1) | (*self.get(r, c) == Color::Dark) as u32)
    }

    /// Format info read from the copy around the top left finder.
    pub fn read_format_info(&self) -> u32 {
        self.read_info(&FORMAT_INFO_COORDS_QR_MAIN)
    }

    /// Format info read from the copy split between the other two finders.
    pub fn read_format_info_side(&self) -> u32 {
        self.read_info(&FORMAT_INFO_COORDS_QR_SIDE)
    }
}


// Encoding region
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn draw_encoding_region(&mut self, payload: BitStream) {
        self.reserve_format_area();
        self.draw_version_info();
        self.draw_payload(payload);

        debug_assert!(!self.grid.contains(&Module::Empty), "Empty module found after placement");
    }

    // Walks the region in placement order, filling unset modules with payload
    // bits and then with light remainder bits
    fn draw_payload(&mut self, mut payload: BitStream) {
        let mut remainder = 0;
        for (r, c) in EncRegionIter::new(self.ver) {
            if self.get(r, c) != Module::Empty {
                continue;
            }
            let bit = match payload.next() {
                Some(bit) => bit,
                None => {
                    remainder += 1;
                    false
                }
            };
            self.set(r, c, Module::Data(Color::from(bit)));
        }
        debug_assert!(payload.next().is_none(), "Payload overflows region: Version {}", self.ver);
        debug_assert_eq!(remainder, self.ver.remainder_bits(), "Remainder bits: Ver {}", self.ver);
    }

    /// Flips every data module the pattern selects and redraws format info for it.
    pub fn apply_mask(&mut self, pattern: MaskPattern) {
        let flip = pattern.mask_functions();
        let w = self.w;
        for (i, module) in self.grid.iter_mut().enumerate() {
            if let Module::Data(clr) = module {
                if flip((i / w) as i16, (i % w) as i16) {
                    *clr = !*clr;
                }
            }
        }
        self.mask = Some(pattern);
        self.draw_format_info(format_info(self.ecl, pattern));
    }
}


// Render
//------------------------------------------------------------------------------

impl QR {
    // Light quiet zone width around the symbol, in modules
    pub const QUIET_ZONE: usize = 4;

    pub fn render(&self, module_sz: u32) -> GrayImage {
        self.render_with(module_sz, Luma([0]), Luma([255]))
    }

    pub fn render_color(&self, module_sz: u32, dark: Rgb<u8>, light: Rgb<u8>) -> RgbImage {
        self.render_with(module_sz, dark, light)
    }

    fn render_with<P: image::Pixel>(
        &self,
        module_sz: u32,
        dark: P,
        light: P,
    ) -> image::ImageBuffer<P, Vec<P::Subpixel>> {
        let side = self.side_len(module_sz as usize) as u32;
        image::ImageBuffer::from_fn(side, side, |x, y| {
            self.color_at(x as usize, y as usize, module_sz as usize).select(dark, light)
        })
    }

    /// Terminal rendering, `module_sz` characters per module. Light modules are
    /// full blocks.
    pub fn to_str(&self, module_sz: usize) -> String {
        let side = self.side_len(module_sz);
        let mut canvas = String::with_capacity(side * (side * 3 + 1));
        for y in 0..side {
            canvas.extend((0..side).map(|x| self.color_at(x, y, module_sz).select(' ', '█')));
            canvas.push('\n');
        }
        canvas
    }

    // Rendered width including the quiet zone on both sides
    fn side_len(&self, module_sz: usize) -> usize {
        (self.w + 2 * Self::QUIET_ZONE) * module_sz
    }

    // Colour under point (x, y) of a render with `module_sz` units per module
    fn color_at(&self, x: usize, y: usize, module_sz: usize) -> Color {
        let qz = Self::QUIET_ZONE;
        let (r, c) = (y / module_sz, x / module_sz);
        if r < qz || c < qz || r >= qz + self.w || c >= qz + self.w {
            return Color::Light;
        }
        *self.get((r - qz) as i16, (c - qz) as i16)
    }

    /// Saves the rendered symbol; the format follows the file extension. BMP
    /// output is a 24-bit bitmap.
    pub fn save<P: AsRef<Path>>(&self, path: P, module_sz: u32) -> ImageResult<()> {
        self.render_color(module_sz, Rgb([0, 0, 0]), Rgb([255, 255, 255])).save(path)
    }
}
