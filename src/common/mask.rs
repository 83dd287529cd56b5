use std::fmt::{Display, Error, Formatter};
use std::ops::Deref;

use rayon::prelude::*;
use tracing::debug;

use super::error::{QRError, QRResult};
use super::metadata::Color;
use crate::builder::QR;

#[derive(Debug, Default, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> QRResult<Self> {
        match pattern {
            0..=7 => Ok(Self(pattern)),
            _ => Err(QRError::InvalidMaskingPattern),
        }
    }

    // Lowest 3 bits of the format info data
    pub(crate) fn from_bits(bits: u32) -> Self {
        Self((bits & 0b111) as u8)
    }

    pub fn all() -> impl Iterator<Item = MaskPattern> {
        (0..8).map(MaskPattern)
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for MaskPattern {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self.0)
    }
}

mod mask_functions {
    pub fn checkerboard(r: i16, c: i16) -> bool {
        (r + c) & 1 == 0
    }

    pub fn horizontal_lines(r: i16, _: i16) -> bool {
        r & 1 == 0
    }

    pub fn vertical_lines(_: i16, c: i16) -> bool {
        c % 3 == 0
    }

    pub fn diagonal_lines(r: i16, c: i16) -> bool {
        (r + c) % 3 == 0
    }

    pub fn large_checkerboard(r: i16, c: i16) -> bool {
        ((r >> 1) + (c / 3)) & 1 == 0
    }

    pub fn fields(r: i16, c: i16) -> bool {
        let p = r as i32 * c as i32;
        (p & 1) + (p % 3) == 0
    }

    pub fn diamonds(r: i16, c: i16) -> bool {
        let p = r as i32 * c as i32;
        ((p & 1) + (p % 3)) & 1 == 0
    }

    pub fn meadow(r: i16, c: i16) -> bool {
        let p = r as i32 * c as i32;
        (((r + c) as i32 & 1) + (p % 3)) & 1 == 0
    }
}

impl MaskPattern {
    pub fn mask_functions(self) -> fn(i16, i16) -> bool {
        match *self {
            0b000 => mask_functions::checkerboard,
            0b001 => mask_functions::horizontal_lines,
            0b010 => mask_functions::vertical_lines,
            0b011 => mask_functions::diagonal_lines,
            0b100 => mask_functions::large_checkerboard,
            0b101 => mask_functions::fields,
            0b110 => mask_functions::diamonds,
            0b111 => mask_functions::meadow,
            _ => unreachable!("Invalid mask pattern {}", self.0),
        }
    }
}


// Mask selection
//------------------------------------------------------------------------------

// Scores all 8 masks on independent copies of the grid and applies the one with
// the lowest penalty. Ties go to the lower pattern index.
pub fn apply_best_mask(qr: &mut QR) -> MaskPattern {
    let base: &QR = qr;
    let best_mask = MaskPattern::all()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|mask| {
            let mut qr = base.clone();
            qr.apply_mask(mask);
            let pen = compute_total_penalty(&qr);
            debug!("Mask {}: penalty {pen}", *mask);
            (pen, mask)
        })
        .min()
        .map(|(_, mask)| mask)
        .unwrap_or_default();
    qr.apply_mask(best_mask);
    best_mask
}

pub fn compute_total_penalty(qr: &QR) -> u32 {
    let adj_pen = compute_adjacent_penalty(qr);
    let blk_pen = compute_block_penalty(qr);
    let fp_pen_h = compute_finder_pattern_penalty(qr, true);
    let fp_pen_v = compute_finder_pattern_penalty(qr, false);
    let bal_pen = compute_balance_penalty(qr);
    adj_pen + blk_pen + fp_pen_h + fp_pen_v + bal_pen
}

// Rule 1: every run of 5 or more same coloured modules in a row or column
// scores 3 plus 1 per module beyond 5
fn compute_adjacent_penalty(qr: &QR) -> u32 {
    let run_penalty = |len: u32| if len >= 5 { len - 2 } else { 0 };
    let mut pen = 0;
    let w = qr.width() as i16;
    for i in 0..w {
        let (mut row_clr, mut row_len) = (*qr.get(i, 0), 0);
        let (mut col_clr, mut col_len) = (*qr.get(0, i), 0);
        for j in 0..w {
            let clr = *qr.get(i, j);
            if clr != row_clr {
                pen += run_penalty(row_len);
                row_clr = clr;
                row_len = 0;
            }
            row_len += 1;

            let clr = *qr.get(j, i);
            if clr != col_clr {
                pen += run_penalty(col_len);
                col_clr = clr;
                col_len = 0;
            }
            col_len += 1;
        }
        pen += run_penalty(row_len) + run_penalty(col_len);
    }
    pen
}

// Rule 2: every 2x2 block of one colour scores 3, overlapping blocks included
fn compute_block_penalty(qr: &QR) -> u32 {
    let mut pen = 0;
    let w = qr.width() as i16;
    for r in 0..w - 1 {
        for c in 0..w - 1 {
            let clr = *qr.get(r, c);
            if clr == *qr.get(r + 1, c) && clr == *qr.get(r, c + 1) && clr == *qr.get(r + 1, c + 1)
            {
                pen += 3;
            }
        }
    }
    pen
}

// Rule 3: every 10111010000 run, a 1:1:3:1:1 finder-like pattern followed by
// 4 light modules, scores 40
fn compute_finder_pattern_penalty(qr: &QR, is_hor: bool) -> u32 {
    const PATTERN: u16 = 0b101_1101_0000;
    const WINDOW: u16 = 0b111_1111_1111;

    let mut pen = 0;
    let w = qr.width() as i16;
    for i in 0..w {
        let mut window = 0u16;
        for j in 0..w {
            let clr = if is_hor { *qr.get(i, j) } else { *qr.get(j, i) };
            window = ((window << 1) | (clr == Color::Dark) as u16) & WINDOW;
            if j >= 10 && window == PATTERN {
                pen += 40;
            }
        }
    }
    pen
}

// Rule 4: with k the number of whole 5% steps in the dark ratio, scores 10 times
// the distance of the nearer of 5k and 5(k+1) from 50
fn compute_balance_penalty(qr: &QR) -> u32 {
    let dark_cnt = qr.count_dark_modules();
    let w = qr.width();
    let k = (dark_cnt * 20 / (w * w)) as u32;
    let (lo, hi) = (5 * k, 5 * (k + 1));
    10 * lo.abs_diff(50).min(hi.abs_diff(50))
}
