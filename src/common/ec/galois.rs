use std::ops::{Add, AddAssign, Mul};

// Galois field GF(256) element
//------------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct G(pub u8);

impl G {
    pub const ZERO: G = G(0);
    pub const ONE: G = G(1);

    // α^i where α = 2 is the primitive element
    pub fn gen_pow(i: usize) -> Self {
        G(EXP_TABLE[i % 255])
    }

    pub fn log(self) -> usize {
        debug_assert!(self.0 != 0, "Log of zero is undefined");
        LOG_TABLE[self.0 as usize] as usize
    }
}

// Addition and subtraction are both XOR in characteristic 2
impl Add for G {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        G(self.0 ^ rhs.0)
    }
}

impl AddAssign for G {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul for G {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        if self.0 == 0 || rhs.0 == 0 {
            return G::ZERO;
        }
        G(EXP_TABLE[(self.log() + rhs.log()) % 255])
    }
}

// Generator polynomial
//------------------------------------------------------------------------------

// Coefficients of (x - α^0)(x - α^1)...(x - α^(n-1)), highest degree first.
// The leading coefficient is always 1.
pub fn generator_poly(n: usize) -> Vec<G> {
    let mut poly = Vec::with_capacity(n + 1);
    poly.push(G::ONE);
    for i in 0..n {
        let root = G::gen_pow(i);
        poly.push(G::ZERO);
        for j in (1..poly.len()).rev() {
            let prev = poly[j - 1];
            poly[j] += prev * root;
        }
    }
    poly
}

#[cfg(test)]
mod galois_tests {
    use super::{generator_poly, G, EXP_TABLE, LOG_TABLE};

    #[test]
    fn test_tables() {
        assert_eq!(EXP_TABLE[0], 1);
        assert_eq!(EXP_TABLE[8], 0x1D);
        assert_eq!(EXP_TABLE[255], 1);
        for i in 1..256 {
            assert_eq!(EXP_TABLE[LOG_TABLE[i] as usize], i as u8);
        }
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(G(0x53) + G(0xCA), G(0x99));
        assert_eq!(G(0x53) + G(0x53), G::ZERO);
        assert_eq!(G(2) * G(0x80), G(0x1D));
        assert_eq!(G(0) * G(0x80), G::ZERO);
        for i in 1..=255u8 {
            assert_eq!(G(i) * G::ONE, G(i));
            let inv = G::gen_pow(255 - G(i).log());
            assert_eq!(G(i) * inv, G::ONE);
        }
    }

    #[test]
    fn test_generator_poly() {
        let to_u8 = |p: Vec<G>| p.into_iter().map(|g| g.0).collect::<Vec<_>>();
        assert_eq!(to_u8(generator_poly(1)), [1, 1]);
        assert_eq!(to_u8(generator_poly(2)), [1, 3, 2]);
        assert_eq!(to_u8(generator_poly(7)), [1, 127, 122, 154, 164, 11, 68, 117]);
    }

    #[test]
    fn test_generator_poly_roots() {
        let poly = generator_poly(10);
        for i in 0..10 {
            let x = G::gen_pow(i);
            let eval = poly.iter().fold(G::ZERO, |acc, &c| acc * x + c);
            assert_eq!(eval, G::ZERO, "α^{i} is not a root");
        }
    }
}

// Global constants
//------------------------------------------------------------------------------

const PRIMITIVE_POLY: u16 = 0x11D;

pub static EXP_TABLE: [u8; 256] = build_exp_table();

pub static LOG_TABLE: [u8; 256] = build_log_table();

const fn build_exp_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 256 {
        table[i] = x as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE_POLY;
        }
        i += 1;
    }
    table
}

const fn build_log_table() -> [u8; 256] {
    let exp = build_exp_table();
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 255 {
        table[exp[i] as usize] = i as u8;
        i += 1;
    }
    table
}
