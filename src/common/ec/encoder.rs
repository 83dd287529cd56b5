use super::{
    galois::{generator_poly, G},
    Block,
};

// Error correction codewords
//------------------------------------------------------------------------------

impl Block {
    // Performs polynomial long division of the data polynomial, shifted by the
    // ec length, by the generator polynomial. The coefficients of the remainder
    // are the error correction codewords.
    pub(super) fn compute_ecc(&mut self) {
        let ec_len = self.ec_len();
        if ec_len == 0 {
            return;
        }
        let gen_poly = generator_poly(ec_len);

        let mut rem = [G::ZERO; super::MAX_BLOCK_SIZE];
        for (r, &d) in rem.iter_mut().zip(self.data()) {
            *r = G(d);
        }

        for i in 0..self.dlen {
            let lead_coeff = rem[i];
            if lead_coeff == G::ZERO {
                continue;
            }
            for (r, &g) in rem[i + 1..i + 1 + ec_len].iter_mut().zip(&gen_poly[1..]) {
                *r += g * lead_coeff;
            }
        }

        for (d, r) in self.data[self.dlen..self.len].iter_mut().zip(&rem[self.dlen..self.len]) {
            *d = r.0;
        }
    }
}

pub fn ecc(data: &[u8], ec_len: usize) -> Vec<u8> {
    Block::new(data, ec_len).ecc().to_vec()
}
