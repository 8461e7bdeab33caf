//! Reflected-binary (Gray) code conversion.

use cadc_core::Word;

/// Decode a Gray-coded word.
///
/// Each binary bit is the XOR of every Gray bit at or above it, so the
/// decode walks from bit 19 down with a running XOR.
#[must_use]
pub fn gray_to_binary(gray: Word) -> Word {
    let mut running = false;
    let mut binary = 0u32;
    for n in (0..Word::BITS).rev() {
        running ^= gray.bit(n);
        if running {
            binary |= 1 << n;
        }
    }
    Word::new(binary)
}

/// Encode a binary word as Gray code: each bit is the XOR of itself and
/// the bit above; the MSB passes straight through.
#[must_use]
pub fn binary_to_gray(binary: Word) -> Word {
    let bits = binary.bits();
    Word::new(bits ^ (bits >> 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn known_codes() {
        let table = [(0, 0), (1, 1), (2, 3), (3, 2), (4, 6), (7, 4), (8, 12)];
        for (bin, gray) in table {
            assert_eq!(binary_to_gray(Word::new(bin)), Word::new(gray));
            assert_eq!(gray_to_binary(Word::new(gray)), Word::new(bin));
        }
        assert_eq!(binary_to_gray(Word::MIN), Word::new(0xC_0000));
        assert_eq!(gray_to_binary(Word::new(0x8_0000)), Word::ONES);
    }

    #[test]
    fn adjacent_codes_differ_in_one_bit() {
        for n in 0..4096u32 {
            let a = binary_to_gray(Word::new(n)).bits();
            let b = binary_to_gray(Word::new(n + 1)).bits();
            assert_eq!((a ^ b).count_ones(), 1);
        }
    }

    #[test]
    fn decode_inverts_encode() {
        let mut rng = StdRng::seed_from_u64(0x5EED_0001);
        for _ in 0..20_000 {
            let x = Word::new(rng.gen_range(0..=Word::MASK));
            assert_eq!(gray_to_binary(binary_to_gray(x)), x);
            assert_eq!(binary_to_gray(gray_to_binary(x)), x);
        }
    }
}
