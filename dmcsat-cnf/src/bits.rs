use anyhow::{anyhow, Result};

/// Physical capacity of every bit vector, in bits.
///
/// The backing store is four 64-bit words regardless of how many bits are
/// logically in use. This limits instances to 256 variables but makes
/// copies and clause mask tests a constant four-word operation.
pub const CAPACITY: usize = 256;

const WORDS: usize = CAPACITY / 64;

/// Fixed-capacity bit vector used for variable assignments and clause masks.
///
/// Bits at index >= the logical bit count are never set; every operation
/// that could touch them is bounds checked against the logical count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitVec256 {
    words: [u64; WORDS],
}

impl BitVec256 {
    pub fn new() -> Self {
        Self { words: [0; WORDS] }
    }

    /// Extract the ith bit. `i >= num_bits` is a caller contract violation.
    #[inline]
    pub fn extract(&self, i: usize, num_bits: usize) -> Result<bool> {
        if i >= num_bits || num_bits > CAPACITY {
            return Err(anyhow!(
                "extract: bit index {} out of range ({})",
                i,
                num_bits
            ));
        }
        Ok(self.words[i >> 6] & (1u64 << (i & 63)) != 0)
    }

    /// Toggle the ith bit in place. `i >= num_bits` is a caller contract
    /// violation.
    #[inline]
    pub fn flip(&mut self, i: usize, num_bits: usize) -> Result<()> {
        if i >= num_bits || num_bits > CAPACITY {
            return Err(anyhow!("flip: bit index {} out of range ({})", i, num_bits));
        }
        self.words[i >> 6] ^= 1u64 << (i & 63);
        Ok(())
    }

    /// Copy the full physical capacity from `src`, not just the logical bits.
    #[inline]
    pub fn copy_from(&mut self, src: &BitVec256) {
        self.words = src.words;
    }

    /// Clear the full physical capacity.
    pub fn zero(&mut self) {
        self.words = [0; WORDS];
    }

    #[inline]
    pub(crate) fn words(&self) -> &[u64; WORDS] {
        &self.words
    }

    /// Render the first `num_bits` bits as a `0`/`1` string, variable 0 first.
    pub fn bitstring(&self, num_bits: usize) -> String {
        (0..num_bits)
            .map(|i| {
                if self.words[i >> 6] & (1u64 << (i & 63)) != 0 {
                    '1'
                } else {
                    '0'
                }
            })
            .collect()
    }

    /// Parse a `0`/`1` string into a bit vector of `num_bits` logical bits.
    pub fn from_bitstring(s: &str) -> Result<(Self, usize)> {
        let num_bits = s.len();
        if num_bits > CAPACITY {
            return Err(anyhow!(
                "bitstring has {} bits, maximum is {}",
                num_bits,
                CAPACITY
            ));
        }
        let mut bits = Self::new();
        for (i, c) in s.chars().enumerate() {
            match c {
                '1' => bits.flip(i, num_bits)?,
                '0' => {}
                _ => return Err(anyhow!("invalid character '{}' in bitstring", c)),
            }
        }
        Ok((bits, num_bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_flip_is_identity() {
        let mut bits = BitVec256::new();
        bits.flip(3, 17).unwrap();
        bits.flip(11, 17).unwrap();
        let before = bits;
        for i in 0..17 {
            bits.flip(i, 17).unwrap();
            bits.flip(i, 17).unwrap();
            assert_eq!(
                bits.extract(i, 17).unwrap(),
                before.extract(i, 17).unwrap()
            );
        }
        assert_eq!(bits, before);
    }

    #[test]
    fn out_of_range_is_an_error() {
        let mut bits = BitVec256::new();
        assert!(bits.extract(17, 17).is_err());
        assert!(bits.flip(256, 256).is_err());
        assert!(bits.extract(0, 257).is_err());
        assert!(bits.flip(64, 64).is_err());
    }

    #[test]
    fn tail_bits_stay_zero() {
        let mut bits = BitVec256::new();
        for i in 0..40 {
            bits.flip(i, 40).unwrap();
        }
        for w in 1..4 {
            // bits 40..63 of word 0 untouched, words 1..3 untouched
            assert_eq!(bits.words()[w], 0);
        }
        assert_eq!(bits.words()[0] >> 40, 0);
    }

    #[test]
    fn copy_covers_full_capacity() {
        let mut src = BitVec256::new();
        src.flip(0, 256).unwrap();
        src.flip(100, 256).unwrap();
        src.flip(255, 256).unwrap();
        let mut dest = BitVec256::new();
        dest.flip(7, 256).unwrap();
        dest.copy_from(&src);
        assert_eq!(dest, src);
    }

    #[test]
    fn bitstring_round_trip() {
        let s = "0110100010";
        let (bits, num_bits) = BitVec256::from_bitstring(s).unwrap();
        assert_eq!(num_bits, 10);
        assert_eq!(bits.bitstring(10), s);
        assert!(BitVec256::from_bitstring("01x0").is_err());
    }
}
