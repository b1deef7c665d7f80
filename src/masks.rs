//! Length-mask index over a vocabulary.
//!
//! Bit `k` of a mask means "some token of length `k + 1` starts here". The
//! one-byte table defaults to bit 0 so a single-byte candidate always
//! exists; the two-byte table defaults to zero (no refinement).

use crate::vocab::Vocabulary;

/// Longest match the scanner will ever try. Longer tokens are stored but
/// recorded at this length in the masks, so they never match.
pub const MAX_TOKEN_LEN: usize = 64;

const PAIR_TABLE_LEN: usize = 1 << 16;

pub struct LengthMasks {
    by_first: [u64; 256],
    by_first_two: Box<[u64]>,
}

#[inline(always)]
fn pair_key(a: u8, b: u8) -> usize {
    ((a as usize) << 8) | b as usize
}

/// Mask with the low `width` bits set, `width` in `1..=64`.
#[inline(always)]
fn width_mask(width: usize) -> u64 {
    if width >= MAX_TOKEN_LEN {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

impl LengthMasks {
    pub fn build(vocab: &Vocabulary) -> Self {
        let mut masks = LengthMasks {
            by_first: [1u64; 256],
            by_first_two: vec![0u64; PAIR_TABLE_LEN].into_boxed_slice(),
        };
        for token in vocab.iter() {
            masks.record(token);
        }
        masks
    }

    fn record(&mut self, token: &[u8]) {
        let Some(&first) = token.first() else {
            return;
        };
        let bit = 1u64 << (token.len().min(MAX_TOKEN_LEN) - 1);
        self.by_first[first as usize] |= bit;
        if let Some(&second) = token.get(1) {
            self.by_first_two[pair_key(first, second)] |= bit;
        }
    }

    pub fn by_first(&self, b: u8) -> u64 {
        self.by_first[b as usize]
    }

    pub fn by_first_two(&self, a: u8, b: u8) -> u64 {
        self.by_first_two[pair_key(a, b)]
    }

    /// Candidate match lengths for the start of `rest`, as a bit mask.
    ///
    /// A non-zero two-byte mask replaces the one-byte mask, keeping bit 0.
    /// Bits for lengths beyond `rest.len()` are cleared. `rest` must be
    /// non-empty.
    #[inline]
    pub fn candidates(&self, rest: &[u8]) -> u64 {
        let remain = rest.len().min(MAX_TOKEN_LEN);
        let mut m = self.by_first[rest[0] as usize];
        if remain >= 2 {
            let m2 = self.by_first_two[pair_key(rest[0], rest[1])];
            if m2 != 0 {
                m = m2 | 1;
            }
        }
        m & width_mask(remain)
    }
}
