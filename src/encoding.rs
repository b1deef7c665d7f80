//! A loaded vocabulary plus its length masks, and the greedy counter over it.
//!
//! At each position the scanner narrows candidate lengths with the masks,
//! then tries them longest first against the vocabulary. The first hit wins.
//! When nothing matches, the byte is counted as a one-byte token, so counts
//! can drift from a real BPE tokenizer on text the vocabulary does not cover.

use std::fmt;

use crate::masks::LengthMasks;
use crate::vocab::Vocabulary;

pub struct Encoding {
    vocab: Vocabulary,
    masks: LengthMasks,
}

impl Encoding {
    pub fn new(vocab: Vocabulary) -> Self {
        let masks = LengthMasks::build(&vocab);
        Encoding { vocab, masks }
    }

    /// Builds an encoding from in-memory tokens. Empty tokens are skipped.
    pub fn from_tokens<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut vocab = Vocabulary::new();
        for token in tokens {
            let token = token.as_ref();
            if !token.is_empty() {
                vocab.insert(token);
            }
        }
        Self::new(vocab)
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn masks(&self) -> &LengthMasks {
        &self.masks
    }

    /// Length of the token chosen at `pos`. Always at least 1.
    #[inline]
    pub fn match_len(&self, bytes: &[u8], pos: usize) -> usize {
        let rest = &bytes[pos..];
        let mut scan = self.masks.candidates(rest);
        while scan != 0 {
            let bit = 63 - scan.leading_zeros() as usize;
            if self.vocab.contains(&rest[..=bit]) {
                return bit + 1;
            }
            scan ^= 1u64 << bit;
        }
        1
    }

    pub fn count_tokens(&self, bytes: &[u8]) -> usize {
        let mut count = 0;
        let mut pos = 0;
        while pos < bytes.len() {
            pos += self.match_len(bytes, pos);
            count += 1;
        }
        count
    }
}

impl fmt::Debug for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoding")
            .field("tokens", &self.vocab.len())
            .finish_non_exhaustive()
    }
}
