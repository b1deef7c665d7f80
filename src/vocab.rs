//! Vocabulary store: a frozen hash set of token byte strings.
//!
//! All token bytes live back to back in one append-only string pool; the
//! open-addressing slot table only records `(hash, offset, len)`. Lookups
//! compare borrowed slices of the pool, so no token is ever copied after
//! insertion and every `&[u8]` handed out stays valid as long as the store.
//!
//! Slot hashes are FNV-1a with the low bit forced on, so a zero hash marks
//! an empty slot.

use std::fmt;

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

#[inline]
pub fn fnv_hash(data: &[u8]) -> u64 {
    let mut h = FNV_OFFSET;
    for &b in data {
        h ^= b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h | 1
}

#[derive(Clone, Copy, Default)]
struct Slot {
    hash: u64,
    off: usize,
    len: usize,
}

pub struct Vocabulary {
    slots: Vec<Slot>,
    pool: Vec<u8>,
    len: usize,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Sized so that `n` tokens fit under a 3/4 load factor without a rehash.
    pub fn with_capacity(n: usize) -> Self {
        let num_slots = (n * 4).div_ceil(3).next_power_of_two().max(4);
        Vocabulary {
            slots: vec![Slot::default(); num_slots],
            pool: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `token`, returning `false` if an equal token is already stored.
    pub fn insert(&mut self, token: &[u8]) -> bool {
        let h = fnv_hash(token);
        if self.find(token, h).is_some() {
            return false;
        }
        if (self.len + 1) * 4 > self.slots.len() * 3 {
            self.grow();
        }

        let off = self.pool.len();
        self.pool.extend_from_slice(token);
        place(
            &mut self.slots,
            Slot {
                hash: h,
                off,
                len: token.len(),
            },
        );
        self.len += 1;
        true
    }

    #[inline]
    pub fn contains(&self, key: &[u8]) -> bool {
        self.find(key, fnv_hash(key)).is_some()
    }

    /// Iterates stored tokens in slot order (unspecified).
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.slots
            .iter()
            .filter(|s| s.hash != 0)
            .map(move |s| &self.pool[s.off..s.off + s.len])
    }

    #[inline]
    fn find(&self, key: &[u8], h: u64) -> Option<&Slot> {
        let mask = self.slots.len() - 1;
        let mut idx = (h as usize) & mask;

        loop {
            let slot = &self.slots[idx];
            if slot.hash == 0 {
                return None;
            }
            if slot.hash == h && slot.len == key.len() {
                let stored = &self.pool[slot.off..slot.off + slot.len];
                if stored == key {
                    return Some(slot);
                }
            }
            idx = (idx + 1) & mask;
        }
    }

    fn grow(&mut self) {
        let mut slots = vec![Slot::default(); self.slots.len() * 2];
        for &slot in self.slots.iter().filter(|s| s.hash != 0) {
            place(&mut slots, slot);
        }
        self.slots = slots;
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vocabulary")
            .field("len", &self.len)
            .field("pool_bytes", &self.pool.len())
            .finish()
    }
}

fn place(slots: &mut [Slot], slot: Slot) {
    let mask = slots.len() - 1;
    let mut idx = (slot.hash as usize) & mask;
    while slots[idx].hash != 0 {
        idx = (idx + 1) & mask;
    }
    slots[idx] = slot;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut vocab = Vocabulary::new();
        assert!(vocab.insert(b"hello"));
        assert!(vocab.insert(b"he"));
        assert!(vocab.contains(b"hello"));
        assert!(vocab.contains(b"he"));
        assert!(!vocab.contains(b"hel"));
        assert!(!vocab.contains(b""));
        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let mut vocab = Vocabulary::with_capacity(2);
        assert!(vocab.insert(b"ab"));
        assert!(!vocab.insert(b"ab"));
        assert_eq!(vocab.len(), 1);
        assert_eq!(vocab.iter().count(), 1);
    }

    #[test]
    fn test_grows_past_initial_capacity() {
        let mut vocab = Vocabulary::with_capacity(1);
        for i in 0u32..1000 {
            assert!(vocab.insert(&i.to_le_bytes()));
        }
        assert_eq!(vocab.len(), 1000);
        for i in 0u32..1000 {
            assert!(vocab.contains(&i.to_le_bytes()));
        }
        assert!(!vocab.contains(&1000u32.to_le_bytes()));
    }

    #[test]
    fn test_iter_yields_every_token() {
        let mut vocab = Vocabulary::new();
        for t in [&b"a"[..], b"bc", b"\xff\x00"] {
            vocab.insert(t);
        }
        let mut tokens: Vec<&[u8]> = vocab.iter().collect();
        tokens.sort();
        assert_eq!(tokens, vec![&b"a"[..], b"bc", b"\xff\x00"]);
    }

    #[test]
    fn test_hash_is_never_zero() {
        assert_ne!(fnv_hash(b""), 0);
        assert_eq!(fnv_hash(b"abc") & 1, 1);
    }
}
