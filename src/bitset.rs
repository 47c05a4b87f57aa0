//! A fixed-size set of glyph ids.

use crate::error::ParseError;

const BITS: usize = u32::BITS as usize;

/// Membership flags for the glyphs `0..len` of a font.
///
/// The subsetter sets bits for glyphs that must be present in the output, then width and
/// descriptor builders treat the set as read-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphBitSet {
    words: Vec<u32>,
    len: usize,
}

impl GlyphBitSet {
    /// Create an empty set able to hold glyph ids below `len`.
    pub fn new(len: usize) -> Self {
        GlyphBitSet {
            words: vec![0; len.div_ceil(BITS)],
            len,
        }
    }

    /// Create a set of size `len` containing `ids`.
    pub fn from_ids(len: usize, ids: impl IntoIterator<Item = u16>) -> Result<Self, ParseError> {
        let mut set = GlyphBitSet::new(len);
        for id in ids {
            set.insert(id)?;
        }
        Ok(set)
    }

    /// Number of glyph ids this set can hold.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mark `gid` as present. Returns `true` if it was not already present.
    pub fn insert(&mut self, gid: u16) -> Result<bool, ParseError> {
        let index = usize::from(gid);
        if index >= self.len {
            return Err(ParseError::BadIndex);
        }
        let mask = 1 << (index % BITS);
        let word = &mut self.words[index / BITS];
        let was_set = *word & mask != 0;
        *word |= mask;
        Ok(!was_set)
    }

    pub fn remove(&mut self, gid: u16) {
        let index = usize::from(gid);
        if index < self.len {
            self.words[index / BITS] &= !(1 << (index % BITS));
        }
    }

    pub fn contains(&self, gid: u16) -> bool {
        let index = usize::from(gid);
        index < self.len && self.words[index / BITS] & (1 << (index % BITS)) != 0
    }

    /// Number of glyphs in the set.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate over the glyph ids in the set in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(i, &word)| {
                (0..BITS)
                    .filter(move |bit| word & (1 << bit) != 0)
                    .map(move |bit| i * BITS + bit)
            })
            // glyph ids never exceed u16::MAX since `insert` takes a u16
            .map(|gid| gid as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_contains() {
        let mut set = GlyphBitSet::new(40);
        assert_eq!(set.insert(3), Ok(true));
        assert_eq!(set.insert(3), Ok(false));
        assert_eq!(set.insert(33), Ok(true));
        assert!(set.contains(3));
        assert!(set.contains(33));
        assert!(!set.contains(4));
        assert!(!set.contains(1000));
        assert_eq!(set.count(), 2);
    }

    #[test]
    fn test_out_of_range() {
        let mut set = GlyphBitSet::new(32);
        assert_eq!(set.insert(32), Err(ParseError::BadIndex));
        set.remove(500);
        assert_eq!(set.count(), 0);
    }

    #[test]
    fn test_iter_ascending() {
        let set = GlyphBitSet::from_ids(100, [64, 2, 31, 32, 99]).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![2, 31, 32, 64, 99]);
    }

    #[test]
    fn test_remove() {
        let mut set = GlyphBitSet::from_ids(10, [1, 2]).unwrap();
        set.remove(1);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![2]);
    }
}
