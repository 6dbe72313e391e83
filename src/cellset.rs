//! Bit set over the cells of a quantized space.
//!
//! The winning set and the losing-neighbor set are both stored as a
//! [`CellSet`]: one bit per cell index, with a cached population count so that
//! the fixed point can report the winning-set size after every scan in O(1).

/// A fixed-universe bit set backed by a vector of u64 words.
///
/// The universe is `0..universe`. Queries outside the universe report
/// "not contained" instead of panicking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSet {
    words: Vec<u64>,
    universe: usize,
    /// Number of set bits (cached for O(1) len())
    count: usize,
}

impl CellSet {
    const BITS_PER_WORD: usize = 64;

    /// Creates an empty set over the cells `0..universe`.
    pub fn new(universe: usize) -> Self {
        let num_words = universe.div_ceil(Self::BITS_PER_WORD);
        Self {
            words: vec![0; num_words],
            universe,
            count: 0,
        }
    }

    /// Creates a set containing exactly the cells satisfying `predicate`.
    pub fn from_predicate(universe: usize, predicate: impl Fn(usize) -> bool) -> Self {
        let mut set = Self::new(universe);
        for index in (0..universe).filter(|&i| predicate(i)) {
            set.insert(index);
        }
        set
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of cells in the universe.
    #[inline]
    pub fn universe(&self) -> usize {
        self.universe
    }

    #[inline]
    fn word_and_mask(index: usize) -> (usize, u64) {
        (index / Self::BITS_PER_WORD, 1u64 << (index % Self::BITS_PER_WORD))
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        if index >= self.universe {
            return false;
        }
        let (word, mask) = Self::word_and_mask(index);
        self.words[word] & mask != 0
    }

    /// Adds a cell. Returns true if it was not previously present.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the universe.
    #[inline]
    pub fn insert(&mut self, index: usize) -> bool {
        assert!(index < self.universe, "Cell {} is outside the universe of {} cells", index, self.universe);
        let (word, mask) = Self::word_and_mask(index);
        let was_clear = self.words[word] & mask == 0;
        if was_clear {
            self.words[word] |= mask;
            self.count += 1;
        }
        was_clear
    }

    /// Removes a cell. Returns true if it was previously present.
    #[inline]
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.universe {
            return false;
        }
        let (word, mask) = Self::word_and_mask(index);
        let was_set = self.words[word] & mask != 0;
        if was_set {
            self.words[word] &= !mask;
            self.count -= 1;
        }
        was_set
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
        self.count = 0;
    }

    /// Returns the complement of this set within the universe.
    pub fn complement(&self) -> CellSet {
        CellSet::from_predicate(self.universe, |i| !self.contains(i))
    }

    /// Returns an iterator over the contained cell indices, in increasing order.
    pub fn iter(&self) -> CellSetIter<'_> {
        CellSetIter {
            set: self,
            word_idx: 0,
            current_word: self.words.first().copied().unwrap_or(0),
        }
    }
}

impl Extend<usize> for CellSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for index in iter {
            self.insert(index);
        }
    }
}

pub struct CellSetIter<'a> {
    set: &'a CellSet,
    word_idx: usize,
    current_word: u64,
}

impl Iterator for CellSetIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let bit = self.current_word.trailing_zeros() as usize;
                self.current_word &= self.current_word - 1; // Clear lowest set bit
                return Some(self.word_idx * CellSet::BITS_PER_WORD + bit);
            }

            self.word_idx += 1;
            if self.word_idx >= self.set.words.len() {
                return None;
            }
            self.current_word = self.set.words[self.word_idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let set = CellSet::new(10);
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.universe(), 10);
        assert!(!set.contains(0));
        assert!(!set.contains(100));
    }

    #[test]
    fn test_insert_remove() {
        let mut set = CellSet::new(100);
        assert!(set.insert(42));
        assert!(!set.insert(42));
        assert!(set.contains(42));
        assert_eq!(set.len(), 1);

        assert!(set.remove(42));
        assert!(!set.remove(42));
        assert!(!set.remove(1000));
        assert!(set.is_empty());
    }

    #[test]
    #[should_panic(expected = "outside the universe")]
    fn test_insert_outside_universe_panics() {
        let mut set = CellSet::new(8);
        set.insert(8);
    }

    #[test]
    fn test_iter_across_words() {
        let mut set = CellSet::new(200);
        set.extend([130, 3, 64, 5, 63]);
        let indices: Vec<_> = set.iter().collect();
        assert_eq!(indices, vec![3, 5, 63, 64, 130]);
    }

    #[test]
    fn test_predicate_and_complement() {
        let evens = CellSet::from_predicate(7, |i| i % 2 == 0);
        assert_eq!(evens.iter().collect::<Vec<_>>(), vec![0, 2, 4, 6]);

        let odds = evens.complement();
        assert_eq!(odds.iter().collect::<Vec<_>>(), vec![1, 3, 5]);
        assert_eq!(odds.len() + evens.len(), 7);
    }

    #[test]
    fn test_clear() {
        let mut set = CellSet::new(100);
        set.extend([1, 50, 99]);
        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains(50));
    }
}
