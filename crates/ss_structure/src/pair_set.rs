//! Pair and PairSet definitions.
//!
//! Compact integer-based representation of base pairs, used to reason
//! about crossing (pseudoknotted) and nested pairings independently of
//! the table formats.
//!
//! A `Pair` is defined by two 32-bit indices (`NAIDX`) packed into a
//! 64-bit integer key (`P1KEY`) for efficient set and map storage.
//!
//! Indices are **0-based** throughout; BPSEQ and CT tables are 1-based,
//! conversions shift by one.
//!

use std::fmt;
use nohash_hasher::IntSet;

use crate::BpSeq;
use crate::NAIDX;
use crate::P1KEY;


/// A base pair (i, j) with i < j.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pair {
    i: NAIDX,
    j: NAIDX,
}

impl Pair {
    /// Create a new pair (i, j). Panics in debug if i >= j.
    pub fn new(i: NAIDX, j: NAIDX) -> Self {
        debug_assert!(i < j);
        Pair { i, j }
    }

    /// Create a pair from two positions in any order.
    pub fn ordered(a: NAIDX, b: NAIDX) -> Self {
        if a < b { Pair::new(a, b) } else { Pair::new(b, a) }
    }

    /// Return the 5'-side index.
    pub fn i(&self) -> NAIDX {
        self.i
    }

    /// Return the 3'-side index.
    pub fn j(&self) -> NAIDX {
        self.j
    }

    /// Compact 64-bit key encoding both indices.
    pub fn key(&self) -> P1KEY {
        ((self.i as P1KEY) << NAIDX::BITS) | (self.j as P1KEY)
    }

    /// Decode a key back into a `Pair`.
    pub fn from_key(key: P1KEY) -> Self {
        let i = (key >> NAIDX::BITS) as NAIDX;
        let j = (key & (NAIDX::MAX as P1KEY)) as NAIDX;
        debug_assert!(i < j);
        Pair { i, j }
    }

    /// True if the two pairs interleave: i < k < j < l or k < i < l < j.
    pub fn crosses(&self, other: &Pair) -> bool {
        let (i, j, k, l) = (self.i, self.j, other.i, other.j);
        (i < k && k < j && j < l) || (k < i && i < l && l < j)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.i, self.j)
    }
}

/// A collection of base pairs represented as compact integer keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSet {
    length: usize,
    pairs: IntSet<P1KEY>,
}

impl PairSet {
    /// Create an empty pair set for a given sequence length.
    pub fn new(length: usize) -> Self {
        Self {
            length,
            pairs: IntSet::default(),
        }
    }

    /// Number of pairs contained in the set.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Insert a new pair; returns true if it was newly inserted.
    pub fn insert(&mut self, pair: Pair) -> bool {
        debug_assert!((pair.j() as usize) < self.length);
        self.pairs.insert(pair.key())
    }

    /// Check if a pair exists in the set.
    pub fn contains(&self, pair: &Pair) -> bool {
        self.pairs.contains(&pair.key())
    }

    /// Iterator over all pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = Pair> + '_ {
        self.pairs.iter().map(|&k| Pair::from_key(k))
    }

    /// Return all pairs as a Vec (for deterministic inspection).
    pub fn to_vec(&self) -> Vec<Pair> {
        let mut v: Vec<_> = self.iter().collect();
        v.sort_unstable();
        v
    }

    /// Underlying sequence length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Pairs of this set that are not in `other`.
    pub fn difference(&self, other: &PairSet) -> PairSet {
        Self {
            length: self.length,
            pairs: self.pairs.difference(&other.pairs).copied().collect(),
        }
    }

    /// All unordered combinations of crossing pairs, sorted.
    pub fn crossing_pairs(&self) -> Vec<(Pair, Pair)> {
        let pairs = self.to_vec();
        let mut crossings = Vec::new();
        for (a, p) in pairs.iter().enumerate() {
            for q in &pairs[a + 1..] {
                if q.i() > p.j() {
                    break;
                }
                if p.crosses(q) {
                    crossings.push((*p, *q));
                }
            }
        }
        crossings
    }

    /// True if no two pairs of the set cross each other.
    pub fn is_nested(&self) -> bool {
        // Stack-based check: after sorting by 5' end, every pair must close
        // before the enclosing one does.
        let mut stack: Vec<NAIDX> = Vec::new();
        for pair in self.to_vec() {
            while stack.last().is_some_and(|&j| j < pair.i()) {
                stack.pop();
            }
            if stack.last().is_some_and(|&j| j < pair.j()) {
                return false;
            }
            stack.push(pair.j());
        }
        true
    }
}

impl From<&BpSeq> for PairSet {
    fn from(bpseq: &BpSeq) -> Self {
        let mut pairs = IntSet::default();
        for entry in bpseq.entries() {
            if entry.pair() > entry.index() {
                let i = (entry.index() - 1) as NAIDX;
                let j = (entry.pair() - 1) as NAIDX;
                pairs.insert(Pair::new(i, j).key());
            }
        }
        Self {
            length: bpseq.len(),
            pairs,
        }
    }
}

impl fmt::Display for PairSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for pair in self.to_vec() {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{pair}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_roundtrip() {
        let p = Pair::new(1, 70_000);
        let k = p.key();
        let q = Pair::from_key(k);
        assert_eq!(p, q);
        assert_eq!(Pair::ordered(9, 2), Pair::new(2, 9));
    }

    #[test]
    fn test_crosses() {
        let a = Pair::new(0, 7);
        let b = Pair::new(1, 8);
        let c = Pair::new(2, 5);
        let d = Pair::new(8, 9);
        assert!(a.crosses(&b));
        assert!(b.crosses(&a));
        assert!(!a.crosses(&c)); // nested
        assert!(!a.crosses(&d)); // disjoint
        assert!(!a.crosses(&a));
    }

    #[test]
    fn test_pair_set_from_bpseq() {
        let bpseq = BpSeq::try_from("1 G 4\n2 C 3\n3 G 2\n4 C 1\n").unwrap();
        let ps = PairSet::from(&bpseq);

        let expected = vec![Pair::new(0, 3), Pair::new(1, 2)];
        assert_eq!(ps.length(), 4);
        assert_eq!(ps.to_vec(), expected);
        assert!(ps.is_nested());
        assert!(ps.crossing_pairs().is_empty());
        assert!(!ps.contains(&Pair::new(0, 2)));
    }

    #[test]
    fn test_nested_and_crossing() {
        let mut ps = PairSet::new(10);
        ps.insert(Pair::new(0, 7));
        ps.insert(Pair::new(2, 4));
        assert!(ps.is_nested());
        ps.insert(Pair::new(1, 8));
        assert!(!ps.is_nested());
        assert_eq!(ps.crossing_pairs(), vec![(Pair::new(0, 7), Pair::new(1, 8))]);

        let mut only = PairSet::new(10);
        only.insert(Pair::new(1, 8));
        let rest = ps.difference(&only);
        assert_eq!(rest.len(), 2);
        assert!(rest.is_nested());
    }

    #[test]
    fn test_display() {
        let mut ps = PairSet::new(6);
        ps.insert(Pair::new(1, 4));
        ps.insert(Pair::new(0, 5));
        assert_eq!(format!("{}", ps), "(0,5),(1,4)");
    }
}
