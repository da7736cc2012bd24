//! BPSEQ pair tables.
//!
//! A BPSEQ table has one entry per residue: `index sequence partner`,
//! where indices are 1-based and contiguous, and partner 0 means the
//! residue is unpaired. Pairing must be a symmetric involution.
//!

use std::fmt;
use std::cmp::Ordering;
use log::debug;
use nohash_hasher::IntMap;

use crate::Ct;
use crate::Derivation;
use crate::Format;
use crate::NAIDX;
use crate::Pair;
use crate::PairSet;
use crate::RenderOptions;
use crate::StructureError;
use crate::SymbolSequence;
use crate::render::split_comment;

/// One BPSEQ line.
#[derive(Debug, Clone)]
pub struct BpSeqEntry {
    index: usize,
    pair: usize,
    seq: char,
    comment: String,
}

impl BpSeqEntry {
    pub fn new(index: usize, pair: usize, seq: char) -> Self {
        Self::with_comment(index, pair, seq, String::new())
    }

    pub fn with_comment(index: usize, pair: usize, seq: char, comment: impl Into<String>) -> Self {
        Self {
            index,
            pair,
            seq,
            comment: comment.into(),
        }
    }

    /// 1-based residue index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based partner index, 0 if unpaired.
    pub fn pair(&self) -> usize {
        self.pair
    }

    pub fn seq(&self) -> char {
        self.seq
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn is_paired(&self) -> bool {
        self.pair != 0
    }

    fn render(&self, options: &RenderOptions) -> String {
        let line = format!("{} {} {}", self.index, self.seq, self.pair);
        if options.comments && !self.comment.trim().is_empty() {
            format!("#{}\n{}", self.comment, line)
        } else {
            line
        }
    }
}

// Comments are annotations only: two entries with the same index,
// partner and residue describe the same pairing.
impl PartialEq for BpSeqEntry {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.pair == other.pair && self.seq == other.seq
    }
}

impl Eq for BpSeqEntry {}

impl PartialOrd for BpSeqEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BpSeqEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.index, self.pair, self.seq).cmp(&(other.index, other.pair, other.seq))
    }
}

impl fmt::Display for BpSeqEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(&RenderOptions::default()))
    }
}

/// A validated BPSEQ table, entries ordered by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BpSeq {
    entries: Vec<BpSeqEntry>,
}

impl BpSeq {
    /// Build a table from entries in any order; fails if the entries are
    /// not contiguously numbered from 1 or the pairing is not symmetric.
    /// Repeated entries collapse into one, the first comment is kept.
    pub fn new(entries: impl IntoIterator<Item = BpSeqEntry>) -> Result<Self, StructureError> {
        let mut entries: Vec<BpSeqEntry> = entries.into_iter().collect();
        entries.sort();
        entries.dedup();
        validate_pairing(Format::BpSeq, entries.iter().map(|e| (e.index, e.pair)))?;
        Ok(Self { entries })
    }

    /// Renumber 0-based symbol positions into 1-based entries.
    pub fn from_dot_bracket(db: &impl SymbolSequence) -> Result<Self, StructureError> {
        let entries = db.symbols().iter().map(|s| {
            let pair = s.pair().map_or(0, |p| p + 1);
            BpSeqEntry::new(s.index() + 1, pair, s.sequence())
        });
        BpSeq::new(entries).map_err(StructureError::derived(Derivation::FromDotBracket))
    }

    pub fn entries(&self) -> &[BpSeqEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a 1-based index.
    pub fn entry(&self, index: usize) -> Option<&BpSeqEntry> {
        index.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// Partner of a 1-based index, 0 if unpaired or out of range.
    pub fn partner(&self, index: usize) -> usize {
        self.entry(index).map_or(0, BpSeqEntry::pair)
    }

    /// The concatenated one-letter sequence.
    pub fn sequence(&self) -> String {
        self.entries.iter().map(|e| e.seq).collect()
    }

    /// All pairs as 1-based `(i, j)` with `i < j`, ordered by `i`.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.entries.iter()
            .filter(|e| e.pair > e.index)
            .map(|e| (e.index, e.pair))
            .collect()
    }

    /// Number of base pairs.
    pub fn paired_count(&self) -> usize {
        self.entries.iter().filter(|e| e.pair > e.index).count()
    }

    /// Full copy of this table where every pair not in `keep` is zeroed.
    pub fn retain_pairs(&self, keep: &PairSet) -> BpSeq {
        let entries = self.entries.iter()
            .map(|e| {
                let kept = e.is_paired() && keep.contains(&Pair::ordered(
                    (e.index - 1) as NAIDX,
                    (e.pair - 1) as NAIDX,
                ));
                BpSeqEntry {
                    pair: if kept { e.pair } else { 0 },
                    ..e.clone()
                }
            })
            .collect();
        // Zeroing both sides of a pair keeps the table symmetric.
        BpSeq { entries }
    }

    /// Render with explicit options.
    pub fn to_text(&self, options: &RenderOptions) -> String {
        let mut text = String::new();
        for e in &self.entries {
            text.push_str(&e.render(options));
            text.push('\n');
        }
        text
    }
}

impl From<&Ct> for BpSeq {
    fn from(ct: &Ct) -> Self {
        // A valid CT table satisfies every BPSEQ invariant.
        let entries = ct.entries().iter()
            .map(|e| BpSeqEntry::with_comment(e.index(), e.pair(), e.seq(), e.comment()))
            .collect();
        BpSeq { entries }
    }
}

impl TryFrom<&str> for BpSeq {
    type Error = StructureError;

    fn try_from(data: &str) -> Result<Self, Self::Error> {
        let mut entries = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for raw in data.lines() {
            let (line, comment) = split_comment(raw);
            if line.is_empty() {
                if let Some(c) = comment.filter(|c| !c.is_empty()) {
                    pending.push(c.to_string());
                }
                continue;
            }

            let split: Vec<&str> = line.split_whitespace().collect();
            if split.len() != 3 || split[1].chars().count() != 1 {
                return Err(StructureError::malformed(Format::BpSeq, raw));
            }
            let index = split[0].parse::<usize>()
                .map_err(|_| StructureError::malformed(Format::BpSeq, raw))?;
            let pair = split[2].parse::<usize>()
                .map_err(|_| StructureError::malformed(Format::BpSeq, raw))?;
            let seq = split[1].chars().next()
                .ok_or_else(|| StructureError::malformed(Format::BpSeq, raw))?;

            if let Some(c) = comment.filter(|c| !c.is_empty()) {
                pending.push(c.to_string());
            }
            entries.push(BpSeqEntry::with_comment(index, pair, seq, pending.join(" ")));
            pending.clear();
        }

        if !pending.is_empty() {
            debug!("BPSEQ: dropping trailing comment(s) without entry: {}", pending.join(" "));
        }
        BpSeq::new(entries)
    }
}

impl fmt::Display for BpSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text(&RenderOptions::default()))
    }
}

/// Checks self-pairing, contiguous numbering from 1 and pairing symmetry
/// over `(index, pair)` tuples sorted by index.
pub(crate) fn validate_pairing(
    format: Format,
    entries: impl Iterator<Item = (usize, usize)> + Clone,
) -> Result<(), StructureError> {
    let mut map: IntMap<usize, usize> = IntMap::default();
    for (index, pair) in entries.clone() {
        if pair != 0 && index == pair {
            return Err(StructureError::SelfPair { index });
        }
        map.insert(index, pair);
    }

    let mut previous = 0;
    for (index, pair) in entries {
        if index != previous + 1 {
            return Err(StructureError::Numbering { format, previous, current: index });
        }
        previous = index;

        if pair != 0 {
            match map.get(&pair) {
                None => return Err(StructureError::MissingPartner { format, index, pair }),
                Some(&back) if back != index => {
                    return Err(StructureError::AsymmetricPair { format, index, pair, back });
                }
                Some(_) => (),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let bpseq = BpSeq::try_from("1 G 4\n2 C 3\n3 G 2\n4 C 1\n").unwrap();
        assert_eq!(bpseq.len(), 4);
        assert_eq!(bpseq.sequence(), "GCGC");
        assert_eq!(bpseq.pairs(), vec![(1, 4), (2, 3)]);
        assert_eq!(bpseq.paired_count(), 2);
        assert_eq!(bpseq.partner(4), 1);
        assert_eq!(bpseq.partner(5), 0);
    }

    #[test]
    fn test_pairing_is_involution() {
        let bpseq = BpSeq::try_from("1 G 6\n2 G 5\n3 A 0\n4 A 0\n5 C 2\n6 C 1").unwrap();
        for e in bpseq.entries() {
            if e.is_paired() {
                assert_eq!(bpseq.partner(e.pair()), e.index());
            }
        }
    }

    #[test]
    fn test_self_pair_fails() {
        let err = BpSeq::try_from("1 G 1\n").unwrap_err();
        assert_eq!(err, StructureError::SelfPair { index: 1 });
        assert!(err.to_string().contains('1'));
    }

    #[test]
    fn test_numbering_gap_fails() {
        let err = BpSeq::try_from("1 G 0\n3 C 0\n").unwrap_err();
        assert!(matches!(err, StructureError::Numbering { previous: 1, current: 3, .. }));

        let err = BpSeq::try_from("2 G 0\n3 C 0\n").unwrap_err();
        assert!(matches!(err, StructureError::Numbering { previous: 0, current: 2, .. }));

        let err = BpSeq::try_from("1 G 0\n1 C 0\n").unwrap_err();
        assert!(matches!(err, StructureError::Numbering { .. }));
    }

    #[test]
    fn test_repeated_entries_collapse() {
        let bpseq = BpSeq::new(vec![
            BpSeqEntry::new(1, 2, 'G'),
            BpSeqEntry::new(2, 1, 'C'),
            BpSeqEntry::with_comment(1, 2, 'G', "again"),
        ]).unwrap();
        assert_eq!(bpseq.len(), 2);
        assert_eq!(bpseq.entries()[0].comment(), "");

        let bpseq = BpSeq::try_from("1 G 2\n2 C 1\n2 C 1\n").unwrap();
        assert_eq!(bpseq.pairs(), vec![(1, 2)]);

        let err = BpSeq::try_from("1 G 2\n2 C 1\n2 C 0\n").unwrap_err();
        assert!(matches!(err, StructureError::Numbering { previous: 2, current: 2, .. }));
    }

    #[test]
    fn test_asymmetric_fails() {
        let err = BpSeq::try_from("1 G 3\n2 C 0\n3 C 2\n").unwrap_err();
        assert!(matches!(err, StructureError::AsymmetricPair { index: 1, pair: 3, back: 2, .. }));

        let err = BpSeq::try_from("1 G 5\n2 C 0\n").unwrap_err();
        assert!(matches!(err, StructureError::MissingPartner { index: 1, pair: 5, .. }));
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(BpSeq::try_from("1 G\n"), Err(StructureError::MalformedLine { .. })));
        assert!(matches!(BpSeq::try_from("1 GC 0\n"), Err(StructureError::MalformedLine { .. })));
        assert!(matches!(BpSeq::try_from("x G 0\n"), Err(StructureError::MalformedLine { .. })));
        assert!(matches!(BpSeq::try_from("1 G -2\n"), Err(StructureError::MalformedLine { .. })));
    }

    #[test]
    fn test_roundtrip_text() {
        let text = "1 G 4\n2 C 3\n3 G 2\n4 C 1\n";
        let bpseq = BpSeq::try_from(text).unwrap();
        assert_eq!(bpseq.to_string(), text);
    }

    #[test]
    fn test_comments() {
        let text = "#stem start\n1 G 4\n2 C 3 # inner\n\n3 G 2\n4 C 1\n";
        let bpseq = BpSeq::try_from(text).unwrap();
        assert_eq!(bpseq.entries()[0].comment(), "stem start");
        assert_eq!(bpseq.entries()[1].comment(), "inner");
        assert_eq!(bpseq.entries()[2].comment(), "");

        let plain = bpseq.to_text(&RenderOptions::default());
        assert_eq!(plain, "1 G 4\n2 C 3\n3 G 2\n4 C 1\n");

        let annotated = bpseq.to_text(&RenderOptions::with_comments());
        assert_eq!(annotated, "#stem start\n1 G 4\n#inner\n2 C 3\n3 G 2\n4 C 1\n");
        assert_eq!(BpSeq::try_from(annotated.as_str()).unwrap().to_text(&RenderOptions::with_comments()), annotated);

        let trailing = BpSeq::try_from("1 G 2\n2 C 1\n# end of table\n").unwrap();
        assert!(trailing.entries().iter().all(|e| e.comment().is_empty()));
    }

    #[test]
    fn test_equality_ignores_order_and_comments() {
        let a = BpSeq::new(vec![
            BpSeqEntry::new(2, 1, 'C'),
            BpSeqEntry::with_comment(1, 2, 'G', "cWW"),
        ]).unwrap();
        let b = BpSeq::try_from("1 G 2\n2 C 1\n").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_retain_pairs() {
        let bpseq = BpSeq::try_from("1 G 8\n2 G 9\n3 A 0\n4 A 0\n5 A 0\n6 A 0\n7 A 0\n8 C 1\n9 C 2\n").unwrap();
        let mut keep = PairSet::new(bpseq.len());
        keep.insert(Pair::new(1, 8));
        let only = bpseq.retain_pairs(&keep);
        assert_eq!(only.pairs(), vec![(2, 9)]);
        assert_eq!(only.len(), bpseq.len());
        assert_eq!(only.sequence(), bpseq.sequence());
        assert!(BpSeq::new(only.entries().to_vec()).is_ok());
    }
}
