//! Dot-bracket sequences.
//!
//! A dot-bracket structure is a sequence line and a structure line of equal
//! length. Symbols live in one arena addressed by 0-based position; pairing
//! partners are positions into that arena, resolved and checked once when
//! the structure is parsed.
//!
//! Bracket levels: `()`, `[]`, `{}`, `<>`, `Aa`, `Bb`, ..., `Zz`. The level
//! of a bracket is its pseudoknot order. `.` is unpaired, `-` missing.
//! Multiple strands can be separated by `&` in both lines.
//!

use std::fmt;
use itertools::Itertools;

use crate::BpSeq;
use crate::CombinedStrand;
use crate::Ct;
use crate::Derivation;
use crate::Format;
use crate::MaxNestedFinder;
use crate::PairSet;
use crate::PseudoknotFinder;
use crate::Strand;
use crate::StrandSpan;
use crate::StructureError;
use crate::combine_strands;

const OPENING: &[u8] = b"([{<ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const CLOSING: &[u8] = b")]}>abcdefghijklmnopqrstuvwxyz";

/// Number of distinct bracket levels.
pub const BRACKET_LEVELS: usize = OPENING.len();

/// One structure character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bracket {
    Unpaired,
    Missing,
    Open(usize),
    Close(usize),
}

impl Bracket {
    /// Pseudoknot order of a bracket, `None` for dots and dashes.
    pub fn order(&self) -> Option<usize> {
        match self {
            Bracket::Open(o) | Bracket::Close(o) => Some(*o),
            _ => None,
        }
    }
}

impl From<Bracket> for char {
    /// Orders beyond the alphabet render as `?`; parsing never produces them.
    fn from(b: Bracket) -> Self {
        let level = |table: &[u8], o: usize| table.get(o).map_or('?', |&c| c as char);
        match b {
            Bracket::Unpaired => '.',
            Bracket::Missing => '-',
            Bracket::Open(o) => level(OPENING, o),
            Bracket::Close(o) => level(CLOSING, o),
        }
    }
}

impl TryFrom<char> for Bracket {
    type Error = char;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '.' => Ok(Bracket::Unpaired),
            '-' => Ok(Bracket::Missing),
            c if c.is_ascii() => {
                if let Some(o) = OPENING.iter().position(|&b| b as char == c) {
                    Ok(Bracket::Open(o))
                } else if let Some(o) = CLOSING.iter().position(|&b| b as char == c) {
                    Ok(Bracket::Close(o))
                } else {
                    Err(c)
                }
            }
            _ => Err(c),
        }
    }
}

/// One residue of a dot-bracket sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotBracketSymbol {
    index: usize,
    sequence: char,
    bracket: Bracket,
    pair: Option<usize>,
    non_canonical: bool,
}

impl DotBracketSymbol {
    pub(crate) fn new(index: usize, sequence: char, bracket: Bracket) -> Self {
        Self {
            index,
            sequence,
            bracket,
            pair: None,
            non_canonical: false,
        }
    }

    /// Copy under a new position, without a partner.
    pub(crate) fn renumbered(&self, index: usize) -> Self {
        Self {
            index,
            pair: None,
            ..self.clone()
        }
    }

    pub(crate) fn set_pair(&mut self, pair: Option<usize>) {
        self.pair = pair;
        if pair.is_none() && self.bracket.order().is_some() {
            self.bracket = Bracket::Unpaired;
        }
    }

    /// 0-based position in the owning sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sequence(&self) -> char {
        self.sequence
    }

    pub fn bracket(&self) -> Bracket {
        self.bracket
    }

    pub fn structure(&self) -> char {
        char::from(self.bracket)
    }

    /// Position of the pairing partner.
    pub fn pair(&self) -> Option<usize> {
        self.pair
    }

    pub fn is_pairing(&self) -> bool {
        self.pair.is_some()
    }

    /// Residue not observed in the experiment.
    pub fn is_missing(&self) -> bool {
        self.bracket == Bracket::Missing
    }

    /// Display flag set when the realized pair is non-canonical.
    pub fn is_non_canonical(&self) -> bool {
        self.non_canonical
    }

    pub fn order(&self) -> Option<usize> {
        self.bracket.order()
    }
}

/// Anything that exposes an arena of dot-bracket symbols split into strands.
pub trait SymbolSequence {
    fn symbols(&self) -> &[DotBracketSymbol];

    fn strand_spans(&self) -> &[StrandSpan];

    /// Number used for the CT `original` column.
    fn original_number(&self, position: usize) -> i32 {
        position as i32 + 1
    }

    fn len(&self) -> usize {
        self.symbols().len()
    }

    fn is_empty(&self) -> bool {
        self.symbols().is_empty()
    }

    fn symbol(&self, position: usize) -> Option<&DotBracketSymbol> {
        self.symbols().get(position)
    }

    fn sequence(&self) -> String {
        self.symbols().iter().map(DotBracketSymbol::sequence).collect()
    }

    fn structure(&self) -> String {
        self.symbols().iter().map(DotBracketSymbol::structure).collect()
    }

    fn strands(&self) -> Vec<Strand<'_>> {
        self.strand_spans().iter()
            .map(|span| Strand::new(span, self.symbols()))
            .collect()
    }

    /// Sequence with strands separated by `&`.
    fn sequence_with_strands(&self) -> String {
        self.strands().iter().map(Strand::sequence).join("&")
    }

    /// Structure with strands separated by `&`.
    fn structure_with_strands(&self) -> String {
        self.strands().iter().map(Strand::structure).join("&")
    }

    fn pseudoknot_order(&self) -> usize {
        self.strands().iter().map(Strand::pseudoknot_order).max().unwrap_or(0)
    }

    fn to_bpseq(&self) -> Result<BpSeq, StructureError> where Self: Sized {
        BpSeq::from_dot_bracket(self)
    }

    fn to_ct(&self) -> Result<Ct, StructureError> where Self: Sized {
        Ct::from_dot_bracket(self)
    }

    /// Cluster strands connected by base pairs, see [`combine_strands`].
    fn combine_strands(&self) -> Vec<CombinedStrand> where Self: Sized {
        combine_strands(self, &[])
    }
}

/// A validated dot-bracket sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotBracket {
    symbols: Vec<DotBracketSymbol>,
    spans: Vec<StrandSpan>,
    original: Option<Vec<i32>>,
}

impl DotBracket {
    /// Parse a sequence and an equal-length structure; `&` separates strands.
    pub fn new(sequence: &str, structure: &str) -> Result<Self, StructureError> {
        let seq: Vec<char> = sequence.trim().chars().collect();
        let dbr: Vec<char> = structure.trim().chars().collect();
        if seq.len() != dbr.len() {
            return Err(StructureError::LengthMismatch {
                sequence: seq.len(),
                structure: dbr.len(),
            });
        }

        let mut symbols: Vec<DotBracketSymbol> = Vec::with_capacity(seq.len());
        let mut boundaries: Vec<usize> = Vec::new();
        for (k, (&s, &d)) in seq.iter().zip(dbr.iter()).enumerate() {
            match (s, d) {
                ('&', '&') => boundaries.push(symbols.len()),
                ('&', _) | (_, '&') => {
                    return Err(StructureError::UnknownSymbol { symbol: '&', position: k });
                }
                _ => {
                    let bracket = Bracket::try_from(d)
                        .map_err(|symbol| StructureError::UnknownSymbol { symbol, position: k })?;
                    symbols.push(DotBracketSymbol::new(symbols.len(), s, bracket));
                }
            }
        }

        link_brackets(&mut symbols)?;

        let mut spans = Vec::with_capacity(boundaries.len() + 1);
        let mut begin = 0;
        for (s, end) in boundaries.into_iter().chain(std::iter::once(symbols.len())).enumerate() {
            spans.push(StrandSpan::new(strand_name(s), begin, end, &symbols));
            begin = end;
        }

        Ok(Self {
            symbols,
            spans,
            original: None,
        })
    }

    /// Derive the bracket notation of a BPSEQ table with the default
    /// pseudoknot finder.
    pub fn from_bpseq(bpseq: &BpSeq) -> Result<Self, StructureError> {
        Self::from_bpseq_with(bpseq, &MaxNestedFinder::default())
    }

    /// Derive the bracket notation of a BPSEQ table. The nested core is
    /// written with `()`; pairs reported as pseudoknots are peeled off
    /// layer by layer, each layer one bracket level higher.
    pub fn from_bpseq_with(bpseq: &BpSeq, finder: &impl PseudoknotFinder) -> Result<Self, StructureError> {
        let mut structure = vec!['.'; bpseq.len()];
        let mut remaining = bpseq.clone();
        let mut order = 0;

        while remaining.paired_count() > 0 {
            let layer = finder.find_pseudoknots(&remaining).into_iter().next();
            let knotted = layer.as_ref()
                .map_or_else(|| PairSet::new(bpseq.len()), PairSet::from);
            if knotted.len() >= remaining.paired_count() || order >= BRACKET_LEVELS {
                return Err(StructureError::TooManyLevels { order });
            }

            let nested = PairSet::from(&remaining).difference(&knotted);
            for pair in nested.iter() {
                structure[pair.i() as usize] = char::from(Bracket::Open(order));
                structure[pair.j() as usize] = char::from(Bracket::Close(order));
            }

            match layer {
                Some(next) => remaining = next,
                None => break,
            }
            order += 1;
        }
        log::debug!("dot-bracket from BPSEQ uses {order} bracket level(s)");

        let structure: String = structure.into_iter().collect();
        DotBracket::new(&bpseq.sequence(), &structure)
            .map_err(StructureError::derived(Derivation::FromBpSeq))
    }

    /// Replace the strand layout; `(name, begin, end)` must tile the sequence.
    pub fn with_strands(mut self, layout: &[(String, usize, usize)]) -> Result<Self, StructureError> {
        let mut covered = 0;
        for (_, begin, end) in layout {
            if *begin != covered || end < begin || *end > self.symbols.len() {
                return Err(StructureError::StrandLayout { expected: self.symbols.len(), found: covered });
            }
            covered = *end;
        }
        if covered != self.symbols.len() {
            return Err(StructureError::StrandLayout { expected: self.symbols.len(), found: covered });
        }
        self.spans = layout.iter()
            .map(|(name, begin, end)| StrandSpan::new(name.clone(), *begin, *end, &self.symbols))
            .collect();
        Ok(self)
    }

    /// Replace the numbering reported in the CT `original` column.
    pub fn with_original_numbers(mut self, numbers: Vec<i32>) -> Result<Self, StructureError> {
        if numbers.len() != self.symbols.len() {
            return Err(StructureError::LengthMismatch {
                sequence: self.symbols.len(),
                structure: numbers.len(),
            });
        }
        self.original = Some(numbers);
        Ok(self)
    }

    /// Flag the symbols at the given positions as taking part in a
    /// non-canonical pair.
    pub fn with_non_canonical(mut self, positions: &[usize]) -> Self {
        for &p in positions {
            if let Some(symbol) = self.symbols.get_mut(p) {
                symbol.non_canonical = true;
            }
        }
        self
    }
}

impl SymbolSequence for DotBracket {
    fn symbols(&self) -> &[DotBracketSymbol] {
        &self.symbols
    }

    fn strand_spans(&self) -> &[StrandSpan] {
        &self.spans
    }

    fn original_number(&self, position: usize) -> i32 {
        match &self.original {
            Some(numbers) => numbers[position],
            None => position as i32 + 1,
        }
    }
}

impl TryFrom<&str> for DotBracket {
    type Error = StructureError;

    /// Parse `[>name]\nSEQUENCE\nSTRUCTURE`.
    fn try_from(data: &str) -> Result<Self, Self::Error> {
        let lines: Vec<&str> = data.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('>'))
            .collect();
        match lines.as_slice() {
            [sequence, structure] => DotBracket::new(sequence, structure),
            _ => Err(StructureError::malformed(Format::DotBracket, data.trim())),
        }
    }
}

impl fmt::Display for DotBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.sequence(), self.structure())
    }
}

/// Default strand names: A, B, ..., Z, A1, B1, ...
fn strand_name(s: usize) -> String {
    let letter = (b'A' + (s % 26) as u8) as char;
    match s / 26 {
        0 => letter.to_string(),
        n => format!("{letter}{n}"),
    }
}

/// Link matching brackets of each level; every bracket must be matched.
fn link_brackets(symbols: &mut [DotBracketSymbol]) -> Result<(), StructureError> {
    let mut stacks: Vec<Vec<usize>> = vec![Vec::new(); BRACKET_LEVELS];
    let mut links = Vec::new();

    for s in symbols.iter() {
        match s.bracket {
            Bracket::Open(o) => stacks[o].push(s.index),
            Bracket::Close(o) => match stacks[o].pop() {
                Some(i) => links.push((i, s.index)),
                None => return Err(StructureError::UnmatchedBracket {
                    bracket: s.structure(),
                    position: s.index,
                }),
            },
            _ => (),
        }
    }

    if let Some(&i) = stacks.iter().flatten().min() {
        return Err(StructureError::UnmatchedBracket {
            bracket: symbols[i].structure(),
            position: i,
        });
    }

    for (i, j) in links {
        symbols[i].pair = Some(j);
        symbols[j].pair = Some(i);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_conversions() {
        assert_eq!(Bracket::try_from('('), Ok(Bracket::Open(0)));
        assert_eq!(Bracket::try_from(']'), Ok(Bracket::Close(1)));
        assert_eq!(Bracket::try_from('A'), Ok(Bracket::Open(4)));
        assert_eq!(Bracket::try_from('z'), Ok(Bracket::Close(29)));
        assert_eq!(Bracket::try_from('-'), Ok(Bracket::Missing));
        assert_eq!(Bracket::try_from('x'), Ok(Bracket::Close(27)));
        assert_eq!(Bracket::try_from('?'), Err('?'));
        assert_eq!(char::from(Bracket::Open(2)), '{');
        assert_eq!(char::from(Bracket::Open(BRACKET_LEVELS)), '?');
    }

    #[test]
    fn test_parse_and_link() {
        let db = DotBracket::new("GGAACCUU", "((..))[]").unwrap();
        assert_eq!(db.len(), 8);
        assert_eq!(db.symbol(0).unwrap().pair(), Some(5));
        assert_eq!(db.symbol(5).unwrap().pair(), Some(0));
        assert_eq!(db.symbol(2).unwrap().pair(), None);
        assert_eq!(db.symbol(6).unwrap().pair(), Some(7));
        assert_eq!(db.sequence(), "GGAACCUU");
        assert_eq!(db.structure(), "((..))[]");
        assert_eq!(db.strands().len(), 1);
    }

    #[test]
    fn test_pairing_is_mutual() {
        let db = DotBracket::new("GGGAAACCCAA", "([{...)]}..").unwrap();
        for s in db.symbols() {
            if let Some(p) = s.pair() {
                assert_eq!(db.symbol(p).unwrap().pair(), Some(s.index()));
                assert_eq!(db.symbol(p).unwrap().order(), s.order());
            }
        }
        assert_eq!(db.pseudoknot_order(), 2);
    }

    #[test]
    fn test_unmatched_brackets() {
        let err = DotBracket::new("GAC", "(.)(").unwrap_err();
        assert!(matches!(err, StructureError::LengthMismatch { sequence: 3, structure: 4 }));

        let err = DotBracket::new("GACC", "(.))").unwrap_err();
        assert_eq!(err, StructureError::UnmatchedBracket { bracket: ')', position: 3 });

        let err = DotBracket::new("GACC", "((.)").unwrap_err();
        assert_eq!(err, StructureError::UnmatchedBracket { bracket: '(', position: 0 });

        let order = DotBracket::new("GACC", "([)]").map(|db| db.pseudoknot_order());
        assert_eq!(order, Ok(1));

        let err = DotBracket::new("GACC", "(.%)").unwrap_err();
        assert_eq!(err, StructureError::UnknownSymbol { symbol: '%', position: 2 });
    }

    #[test]
    fn test_strand_separators() {
        let db = DotBracket::new("GGA&UCC", "((.&.))").unwrap();
        assert_eq!(db.len(), 6);
        assert_eq!(db.strands().len(), 2);
        assert_eq!(db.strands()[1].name(), "B");
        assert_eq!(db.sequence_with_strands(), "GGA&UCC");
        assert_eq!(db.structure_with_strands(), "((.&.))");
        assert_eq!(db.symbol(0).unwrap().pair(), Some(5));

        let err = DotBracket::new("GGA&UCC", "((..)))").unwrap_err();
        assert!(matches!(err, StructureError::UnknownSymbol { symbol: '&', position: 3 }));
    }

    #[test]
    fn test_from_bpseq_nested() {
        let bpseq = BpSeq::try_from("1 G 4\n2 C 3\n3 G 2\n4 C 1\n").unwrap();
        let db = DotBracket::from_bpseq(&bpseq).unwrap();
        assert_eq!(db.sequence(), "GCGC");
        assert_eq!(db.structure(), "(())");
        assert_eq!(db.to_bpseq().unwrap(), bpseq);
    }

    #[test]
    fn test_from_bpseq_pseudoknot() {
        let bpseq = BpSeq::try_from(
            "1 G 8\n2 G 9\n3 A 0\n4 A 0\n5 A 0\n6 A 0\n7 A 0\n8 C 1\n9 C 2\n").unwrap();
        let db = DotBracket::from_bpseq(&bpseq).unwrap();
        assert_eq!(db.structure(), "([.....)]");
        assert_eq!(db.pseudoknot_order(), 1);
        assert_eq!(db.to_bpseq().unwrap(), bpseq);
    }

    #[test]
    fn test_text_form() {
        let db = DotBracket::try_from(">test\nGCGC\n(())\n").unwrap();
        assert_eq!(db.to_string(), "GCGC\n(())");
        assert!(matches!(DotBracket::try_from("GCGC\n"), Err(StructureError::MalformedLine { .. })));
    }

    #[test]
    fn test_custom_layout_and_numbering() {
        let db = DotBracket::new("GGAUCC", "((.-))").unwrap()
            .with_strands(&[("X".to_string(), 0, 3), ("Y".to_string(), 3, 6)]).unwrap()
            .with_original_numbers(vec![10, 11, 12, 40, 41, 42]).unwrap();
        assert_eq!(db.strands()[0].name(), "X");
        assert_eq!(db.original_number(3), 40);

        let ct = db.to_ct().unwrap();
        assert_eq!(ct.strand_count(), 2);
        assert_eq!(ct.entries()[3].before(), 0);
        assert_eq!(ct.entries()[3].original(), 40);
        assert_eq!(ct.entries()[0].pair(), 6);

        let bad = DotBracket::new("GGAUCC", "((.-))").unwrap()
            .with_strands(&[("X".to_string(), 0, 2), ("Y".to_string(), 3, 6)]);
        assert!(matches!(bad, Err(StructureError::StrandLayout { .. })));
    }
}
