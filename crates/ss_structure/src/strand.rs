//! Strands: contiguous runs of symbols belonging to one molecular chain.
//!
//! A `StrandSpan` is the positional descriptor stored by its owner: a
//! half-open range `[begin, end)` and the leading and trailing runs of
//! missing symbols, computed once at construction. A `Strand` is a
//! borrowed view pairing a span with the symbol arena it indexes into.
//!

use std::fmt;
use std::ops::Range;

use crate::DotBracketSymbol;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrandSpan {
    name: String,
    begin: usize,
    end: usize,
    missing_begin: Range<usize>,
    missing_end: Range<usize>,
}

impl StrandSpan {
    /// Describe `symbols[begin..end]`; the terminal missing runs are found
    /// by scanning inward until a present symbol is found.
    pub fn new(name: impl Into<String>, begin: usize, end: usize, symbols: &[DotBracketSymbol]) -> Self {
        debug_assert!(begin <= end && end <= symbols.len());
        let mut head = begin;
        while head < end && symbols[head].is_missing() {
            head += 1;
        }
        let mut tail = end;
        while tail > head && symbols[tail - 1].is_missing() {
            tail -= 1;
        }
        Self {
            name: name.into(),
            begin,
            end,
            missing_begin: begin..head,
            missing_end: tail..end,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.begin..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn contains(&self, position: usize) -> bool {
        self.range().contains(&position)
    }

    /// Positions of the leading run of missing symbols.
    pub fn missing_begin(&self) -> Range<usize> {
        self.missing_begin.clone()
    }

    /// Positions of the trailing run of missing symbols.
    pub fn missing_end(&self) -> Range<usize> {
        self.missing_end.clone()
    }
}

/// A strand view over a symbol arena.
#[derive(Debug, Clone, Copy)]
pub struct Strand<'a> {
    span: &'a StrandSpan,
    arena: &'a [DotBracketSymbol],
}

impl<'a> Strand<'a> {
    pub fn new(span: &'a StrandSpan, arena: &'a [DotBracketSymbol]) -> Self {
        Self { span, arena }
    }

    pub fn span(&self) -> &'a StrandSpan {
        self.span
    }

    pub fn name(&self) -> &'a str {
        self.span.name()
    }

    pub fn begin(&self) -> usize {
        self.span.begin
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// True if the arena position lies within this strand.
    pub fn contains(&self, position: usize) -> bool {
        self.span.contains(position)
    }

    pub fn symbols(&self) -> &'a [DotBracketSymbol] {
        &self.arena[self.span.range()]
    }

    pub fn sequence(&self) -> String {
        self.symbols().iter().map(DotBracketSymbol::sequence).collect()
    }

    pub fn structure(&self) -> String {
        self.symbols().iter().map(DotBracketSymbol::structure).collect()
    }

    pub fn missing_begin(&self) -> &'a [DotBracketSymbol] {
        &self.arena[self.span.missing_begin()]
    }

    pub fn missing_end(&self) -> &'a [DotBracketSymbol] {
        &self.arena[self.span.missing_end()]
    }

    /// Missing symbols that are neither leading nor trailing.
    pub fn internal_missing(&self) -> Vec<&'a DotBracketSymbol> {
        let inner = self.span.missing_begin.end..self.span.missing_end.start;
        self.arena[inner].iter().filter(|s| s.is_missing()).collect()
    }

    /// Highest bracket level used in this strand, 0 without pairs.
    pub fn pseudoknot_order(&self) -> usize {
        self.symbols().iter().filter_map(DotBracketSymbol::order).max().unwrap_or(0)
    }
}

impl fmt::Display for Strand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">strand_{}\n{}\n{}", self.name(), self.sequence(), self.structure())
    }
}

#[cfg(test)]
mod tests {
    use crate::DotBracket;
    use crate::SymbolSequence;

    #[test]
    fn test_missing_runs() {
        let db = DotBracket::new("AAGGACCUU", "--((-))--").unwrap();
        let strands = db.strands();
        let s = strands[0];
        assert_eq!(s.missing_begin().len(), 2);
        assert_eq!(s.missing_end().len(), 2);
        assert_eq!(s.span().missing_end(), 7..9);
        let internal = s.internal_missing();
        assert_eq!(internal.len(), 1);
        assert_eq!(internal[0].index(), 4);
        assert_eq!(s.pseudoknot_order(), 0);
    }

    #[test]
    fn test_all_missing() {
        let db = DotBracket::new("AAA", "---").unwrap();
        let s = db.strands()[0];
        assert_eq!(s.missing_begin().len(), 3);
        assert!(s.missing_end().is_empty());
        assert!(s.internal_missing().is_empty());
    }

    #[test]
    fn test_views_per_strand() {
        let db = DotBracket::new("GGA&UCC&AA", "([.&.)]&..").unwrap();
        let strands = db.strands();
        assert_eq!(strands.len(), 3);
        assert_eq!(strands[1].begin(), 3);
        assert_eq!(strands[1].sequence(), "UCC");
        assert_eq!(strands[1].structure(), ".)]");
        assert_eq!(strands[1].pseudoknot_order(), 1);
        assert_eq!(strands[2].pseudoknot_order(), 0);
        assert!(strands[2].contains(7));
        assert!(!strands[2].contains(6));
        assert_eq!(strands[0].to_string(), ">strand_A\nGGA\n([.");
    }
}
