//! Combined strands.
//!
//! Strands that are cross-linked by base pairs are merged into one
//! `CombinedStrand`, which owns a renumbered copy of the member symbols.
//! A symbol's new position is its enumeration order over the concatenated
//! member strands, and partners are re-resolved against that numbering.
//!

use std::fmt;
use std::collections::VecDeque;
use ahash::AHashMap;
use ahash::AHashSet;
use itertools::Itertools;
use log::warn;
use nohash_hasher::IntMap;

use crate::DotBracketSymbol;
use crate::Strand;
use crate::StrandSpan;
use crate::SymbolSequence;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedStrand {
    symbols: Vec<DotBracketSymbol>,
    spans: Vec<StrandSpan>,
    renumbering: IntMap<usize, usize>,
}

impl CombinedStrand {
    /// Copy and renumber the symbols of the given strands. Partners outside
    /// of these strands cannot be resolved and are dropped.
    pub fn new(strands: &[Strand<'_>]) -> Self {
        let mut renumbering: IntMap<usize, usize> = IntMap::default();
        for (new, symbol) in strands.iter().flat_map(Strand::symbols).enumerate() {
            renumbering.insert(symbol.index(), new);
        }

        let mut symbols: Vec<DotBracketSymbol> = strands.iter()
            .flat_map(Strand::symbols)
            .enumerate()
            .map(|(new, symbol)| symbol.renumbered(new))
            .collect();

        for (new, symbol) in strands.iter().flat_map(Strand::symbols).enumerate() {
            if let Some(old_pair) = symbol.pair() {
                let pair = renumbering.get(&old_pair).copied();
                if pair.is_none() {
                    warn!("Dropping pair ({}, {}) leaving the combined strands.", symbol.index(), old_pair);
                }
                symbols[new].set_pair(pair);
            }
        }

        let mut spans = Vec::with_capacity(strands.len());
        let mut begin = 0;
        for strand in strands {
            spans.push(StrandSpan::new(strand.name(), begin, begin + strand.len(), &symbols));
            begin += strand.len();
        }

        Self { symbols, spans, renumbering }
    }

    /// Position of a symbol of the source sequence within this combined strand.
    pub fn index_of(&self, source_position: usize) -> Option<usize> {
        self.renumbering.get(&source_position).copied()
    }

    /// Concatenated names of the member strands.
    pub fn name(&self) -> String {
        self.spans.iter().map(StrandSpan::name).join("")
    }

    /// True if the structure holds no base pair at all (only dots and dashes).
    pub fn is_invalid(&self) -> bool {
        self.symbols.iter().all(|s| s.order().is_none())
    }

    /// Leading and trailing missing runs, two per member strand.
    pub fn terminal_missing(&self) -> Vec<&[DotBracketSymbol]> {
        self.strands().iter()
            .flat_map(|s| [s.missing_begin(), s.missing_end()])
            .collect()
    }

    /// Missing symbols that are not part of a terminal run.
    pub fn internal_missing(&self) -> Vec<&DotBracketSymbol> {
        self.strands().iter()
            .flat_map(|s| s.internal_missing())
            .collect()
    }

    /// Member strand holding a position.
    pub fn strand_of(&self, position: usize) -> Option<Strand<'_>> {
        self.strands().into_iter().find(|s| s.contains(position))
    }
}

impl SymbolSequence for CombinedStrand {
    fn symbols(&self) -> &[DotBracketSymbol] {
        &self.symbols
    }

    fn strand_spans(&self) -> &[StrandSpan] {
        &self.spans
    }
}

impl fmt::Display for CombinedStrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">strand_{}\n{}\n{}", self.name(), self.sequence(), self.structure())
    }
}

/// Cluster the strands of a sequence into connected components.
///
/// Two strands are adjacent if a symbol of one is paired with a symbol of
/// the other, or if `links` (arena positions, e.g. non-canonical pairs
/// which are not part of the bracket notation) connects them. Every
/// component becomes one `CombinedStrand`, unconnected strands become
/// singletons. Components are emitted in order of their first strand and
/// keep the input strand order internally.
pub fn combine_strands(db: &impl SymbolSequence, links: &[(usize, usize)]) -> Vec<CombinedStrand> {
    let strands = db.strands();
    let strand_of = |position: usize| strands.iter().position(|s| s.contains(position));

    let mut adjacency: AHashMap<usize, AHashSet<usize>> = AHashMap::default();
    let mut connect = |a: usize, b: usize| {
        if a != b {
            adjacency.entry(a).or_default().insert(b);
            adjacency.entry(b).or_default().insert(a);
        }
    };

    for (s, strand) in strands.iter().enumerate() {
        for symbol in strand.symbols() {
            if let Some(t) = symbol.pair().and_then(strand_of) {
                connect(s, t);
            }
        }
    }
    for &(u, v) in links {
        if let (Some(s), Some(t)) = (strand_of(u), strand_of(v)) {
            connect(s, t);
        }
    }

    let mut visited = vec![false; strands.len()];
    let mut combined = Vec::new();
    for first in 0..strands.len() {
        if visited[first] {
            continue;
        }
        visited[first] = true;
        let mut component = vec![first];
        let mut queue = VecDeque::from([first]);
        while let Some(s) = queue.pop_front() {
            for &t in adjacency.get(&s).into_iter().flatten() {
                if !visited[t] {
                    visited[t] = true;
                    component.push(t);
                    queue.push_back(t);
                }
            }
        }
        component.sort_unstable();
        let members: Vec<Strand<'_>> = component.iter().map(|&s| strands[s]).collect();
        combined.push(CombinedStrand::new(&members));
    }
    combined
}
