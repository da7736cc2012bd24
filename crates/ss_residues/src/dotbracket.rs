//! Dot-bracket sequences backed by a residue collection.
//!
//! Every symbol corresponds to one residue, strands follow the chains of
//! the collection and the CT `original` column reports residue numbers.
//! Residues that were not observed are always written as `-`, whatever
//! the structure line says at that position.
//!

use std::fmt;
use ahash::AHashMap;
use log::{debug, trace};

use ss_structure::CombinedStrand;
use ss_structure::Derivation;
use ss_structure::DotBracket;
use ss_structure::DotBracketSymbol;
use ss_structure::PseudoknotFinder;
use ss_structure::StrandSpan;
use ss_structure::StructureError;
use ss_structure::SymbolSequence;
use ss_structure::combine_strands;

use crate::ClassifiedBasePair;
use crate::Residue;
use crate::ResidueCollection;
use crate::ResidueError;
use crate::ResidueId;
use crate::bpseq_from_residues;

#[derive(Debug, Clone)]
pub struct DotBracketFromResidues {
    dot_bracket: DotBracket,
    residue_ids: Vec<ResidueId>,
    positions: AHashMap<ResidueId, usize>,
}

impl DotBracketFromResidues {
    /// Lay a sequence and structure over the residues, one character each.
    pub fn new(sequence: &str, structure: &str, residues: &ResidueCollection) -> Result<Self, ResidueError> {
        let structure: Vec<char> = structure.trim().chars().collect();
        if structure.len() != residues.len() {
            return Err(ResidueError::LengthMismatch {
                what: "dot-bracket structure",
                expected: residues.len(),
                found: structure.len(),
            });
        }
        let structure: String = structure.into_iter()
            .zip(residues.residues())
            .map(|(c, r)| if r.is_missing() { '-' } else { c })
            .collect();
        trace!("structure with missing residues: {structure}");

        let mut layout = Vec::with_capacity(residues.chains().len());
        let mut begin = 0;
        for chain in residues.chains() {
            layout.push((chain.id().to_string(), begin, begin + chain.len()));
            begin += chain.len();
        }
        let numbers = residues.residues().map(|r| r.id().number()).collect();

        let dot_bracket = DotBracket::new(sequence, &structure)
            .and_then(|db| db.with_strands(&layout))
            .and_then(|db| db.with_original_numbers(numbers))
            .map_err(StructureError::derived(Derivation::FromResidues))?;

        let residue_ids: Vec<ResidueId> = residues.residues().map(|r| r.id().clone()).collect();
        let positions = residue_ids.iter()
            .enumerate()
            .map(|(p, id)| (id.clone(), p))
            .collect();
        Ok(Self { dot_bracket, residue_ids, positions })
    }

    /// Derive the bracket structure of residues and their base pairs.
    ///
    /// Returns the structure together with copies of `pairs` in which every
    /// pair realized by the brackets is marked as represented. Pairs on
    /// missing residues are not realized.
    pub fn from_residues(
        residues: &ResidueCollection,
        pairs: &[ClassifiedBasePair],
        finder: &impl PseudoknotFinder,
    ) -> Result<(Self, Vec<ClassifiedBasePair>), ResidueError> {
        let is_missing = |id: &ResidueId| residues.residue(id).is_some_and(Residue::is_missing);
        let observed: Vec<ClassifiedBasePair> = pairs.iter()
            .filter(|p| !is_missing(p.left()) && !is_missing(p.right()))
            .cloned()
            .collect();
        if observed.len() < pairs.len() {
            debug!("{} base pair(s) on missing residues not realized", pairs.len() - observed.len());
        }

        let bpseq = bpseq_from_residues(residues, &observed)?;
        let db = DotBracket::from_bpseq_with(&bpseq, finder)
            .map_err(StructureError::derived(Derivation::FromResidues))?;
        let me = Self::new(&db.sequence(), &db.structure(), residues)?;
        Ok(me.mark_represented(pairs))
    }

    /// Mark the pairs realized by this structure and flag the symbols of
    /// realized non-canonical pairs.
    pub fn mark_represented(self, pairs: &[ClassifiedBasePair]) -> (Self, Vec<ClassifiedBasePair>) {
        let mut non_canonical = Vec::new();
        let marked: Vec<ClassifiedBasePair> = pairs.iter()
            .map(|pair| match self.positions_of(pair) {
                Some((u, v)) if self.dot_bracket.symbols()[u].pair() == Some(v) => {
                    if !pair.is_canonical() {
                        non_canonical.extend([u, v]);
                    }
                    pair.marked_represented()
                }
                _ => pair.clone(),
            })
            .collect();
        debug!("{} of {} base pairs represented",
            marked.iter().filter(|p| p.is_represented()).count(), marked.len());

        let me = Self {
            dot_bracket: self.dot_bracket.with_non_canonical(&non_canonical),
            ..self
        };
        (me, marked)
    }

    pub fn dot_bracket(&self) -> &DotBracket {
        &self.dot_bracket
    }

    pub fn residue_id(&self, position: usize) -> Option<&ResidueId> {
        self.residue_ids.get(position)
    }

    pub fn position_of(&self, id: &ResidueId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn symbol_for(&self, id: &ResidueId) -> Option<&DotBracketSymbol> {
        self.symbol(self.position_of(id)?)
    }

    /// Cluster strands connected either by brackets or by non-canonical
    /// pairs between their residues.
    pub fn combine_strands_with_pairs(&self, pairs: &[ClassifiedBasePair]) -> Vec<CombinedStrand> {
        let links: Vec<(usize, usize)> = pairs.iter()
            .filter(|p| !p.is_canonical())
            .filter_map(|p| self.positions_of(p))
            .collect();
        combine_strands(self, &links)
    }

    fn positions_of(&self, pair: &ClassifiedBasePair) -> Option<(usize, usize)> {
        Some((self.position_of(pair.left())?, self.position_of(pair.right())?))
    }
}

impl SymbolSequence for DotBracketFromResidues {
    fn symbols(&self) -> &[DotBracketSymbol] {
        self.dot_bracket.symbols()
    }

    fn strand_spans(&self) -> &[StrandSpan] {
        self.dot_bracket.strand_spans()
    }

    fn original_number(&self, position: usize) -> i32 {
        self.dot_bracket.original_number(position)
    }
}

impl fmt::Display for DotBracketFromResidues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.sequence_with_strands(), self.structure_with_strands())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MoleculeType;
    use ss_structure::MaxNestedFinder;

    fn residues(chain: &str, first: i32, seq: &str, missing: &[usize]) -> Vec<Residue> {
        seq.chars().enumerate()
            .map(|(k, c)| {
                let r = Residue::new(ResidueId::new(chain, first + k as i32), c, MoleculeType::Rna);
                if missing.contains(&k) { r.missing() } else { r }
            })
            .collect()
    }

    #[test]
    fn test_missing_residues_win() {
        let collection = ResidueCollection::from_residues(residues("A", 1, "GGAAACC", &[2, 3]));
        let db = DotBracketFromResidues::new("GGAAACC", "((...))", &collection).unwrap();
        assert_eq!(db.structure(), "((--.))");
        assert_eq!(db.strands()[0].internal_missing().len(), 2);

        let err = DotBracketFromResidues::new("GGAAACC", "(((.)))", &collection).unwrap_err();
        assert!(matches!(err, ResidueError::Structure(StructureError::Derivation {
            step: Derivation::FromResidues,
            ..
        })));
    }

    #[test]
    fn test_pairs_on_missing_residues_are_not_realized() {
        let collection = ResidueCollection::from_residues(residues("A", 1, "GGAAACC", &[6]));
        let pairs = [
            ClassifiedBasePair::canonical(ResidueId::new("A", 1), ResidueId::new("A", 7)),
            ClassifiedBasePair::canonical(ResidueId::new("A", 2), ResidueId::new("A", 6)),
        ];
        let (db, marked) = DotBracketFromResidues::from_residues(
            &collection, &pairs, &MaxNestedFinder::default()).unwrap();
        assert_eq!(db.structure(), ".(...)-");
        assert!(!marked[0].is_represented());
        assert!(marked[1].is_represented());
        assert!(db.symbol_for(&ResidueId::new("A", 7)).unwrap().is_missing());
    }

    #[test]
    fn test_chains_become_strands() {
        let mut all = residues("A", 1, "GGA", &[]);
        all.extend(residues("B", 30, "UCC", &[]));
        let collection = ResidueCollection::from_residues(all);
        let db = DotBracketFromResidues::new("GGAUCC", "((..))", &collection).unwrap();
        assert_eq!(db.to_string(), "GGA&UCC\n((.&.))");
        assert_eq!(db.strands()[1].name(), "B");
        assert_eq!(db.original_number(3), 30);
        assert_eq!(db.residue_id(4), Some(&ResidueId::new("B", 31)));
        assert_eq!(db.symbol_for(&ResidueId::new("B", 32)).unwrap().pair(), Some(0));

        let ct = db.to_ct().unwrap();
        assert_eq!(ct.strand_count(), 2);
        assert_eq!(ct.entries()[3].original(), 30);

        let err = DotBracketFromResidues::new("GGAUC", "((.))", &collection).unwrap_err();
        assert!(matches!(err, ResidueError::LengthMismatch { expected: 6, found: 5, .. }));
    }
}
