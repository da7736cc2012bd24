//! Residue collections.
//!
//! The residue level is supplied by structure-file readers: an ordered list
//! of chains, each an ordered list of residues with a one-letter code and a
//! flag for residues that were not observed in the experiment.
//!

use std::fmt;
use ahash::AHashMap;

/// Stable identifier of a residue: chain, residue number and insertion code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueId {
    chain: String,
    number: i32,
    icode: Option<char>,
}

impl ResidueId {
    pub fn new(chain: impl Into<String>, number: i32) -> Self {
        Self { chain: chain.into(), number, icode: None }
    }

    pub fn with_icode(mut self, icode: char) -> Self {
        self.icode = Some(icode);
        self
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn icode(&self) -> Option<char> {
        self.icode
    }
}

impl fmt::Display for ResidueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.icode {
            Some(icode) => write!(f, "{}.{}{}", self.chain, self.number, icode),
            None => write!(f, "{}.{}", self.chain, self.number),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoleculeType {
    Rna,
    Protein,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    id: ResidueId,
    one_letter: char,
    missing: bool,
    molecule: MoleculeType,
}

impl Residue {
    pub fn new(id: ResidueId, one_letter: char, molecule: MoleculeType) -> Self {
        Self { id, one_letter, missing: false, molecule }
    }

    /// Mark the residue as not observed.
    pub fn missing(mut self) -> Self {
        self.missing = true;
        self
    }

    pub fn id(&self) -> &ResidueId {
        &self.id
    }

    pub fn one_letter(&self) -> char {
        self.one_letter
    }

    pub fn is_missing(&self) -> bool {
        self.missing
    }

    pub fn molecule(&self) -> MoleculeType {
        self.molecule
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    id: String,
    residues: Vec<Residue>,
}

impl Chain {
    pub fn new(id: impl Into<String>, residues: Vec<Residue>) -> Self {
        Self { id: id.into(), residues }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

/// Ordered chains of residues. Residues are addressed by identifier or by
/// their 0-based position in the concatenation of all chains.
#[derive(Debug, Clone)]
pub struct ResidueCollection {
    chains: Vec<Chain>,
    positions: AHashMap<ResidueId, usize>,
}

impl ResidueCollection {
    pub fn new(chains: Vec<Chain>) -> Self {
        let positions = chains.iter()
            .flat_map(|c| c.residues.iter())
            .enumerate()
            .map(|(p, r)| (r.id.clone(), p))
            .collect();
        Self { chains, positions }
    }

    /// Group residues into chains by consecutive chain identifiers.
    pub fn from_residues(residues: impl IntoIterator<Item = Residue>) -> Self {
        let mut chains: Vec<Chain> = Vec::new();
        for residue in residues {
            match chains.last_mut() {
                Some(chain) if chain.id == residue.id.chain => chain.residues.push(residue),
                _ => chains.push(Chain::new(residue.id.chain.clone(), vec![residue])),
            }
        }
        Self::new(chains)
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn residues(&self) -> impl Iterator<Item = &Residue> {
        self.chains.iter().flat_map(|c| c.residues.iter())
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position_of(&self, id: &ResidueId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn residue(&self, id: &ResidueId) -> Option<&Residue> {
        self.residues().nth(self.position_of(id)?)
    }

    pub fn chain_of(&self, id: &ResidueId) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == id.chain && c.residues.iter().any(|r| &r.id == id))
    }

    pub fn sequence(&self) -> String {
        self.residues().map(Residue::one_letter).collect()
    }

    /// Keep residues of one molecule type; chains left empty are dropped.
    pub fn filtered(&self, molecule: MoleculeType) -> Self {
        let chains = self.chains.iter()
            .map(|c| Chain::new(
                c.id.clone(),
                c.residues.iter().filter(|r| r.molecule == molecule).cloned().collect(),
            ))
            .filter(|c| !c.is_empty())
            .collect();
        Self::new(chains)
    }
}
