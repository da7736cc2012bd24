use std::fmt;
use thiserror::Error;

/// Text format a line was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    BpSeq,
    Ct,
    DotBracket,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::BpSeq => "BPSEQ",
            Format::Ct => "CT",
            Format::DotBracket => "dot-bracket",
        };
        write!(f, "{name}")
    }
}

/// The representation a derived structure was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    FromBpSeq,
    FromCt,
    FromDotBracket,
    FromResidues,
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Derivation::FromBpSeq => "derived from BPSEQ",
            Derivation::FromCt => "derived from CT",
            Derivation::FromDotBracket => "derived from dot-bracket",
            Derivation::FromResidues => "derived from residues and base pairs",
        };
        write!(f, "{name}")
    }
}

/// Structural-validation failure. Raised whenever a pair table or
/// bracket sequence violates one of its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("line does not conform to {format} format: {line}")]
    MalformedLine { format: Format, line: String },

    #[error("residue {index} cannot be paired with itself")]
    SelfPair { index: usize },

    #[error("inconsistent numbering in {format} data: previous={previous}, current={current}")]
    Numbering {
        format: Format,
        previous: usize,
        current: usize,
    },

    #[error("inconsistent pairing in {format} data: ({index} -> {pair}), but {pair} does not exist")]
    MissingPartner {
        format: Format,
        index: usize,
        pair: usize,
    },

    #[error("inconsistent pairing in {format} data: ({index} -> {pair}) and ({pair} -> {back})")]
    AsymmetricPair {
        format: Format,
        index: usize,
        pair: usize,
        back: usize,
    },

    #[error("invalid '{column}' column in CT entry: {entry}")]
    InvalidColumn { column: &'static str, entry: String },

    #[error("inconsistent strand boundary ('{column}' column) in CT entry: {entry}")]
    StrandBoundary { column: &'static str, entry: String },

    #[error("sequence and structure differ in length ({sequence} vs {structure})")]
    LengthMismatch { sequence: usize, structure: usize },

    #[error("unknown structure symbol '{symbol}' at position {position}")]
    UnknownSymbol { symbol: char, position: usize },

    #[error("unmatched bracket '{bracket}' at position {position}")]
    UnmatchedBracket { bracket: char, position: usize },

    #[error("strand layout covers residues up to {found}, expected {expected}")]
    StrandLayout { expected: usize, found: usize },

    #[error("pseudoknot order {order} exceeds the bracket alphabet")]
    TooManyLevels { order: usize },

    #[error("invalid structure {step}: {source}")]
    Derivation {
        step: Derivation,
        #[source]
        source: Box<StructureError>,
    },
}

impl StructureError {
    /// Attribute an error to the derivation step that produced it.
    pub fn derived(step: Derivation) -> impl FnOnce(StructureError) -> StructureError {
        move |source| StructureError::Derivation {
            step,
            source: Box::new(source),
        }
    }

    pub(crate) fn malformed(format: Format, line: impl Into<String>) -> Self {
        StructureError::MalformedLine {
            format,
            line: line.into(),
        }
    }
}
