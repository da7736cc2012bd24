use thiserror::Error;
use ss_structure::StructureError;

use crate::ResidueId;

/// Error type for conversions between residues and structure formats.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResidueError {
    /// A base pair references a residue that is not in the collection.
    #[error("residue {0} not found in the residue collection")]
    UnknownResidue(ResidueId),

    /// Residue collection and structure do not describe the same residues.
    #[error("{what}: expected {expected} residues, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Structure(#[from] StructureError),
}
