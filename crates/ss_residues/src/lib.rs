//! The ss_residues crate.
//!
//! Bridges the residue level to secondary structure formats:
//!  - residue collections (chains of residues with one-letter codes)
//!  - classified base pairs (canonical / non-canonical)
//!  - BPSEQ and CT tables derived from both
//!  - dot-bracket sequences with residue-identifier mapping and
//!    chain-aware strands
//!

mod error;
mod residue;
mod base_pair;
mod convert;
mod dotbracket;

pub use error::*;
pub use residue::*;
pub use base_pair::*;
pub use convert::*;
pub use dotbracket::*;

