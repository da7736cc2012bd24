//! The ss_structure crate.
//!
//! Interconvertible secondary structure representations:
//!  - BPSEQ (index / partner / residue tables)
//!  - CT (BPSEQ with neighbor links and original numbering)
//!  - dot-bracket (sequence + bracket notation, split into strands)
//!
//! Provides pseudoknot extraction from crossing pair tables.
//!

mod error;
mod render;
mod pair_set;
mod bpseq;
mod ct;
mod dotbracket;
mod strand;
mod combined;
mod pseudoknots;

pub use error::*;
pub use render::*;
pub use pair_set::*;
pub use bpseq::*;
pub use ct::*;
pub use dotbracket::*;
pub use strand::*;
pub use combined::*;
pub use pseudoknots::*;


/// Nucleic Acid INdeX: 0-based residue positions in pair sets.
/// `P1KEY` needs to be *twice as large* (in bits) as `NAIDX`, since
/// pairs `(NAIDX, NAIDX)` are compacted into one `P1KEY`.
pub type NAIDX = u32;

/// Pair key. Must be >= 2×`NAIDX` in bit width so we can safely pack two indices.
pub type P1KEY = u64;

/// Compile-time sanity check: 2×NAIDX bits must fit into P1KEY.
const _: () = {
    debug_assert!(2 * NAIDX::BITS <= P1KEY::BITS);
};

