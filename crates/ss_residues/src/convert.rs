//! Pair tables derived from residues and classified base pairs.
//!

use ahash::AHashSet;
use log::debug;

use ss_structure::BpSeq;
use ss_structure::BpSeqEntry;
use ss_structure::Ct;
use ss_structure::CtEntry;
use ss_structure::Derivation;
use ss_structure::StructureError;

use crate::ClassifiedBasePair;
use crate::MoleculeType;
use crate::ResidueCollection;
use crate::ResidueError;

/// BPSEQ over all residues of the collection.
///
/// Every pair contributes two mutually referencing entries, annotated with
/// the justification of non-canonical pairs. Residues not covered by any
/// pair are unpaired. A pair reported more than once, in either order,
/// counts once. A residue covered by two different pairs violates the
/// BPSEQ invariants and is reported as such.
pub fn bpseq_from_residues(
    residues: &ResidueCollection,
    pairs: &[ClassifiedBasePair],
) -> Result<BpSeq, ResidueError> {
    let codes: Vec<char> = residues.residues().map(|r| r.one_letter()).collect();
    let mut entries = Vec::with_capacity(codes.len());
    let mut covered: AHashSet<usize> = AHashSet::default();
    let mut seen: AHashSet<(usize, usize)> = AHashSet::default();

    for pair in pairs {
        let (left, right) = pair.residues();
        let i = residues.position_of(left)
            .ok_or_else(|| ResidueError::UnknownResidue(left.clone()))?;
        let j = residues.position_of(right)
            .ok_or_else(|| ResidueError::UnknownResidue(right.clone()))?;
        if !seen.insert((i.min(j), i.max(j))) {
            continue;
        }
        let comment = match pair.is_canonical() {
            true => "",
            false => pair.justification().unwrap_or(""),
        };
        entries.push(BpSeqEntry::with_comment(i + 1, j + 1, codes[i], comment));
        entries.push(BpSeqEntry::with_comment(j + 1, i + 1, codes[j], comment));
        covered.insert(i);
        covered.insert(j);
    }

    for (p, &code) in codes.iter().enumerate() {
        if !covered.contains(&p) {
            entries.push(BpSeqEntry::new(p + 1, 0, code));
        }
    }
    debug!("{} base pairs over {} residues", pairs.len(), codes.len());

    BpSeq::new(entries)
        .map_err(StructureError::derived(Derivation::FromResidues))
        .map_err(ResidueError::from)
}

/// CT of a BPSEQ laid out over the RNA chains of a residue collection.
///
/// Neighbor columns restart at every chain and `original` carries the
/// residue numbers.
pub fn ct_from_bpseq_and_residues(bpseq: &BpSeq, residues: &ResidueCollection) -> Result<Ct, ResidueError> {
    let rna = residues.filtered(MoleculeType::Rna);
    if rna.len() != bpseq.len() {
        return Err(ResidueError::LengthMismatch {
            what: "RNA residues for CT",
            expected: bpseq.len(),
            found: rna.len(),
        });
    }

    let layout = rna.chains().iter()
        .flat_map(|chain| (0..chain.len()).map(move |local| (local, chain.len())));
    let numbers = rna.residues().map(|r| r.id().number());

    let entries = bpseq.entries().iter()
        .zip(layout)
        .zip(numbers)
        .map(|((e, (local, size)), number)| CtEntry::with_comment(
            e.index(),
            e.pair(),
            local,
            (local + 2) % (size + 1),
            number,
            e.seq(),
            e.comment(),
        ));

    Ct::new(entries)
        .map_err(StructureError::derived(Derivation::FromResidues))
        .map_err(ResidueError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Residue;
    use crate::ResidueId;

    fn collection() -> ResidueCollection {
        let chain_a = "GGAC".chars().enumerate()
            .map(|(k, c)| Residue::new(ResidueId::new("A", k as i32 + 1), c, MoleculeType::Rna));
        let chain_b = "GUCC".chars().enumerate()
            .map(|(k, c)| Residue::new(ResidueId::new("B", k as i32 + 20), c, MoleculeType::Rna));
        ResidueCollection::from_residues(chain_a.chain(chain_b))
    }

    #[test]
    fn test_bpseq_from_residues() {
        let residues = collection();
        let pairs = [
            ClassifiedBasePair::canonical(ResidueId::new("A", 1), ResidueId::new("B", 23)),
            ClassifiedBasePair::non_canonical(ResidueId::new("B", 20), ResidueId::new("A", 3), Some("tSH".to_string())),
        ];
        let bpseq = bpseq_from_residues(&residues, &pairs).unwrap();
        assert_eq!(bpseq.len(), 8);
        assert_eq!(bpseq.sequence(), "GGACGUCC");
        assert_eq!(bpseq.pairs(), vec![(1, 8), (3, 5)]);
        assert_eq!(bpseq.entry(1).unwrap().comment(), "");
        assert_eq!(bpseq.entry(3).unwrap().comment(), "tSH");
        assert_eq!(bpseq.entry(5).unwrap().comment(), "tSH");
        assert!(!bpseq.entry(2).unwrap().is_paired());
    }

    #[test]
    fn test_repeated_pair_counts_once() {
        let residues = collection();
        let pairs = [
            ClassifiedBasePair::canonical(ResidueId::new("A", 1), ResidueId::new("B", 23)),
            ClassifiedBasePair::canonical(ResidueId::new("B", 23), ResidueId::new("A", 1)),
            ClassifiedBasePair::canonical(ResidueId::new("A", 1), ResidueId::new("B", 23)),
        ];
        let bpseq = bpseq_from_residues(&residues, &pairs).unwrap();
        assert_eq!(bpseq.len(), 8);
        assert_eq!(bpseq.pairs(), vec![(1, 8)]);
    }

    #[test]
    fn test_bpseq_errors() {
        let residues = collection();
        let unknown = [ClassifiedBasePair::canonical(ResidueId::new("A", 1), ResidueId::new("C", 1))];
        assert_eq!(
            bpseq_from_residues(&residues, &unknown).unwrap_err(),
            ResidueError::UnknownResidue(ResidueId::new("C", 1)),
        );

        let doubled = [
            ClassifiedBasePair::canonical(ResidueId::new("A", 1), ResidueId::new("B", 23)),
            ClassifiedBasePair::canonical(ResidueId::new("A", 1), ResidueId::new("B", 22)),
        ];
        let err = bpseq_from_residues(&residues, &doubled).unwrap_err();
        assert!(matches!(err, ResidueError::Structure(StructureError::Derivation {
            step: Derivation::FromResidues,
            ..
        })));
    }

    #[test]
    fn test_ct_per_chain() {
        let residues = collection();
        let pairs = [ClassifiedBasePair::canonical(ResidueId::new("A", 1), ResidueId::new("B", 23))];
        let bpseq = bpseq_from_residues(&residues, &pairs).unwrap();
        let ct = ct_from_bpseq_and_residues(&bpseq, &residues).unwrap();
        assert_eq!(ct.strand_count(), 2);

        let e = &ct.entries()[4];
        assert_eq!((e.index(), e.before(), e.after(), e.original()), (5, 0, 2, 20));
        let e = &ct.entries()[3];
        assert_eq!((e.index(), e.before(), e.after(), e.original()), (4, 3, 0, 4));
        assert_eq!(ct.entries()[0].pair(), 8);
        assert_eq!(BpSeq::from(&ct), bpseq);
    }

    #[test]
    fn test_ct_ignores_other_molecules() {
        let mut all: Vec<Residue> = collection().residues().cloned().collect();
        all.push(Residue::new(ResidueId::new("P", 1), 'M', MoleculeType::Protein));
        let residues = ResidueCollection::from_residues(all);

        let rna_only = bpseq_from_residues(&residues.filtered(MoleculeType::Rna), &[]).unwrap();
        assert_eq!(ct_from_bpseq_and_residues(&rna_only, &residues).unwrap().len(), 8);

        let everything = bpseq_from_residues(&residues, &[]).unwrap();
        assert!(matches!(
            ct_from_bpseq_and_residues(&everything, &residues),
            Err(ResidueError::LengthMismatch { expected: 9, found: 8, .. })
        ));
    }
}
