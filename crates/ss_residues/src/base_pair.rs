use std::fmt;

use crate::ResidueId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasePairKind {
    Canonical,
    NonCanonical,
}

/// An externally classified base pair between two residues.
///
/// The pair is unordered: `left` and `right` keep the order in which the
/// classifier reported them, but comparisons go through `residues()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedBasePair {
    left: ResidueId,
    right: ResidueId,
    kind: BasePairKind,
    justification: Option<String>,
    represented: bool,
}

impl ClassifiedBasePair {
    pub fn canonical(left: ResidueId, right: ResidueId) -> Self {
        Self {
            left,
            right,
            kind: BasePairKind::Canonical,
            justification: None,
            represented: false,
        }
    }

    pub fn non_canonical(left: ResidueId, right: ResidueId, justification: Option<String>) -> Self {
        Self {
            left,
            right,
            kind: BasePairKind::NonCanonical,
            justification,
            represented: false,
        }
    }

    pub fn left(&self) -> &ResidueId {
        &self.left
    }

    pub fn right(&self) -> &ResidueId {
        &self.right
    }

    /// Both residues, smaller identifier first.
    pub fn residues(&self) -> (&ResidueId, &ResidueId) {
        if self.left <= self.right {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        }
    }

    pub fn kind(&self) -> BasePairKind {
        self.kind
    }

    pub fn is_canonical(&self) -> bool {
        self.kind == BasePairKind::Canonical
    }

    pub fn justification(&self) -> Option<&str> {
        self.justification.as_deref()
    }

    /// True once the pair was found in a derived bracket structure.
    pub fn is_represented(&self) -> bool {
        self.represented
    }

    pub fn marked_represented(&self) -> Self {
        Self {
            represented: true,
            ..self.clone()
        }
    }

    pub fn involves(&self, id: &ResidueId) -> bool {
        &self.left == id || &self.right == id
    }

    /// The other residue of the pair.
    pub fn partner_of(&self, id: &ResidueId) -> Option<&ResidueId> {
        if &self.left == id {
            Some(&self.right)
        } else if &self.right == id {
            Some(&self.left)
        } else {
            None
        }
    }
}

impl fmt::Display for ClassifiedBasePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = self.residues();
        match (self.kind, &self.justification) {
            (BasePairKind::Canonical, _) => write!(f, "{a} - {b}"),
            (BasePairKind::NonCanonical, Some(j)) => write!(f, "{a} ~ {b} ({j})"),
            (BasePairKind::NonCanonical, None) => write!(f, "{a} ~ {b}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unordered_pair() {
        let a = ResidueId::new("A", 1);
        let b = ResidueId::new("A", 9);
        let pair = ClassifiedBasePair::non_canonical(b.clone(), a.clone(), Some("cWH".to_string()));
        assert_eq!(pair.residues(), (&a, &b));
        assert_eq!(pair.partner_of(&a), Some(&b));
        assert!(pair.involves(&b));
        assert!(!pair.is_canonical());
        assert_eq!(pair.to_string(), "A.1 ~ A.9 (cWH)");
    }

    #[test]
    fn test_marking_copies() {
        let pair = ClassifiedBasePair::canonical(ResidueId::new("A", 1), ResidueId::new("A", 9));
        let marked = pair.marked_represented();
        assert!(!pair.is_represented());
        assert!(marked.is_represented());
        assert_eq!(marked.residues(), pair.residues());
    }
}
