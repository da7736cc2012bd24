//! Pseudoknot extraction.
//!
//! A pseudoknot finder takes a BPSEQ table whose pairs may cross and
//! reports one or more alternative sets of pairs whose removal leaves a
//! nested structure. Each result is a full copy of the input where every
//! pair that is *not* considered a pseudoknot has its partner zeroed.
//!
//! `MaxNestedFinder` keeps a maximum nested subset of the pairs and reports
//! the rest. Pairs that cross nothing are part of every maximum nested
//! subset, so the search runs over crossing pairs only: a Nussinov-style
//! table over their (compressed) positions, followed by a traceback of all
//! co-optimal subsets.
//!

use std::collections::BTreeSet;
use log::debug;
use ndarray::Array2;
use nohash_hasher::IntMap;

use crate::BpSeq;
use crate::NAIDX;
use crate::P1KEY;
use crate::Pair;
use crate::PairSet;

pub trait PseudoknotFinder {
    /// Alternative pseudoknot pair sets of `bpseq`, each as a full BPSEQ
    /// copy containing only those pairs. A nested input yields a single
    /// copy without any pairs.
    fn find_pseudoknots(&self, bpseq: &BpSeq) -> Vec<BpSeq>;
}

/// Reports the complements of maximum nested pair subsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxNestedFinder {
    max_solutions: usize,
}

impl Default for MaxNestedFinder {
    fn default() -> Self {
        Self { max_solutions: 16 }
    }
}

impl MaxNestedFinder {
    /// Finder reporting at most `max_solutions` (at least one) alternatives.
    pub fn new(max_solutions: usize) -> Self {
        Self { max_solutions: max_solutions.max(1) }
    }

    pub fn max_solutions(&self) -> usize {
        self.max_solutions
    }

    /// All maximum nested subsets of `pairs` (up to `max_solutions`),
    /// in a deterministic order.
    pub fn max_nested_subsets(&self, pairs: &PairSet) -> Vec<PairSet> {
        let mut crossing = PairSet::new(pairs.length());
        for (p, q) in pairs.crossing_pairs() {
            crossing.insert(p);
            crossing.insert(q);
        }
        let free = pairs.difference(&crossing);
        if crossing.is_empty() {
            return vec![free];
        }

        // Compress the crossing pairs onto consecutive positions.
        let mut positions: Vec<NAIDX> = crossing.iter().flat_map(|p| [p.i(), p.j()]).collect();
        positions.sort_unstable();
        let rank: IntMap<NAIDX, usize> = positions.iter()
            .enumerate()
            .map(|(r, &p)| (p, r))
            .collect();
        let mut partner = vec![0; positions.len()];
        for p in crossing.iter() {
            partner[rank[&p.i()]] = rank[&p.j()];
            partner[rank[&p.j()]] = rank[&p.i()];
        }

        let dp = max_nested(&partner);
        let mut memo = IntMap::default();
        let solutions = traceback_all(0, partner.len() - 1, &dp, &partner, self.max_solutions, &mut memo);
        debug!("{} crossing pairs, {} kept per nested subset, {} alternative(s)",
            crossing.len(), dp[(0, partner.len() - 1)], solutions.len());

        solutions.into_iter()
            .map(|keys| {
                let mut nested = free.clone();
                for key in keys {
                    let pair = Pair::from_key(key);
                    nested.insert(Pair::new(
                        positions[pair.i() as usize],
                        positions[pair.j() as usize],
                    ));
                }
                debug_assert!(nested.is_nested());
                nested
            })
            .collect()
    }
}

impl PseudoknotFinder for MaxNestedFinder {
    fn find_pseudoknots(&self, bpseq: &BpSeq) -> Vec<BpSeq> {
        let all = PairSet::from(bpseq);
        self.max_nested_subsets(&all)
            .into_iter()
            .map(|nested| bpseq.retain_pairs(&all.difference(&nested)))
            .collect()
    }
}

/// Pseudoknot sets of `bpseq` with the default finder.
pub fn find_pseudoknots(bpseq: &BpSeq) -> Vec<BpSeq> {
    MaxNestedFinder::default().find_pseudoknots(bpseq)
}

/// Table of the maximum number of non-crossing pairs within `[i, j]`.
/// Every position has exactly one partner, so the only alternatives for
/// `i` are to be dropped or to close its own pair.
fn max_nested(partner: &[usize]) -> Array2<u32> {
    let n = partner.len();
    let mut dp = Array2::from_elem((n, n), 0);
    for l in 1..n {
        for i in 0..n - l {
            let j = i + l;
            let mut max_val = dp[(i + 1, j)];
            let k = partner[i];
            if k > i && k <= j {
                max_val = max_val.max(1 + inner(&dp, i + 1, k - 1) + inner(&dp, k + 1, j));
            }
            dp[(i, j)] = max_val;
        }
    }
    dp
}

fn inner(dp: &Array2<u32>, i: usize, j: usize) -> u32 {
    if i < j { dp[(i, j)] } else { 0 }
}

fn traceback_all(
    i: usize,
    j: usize,
    dp: &Array2<u32>,
    partner: &[usize],
    limit: usize,
    memo: &mut IntMap<P1KEY, BTreeSet<Vec<P1KEY>>>,
) -> BTreeSet<Vec<P1KEY>> {
    if i >= j {
        return BTreeSet::from([vec![]]);
    }

    let key = Pair::new(i as NAIDX, j as NAIDX).key();
    if let Some(cached) = memo.get(&key) {
        return cached.clone();
    }

    let mut results = BTreeSet::new();
    let dp_ij = dp[(i, j)];

    // Case 1: i dropped
    if dp_ij == dp[(i + 1, j)] {
        results.extend(traceback_all(i + 1, j, dp, partner, limit, memo));
    }

    // Case 2: i kept with its partner
    let k = partner[i];
    if k > i && k <= j && dp_ij == 1 + inner(dp, i + 1, k - 1) + inner(dp, k + 1, j) {
        let enclosed = traceback_all(i + 1, k - 1, dp, partner, limit, memo);
        let following = traceback_all(k + 1, j, dp, partner, limit, memo);
        for left in &enclosed {
            for right in &following {
                let mut combined = left.clone();
                combined.extend(right);
                combined.push(Pair::new(i as NAIDX, k as NAIDX).key());
                combined.sort_unstable();
                results.insert(combined);
            }
        }
    }

    while results.len() > limit {
        results.pop_last();
    }
    memo.insert(key, results.clone());
    results
}
