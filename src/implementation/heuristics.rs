// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! This module provides the implementation of the various heuristics that
//! tune the behavior of the solvers: cutoffs, node orderings for the
//! branch-and-price fringe, and branching-variable selection rules.

use std::cmp::Ordering;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use compare::Compare;

use crate::{Agent, BranchingRule, Cutoff, FixingSet, Item, NodeRanking, OpenNode};

/// The tolerance under which a fractional LP value is considered integral.
pub const FRACTIONAL_EPS: f64 = 1e-6;

// ----------------------------------------------------------------------------
// --- CUTOFFS ----------------------------------------------------------------
// ----------------------------------------------------------------------------

/// _This is the default cutoff heuristic._ It imposes that the search goes
/// on until optimality is proved.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoCutoff;
impl Cutoff for NoCutoff {
    fn must_stop(&self) -> bool {
        false
    }
}

/// This cutoff allows one to specify a maximum time budget to solve the
/// problem. Once the budget is elapsed, the optimization stops and the best
/// result that has been found (so far) is returned, flagged not exact.
///
/// Cloning a `TimeBudget` yields a handle on the *same* deadline, which is
/// how one single wall clock is shared between the column generation, the
/// branch-and-price tree and the local search workers.
#[derive(Debug, Clone)]
pub struct TimeBudget {
    stop: Arc<AtomicBool>,
}
impl TimeBudget {
    pub fn new(budget: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let t_flag = Arc::clone(&stop);

        // timer
        std::thread::spawn(move || {
            std::thread::sleep(budget);
            t_flag.store(true, std::sync::atomic::Ordering::Relaxed);
        });

        TimeBudget { stop }
    }
}
impl Cutoff for TimeBudget {
    fn must_stop(&self) -> bool {
        self.stop.load(std::sync::atomic::Ordering::Relaxed)
    }
}

// ----------------------------------------------------------------------------
// --- NODE ORDERINGS ---------------------------------------------------------
// ----------------------------------------------------------------------------

/// Depth-first ordering: the deepest open node pops first, ties broken by
/// creation order (the most recently created node wins, which makes the
/// fringe behave like a stack along one branch).
#[derive(Debug, Default, Copy, Clone)]
pub struct DepthFirst;
impl NodeRanking for DepthFirst {
    fn compare(&self, a: &OpenNode, b: &OpenNode) -> Ordering {
        a.depth
            .cmp(&b.depth)
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Best-first (A*) ordering: the open node with the smallest lower bound
/// pops first. This is only informative when children carry their own
/// freshly computed column-generation bound (the eager, expensive strategy);
/// with inherited bounds it degenerates gracefully.
#[derive(Debug, Default, Copy, Clone)]
pub struct BestFirst;
impl NodeRanking for BestFirst {
    fn compare(&self, a: &OpenNode, b: &OpenNode) -> Ordering {
        b.lower_bound
            .cmp(&a.lower_bound)
            .then_with(|| a.depth.cmp(&b.depth))
    }
}

/// Limited-discrepancy ordering: open nodes with fewer discrepancies (fewer
/// times the less-preferred branch was taken) pop first, deepest first among
/// equals.
#[derive(Debug, Default, Copy, Clone)]
pub struct LimitedDiscrepancy;
impl NodeRanking for LimitedDiscrepancy {
    fn compare(&self, a: &OpenNode, b: &OpenNode) -> Ordering {
        b.discrepancies
            .cmp(&a.discrepancies)
            .then_with(|| a.depth.cmp(&b.depth))
    }
}

/// This is a thin wrapper to convert a `NodeRanking` into a `Compare`
/// object as is required to configure the order of a binary-heap based
/// fringe. It has no behavior of its own: it simply delegates to the
/// underlying ranking.
#[derive(Debug, Clone, Copy)]
pub struct CompareOpenNode<R: NodeRanking>(R);
impl<R: NodeRanking> CompareOpenNode<R> {
    /// Creates a new instance
    pub fn new(ranking: R) -> Self {
        Self(ranking)
    }
}
impl<R: NodeRanking> Compare<OpenNode> for CompareOpenNode<R> {
    fn compare(&self, l: &OpenNode, r: &OpenNode) -> Ordering {
        self.0.compare(l, r)
    }
}

// ----------------------------------------------------------------------------
// --- BRANCHING RULES --------------------------------------------------------
// ----------------------------------------------------------------------------

fn is_fractional(x: f64) -> bool {
    x > FRACTIONAL_EPS && x < 1.0 - FRACTIONAL_EPS
}

/// _This is the default branching rule._ Among all free (item, agent) pairs
/// with a fractional value, it selects the one with the largest value; the
/// first pair in (item-major, agent-minor) scan order wins ties.
#[derive(Debug, Default, Copy, Clone)]
pub struct LargestFractional;
impl BranchingRule for LargestFractional {
    fn choose(&self, values: &[Vec<f64>], fixings: &FixingSet) -> Option<(Item, Agent)> {
        let mut best: Option<(Item, Agent)> = None;
        let mut best_val = 0.0_f64;
        for (j, row) in values.iter().enumerate() {
            for (i, &x) in row.iter().enumerate() {
                if fixings.is_free(Item(j), Agent(i)) && is_fractional(x) && x > best_val {
                    best_val = x;
                    best = Some((Item(j), Agent(i)));
                }
            }
        }
        best
    }
}

/// The most-fractional branching rule selects the free pair whose value is
/// the closest to one half.
///
/// Tie-break: the first pair in (item-major, agent-minor) scan order wins.
/// The rule genuinely minimizes the distance to one half; it never
/// degenerates into "first fractional pair found".
#[derive(Debug, Default, Copy, Clone)]
pub struct MostFractional;
impl BranchingRule for MostFractional {
    fn choose(&self, values: &[Vec<f64>], fixings: &FixingSet) -> Option<(Item, Agent)> {
        let mut best: Option<(Item, Agent)> = None;
        let mut best_dist = f64::INFINITY;
        for (j, row) in values.iter().enumerate() {
            for (i, &x) in row.iter().enumerate() {
                if fixings.is_free(Item(j), Agent(i)) && is_fractional(x) {
                    let dist = (x - 0.5).abs();
                    if dist < best_dist {
                        best_dist = dist;
                        best = Some((Item(j), Agent(i)));
                    }
                }
            }
        }
        best
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################


#[cfg(test)]
mod test_rankings {
    use std::cmp::Ordering;

    use crate::*;

    fn node(id: usize, lb: i64, depth: usize, disc: usize) -> OpenNode {
        OpenNode { id, lower_bound: lb, depth, discrepancies: disc }
    }

    #[test]
    fn depth_first_prefers_the_deepest_node() {
        let shallow = node(0, 0, 1, 0);
        let deep = node(1, 0, 5, 0);
        assert_eq!(Ordering::Greater, DepthFirst.compare(&deep, &shallow));
    }

    #[test]
    fn depth_first_breaks_ties_on_recency() {
        let old = node(0, 0, 3, 0);
        let new = node(7, 0, 3, 0);
        assert_eq!(Ordering::Greater, DepthFirst.compare(&new, &old));
    }

    #[test]
    fn best_first_prefers_the_smallest_bound() {
        let tight = node(0, 10, 0, 0);
        let loose = node(1, 99, 0, 0);
        assert_eq!(Ordering::Greater, BestFirst.compare(&tight, &loose));
    }

    #[test]
    fn lds_prefers_fewer_discrepancies() {
        let straight = node(0, 0, 2, 0);
        let wayward = node(1, 0, 9, 3);
        assert_eq!(Ordering::Greater, LimitedDiscrepancy.compare(&straight, &wayward));
    }
}

#[cfg(test)]
mod test_branching {
    use crate::*;

    #[test]
    fn largest_fractional_picks_the_largest_fractional_value() {
        let values = vec![vec![0.2, 0.8], vec![1.0, 0.0]];
        let fixings = FixingSet::new(2, 2);
        assert_eq!(
            Some((Item(0), Agent(1))),
            LargestFractional.choose(&values, &fixings)
        );
    }

    #[test]
    fn integral_solutions_yield_no_branching_pair() {
        let values = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let fixings = FixingSet::new(2, 2);
        assert_eq!(None, LargestFractional.choose(&values, &fixings));
        assert_eq!(None, MostFractional.choose(&values, &fixings));
    }

    #[test]
    fn fixed_pairs_are_never_selected() {
        let values = vec![vec![0.4, 0.6], vec![0.5, 0.5]];
        let mut fixings = FixingSet::new(2, 2);
        fixings.force(Item(0), Agent(1));
        fixings.forbid(Item(1), Agent(0));
        assert_eq!(
            Some((Item(1), Agent(1))),
            LargestFractional.choose(&values, &fixings)
        );
    }

    #[test]
    fn most_fractional_picks_the_value_closest_to_one_half() {
        let values = vec![vec![0.9, 0.1], vec![0.45, 0.55]];
        let fixings = FixingSet::new(2, 2);
        assert_eq!(
            Some((Item(1), Agent(0))),
            MostFractional.choose(&values, &fixings)
        );
    }

    /// A rule that only kept the first fractional pair found would return
    /// (0, 0) here; the distance to one half must actually be minimized.
    #[test]
    fn most_fractional_does_not_degenerate_to_the_first_fractional_pair() {
        let values = vec![vec![0.9, 0.1], vec![0.5, 0.5]];
        let fixings = FixingSet::new(2, 2);
        assert_eq!(
            Some((Item(1), Agent(0))),
            MostFractional.choose(&values, &fixings)
        );
    }
}
