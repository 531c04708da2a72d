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

//! This module defines the traits of the pluggable search policies: how to
//! pick a branching variable, how to order the open nodes of the tree, and
//! when to give up on proving optimality.

use std::cmp::Ordering;

use crate::{Agent, FixingSet, Item, OpenNode};

/// This trait abstracts the branching-variable selection policy of the
/// branch-and-price tree. Given the fractional assignment values produced
/// by column generation, an implementation picks exactly one free
/// (item, agent) pair to branch on, or `None` when the solution is
/// integral.
pub trait BranchingRule {
    /// `values[item][agent]` is the aggregated fractional value of the
    /// corresponding assignment variable.
    fn choose(&self, values: &[Vec<f64>], fixings: &FixingSet) -> Option<(Item, Agent)>;
}

/// This trait defines the node-ordering policy of the solver fringe: the
/// node which compares `Greater` is the more promising one and pops first.
pub trait NodeRanking {
    fn compare(&self, a: &OpenNode, b: &OpenNode) -> Ordering;
}
impl<X: NodeRanking + ?Sized> NodeRanking for &X {
    fn compare(&self, a: &OpenNode, b: &OpenNode) -> Ordering {
        (**self).compare(a, b)
    }
}

/// This trait encapsulates a criterion (external to the solver) which can
/// decide to stop the search before optimality is proved. All engines poll
/// it at their iteration boundaries and degrade to returning the best known
/// result.
pub trait Cutoff {
    /// Returns true when the search must stop.
    fn must_stop(&self) -> bool;
}
