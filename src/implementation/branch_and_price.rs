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

//! This module provides the branch-and-price solver: a single-threaded tree
//! search which re-solves column generation at every node, branches on a
//! fractional assignment variable, and prunes on the column-generation
//! lower bounds until the incumbent is proved optimal (or the cutoff says
//! to give up).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    Agent, Assignment, BranchingRule, ColGenResult, Column, ColumnGeneration,
    CompareOpenNode, Completion, Cutoff, Event, ExactKnapsackSolver, Fixing, FixingSet,
    Fringe, Instance, Item, LinearProgramSolver, NodeRanking, OpenNode, SearchObserver,
    SimpleFringe, Solution, Solver,
};

/// One node of the branch-and-price tree. Nodes live in an arena indexed by
/// `usize` and only know their parent: the set of branching decisions in
/// effect at a node is reconstructed by walking the chain up to the root,
/// never stored per node.
struct Node {
    parent: Option<usize>,
    /// The branching decision this node adds to its parent's chain (`None`
    /// for the root).
    fixing: Option<Fixing>,
    /// The column-generation result computed eagerly at creation time, when
    /// the ranking asked for fresh child bounds. Taken (not recomputed) at
    /// expansion.
    cached: Option<ColGenResult>,
}

/// The branch-and-price solver.
///
/// All policies are injected at construction: the two external
/// mathematical collaborators, the branching rule, the node ordering, the
/// cutoff and the progress observer. `eager_child_bounds` asks the solver
/// to run column generation when *creating* a child rather than when
/// expanding it, so that the ordering can rank the child by its own fresh
/// bound; this is the expensive-but-informative strategy meant for
/// best-first orderings.
pub struct BranchAndPrice<'a> {
    instance: Arc<Instance>,
    knapsack: &'a dyn ExactKnapsackSolver,
    lp: &'a dyn LinearProgramSolver,
    branching: &'a dyn BranchingRule,
    cutoff: &'a dyn Cutoff,
    observer: &'a dyn SearchObserver,
    eager_child_bounds: bool,

    nodes: Vec<Node>,
    fringe: SimpleFringe<OpenNode, CompareOpenNode<&'a dyn NodeRanking>>,
    /// Multiset of the lower bounds of all open nodes; its smallest key is
    /// the best provable bound while the search runs.
    open_bounds: BTreeMap<i64, usize>,
    /// Columns pooled across the whole tree; re-validated per node.
    pool: Vec<Column>,

    best_sol: Option<Assignment>,
    /// The node whose expansion produced the incumbent.
    best_node: Option<usize>,
    best_ub: i64,
    best_lb: i64,
    reported_lb: i64,
    explored: usize,
    start: Instant,
}

impl<'a> BranchAndPrice<'a> {
    pub fn custom(
        instance: Arc<Instance>,
        knapsack: &'a dyn ExactKnapsackSolver,
        lp: &'a dyn LinearProgramSolver,
        branching: &'a dyn BranchingRule,
        ranking: &'a dyn NodeRanking,
        cutoff: &'a dyn Cutoff,
        observer: &'a dyn SearchObserver,
        eager_child_bounds: bool,
    ) -> Self {
        BranchAndPrice {
            instance,
            knapsack,
            lp,
            branching,
            cutoff,
            observer,
            eager_child_bounds,
            nodes: vec![],
            fringe: SimpleFringe::new(CompareOpenNode::new(ranking)),
            open_bounds: BTreeMap::new(),
            pool: vec![],
            best_sol: None,
            best_node: None,
            best_ub: i64::MAX,
            best_lb: i64::MIN,
            reported_lb: i64::MIN,
            explored: 0,
            start: Instant::now(),
        }
    }

    /// The number of nodes whose column generation has been solved.
    pub fn explored(&self) -> usize {
        self.explored
    }

    // --- tree plumbing ------------------------------------------------------

    fn push_node(
        &mut self,
        parent: Option<usize>,
        fixing: Option<Fixing>,
        cached: Option<ColGenResult>,
        lower_bound: i64,
        depth: usize,
        discrepancies: usize,
    ) {
        let id = self.nodes.len();
        self.nodes.push(Node { parent, fixing, cached });
        self.fringe.push(OpenNode { id, lower_bound, depth, discrepancies });
        *self.open_bounds.entry(lower_bound).or_insert(0) += 1;
    }

    fn forget_open_bound(&mut self, bound: i64) {
        if let Some(count) = self.open_bounds.get_mut(&bound) {
            *count -= 1;
            if *count == 0 {
                self.open_bounds.remove(&bound);
            }
        }
    }

    /// Reconstructs the branching decisions in effect at the given node by
    /// walking its chain up to the root (O(depth)).
    fn fixing_set(&self, id: usize) -> FixingSet {
        let mut chain = vec![];
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if let Some(fixing) = self.nodes[node].fixing {
                chain.push(fixing);
            }
            cursor = self.nodes[node].parent;
        }
        let mut fixings = FixingSet::new(self.instance.nb_items(), self.instance.nb_agents());
        for fixing in chain.into_iter().rev() {
            fixings.apply(fixing);
        }
        fixings
    }

    fn colgen(&mut self, fixings: &FixingSet) -> Option<ColGenResult> {
        let instance = Arc::clone(&self.instance);
        let engine =
            ColumnGeneration::new(instance.as_ref(), self.knapsack, self.lp, self.cutoff);
        engine.solve(fixings, &mut self.pool)
    }

    // --- incumbent / bound bookkeeping --------------------------------------

    fn maybe_update_incumbent(&mut self, node: usize, assignment: Assignment) {
        let mut solution = Solution::new(Arc::clone(&self.instance));
        for (j, agent) in assignment.iter().enumerate() {
            solution.set(Item(j), *agent);
        }
        if solution.feasible() && solution.cost() < self.best_ub {
            self.best_ub = solution.cost();
            self.best_sol = Some(assignment.clone());
            self.best_node = Some(node);
            self.observer.notify(Event::Incumbent {
                cost: solution.cost(),
                assignment,
                tag: "bnp",
                elapsed: self.start.elapsed(),
            });
        }
    }

    /// The smallest lower bound among the open nodes; reports its increases
    /// and returns true when the incumbent has caught up with it (proven
    /// optimal).
    fn incumbent_is_proven(&mut self) -> bool {
        let Some(&open) = self.open_bounds.keys().next() else {
            return self.best_sol.is_some();
        };
        if open > self.reported_lb {
            self.reported_lb = open;
            self.observer.notify(Event::Bound {
                bound: open,
                tag: "bnp",
                elapsed: self.start.elapsed(),
            });
        }
        self.best_ub != i64::MAX && self.best_ub <= open
    }

    // --- expansion ----------------------------------------------------------

    /// The first (item, agent) pair left free by the fixings, if any.
    fn first_free_pair(&self, fixings: &FixingSet) -> Option<(Item, Agent)> {
        self.instance.items().find_map(|item| {
            self.instance
                .agents()
                .find(|agent| fixings.is_free(item, *agent))
                .map(|agent| (item, agent))
        })
    }

    /// The load an agent would carry from forced items alone.
    fn forced_load(&self, agent: Agent, fixings: &FixingSet) -> i64 {
        self.instance
            .items()
            .filter(|j| fixings.forced(*j) == Some(agent))
            .map(|j| self.instance.weight(j, agent))
            .sum()
    }

    fn expand(&mut self, open: OpenNode) {
        let fixings = self.fixing_set(open.id);
        let result = match self.nodes[open.id].cached.take() {
            Some(cached) => Some(cached),
            None => self.colgen(&fixings),
        };
        // infeasible below this node (or LP failure): prune
        let Some(result) = result else { return };
        self.explored += 1;

        let bound = open.lower_bound.max(result.lower_bound);
        if self.best_ub != i64::MAX && self.best_ub <= bound {
            return;
        }

        if let Some(assignment) = result.assignment(&fixings) {
            // candidate integral solution; nothing below this node can beat
            // the node's own (exactly solved) relaxation, so close it
            self.maybe_update_incumbent(open.id, assignment);
            if result.is_exact {
                return;
            }
        }

        let mut chosen = self.branching.choose(&result.values, &fixings);
        if chosen.is_none() && !result.is_exact {
            // a generation loop stopped early (cutoff, or only already
            // pooled candidates) can leave nothing fractional to branch on
            // while the node is not solved; branch on any free pair rather
            // than dropping the subtree
            chosen = self.first_free_pair(&fixings);
        }
        let Some((item, agent)) = chosen else {
            return;
        };

        // child "1": item forced onto agent (and off every other agent);
        // skipped when the forced items alone would overload the agent
        let mut forced = fixings.clone();
        forced.force(item, agent);
        if self.forced_load(agent, &forced) <= self.instance.capacity(agent) {
            self.push_child(
                open,
                Fixing { item, agent, forced: true },
                bound,
                open.discrepancies,
            );
        }

        // child "0": item forbidden on agent only
        self.push_child(
            open,
            Fixing { item, agent, forced: false },
            bound,
            open.discrepancies + 1,
        );
    }

    fn push_child(&mut self, parent: OpenNode, fixing: Fixing, bound: i64, discrepancies: usize) {
        let (cached, bound) = if self.eager_child_bounds {
            let mut fixings = self.fixing_set(parent.id);
            fixings.apply(fixing);
            match self.colgen(&fixings) {
                // child proven infeasible: do not even create it
                None => return,
                Some(result) => {
                    let bound = bound.max(result.lower_bound);
                    (Some(result), bound)
                }
            }
        } else {
            (None, bound)
        };
        self.push_node(
            Some(parent.id),
            Some(fixing),
            cached,
            bound,
            parent.depth + 1,
            discrepancies,
        );
    }

    // --- test hooks ---------------------------------------------------------

    /// The fixing chain of the node that produced the incumbent, root first.
    #[cfg(test)]
    fn incumbent_chain(&self) -> Vec<Fixing> {
        let mut chain = vec![];
        let mut cursor = self.best_node;
        while let Some(node) = cursor {
            if let Some(fixing) = self.nodes[node].fixing {
                chain.push(fixing);
            }
            cursor = self.nodes[node].parent;
        }
        chain.reverse();
        chain
    }
}

impl Solver for BranchAndPrice<'_> {
    fn minimize(&mut self) -> Completion {
        self.start = Instant::now();
        self.push_node(None, None, None, self.instance.combinatorial_lb(), 0, 0);

        let mut aborted = false;
        while let Some(open) = self.fringe.pop() {
            if self.cutoff.must_stop() {
                self.fringe.push(open);
                aborted = true;
                break;
            }
            self.forget_open_bound(open.lower_bound);
            if self.best_ub != i64::MAX && self.best_ub <= open.lower_bound {
                continue;
            }
            self.expand(open);
            if self.incumbent_is_proven() {
                self.fringe.clear();
                self.open_bounds.clear();
                break;
            }
        }

        if aborted {
            self.best_lb = self
                .open_bounds
                .keys()
                .next()
                .copied()
                .unwrap_or(self.best_ub);
            Completion { is_exact: false, best_value: self.best_value() }
        } else {
            if self.best_sol.is_some() {
                self.best_lb = self.best_ub;
                self.observer.notify(Event::Bound {
                    bound: self.best_lb,
                    tag: "bnp",
                    elapsed: self.start.elapsed(),
                });
            }
            Completion { is_exact: true, best_value: self.best_value() }
        }
    }

    fn best_value(&self) -> Option<i64> {
        self.best_sol.as_ref().map(|_| self.best_ub)
    }

    fn best_solution(&self) -> Option<Assignment> {
        self.best_sol.clone()
    }

    fn best_lower_bound(&self) -> i64 {
        self.best_lb
    }

    fn best_upper_bound(&self) -> i64 {
        self.best_ub
    }

    fn set_primal(&mut self, value: i64, solution: Assignment) {
        if value < self.best_ub {
            self.best_ub = value;
            self.best_sol = Some(solution);
            self.best_node = None;
        }
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
