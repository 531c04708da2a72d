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

//! This module defines the most basic data types that are used throughout all
//! the code of our library (both at the abstraction and implementation levels).
//! These are also the types your client code is likely to work with.

// ----------------------------------------------------------------------------
// --- ITEM -------------------------------------------------------------------
// ----------------------------------------------------------------------------
/// This type denotes an item (a job) of the assignment problem at hand.
/// Each item is assumed to be identified with an integer ranging from 0
/// until `instance.nb_items()`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Item(pub usize);
impl Item {
    #[inline]
    /// This function returns the id (numeric value) of the item.
    ///
    /// # Examples:
    /// ```
    /// # use gaps::Item;
    /// assert_eq!(0, Item(0).id());
    /// assert_eq!(7, Item(7).id());
    /// ```
    pub fn id(self) -> usize {
        self.0
    }
}

// ----------------------------------------------------------------------------
// --- AGENT ------------------------------------------------------------------
// ----------------------------------------------------------------------------
/// This type denotes an agent (a resource) of the assignment problem at hand.
/// Each agent is assumed to be identified with an integer ranging from 0
/// until `instance.nb_agents()`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Agent(pub usize);
impl Agent {
    #[inline]
    /// This function returns the id (numeric value) of the agent.
    pub fn id(self) -> usize {
        self.0
    }
}

// ----------------------------------------------------------------------------
// --- FIXING -----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// This denotes one branching decision that was made during the search. It
/// forces the given (item, agent) pair to the specified value. Any `Fixing`
/// should be understood as ```[[ x[item][agent] = forced ]]```.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Fixing {
    pub item: Item,
    pub agent: Agent,
    /// True when the item is forced *onto* the agent, false when it is
    /// forced off of it.
    pub forced: bool,
}

// ----------------------------------------------------------------------------
// --- COLUMN -----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// One packing pattern for a single agent in the Dantzig-Wolfe reformulation
/// of the problem: a subset of items along with its aggregate (real) cost.
///
/// Algebraically, a column is a 0/1 vector spanning the two row families of
/// the restricted master problem: the "agent selected" row of its agent and
/// one row per item it contains.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Column {
    /// The agent this pattern belongs to.
    pub agent: Agent,
    /// The items packed by this pattern, in increasing id order.
    pub items: Vec<Item>,
    /// The sum of the real assignment costs of the packed items.
    pub cost: i64,
}
impl Column {
    /// Creates a new column for the given agent. The items are sorted so
    /// that two columns packing the same subset always compare equal.
    pub fn new(agent: Agent, mut items: Vec<Item>, cost: i64) -> Self {
        items.sort_unstable();
        Column { agent, items, cost }
    }
}

// ----------------------------------------------------------------------------
// --- FIXING SET -------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The materialized set of branching decisions in effect at some node of the
/// branch-and-price tree. It is reconstructed by walking a node's fixing
/// chain up to the root; it is never stored per node.
///
/// Forcing an item onto an agent simultaneously forbids it on every other
/// agent, so a single branching decision can fix up to M-1 additional
/// variables.
#[derive(Debug, Clone)]
pub struct FixingSet {
    nb_agents: usize,
    /// per item, the agent it is forced onto (if any)
    forced: Vec<Option<Agent>>,
    /// forbidden[item][agent]
    forbidden: Vec<Vec<bool>>,
}
impl FixingSet {
    pub fn new(nb_items: usize, nb_agents: usize) -> Self {
        FixingSet {
            nb_agents,
            forced: vec![None; nb_items],
            forbidden: vec![vec![false; nb_agents]; nb_items],
        }
    }

    /// Applies one branching decision to the set.
    pub fn apply(&mut self, fixing: Fixing) {
        if fixing.forced {
            self.force(fixing.item, fixing.agent)
        } else {
            self.forbid(fixing.item, fixing.agent)
        }
    }
    /// Forces `item` onto `agent` (and off every other agent).
    pub fn force(&mut self, item: Item, agent: Agent) {
        self.forced[item.id()] = Some(agent);
        for a in 0..self.nb_agents {
            self.forbidden[item.id()][a] = a != agent.id();
        }
    }
    /// Forbids the assignment of `item` to `agent`.
    pub fn forbid(&mut self, item: Item, agent: Agent) {
        self.forbidden[item.id()][agent.id()] = true;
    }

    /// The agent this item is forced onto, if any.
    #[inline]
    pub fn forced(&self, item: Item) -> Option<Agent> {
        self.forced[item.id()]
    }
    /// True iff the (item, agent) pair is fixed to zero.
    #[inline]
    pub fn is_forbidden(&self, item: Item, agent: Agent) -> bool {
        self.forbidden[item.id()][agent.id()]
    }
    /// True iff the (item, agent) pair is not fixed either way.
    #[inline]
    pub fn is_free(&self, item: Item, agent: Agent) -> bool {
        self.forced[item.id()].is_none() && !self.forbidden[item.id()][agent.id()]
    }
    /// True iff the item is not forced onto any agent.
    #[inline]
    pub fn is_unfixed(&self, item: Item) -> bool {
        self.forced[item.id()].is_none()
    }

    /// Decides whether a pooled column may be reused under this fixing set.
    /// A column is rejected when it packs an item that is forced (forced
    /// items are carried outside the master, through reduced capacities and
    /// a separate cost term) or an item that is forbidden on the column's
    /// agent.
    ///
    /// This check only looks at the fixings. The caller must additionally
    /// make sure the column fits the capacity left on its agent once the
    /// forced items are accounted for.
    pub fn accepts(&self, column: &Column) -> bool {
        column
            .items
            .iter()
            .all(|item| self.is_free(*item, column.agent))
    }
}

// ----------------------------------------------------------------------------
// --- GLOBAL COST ------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The objective value of a (possibly capacity-infeasible) assignment, packed
/// into a single lexicographically-ordered pair: overcapacity dominates cost.
/// A capacity-feasible-but-costlier solution therefore always beats a
/// cheaper-but-infeasible one.
///
/// The lexicographic order comes for free from the field order and the
/// derived `Ord`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct GlobalCost {
    /// Total amount by which agent loads exceed their capacities.
    pub overcapacity: i64,
    /// Total real assignment cost.
    pub cost: i64,
}
impl GlobalCost {
    pub const ZERO: GlobalCost = GlobalCost { overcapacity: 0, cost: 0 };

    /// True iff this cost belongs to a capacity-feasible assignment.
    pub fn feasible(self) -> bool {
        self.overcapacity == 0
    }
}

// ----------------------------------------------------------------------------
// --- OPEN NODE --------------------------------------------------------------
// ----------------------------------------------------------------------------
/// A reference to a not-yet-expanded node of the branch-and-price tree,
/// as stored on the solver fringe. The node's fixing chain lives in the
/// tree arena; the open node only carries the data the node orderings
/// need to rank it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct OpenNode {
    /// The arena id of the node.
    pub id: usize,
    /// The best known lower bound on any solution below this node. For
    /// nodes whose column generation has not run yet, this is inherited
    /// from the parent.
    pub lower_bound: i64,
    /// The depth of the node (number of branching decisions on its chain).
    pub depth: usize,
    /// The number of times the less-preferred branch was taken between the
    /// root and this node.
    pub discrepancies: usize,
}

// ----------------------------------------------------------------------------
// --- Results ----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// A reason explaining why a search stopped before proving optimality.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Reason {
    /// It stopped because the configured cutoff criterion was met
    CutoffOccurred,
}

/// The outcome of a search.
#[derive(Debug, Clone)]
pub struct Completion {
    /// is the given solution exact (proved optimal for the given [sub-]problem)?
    /// or is it an approximation ?
    pub is_exact: bool,
    /// if present, the value of the best solution derived from this search
    pub best_value: Option<i64>,
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_common {
    use crate::*;

    #[test]
    fn test_item_and_agent_ids() {
        assert_eq!(0, Item(0).id());
        assert_eq!(3, Item(3).id());
        assert_eq!(0, Agent(0).id());
        assert_eq!(3, Agent(3).id());
    }

    #[test]
    fn columns_with_same_subset_compare_equal_regardless_of_order() {
        let a = Column::new(Agent(1), vec![Item(3), Item(0), Item(2)], 10);
        let b = Column::new(Agent(1), vec![Item(0), Item(2), Item(3)], 10);
        assert_eq!(a, b);
    }

    #[test]
    fn overcapacity_dominates_cost() {
        let feasible_but_costly = GlobalCost { overcapacity: 0, cost: 1000 };
        let cheap_but_infeasible = GlobalCost { overcapacity: 1, cost: 0 };
        assert!(feasible_but_costly < cheap_but_infeasible);
    }

    #[test]
    fn global_cost_breaks_ties_on_cost() {
        let a = GlobalCost { overcapacity: 2, cost: 10 };
        let b = GlobalCost { overcapacity: 2, cost: 11 };
        assert!(a < b);
    }

    #[test]
    fn forcing_an_item_forbids_it_everywhere_else() {
        let mut fixings = FixingSet::new(2, 3);
        fixings.force(Item(0), Agent(1));
        assert_eq!(Some(Agent(1)), fixings.forced(Item(0)));
        assert!(fixings.is_forbidden(Item(0), Agent(0)));
        assert!(!fixings.is_forbidden(Item(0), Agent(1)));
        assert!(fixings.is_forbidden(Item(0), Agent(2)));
        assert!(fixings.is_unfixed(Item(1)));
    }

    #[test]
    fn a_forced_item_is_not_free_even_on_its_own_agent() {
        // forced items are carried outside the master problem, so no reused
        // column may pack them
        let mut fixings = FixingSet::new(2, 2);
        fixings.force(Item(0), Agent(0));
        assert!(!fixings.is_free(Item(0), Agent(0)));
        assert!(fixings.is_free(Item(1), Agent(0)));
    }

    #[test]
    fn column_revalidation_against_the_fixing_set() {
        let mut fixings = FixingSet::new(3, 2);
        fixings.forbid(Item(1), Agent(0));
        assert!(fixings.accepts(&Column::new(Agent(0), vec![Item(0), Item(2)], 5)));
        assert!(!fixings.accepts(&Column::new(Agent(0), vec![Item(0), Item(1)], 5)));
        assert!(fixings.accepts(&Column::new(Agent(1), vec![Item(1)], 5)));

        fixings.force(Item(2), Agent(1));
        assert!(!fixings.accepts(&Column::new(Agent(1), vec![Item(2)], 5)));
        assert!(!fixings.accepts(&Column::new(Agent(0), vec![Item(0), Item(2)], 5)));
    }
}
