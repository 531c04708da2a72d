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

//! This module provides the internal state of the local-search engine: a
//! *complete* item-to-agent assignment with incrementally maintained
//! per-agent loads and an aggregate `(overcapacity, cost)` objective.

use std::sync::Arc;

use crate::{Agent, Assignment, GlobalCost, Instance, Item};

/// The effect of a move on the global cost: the signed change of each
/// coordinate. Deltas compare lexicographically exactly like the costs they
/// apply to, so a delta is strictly improving iff it is smaller than
/// `CostDelta::NONE`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct CostDelta {
    pub overcapacity: i64,
    pub cost: i64,
}
impl CostDelta {
    pub const NONE: CostDelta = CostDelta { overcapacity: 0, cost: 0 };

    /// True iff applying this delta strictly improves the global cost.
    #[inline]
    pub fn improving(self) -> bool {
        self < CostDelta::NONE
    }

    /// The global cost resulting from applying this delta.
    #[inline]
    pub fn applied_to(self, cost: GlobalCost) -> GlobalCost {
        GlobalCost {
            overcapacity: cost.overcapacity + self.overcapacity,
            cost: cost.cost + self.cost,
        }
    }
}

/// The state the local-search engine works on. Unlike the public
/// `Solution`, every item is always assigned; capacity violations are
/// allowed and tracked through the overcapacity coordinate of the global
/// cost.
///
/// Moves are evaluated without touching the state (`evaluate_shift`,
/// `evaluate_swap`) and applied with the previously evaluated delta; the
/// application recomputes the cost from its own bookkeeping and *asserts*
/// that it matches the declared delta. A mismatch means the incremental
/// evaluation is buggy and is fatal by design.
#[derive(Debug, Clone)]
pub struct LocalSearchState {
    instance: Arc<Instance>,
    assignment: Vec<Agent>,
    agent_weight: Vec<i64>,
    agent_cost: Vec<i64>,
    cost: GlobalCost,
}

impl LocalSearchState {
    /// Builds the state for a complete assignment.
    pub fn new(instance: Arc<Instance>, assignment: Vec<Agent>) -> Self {
        let mut agent_weight = vec![0; instance.nb_agents()];
        let mut agent_cost = vec![0; instance.nb_agents()];
        for (j, agent) in assignment.iter().enumerate() {
            agent_weight[agent.id()] += instance.weight(Item(j), *agent);
            agent_cost[agent.id()] += instance.cost(Item(j), *agent);
        }
        let cost = GlobalCost {
            overcapacity: instance
                .agents()
                .map(|a| 0.max(agent_weight[a.id()] - instance.capacity(a)))
                .sum(),
            cost: agent_cost.iter().sum(),
        };
        LocalSearchState { instance, assignment, agent_weight, agent_cost, cost }
    }

    /// The greedy starting point: every item on its cheapest agent,
    /// capacities be damned.
    pub fn min_cost_seed(instance: Arc<Instance>) -> Self {
        let assignment = instance
            .items()
            .map(|j| instance.min_cost_agent(j))
            .collect();
        Self::new(instance, assignment)
    }

    #[inline]
    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }
    #[inline]
    pub fn agent_of(&self, item: Item) -> Agent {
        self.assignment[item.id()]
    }
    #[inline]
    pub fn assignment(&self) -> &[Agent] {
        &self.assignment
    }
    #[inline]
    pub fn cost(&self) -> GlobalCost {
        self.cost
    }
    /// The state in the solver-facing assignment shape.
    pub fn to_assignment(&self) -> Assignment {
        self.assignment.iter().copied().map(Some).collect()
    }
    /// A hash of the compact item-to-agent vector, used to deduplicate the
    /// states visited by the best-first driver.
    #[inline]
    pub fn fingerprint(&self) -> u64 {
        fxhash::hash64(&self.assignment)
    }

    #[inline]
    fn over(&self, agent: Agent, weight: i64) -> i64 {
        0.max(weight - self.instance.capacity(agent))
    }

    /// Evaluates moving `item` onto `to` without touching the state.
    pub fn evaluate_shift(&self, item: Item, to: Agent) -> CostDelta {
        let from = self.agent_of(item);
        if from == to {
            return CostDelta::NONE;
        }
        let w_from = self.instance.weight(item, from);
        let w_to = self.instance.weight(item, to);
        let overcapacity = self.over(from, self.agent_weight[from.id()] - w_from)
            - self.over(from, self.agent_weight[from.id()])
            + self.over(to, self.agent_weight[to.id()] + w_to)
            - self.over(to, self.agent_weight[to.id()]);
        let cost = self.instance.cost(item, to) - self.instance.cost(item, from);
        CostDelta { overcapacity, cost }
    }

    /// Evaluates exchanging the agents of `first` and `second` without
    /// touching the state. Items on the same agent yield a null delta.
    pub fn evaluate_swap(&self, first: Item, second: Item) -> CostDelta {
        let p = self.agent_of(first);
        let q = self.agent_of(second);
        if p == q {
            return CostDelta::NONE;
        }
        let new_p = self.agent_weight[p.id()] - self.instance.weight(first, p)
            + self.instance.weight(second, p);
        let new_q = self.agent_weight[q.id()] - self.instance.weight(second, q)
            + self.instance.weight(first, q);
        let overcapacity = self.over(p, new_p) - self.over(p, self.agent_weight[p.id()])
            + self.over(q, new_q)
            - self.over(q, self.agent_weight[q.id()]);
        let cost = self.instance.cost(first, q) + self.instance.cost(second, p)
            - self.instance.cost(first, p)
            - self.instance.cost(second, q);
        CostDelta { overcapacity, cost }
    }

    /// Applies a shift whose effect was declared to be `delta`.
    pub fn apply_shift(&mut self, item: Item, to: Agent, delta: CostDelta) {
        let expected = delta.applied_to(self.cost);
        let from = self.agent_of(item);
        self.displace(item, from, to);
        self.assignment[item.id()] = to;
        assert_eq!(expected, self.cost, "shift evaluation is inconsistent");
        debug_assert!(self.consistent());
    }

    /// Applies a swap whose effect was declared to be `delta`.
    pub fn apply_swap(&mut self, first: Item, second: Item, delta: CostDelta) {
        let expected = delta.applied_to(self.cost);
        let p = self.agent_of(first);
        let q = self.agent_of(second);
        self.displace(first, p, q);
        self.displace(second, q, p);
        self.assignment[first.id()] = q;
        self.assignment[second.id()] = p;
        assert_eq!(expected, self.cost, "swap evaluation is inconsistent");
        debug_assert!(self.consistent());
    }

    /// Moves one item's weight and cost contribution from one agent to
    /// another, maintaining the aggregates.
    fn displace(&mut self, item: Item, from: Agent, to: Agent) {
        let over_before = self.over(from, self.agent_weight[from.id()])
            + self.over(to, self.agent_weight[to.id()]);
        self.agent_weight[from.id()] -= self.instance.weight(item, from);
        self.agent_cost[from.id()] -= self.instance.cost(item, from);
        self.agent_weight[to.id()] += self.instance.weight(item, to);
        self.agent_cost[to.id()] += self.instance.cost(item, to);
        let over_after = self.over(from, self.agent_weight[from.id()])
            + self.over(to, self.agent_weight[to.id()]);
        self.cost.overcapacity += over_after - over_before;
        self.cost.cost +=
            self.instance.cost(item, to) - self.instance.cost(item, from);
    }

    /// Full recomputation of the aggregates, compared against the
    /// incrementally maintained ones.
    fn consistent(&self) -> bool {
        let fresh = Self::new(self.instance.clone(), self.assignment.clone());
        fresh.agent_weight == self.agent_weight
            && fresh.agent_cost == self.agent_cost
            && fresh.cost == self.cost
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_state {
    use std::sync::Arc;

    use crate::*;

    fn instance() -> Arc<Instance> {
        Arc::new(
            Instance::new(
                vec![5, 7],
                vec![vec![2, 3, 4], vec![3, 2, 1]],
                vec![vec![3, 4, 9], vec![11, 10, 2]],
            )
            .unwrap(),
        )
    }

    #[test]
    fn construction_computes_the_aggregates() {
        let state =
            LocalSearchState::new(instance(), vec![Agent(0), Agent(0), Agent(1)]);
        assert_eq!(GlobalCost { overcapacity: 0, cost: 9 }, state.cost());
    }

    #[test]
    fn shift_evaluation_matches_its_application() {
        let mut state =
            LocalSearchState::new(instance(), vec![Agent(0), Agent(0), Agent(0)]);
        // agent 0 carries weight 9 over capacity 5
        assert_eq!(GlobalCost { overcapacity: 4, cost: 16 }, state.cost());
        let delta = state.evaluate_shift(Item(2), Agent(1));
        assert_eq!(CostDelta { overcapacity: -4, cost: -7 }, delta);
        state.apply_shift(Item(2), Agent(1), delta);
        assert_eq!(GlobalCost { overcapacity: 0, cost: 9 }, state.cost());
    }

    #[test]
    fn swap_evaluation_matches_its_application() {
        let mut state =
            LocalSearchState::new(instance(), vec![Agent(0), Agent(1), Agent(1)]);
        let delta = state.evaluate_swap(Item(0), Item(1));
        state.apply_swap(Item(0), Item(1), delta);
        assert_eq!(Agent(1), state.agent_of(Item(0)));
        assert_eq!(Agent(0), state.agent_of(Item(1)));
    }

    #[test]
    fn same_agent_moves_are_null() {
        let state =
            LocalSearchState::new(instance(), vec![Agent(0), Agent(0), Agent(1)]);
        assert_eq!(CostDelta::NONE, state.evaluate_shift(Item(0), Agent(0)));
        assert_eq!(CostDelta::NONE, state.evaluate_swap(Item(0), Item(1)));
    }

    #[test]
    fn a_delta_is_improving_iff_lexicographically_negative() {
        assert!(CostDelta { overcapacity: -1, cost: 100 }.improving());
        assert!(CostDelta { overcapacity: 0, cost: -1 }.improving());
        assert!(!CostDelta { overcapacity: 0, cost: 0 }.improving());
        assert!(!CostDelta { overcapacity: 1, cost: -100 }.improving());
    }

    #[test]
    fn equal_assignments_share_a_fingerprint() {
        let a = LocalSearchState::new(instance(), vec![Agent(0), Agent(0), Agent(1)]);
        let b = LocalSearchState::new(instance(), vec![Agent(0), Agent(0), Agent(1)]);
        let c = LocalSearchState::new(instance(), vec![Agent(1), Agent(0), Agent(1)]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn the_min_cost_seed_picks_the_cheapest_agents() {
        let state = LocalSearchState::min_cost_seed(instance());
        assert_eq!(&[Agent(0), Agent(0), Agent(1)][..], state.assignment());
    }
}
