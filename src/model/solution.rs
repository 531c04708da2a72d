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

//! This module provides the mutable `Solution`: an item-to-agent mapping
//! whose cost, weight and overcapacity aggregates are maintained in O(1)
//! per mutation.

use std::fmt;
use std::sync::Arc;

use crate::{Agent, GlobalCost, Instance, Item};

/// A (possibly partial, possibly capacity-infeasible) assignment of items to
/// agents. Every mutation goes through `set` which keeps the per-agent and
/// aggregate bookkeeping consistent with the mapping: the old contribution
/// of the item is subtracted, the new one is added.
#[derive(Debug, Clone)]
pub struct Solution {
    instance: Arc<Instance>,
    assignment: Vec<Option<Agent>>,
    agent_weight: Vec<i64>,
    agent_cost: Vec<i64>,
    total_weight: i64,
    total_cost: i64,
    total_overcapacity: i64,
    nb_assigned: usize,
}

impl Solution {
    /// Creates an empty solution (no item assigned).
    pub fn new(instance: Arc<Instance>) -> Self {
        let nb_items = instance.nb_items();
        let nb_agents = instance.nb_agents();
        Solution {
            instance,
            assignment: vec![None; nb_items],
            agent_weight: vec![0; nb_agents],
            agent_cost: vec![0; nb_agents],
            total_weight: 0,
            total_cost: 0,
            total_overcapacity: 0,
            nb_assigned: 0,
        }
    }

    /// Creates the greedy seed solution which assigns every item to its
    /// cheapest agent, capacities be damned. The result is complete but
    /// usually capacity-infeasible; it is meant as a starting point for the
    /// local search.
    pub fn min_cost_seed(instance: Arc<Instance>) -> Self {
        let mut sol = Self::new(instance.clone());
        for item in instance.items() {
            sol.set(item, Some(instance.min_cost_agent(item)));
        }
        sol
    }

    #[inline]
    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }
    #[inline]
    pub fn agent_of(&self, item: Item) -> Option<Agent> {
        self.assignment[item.id()]
    }
    #[inline]
    pub fn assignment(&self) -> &[Option<Agent>] {
        &self.assignment
    }
    #[inline]
    pub fn agent_weight(&self, agent: Agent) -> i64 {
        self.agent_weight[agent.id()]
    }
    #[inline]
    pub fn agent_cost(&self, agent: Agent) -> i64 {
        self.agent_cost[agent.id()]
    }
    /// The overcapacity of one agent: `max(0, weight - capacity)`.
    #[inline]
    pub fn agent_overcapacity(&self, agent: Agent) -> i64 {
        0.max(self.agent_weight[agent.id()] - self.instance.capacity(agent))
    }
    #[inline]
    pub fn weight(&self) -> i64 {
        self.total_weight
    }
    #[inline]
    pub fn cost(&self) -> i64 {
        self.total_cost
    }
    #[inline]
    pub fn overcapacity(&self) -> i64 {
        self.total_overcapacity
    }
    #[inline]
    pub fn assigned(&self) -> usize {
        self.nb_assigned
    }
    #[inline]
    pub fn global_cost(&self) -> GlobalCost {
        GlobalCost { overcapacity: self.total_overcapacity, cost: self.total_cost }
    }

    /// A solution is feasible iff every item is assigned and no agent
    /// exceeds its capacity.
    pub fn feasible(&self) -> bool {
        self.nb_assigned == self.instance.nb_items() && self.total_overcapacity == 0
    }

    /// (Re)assigns `item` to `agent` (or unassigns it when `agent` is
    /// `None`). All aggregates are updated in O(1).
    pub fn set(&mut self, item: Item, agent: Option<Agent>) {
        if let Some(old) = self.assignment[item.id()] {
            let w = self.instance.weight(item, old);
            let c = self.instance.cost(item, old);
            let over_before = self.agent_overcapacity(old);
            self.agent_weight[old.id()] -= w;
            self.agent_cost[old.id()] -= c;
            self.total_overcapacity += self.agent_overcapacity(old) - over_before;
            self.total_weight -= w;
            self.total_cost -= c;
            self.nb_assigned -= 1;
        }
        self.assignment[item.id()] = agent;
        if let Some(new) = agent {
            let w = self.instance.weight(item, new);
            let c = self.instance.cost(item, new);
            let over_before = self.agent_overcapacity(new);
            self.agent_weight[new.id()] += w;
            self.agent_cost[new.id()] += c;
            self.total_overcapacity += self.agent_overcapacity(new) - over_before;
            self.total_weight += w;
            self.total_cost += c;
            self.nb_assigned += 1;
        }
    }
}

/// The persisted solution format: one agent index per item, in item order,
/// whitespace-separated and newline-terminated; `-1` denotes an unassigned
/// item.
impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (j, agent) in self.assignment.iter().enumerate() {
            if j > 0 {
                write!(f, " ")?;
            }
            match agent {
                Some(a) => write!(f, "{}", a.id())?,
                None => write!(f, "-1")?,
            }
        }
        writeln!(f)
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
