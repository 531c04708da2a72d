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

//! This module provides the immutable problem instance: the weights, costs
//! and capacities, along with a few quantities which are derived once at
//! construction time and cached ever after.

use thiserror::Error;

use crate::{Agent, Item};

/// The errors that can pop up while building an instance.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("an instance must comprise at least one item and one agent")]
    Empty,
    #[error("expected a {expected}-entry row for agent {agent}, got {actual}")]
    DimensionMismatch { agent: usize, expected: usize, actual: usize },
}

/// An immutable instance of the generalized assignment problem: `nb_items`
/// items must each be assigned to exactly one of `nb_agents` agents; the
/// assignment of item j to agent i consumes `weight(j, i)` units of the
/// agent's capacity and incurs a cost of `cost(j, i)`.
///
/// An instance is built once and never mutated. Everything the search
/// engines repeatedly need (cheapest/priciest agent per item, trivial
/// bounds) is computed up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    nb_items: usize,
    nb_agents: usize,
    /// weight[agent][item]
    weight: Vec<Vec<i64>>,
    /// cost[agent][item]
    cost: Vec<Vec<i64>>,
    capacity: Vec<i64>,
    // -- cached at construction -------------------------------------------
    min_cost_agent: Vec<Agent>,
    max_cost_agent: Vec<Agent>,
    min_weight_agent: Vec<Agent>,
    max_weight_agent: Vec<Agent>,
    total_cost: i64,
    combinatorial_lb: i64,
}

impl Instance {
    /// Creates a new instance from the per-agent capacity vector and the
    /// weight and cost matrices (both indexed `[agent][item]`).
    pub fn new(
        capacity: Vec<i64>,
        weight: Vec<Vec<i64>>,
        cost: Vec<Vec<i64>>,
    ) -> Result<Self, ModelError> {
        let nb_agents = capacity.len();
        if nb_agents == 0 || weight.len() != nb_agents || cost.len() != nb_agents {
            return Err(ModelError::Empty);
        }
        let nb_items = weight[0].len();
        if nb_items == 0 {
            return Err(ModelError::Empty);
        }
        for (i, row) in weight.iter().enumerate() {
            if row.len() != nb_items {
                return Err(ModelError::DimensionMismatch {
                    agent: i,
                    expected: nb_items,
                    actual: row.len(),
                });
            }
        }
        for (i, row) in cost.iter().enumerate() {
            if row.len() != nb_items {
                return Err(ModelError::DimensionMismatch {
                    agent: i,
                    expected: nb_items,
                    actual: row.len(),
                });
            }
        }

        let mut min_cost_agent = vec![Agent(0); nb_items];
        let mut max_cost_agent = vec![Agent(0); nb_items];
        let mut min_weight_agent = vec![Agent(0); nb_items];
        let mut max_weight_agent = vec![Agent(0); nb_items];
        for j in 0..nb_items {
            for i in 1..nb_agents {
                if cost[i][j] < cost[min_cost_agent[j].id()][j] {
                    min_cost_agent[j] = Agent(i);
                }
                if cost[i][j] > cost[max_cost_agent[j].id()][j] {
                    max_cost_agent[j] = Agent(i);
                }
                if weight[i][j] < weight[min_weight_agent[j].id()][j] {
                    min_weight_agent[j] = Agent(i);
                }
                if weight[i][j] > weight[max_weight_agent[j].id()][j] {
                    max_weight_agent[j] = Agent(i);
                }
            }
        }
        let total_cost = cost.iter().flatten().sum();
        let combinatorial_lb = (0..nb_items)
            .map(|j| cost[min_cost_agent[j].id()][j])
            .sum::<i64>();

        Ok(Instance {
            nb_items,
            nb_agents,
            weight,
            cost,
            capacity,
            min_cost_agent,
            max_cost_agent,
            min_weight_agent,
            max_weight_agent,
            total_cost,
            combinatorial_lb,
        })
    }

    #[inline]
    pub fn nb_items(&self) -> usize {
        self.nb_items
    }
    #[inline]
    pub fn nb_agents(&self) -> usize {
        self.nb_agents
    }
    #[inline]
    pub fn weight(&self, item: Item, agent: Agent) -> i64 {
        self.weight[agent.id()][item.id()]
    }
    #[inline]
    pub fn cost(&self, item: Item, agent: Agent) -> i64 {
        self.cost[agent.id()][item.id()]
    }
    #[inline]
    pub fn capacity(&self, agent: Agent) -> i64 {
        self.capacity[agent.id()]
    }
    /// An iterator over all item ids.
    pub fn items(&self) -> impl Iterator<Item = Item> {
        (0..self.nb_items).map(Item)
    }
    /// An iterator over all agent ids.
    pub fn agents(&self) -> impl Iterator<Item = Agent> {
        (0..self.nb_agents).map(Agent)
    }

    /// The agent to which the given item is the cheapest to assign.
    #[inline]
    pub fn min_cost_agent(&self, item: Item) -> Agent {
        self.min_cost_agent[item.id()]
    }
    /// The agent to which the given item is the priciest to assign.
    #[inline]
    pub fn max_cost_agent(&self, item: Item) -> Agent {
        self.max_cost_agent[item.id()]
    }
    /// The agent on which the given item weighs the least.
    #[inline]
    pub fn min_weight_agent(&self, item: Item) -> Agent {
        self.min_weight_agent[item.id()]
    }
    /// The agent on which the given item weighs the most.
    #[inline]
    pub fn max_weight_agent(&self, item: Item) -> Agent {
        self.max_weight_agent[item.id()]
    }

    /// The sum of all cost entries of the instance.
    #[inline]
    pub fn total_cost(&self) -> i64 {
        self.total_cost
    }
    /// A trivial upper bound on the optimal assignment cost: no assignment
    /// can ever cost more than the sum of all cost entries.
    #[inline]
    pub fn bound(&self) -> i64 {
        self.total_cost + 1
    }
    /// The combinatorial-relaxation lower bound obtained by assigning every
    /// item to its cheapest agent and forgetting about capacities.
    #[inline]
    pub fn combinatorial_lb(&self) -> i64 {
        self.combinatorial_lb
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_instance {
    use crate::*;

    fn instance() -> Instance {
        // 2 agents, 3 items
        Instance::new(
            vec![5, 7],
            vec![vec![2, 3, 4], vec![3, 2, 1]],
            vec![vec![3, 4, 9], vec![11, 10, 2]],
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_instances() {
        assert_eq!(Err(ModelError::Empty), Instance::new(vec![], vec![], vec![]));
        assert_eq!(
            Err(ModelError::Empty),
            Instance::new(vec![5], vec![vec![]], vec![vec![]])
        );
    }

    #[test]
    fn rejects_ragged_matrices() {
        let res = Instance::new(
            vec![5, 7],
            vec![vec![2, 3, 4], vec![3, 2]],
            vec![vec![3, 4, 9], vec![11, 10, 2]],
        );
        assert_eq!(
            Err(ModelError::DimensionMismatch { agent: 1, expected: 3, actual: 2 }),
            res
        );
    }

    #[test]
    fn caches_extreme_agents_per_item() {
        let inst = instance();
        assert_eq!(Agent(0), inst.min_cost_agent(Item(0)));
        assert_eq!(Agent(1), inst.max_cost_agent(Item(0)));
        assert_eq!(Agent(1), inst.min_cost_agent(Item(2)));
        assert_eq!(Agent(0), inst.min_weight_agent(Item(0)));
        assert_eq!(Agent(1), inst.min_weight_agent(Item(2)));
        assert_eq!(Agent(0), inst.max_weight_agent(Item(2)));
    }

    #[test]
    fn trivial_bound_is_total_cost_plus_one() {
        let inst = instance();
        assert_eq!(3 + 4 + 9 + 11 + 10 + 2, inst.total_cost());
        assert_eq!(inst.total_cost() + 1, inst.bound());
    }

    #[test]
    fn combinatorial_lb_sums_per_item_minima() {
        let inst = instance();
        assert_eq!(3 + 4 + 2, inst.combinatorial_lb());
    }
}
