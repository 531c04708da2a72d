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

//! This module provides the pricing oracle of the Dantzig-Wolfe
//! decomposition: the adapter which turns one agent's dual prices into a 0/1
//! knapsack instance, delegates it to the exact knapsack collaborator, and
//! turns the optimal subset back into a column of the restricted master.

use crate::{
    Agent, Column, ExactKnapsackSolver, FixingSet, Instance, Item, KnapsackItem,
};

/// The fixed-point multiplier used to turn fractional dual prices into
/// integer knapsack profits.
///
/// The rounding direction matters: per-item profits are rounded *up* and
/// the agent-dual threshold is rounded *down*, so a truly improving column
/// can never be rejected because of floating-point error. The converse (a
/// non-improving column occasionally passing the test) cannot break
/// termination: the master's column-pool dedup stops the generation loop
/// when only known patterns come back, and that exit claims no proven
/// price-out.
pub const PRECISION: i64 = 10_000;

/// The outcome of pricing one agent.
#[derive(Debug, Clone)]
pub struct Priced {
    /// An improving column for this agent, when one exists.
    pub column: Option<Column>,
    /// `max(0, z_i)` where `z_i` is the optimum of the agent's knapsack with
    /// up-rounded scaled profits. Because the profits over-estimate, this is
    /// an *upper* bound on `PRECISION * max_S sum_{j in S} (v_j - c_ij)`,
    /// which is exactly what the Lagrangian dual bound of the generation
    /// loop needs to subtract.
    pub scaled_value: i64,
}

/// The pricing oracle. It is a stateless adapter: all of the problem data
/// lives in the instance, all of the search state in the fixing set passed
/// to each call.
pub struct PricingOracle<'a> {
    instance: &'a Instance,
    knapsack: &'a dyn ExactKnapsackSolver,
}

impl<'a> PricingOracle<'a> {
    pub fn new(instance: &'a Instance, knapsack: &'a dyn ExactKnapsackSolver) -> Self {
        Self { instance, knapsack }
    }

    /// The capacity left to the agent once the weight of the items forced
    /// onto it has been subtracted.
    pub fn reduced_capacity(&self, agent: Agent, fixings: &FixingSet) -> i64 {
        let forced: i64 = self
            .instance
            .items()
            .filter(|item| fixings.forced(*item) == Some(agent))
            .map(|item| self.instance.weight(item, agent))
            .sum();
        self.instance.capacity(agent) - forced
    }

    /// Prices the given agent under the given dual prices: builds the
    /// knapsack candidates (free items with a positive up-rounded scaled
    /// profit `ceil(PRECISION * (v_j - c_ij))` fitting the reduced
    /// capacity), solves it exactly, and reports both the scaled optimum
    /// and, when the pattern prices out negative against the agent dual,
    /// the corresponding column.
    pub fn price(
        &self,
        agent: Agent,
        agent_dual: f64,
        item_duals: &[f64],
        fixings: &FixingSet,
    ) -> Priced {
        let capacity = self.reduced_capacity(agent, fixings);

        let mut candidates = vec![];
        let mut knap_items = vec![];
        for item in self.instance.items() {
            if !fixings.is_free(item, agent) {
                continue;
            }
            let weight = self.instance.weight(item, agent);
            let cost = self.instance.cost(item, agent);
            let profit =
                (PRECISION as f64 * (item_duals[item.id()] - cost as f64)).ceil() as i64;
            if profit > 0 && weight <= capacity {
                candidates.push(item);
                knap_items.push(KnapsackItem { weight, profit });
            }
        }

        let selection = self.knapsack.solve(capacity, &knap_items);
        let scaled_value = selection
            .iter()
            .map(|k| knap_items[*k].profit)
            .sum::<i64>()
            .max(0);

        // the pattern is improving iff its reduced cost is negative, i.e.
        // sum_j (v_j - c_ij) > -u_i; down-rounding the right-hand side makes
        // the scaled test conservative in the accepting direction
        let threshold = (-(PRECISION as f64) * agent_dual).floor() as i64;
        let column = if !selection.is_empty() && scaled_value > threshold {
            let items: Vec<Item> = selection.iter().map(|k| candidates[*k]).collect();
            let cost = items.iter().map(|j| self.instance.cost(*j, agent)).sum();
            Some(Column::new(agent, items, cost))
        } else {
            None
        };

        Priced { column, scaled_value }
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
