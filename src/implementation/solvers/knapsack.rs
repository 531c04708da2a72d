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

//! This module provides the default exact 0/1 knapsack backend: a plain
//! dynamic program over the capacities.

use crate::{ExactKnapsackSolver, KnapsackItem};

/// _This is the default knapsack backend._ It runs the textbook 0/1
/// dynamic program in O(n * capacity) time and memory, which is perfectly
/// adequate for the capacities of the pricing subproblems (agent capacities
/// are small integers).
///
/// Items with a non-positive profit can never improve the objective and are
/// skipped outright; items with a non-positive weight but a positive profit
/// are always taken.
#[derive(Debug, Default, Copy, Clone)]
pub struct DpKnapsack;

impl ExactKnapsackSolver for DpKnapsack {
    fn solve(&self, capacity: i64, items: &[KnapsackItem]) -> Vec<usize> {
        let mut chosen = vec![];
        if capacity < 0 {
            return chosen;
        }
        let cap = capacity as usize;
        let n = items.len();

        // free items are decided outside of the dp
        for (i, item) in items.iter().enumerate() {
            if item.weight <= 0 && item.profit > 0 {
                chosen.push(i);
            }
        }

        let mut best = vec![0_i64; cap + 1];
        let mut taken = vec![vec![false; cap + 1]; n];
        for (i, item) in items.iter().enumerate() {
            if item.profit <= 0 || item.weight <= 0 || item.weight > capacity {
                continue;
            }
            let w = item.weight as usize;
            for c in (w..=cap).rev() {
                let candidate = best[c - w] + item.profit;
                if candidate > best[c] {
                    best[c] = candidate;
                    taken[i][c] = true;
                }
            }
        }

        let mut remaining = cap;
        let mut packed = vec![];
        for i in (0..n).rev() {
            if items[i].profit <= 0 || items[i].weight <= 0 {
                continue;
            }
            if taken[i][remaining] {
                packed.push(i);
                remaining -= items[i].weight as usize;
            }
        }
        packed.reverse();
        chosen.extend(packed);
        chosen.sort_unstable();
        chosen
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_dp_knapsack {
    use crate::*;

    fn item(weight: i64, profit: i64) -> KnapsackItem {
        KnapsackItem { weight, profit }
    }
    fn profit_of(items: &[KnapsackItem], selection: &[usize]) -> i64 {
        selection.iter().map(|i| items[*i].profit).sum()
    }
    fn weight_of(items: &[KnapsackItem], selection: &[usize]) -> i64 {
        selection.iter().map(|i| items[*i].weight).sum()
    }
    /// Exhaustive reference: the best profit over all 2^n subsets.
    fn brute_force(capacity: i64, items: &[KnapsackItem]) -> i64 {
        let mut best = 0;
        for mask in 0_usize..(1 << items.len()) {
            let mut weight = 0;
            let mut profit = 0;
            for (i, item) in items.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    weight += item.weight.max(0);
                    profit += item.profit;
                }
            }
            if weight <= capacity && profit > best {
                best = profit;
            }
        }
        best
    }

    #[test]
    fn empty_input_yields_an_empty_selection() {
        assert!(DpKnapsack.solve(10, &[]).is_empty());
    }

    #[test]
    fn negative_capacity_yields_an_empty_selection() {
        assert!(DpKnapsack.solve(-1, &[item(1, 5)]).is_empty());
    }

    #[test]
    fn it_solves_a_textbook_instance() {
        let items = [item(2, 3), item(3, 4), item(4, 5), item(5, 6)];
        let selection = DpKnapsack.solve(5, &items);
        assert_eq!(vec![0, 1], selection);
        assert_eq!(7, profit_of(&items, &selection));
    }

    #[test]
    fn non_positive_profits_are_never_packed() {
        let items = [item(1, -3), item(1, 0), item(1, 2)];
        assert_eq!(vec![2], DpKnapsack.solve(10, &items));
    }

    #[test]
    fn zero_weight_items_with_positive_profit_are_always_packed() {
        let items = [item(0, 2), item(5, 3)];
        assert_eq!(vec![0, 1], DpKnapsack.solve(5, &items));
        assert_eq!(vec![0], DpKnapsack.solve(4, &items));
    }

    #[test]
    fn it_matches_an_exhaustive_search_on_all_small_capacities() {
        let items = [
            item(3, 7),
            item(2, 2),
            item(5, 9),
            item(4, 4),
            item(1, 1),
            item(6, 13),
            item(2, 5),
            item(3, 3),
        ];
        for capacity in 0..=20 {
            let selection = DpKnapsack.solve(capacity, &items);
            assert!(weight_of(&items, &selection) <= capacity);
            assert_eq!(
                brute_force(capacity, &items),
                profit_of(&items, &selection),
                "capacity {capacity}"
            );
        }
    }
}
