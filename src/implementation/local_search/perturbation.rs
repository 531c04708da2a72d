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

//! This module provides the diversification operator of the large
//! neighborhood search: a compound move that forcibly relocates a small
//! random subset of the items, possibly degrading the cost, so that the
//! subsequent descent can escape the local optimum it was stuck in.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{Agent, CostDelta, Item, LocalSearchState};

/// Relocates `k` randomly drawn items (reservoir sampling over the item
/// range), in random order, each onto its locally best *different* agent
/// (ties broken by the first such agent). Returns the agents whose loads
/// were touched, so the caller can mark them stale in its engine.
pub fn perturb<R: Rng + ?Sized>(
    state: &mut LocalSearchState,
    rng: &mut R,
    k: usize,
) -> Vec<Agent> {
    let nb_items = state.instance().nb_items();
    let nb_agents = state.instance().nb_agents();
    if nb_agents < 2 || k == 0 {
        return vec![];
    }

    let k = k.min(nb_items);
    let mut sample: Vec<Item> = (0..k).map(Item).collect();
    for j in k..nb_items {
        let slot = rng.random_range(0..=j);
        if slot < k {
            sample[slot] = Item(j);
        }
    }
    sample.shuffle(rng);

    let mut touched = vec![];
    for item in sample {
        let from = state.agent_of(item);
        let mut best: Option<(Agent, CostDelta)> = None;
        for to in state.instance().agents() {
            if to == from {
                continue;
            }
            let delta = state.evaluate_shift(item, to);
            if best.map_or(true, |(_, d)| delta < d) {
                best = Some((to, delta));
            }
        }
        if let Some((to, delta)) = best {
            state.apply_shift(item, to, delta);
            touched.push(from);
            touched.push(to);
        }
    }
    touched
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_perturbation {
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::*;

    fn instance() -> Arc<Instance> {
        Arc::new(
            Instance::new(
                vec![10, 10, 10],
                vec![vec![2, 3, 4, 1], vec![3, 2, 1, 2], vec![1, 1, 2, 3]],
                vec![vec![3, 4, 9, 2], vec![11, 10, 2, 5], vec![6, 7, 8, 1]],
            )
            .unwrap(),
        )
    }

    #[test]
    fn every_sampled_item_changes_agent() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut state = LocalSearchState::min_cost_seed(instance());
        let before = state.assignment().to_vec();
        let touched = perturb(&mut state, &mut rng, 4);
        let moved = before
            .iter()
            .zip(state.assignment().iter())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(4, moved);
        assert_eq!(8, touched.len());
    }

    #[test]
    fn it_is_a_noop_with_a_single_agent() {
        let inst = Arc::new(
            Instance::new(vec![10], vec![vec![2, 3]], vec![vec![3, 4]]).unwrap(),
        );
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = LocalSearchState::min_cost_seed(inst);
        assert!(perturb(&mut state, &mut rng, 2).is_empty());
    }

    #[test]
    fn sampling_more_items_than_exist_relocates_them_all() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = LocalSearchState::min_cost_seed(instance());
        let before = state.assignment().to_vec();
        perturb(&mut state, &mut rng, 100);
        for (a, b) in before.iter().zip(state.assignment().iter()) {
            assert_ne!(a, b);
        }
    }

    #[test]
    fn identical_seeds_give_identical_perturbations() {
        let mut state_a = LocalSearchState::min_cost_seed(instance());
        let mut state_b = LocalSearchState::min_cost_seed(instance());
        perturb(&mut state_a, &mut StdRng::seed_from_u64(3), 3);
        perturb(&mut state_b, &mut StdRng::seed_from_u64(3), 3);
        assert_eq!(state_a.assignment(), state_b.assignment());
    }
}
