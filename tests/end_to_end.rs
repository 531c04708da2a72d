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

#![cfg(test)]

//! End-to-end checks running both engines on complete instances and
//! cross-validating their answers against exhaustive enumeration.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gaps::*;

/// Enumerates every complete assignment and returns the optimal feasible
/// cost, or `None` when the instance is infeasible.
fn brute_force(inst: &Instance) -> Option<i64> {
    let n = inst.nb_items();
    let m = inst.nb_agents();
    let mut best: Option<i64> = None;
    let mut assign = vec![0usize; n];
    loop {
        let mut load = vec![0i64; m];
        let mut cost = 0i64;
        for (j, &i) in assign.iter().enumerate() {
            load[i] += inst.weight(Item(j), Agent(i));
            cost += inst.cost(Item(j), Agent(i));
        }
        let feasible = (0..m).all(|i| load[i] <= inst.capacity(Agent(i)));
        if feasible && best.map_or(true, |b| cost < b) {
            best = Some(cost);
        }

        let mut j = 0;
        loop {
            if j == n {
                return best;
            }
            assign[j] += 1;
            if assign[j] < m {
                break;
            }
            assign[j] = 0;
            j += 1;
        }
    }
}

/// Recomputes the cost of a reported assignment and checks its feasibility.
fn validate(inst: &Arc<Instance>, assignment: &Assignment, expected_cost: i64) {
    let mut sol = Solution::new(Arc::clone(inst));
    for (j, agent) in assignment.iter().enumerate() {
        sol.set(Item(j), *agent);
    }
    assert!(sol.feasible());
    assert_eq!(expected_cost, sol.cost());
}

fn branch_and_price<'a>(
    instance: Arc<Instance>,
    cutoff: &'a dyn Cutoff,
) -> BranchAndPrice<'a> {
    BranchAndPrice::custom(
        instance,
        &DpKnapsack,
        &DenseSimplex,
        &LargestFractional,
        &BestFirst,
        cutoff,
        &NoopObserver,
        false,
    )
}

fn two_agents() -> Arc<Instance> {
    Arc::new(
        Instance::new(
            vec![5, 7],
            vec![vec![2, 3], vec![3, 4]],
            vec![vec![11, 12], vec![5, 10]],
        )
        .unwrap(),
    )
}

fn three_agents() -> Arc<Instance> {
    Arc::new(
        Instance::new(
            vec![10, 12, 11],
            vec![
                vec![4, 5, 3, 6, 2],
                vec![3, 4, 5, 2, 4],
                vec![5, 2, 4, 3, 3],
            ],
            vec![
                vec![6, 9, 4, 8, 5],
                vec![7, 5, 9, 3, 7],
                vec![9, 7, 6, 5, 2],
            ],
        )
        .unwrap(),
    )
}

/// A 3-agent, 30-item instance with capacities loose enough that every
/// complete assignment is feasible.
fn large(seed: u64) -> Arc<Instance> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = 30;
    let weight: Vec<Vec<i64>> = (0..3)
        .map(|_| (0..n).map(|_| rng.random_range(1..=9)).collect())
        .collect();
    let cost: Vec<Vec<i64>> = (0..3)
        .map(|_| (0..n).map(|_| rng.random_range(1..=20)).collect())
        .collect();
    Arc::new(Instance::new(vec![9 * n as i64; 3], weight, cost).unwrap())
}

#[test]
fn a_single_item_instance_is_solved_at_the_root() {
    let inst = Arc::new(Instance::new(vec![5], vec![vec![4]], vec![vec![10]]).unwrap());
    let mut bnp = branch_and_price(Arc::clone(&inst), &NoCutoff);
    let completion = bnp.minimize();
    assert!(completion.is_exact);
    assert_eq!(Some(10), completion.best_value);
    validate(&inst, &bnp.best_solution().unwrap(), 10);
}

#[test]
fn both_engines_find_the_two_agent_optimum() {
    let inst = two_agents();

    let mut bnp = branch_and_price(Arc::clone(&inst), &NoCutoff);
    let completion = bnp.minimize();
    assert!(completion.is_exact);
    assert_eq!(Some(15), completion.best_value);
    validate(&inst, &bnp.best_solution().unwrap(), 15);

    let config = LnsConfigBuilder::default()
        .nb_threads(1)
        .perturbation_size(2)
        .build()
        .unwrap();
    let mut lns = LnsSolver::new(Arc::clone(&inst), config, &NoCutoff, &NoopObserver);
    let completion = lns.minimize();
    assert!(!completion.is_exact);
    assert_eq!(Some(15), completion.best_value);
    validate(&inst, &lns.best_solution().unwrap(), 15);
}

#[test]
fn branch_and_price_matches_exhaustive_enumeration() {
    let inst = three_agents();
    let optimum = brute_force(&inst).unwrap();

    let mut bnp = branch_and_price(Arc::clone(&inst), &NoCutoff);
    let completion = bnp.minimize();
    assert!(completion.is_exact);
    assert_eq!(Some(optimum), completion.best_value);
    // at exact completion the proven bound closes the gap
    assert_eq!(optimum, bnp.best_lower_bound());
    assert_eq!(optimum, bnp.best_upper_bound());
    validate(&inst, &bnp.best_solution().unwrap(), optimum);
}

#[test]
fn every_ordering_agrees_with_enumeration() {
    let inst = three_agents();
    let optimum = brute_force(&inst).unwrap();
    for (ranking, eager) in [
        (&DepthFirst as &dyn NodeRanking, false),
        (&BestFirst as &dyn NodeRanking, true),
        (&LimitedDiscrepancy as &dyn NodeRanking, false),
    ] {
        let mut bnp = BranchAndPrice::custom(
            Arc::clone(&inst),
            &DpKnapsack,
            &DenseSimplex,
            &LargestFractional,
            ranking,
            &NoCutoff,
            &NoopObserver,
            eager,
        );
        assert_eq!(Some(optimum), bnp.minimize().best_value);
    }
}

#[test]
fn randomized_small_instances_match_exhaustive_enumeration() {
    // tight capacities force deep branching with items pinned onto agents,
    // so the shared column pool keeps being reseeded under capacities that
    // are smaller than the ones its columns were priced with
    for seed in 0..400u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let m = rng.random_range(2..=3usize);
        let n = rng.random_range(4..=6usize);
        let weight: Vec<Vec<i64>> = (0..m)
            .map(|_| (0..n).map(|_| rng.random_range(1..=9)).collect())
            .collect();
        let cost: Vec<Vec<i64>> = (0..m)
            .map(|_| (0..n).map(|_| rng.random_range(1..=20)).collect())
            .collect();
        let capacity: Vec<i64> = (0..m).map(|_| rng.random_range(5..=15)).collect();
        let inst = Arc::new(Instance::new(capacity, weight, cost).unwrap());
        let expected = brute_force(&inst);

        let mut bnp = branch_and_price(Arc::clone(&inst), &NoCutoff);
        let completion = bnp.minimize();
        assert!(completion.is_exact, "seed {seed}");
        assert_eq!(expected, completion.best_value, "seed {seed}");
        if let Some(value) = completion.best_value {
            validate(&inst, &bnp.best_solution().unwrap(), value);
        }
    }
}

#[test]
fn the_local_search_never_reports_an_infeasible_or_superoptimal_value() {
    let inst = three_agents();
    let optimum = brute_force(&inst).unwrap();

    let config = LnsConfigBuilder::default()
        .nb_threads(2)
        .perturbation_size(3)
        .build()
        .unwrap();
    let mut lns = LnsSolver::new(Arc::clone(&inst), config, &NoCutoff, &NoopObserver);
    let completion = lns.minimize();
    let value = completion.best_value.unwrap();
    assert!(value >= optimum);
    validate(&inst, &lns.best_solution().unwrap(), value);
}

#[test]
fn an_infeasible_instance_is_proved_unsat() {
    let inst = Arc::new(
        Instance::new(vec![1, 1], vec![vec![5, 5], vec![5, 5]], vec![vec![1, 1], vec![1, 1]])
            .unwrap(),
    );
    let mut bnp = branch_and_price(Arc::clone(&inst), &NoCutoff);
    let completion = bnp.minimize();
    assert!(completion.is_exact);
    assert_eq!(None, completion.best_value);
    assert_eq!(None, bnp.best_solution());
}

#[test]
fn a_tight_time_budget_degrades_gracefully() {
    let inst = large(42);
    let budget = TimeBudget::new(Duration::from_millis(20));
    let mut bnp = branch_and_price(Arc::clone(&inst), &budget);
    bnp.minimize();
    // whatever happened, the reported bounds must bracket each other
    assert!(bnp.best_lower_bound() <= bnp.best_upper_bound());
    if let Some(value) = bnp.best_value() {
        validate(&inst, &bnp.best_solution().unwrap(), value);
    }
}

#[test]
fn the_heuristic_value_respects_the_exact_lower_bound() {
    let inst = large(7);

    let config = LnsConfigBuilder::default()
        .nb_threads(2)
        .build()
        .unwrap();
    let lns_budget = TimeBudget::new(Duration::from_millis(200));
    let mut lns = LnsSolver::new(Arc::clone(&inst), config, &lns_budget, &NoopObserver);
    // capacities are loose, so the greedy seed is feasible and a value is
    // guaranteed
    let value = lns.minimize().best_value.unwrap();
    validate(&inst, &lns.best_solution().unwrap(), value);

    let bnp_budget = TimeBudget::new(Duration::from_millis(200));
    let mut bnp = branch_and_price(Arc::clone(&inst), &bnp_budget);
    bnp.minimize();
    // any proven lower bound must stay below any feasible value
    assert!(bnp.best_lower_bound() <= value);
}
