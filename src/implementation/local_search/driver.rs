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

//! This module provides the best-first driver of the large neighborhood
//! search: a fixed-size worker pool draining a shared frontier of candidate
//! states. Each worker runs the descent-perturb cycle on its own
//! thread-local state; the frontier (plus the global best and the duplicate
//! set) is the only shared, lock-protected resource.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use compare::Compare;
use dashmap::DashSet;
use derive_builder::Builder;
use fxhash::FxBuildHasher;
use parking_lot::{Condvar, Mutex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{
    perturb, Agent, Assignment, Completion, Cutoff, Event, Fringe, GlobalCost, Instance,
    Item, LocalSearch, LocalSearchState, SearchObserver, SimpleFringe, Solution, Solver,
};

/// The number of consecutive diversifications allowed to produce no new
/// frontier state before the driver gives up.
const FRUITLESS_LIMIT: usize = 16;

/// The configuration of the large-neighborhood-search driver.
#[derive(Debug, Clone, Builder)]
pub struct LnsConfig {
    /// The number of workers draining the frontier. Worker 0 doubles as the
    /// diversification worker: when the frontier runs dry it restarts from
    /// a perturbation of the global best.
    #[builder(default = "num_cpus::get()")]
    pub nb_threads: usize,
    /// How many items one perturbation relocates.
    #[builder(default = "8")]
    pub perturbation_size: usize,
    /// How many descent-perturb cycles a worker chains on one frontier
    /// state before going back to the frontier.
    #[builder(default = "4")]
    pub rounds: usize,
    /// The seed of the per-worker random number generators.
    #[builder(default = "0")]
    pub seed: u64,
}

/// One not-yet-optimized entry of the shared frontier.
struct Candidate {
    cost: GlobalCost,
    assignment: Vec<Agent>,
}

/// Frontier order: the cheapest candidate pops first.
struct CompareCandidate;
impl Compare<Candidate> for CompareCandidate {
    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        b.cost.cmp(&a.cost)
    }
}

/// The unit of work a worker got from the frontier.
enum WorkLoad {
    /// The search is over (frontier drained and diversification exhausted).
    Complete,
    /// The cutoff fired; everyone stops with the best known result.
    Aborted,
    /// Nothing to do right now, but some ongoing work may still repopulate
    /// the frontier.
    Starvation,
    /// One candidate to optimize. When `diversification` is set, the
    /// assignment is the global best and must be perturbed before the
    /// descent.
    WorkItem { assignment: Vec<Agent>, diversification: bool },
}

/// The portion of the shared state protected by the mutex.
struct Critical {
    fringe: SimpleFringe<Candidate, CompareCandidate>,
    /// Number of workers currently busy on a work item.
    ongoing: usize,
    /// Consecutive diversifications that pushed nothing new.
    fruitless: usize,
    abort: bool,
    complete: bool,
    best_cost: GlobalCost,
    best_assignment: Vec<Agent>,
}

/// The state shared by all workers.
struct Shared<'a> {
    instance: Arc<Instance>,
    cutoff: &'a (dyn Cutoff + Sync),
    observer: &'a dyn SearchObserver,
    /// Fingerprints of every state ever pushed onto the frontier.
    seen: DashSet<u64, FxBuildHasher>,
    critical: Mutex<Critical>,
    monitor: Condvar,
    start: Instant,
}

/// The large-neighborhood-search solver.
///
/// It is a heuristic: it never proves optimality, so `minimize` always
/// returns a completion flagged inexact and `best_lower_bound` stays at its
/// uninformative default.
pub struct LnsSolver<'a> {
    instance: Arc<Instance>,
    config: LnsConfig,
    cutoff: &'a (dyn Cutoff + Sync),
    observer: &'a dyn SearchObserver,
    best: Option<(GlobalCost, Vec<Agent>)>,
}

impl<'a> LnsSolver<'a> {
    pub fn new(
        instance: Arc<Instance>,
        config: LnsConfig,
        cutoff: &'a (dyn Cutoff + Sync),
        observer: &'a dyn SearchObserver,
    ) -> Self {
        LnsSolver { instance, config, cutoff, observer, best: None }
    }

    /// The initial frontier: the greedy min-cost seed, plus the primal the
    /// caller may have injected through `set_primal`.
    fn initial_candidates(&self) -> Vec<Candidate> {
        let seed = LocalSearchState::min_cost_seed(Arc::clone(&self.instance));
        let mut candidates = vec![Candidate {
            cost: seed.cost(),
            assignment: seed.assignment().to_vec(),
        }];
        if let Some((cost, assignment)) = &self.best {
            candidates.push(Candidate { cost: *cost, assignment: assignment.clone() });
        }
        candidates
    }

    fn get_workload(shared: &Shared<'_>, worker_id: usize) -> WorkLoad {
        let mut critical = shared.critical.lock();
        if critical.abort {
            return WorkLoad::Aborted;
        }
        if shared.cutoff.must_stop() {
            critical.abort = true;
            shared.monitor.notify_all();
            return WorkLoad::Aborted;
        }
        if critical.complete {
            return WorkLoad::Complete;
        }
        if let Some(candidate) = critical.fringe.pop() {
            critical.ongoing += 1;
            return WorkLoad::WorkItem {
                assignment: candidate.assignment,
                diversification: false,
            };
        }
        if critical.ongoing == 0 {
            if critical.fruitless >= FRUITLESS_LIMIT {
                critical.complete = true;
                shared.monitor.notify_all();
                return WorkLoad::Complete;
            }
            if worker_id == 0 {
                critical.fruitless += 1;
                critical.ongoing += 1;
                return WorkLoad::WorkItem {
                    assignment: critical.best_assignment.clone(),
                    diversification: true,
                };
            }
        }
        shared.monitor.wait(&mut critical);
        WorkLoad::Starvation
    }

    fn worker(shared: &Shared<'_>, worker_id: usize, config: &LnsConfig) {
        let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(worker_id as u64));
        let mut engine = LocalSearch::new(shared.instance.nb_agents());
        loop {
            match Self::get_workload(shared, worker_id) {
                WorkLoad::Complete | WorkLoad::Aborted => break,
                WorkLoad::Starvation => continue,
                WorkLoad::WorkItem { assignment, diversification } => {
                    Self::process(
                        shared,
                        &mut engine,
                        &mut rng,
                        config,
                        assignment,
                        diversification,
                    );
                }
            }
        }
    }

    /// Optimizes one frontier state: descend to a local optimum, record it,
    /// offer a perturbed sibling to the frontier, and chain a few more
    /// descent-perturb cycles locally (marking only the agents the
    /// perturbation touched).
    fn process(
        shared: &Shared<'_>,
        engine: &mut LocalSearch,
        rng: &mut StdRng,
        config: &LnsConfig,
        assignment: Vec<Agent>,
        diversification: bool,
    ) {
        let mut state = LocalSearchState::new(Arc::clone(&shared.instance), assignment);
        engine.mark_all_changed();
        if diversification {
            perturb(&mut state, rng, config.perturbation_size);
        }

        for round in 0..config.rounds.max(1) {
            engine.optimize(&mut state, shared.cutoff);
            Self::record(shared, &state);
            if shared.cutoff.must_stop() {
                break;
            }

            // offer a perturbed sibling to the other workers
            let mut sibling = state.clone();
            perturb(&mut sibling, rng, config.perturbation_size);
            if shared.seen.insert(sibling.fingerprint()) {
                let mut critical = shared.critical.lock();
                critical.fringe.push(Candidate {
                    cost: sibling.cost(),
                    assignment: sibling.assignment().to_vec(),
                });
                critical.fruitless = 0;
                shared.monitor.notify_all();
            }

            // keep walking locally from our own perturbation
            if round + 1 < config.rounds {
                let touched = perturb(&mut state, rng, config.perturbation_size);
                engine.mark_changed(&touched);
            }
        }

        let mut critical = shared.critical.lock();
        critical.ongoing -= 1;
        shared.monitor.notify_all();
    }

    fn record(shared: &Shared<'_>, state: &LocalSearchState) {
        let cost = state.cost();
        let mut critical = shared.critical.lock();
        if cost < critical.best_cost {
            critical.best_cost = cost;
            critical.best_assignment = state.assignment().to_vec();
            drop(critical);
            if cost.feasible() {
                shared.observer.notify(Event::Incumbent {
                    cost: cost.cost,
                    assignment: state.to_assignment(),
                    tag: "lns",
                    elapsed: shared.start.elapsed(),
                });
            }
        }
    }
}

impl Solver for LnsSolver<'_> {
    fn minimize(&mut self) -> Completion {
        let candidates = self.initial_candidates();
        let best = candidates
            .iter()
            .min_by_key(|c| c.cost)
            .map(|c| (c.cost, c.assignment.clone()))
            .expect("at least the seed candidate exists");

        let shared = Shared {
            instance: Arc::clone(&self.instance),
            cutoff: self.cutoff,
            observer: self.observer,
            seen: DashSet::with_hasher(FxBuildHasher::default()),
            critical: Mutex::new(Critical {
                fringe: SimpleFringe::new(CompareCandidate),
                ongoing: 0,
                fruitless: 0,
                abort: false,
                complete: false,
                best_cost: best.0,
                best_assignment: best.1,
            }),
            monitor: Condvar::new(),
            start: Instant::now(),
        };
        {
            let mut critical = shared.critical.lock();
            for candidate in candidates {
                if shared.seen.insert(fxhash::hash64(&candidate.assignment)) {
                    critical.fringe.push(candidate);
                }
            }
        }

        let nb_threads = self.config.nb_threads.max(1);
        let config = &self.config;
        let shared_ref = &shared;
        std::thread::scope(|s| {
            for worker_id in 0..nb_threads {
                s.spawn(move || Self::worker(shared_ref, worker_id, config));
            }
        });

        let critical = shared.critical.into_inner();
        self.best = Some((critical.best_cost, critical.best_assignment));
        Completion { is_exact: false, best_value: self.best_value() }
    }

    fn best_value(&self) -> Option<i64> {
        match &self.best {
            Some((cost, _)) if cost.feasible() => Some(cost.cost),
            _ => None,
        }
    }

    fn best_solution(&self) -> Option<Assignment> {
        match &self.best {
            Some((cost, assignment)) if cost.feasible() => {
                Some(assignment.iter().copied().map(Some).collect())
            }
            _ => None,
        }
    }

    fn best_lower_bound(&self) -> i64 {
        i64::MIN
    }

    fn best_upper_bound(&self) -> i64 {
        self.best_value().unwrap_or(i64::MAX)
    }

    fn set_primal(&mut self, value: i64, solution: Assignment) {
        let assignment: Option<Vec<Agent>> = solution.into_iter().collect();
        let Some(assignment) = assignment else { return };
        let mut check = Solution::new(Arc::clone(&self.instance));
        for (j, agent) in assignment.iter().enumerate() {
            check.set(Item(j), Some(*agent));
        }
        debug_assert_eq!(value, check.cost());
        let cost = check.global_cost();
        if self.best.as_ref().map_or(true, |(best, _)| cost < *best) {
            self.best = Some((cost, assignment));
        }
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_driver {
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;

    use crate::*;

    fn config(nb_threads: usize) -> LnsConfig {
        LnsConfigBuilder::default()
            .nb_threads(nb_threads)
            .perturbation_size(2)
            .rounds(2)
            .seed(0)
            .build()
            .unwrap()
    }

    #[test]
    fn it_fixes_an_infeasible_greedy_seed() {
        // the min-cost seed piles both items onto agent 0 (weight 6 > 4);
        // shifting one of them over is the only way to feasibility
        let inst = Arc::new(
            Instance::new(
                vec![4, 4],
                vec![vec![3, 3], vec![3, 3]],
                vec![vec![1, 1], vec![5, 5]],
            )
            .unwrap(),
        );
        let mut lns = LnsSolver::new(inst, config(1), &NoCutoff, &NoopObserver);
        let completion = lns.minimize();
        assert!(!completion.is_exact);
        assert_eq!(Some(6), completion.best_value);
        assert!(lns.best_solution().is_some());
    }

    #[test]
    fn an_already_optimal_seed_is_kept() {
        let inst = Arc::new(
            Instance::new(
                vec![5, 7],
                vec![vec![2, 3], vec![3, 4]],
                vec![vec![11, 12], vec![5, 10]],
            )
            .unwrap(),
        );
        let mut lns = LnsSolver::new(inst, config(1), &NoCutoff, &NoopObserver);
        assert_eq!(Some(15), lns.minimize().best_value);
    }

    #[test]
    fn several_workers_terminate_and_never_degrade_the_seed() {
        let inst = Arc::new(
            Instance::new(
                vec![10, 10, 10],
                vec![vec![2, 3, 4, 1], vec![3, 2, 1, 2], vec![1, 1, 2, 3]],
                vec![vec![3, 4, 9, 2], vec![11, 10, 2, 5], vec![6, 7, 8, 1]],
            )
            .unwrap(),
        );
        // the greedy seed is feasible at cost 10; the search may only improve
        let mut lns = LnsSolver::new(inst, config(4), &NoCutoff, &NoopObserver);
        let completion = lns.minimize();
        assert!(completion.best_value.is_some());
        assert!(completion.best_value.unwrap() <= 10);
    }

    #[test]
    fn the_time_budget_stops_the_search() {
        let inst = Arc::new(
            Instance::new(
                vec![10, 10, 10],
                vec![vec![2, 3, 4, 1], vec![3, 2, 1, 2], vec![1, 1, 2, 3]],
                vec![vec![3, 4, 9, 2], vec![11, 10, 2, 5], vec![6, 7, 8, 1]],
            )
            .unwrap(),
        );
        let budget = TimeBudget::new(Duration::from_millis(50));
        let mut lns = LnsSolver::new(inst, config(2), &budget, &NoopObserver);
        let completion = lns.minimize();
        assert!(!completion.is_exact);
        assert!(completion.best_value.is_some());
    }

    #[test]
    fn a_caller_supplied_primal_is_never_degraded() {
        let inst = Arc::new(
            Instance::new(
                vec![5, 7],
                vec![vec![2, 3], vec![3, 4]],
                vec![vec![11, 12], vec![5, 10]],
            )
            .unwrap(),
        );
        let mut lns = LnsSolver::new(inst, config(1), &NoCutoff, &NoopObserver);
        lns.set_primal(15, vec![Some(Agent(1)), Some(Agent(1))]);
        let completion = lns.minimize();
        assert_eq!(Some(15), completion.best_value);
    }

    #[test]
    fn incumbents_are_reported_through_the_observer() {
        struct Recorder(Mutex<Vec<Event>>);
        impl SearchObserver for Recorder {
            fn notify(&self, event: Event) {
                self.0.lock().push(event);
            }
        }

        let inst = Arc::new(
            Instance::new(
                vec![4, 4],
                vec![vec![3, 3], vec![3, 3]],
                vec![vec![1, 1], vec![5, 5]],
            )
            .unwrap(),
        );
        let recorder = Recorder(Mutex::new(vec![]));
        let mut lns = LnsSolver::new(inst, config(1), &NoCutoff, &recorder);
        lns.minimize();
        let events = recorder.0.lock();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Incumbent { cost: 6, tag: "lns", .. })));
    }
}
