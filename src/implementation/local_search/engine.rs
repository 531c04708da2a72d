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

//! This module provides the move machinery of the local search: shift and
//! swap enumeration, incremental evaluation, a cache of the strictly
//! improving moves, and the changed-agent bookkeeping that limits
//! re-evaluation to the part of the neighborhood a mutation can have made
//! stale.

use crate::{Agent, CostDelta, Cutoff, Item, LocalSearchState};

/// One neighborhood move.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Move {
    /// Reassign `item` onto `to`.
    Shift { item: Item, to: Agent },
    /// Exchange the agents of `first` and `second`.
    Swap { first: Item, second: Item },
}

/// A cached improving move along with the two agents whose loads its
/// evaluation depends on (recorded at evaluation time, since applying other
/// moves can change the items' agents afterwards).
#[derive(Debug, Copy, Clone)]
struct CachedMove {
    mv: Move,
    touches: (Agent, Agent),
    delta: CostDelta,
}

/// The hill-climbing engine. It is a per-worker, thread-local object meant
/// to be reused across `optimize` calls on the same state: the changed-agent
/// marks persist, so a call following a perturbation only re-scans the
/// agents the perturbation touched.
pub struct LocalSearch {
    changed: Vec<bool>,
    cache: Vec<CachedMove>,
}

impl LocalSearch {
    pub fn new(nb_agents: usize) -> Self {
        LocalSearch { changed: vec![true; nb_agents], cache: vec![] }
    }

    /// Marks every agent stale and drops the move cache. Required when the
    /// engine is pointed at a state it has not been tracking.
    pub fn mark_all_changed(&mut self) {
        self.changed.iter_mut().for_each(|flag| *flag = true);
        self.cache.clear();
    }

    /// Marks the given agents stale (e.g. the agents a perturbation
    /// touched) and invalidates the cached moves depending on them.
    pub fn mark_changed(&mut self, agents: &[Agent]) {
        for agent in agents {
            self.changed[agent.id()] = true;
        }
        let changed = &self.changed;
        self.cache
            .retain(|c| !changed[c.touches.0.id()] && !changed[c.touches.1.id()]);
    }

    /// Runs the local search to a local optimum (or until the cutoff says
    /// to stop): repeatedly refresh the improving-move cache for the stale
    /// agents, apply the best cached move, and invalidate what the move
    /// made stale. Returns the number of moves applied.
    pub fn optimize(
        &mut self,
        state: &mut LocalSearchState,
        cutoff: &(impl Cutoff + ?Sized),
    ) -> usize {
        let mut applied = 0;
        loop {
            if cutoff.must_stop() {
                break;
            }
            self.refresh(state);
            // the lexicographically best delta is Pareto-non-dominated: any
            // move dominating it would compare smaller
            let Some(best) = self.cache.iter().copied().min_by_key(|c| c.delta) else {
                break;
            };
            match best.mv {
                Move::Shift { item, to } => state.apply_shift(item, to, best.delta),
                Move::Swap { first, second } => {
                    state.apply_swap(first, second, best.delta)
                }
            }
            applied += 1;
            self.mark_changed(&[best.touches.0, best.touches.1]);
        }
        applied
    }

    /// Re-evaluates the neighborhood of every stale agent and caches the
    /// strictly improving moves. Each candidate move is attributed to
    /// exactly one scanning agent so that no move is cached twice:
    /// * shifts out of a stale agent are scanned from that agent;
    /// * shifts into a stale agent are scanned from it only when the origin
    ///   agent is not itself stale;
    /// * swaps between two stale agents are scanned from the smaller id.
    fn refresh(&mut self, state: &LocalSearchState) {
        let instance = state.instance().clone();
        let stale: Vec<Agent> = instance.agents().filter(|a| self.changed[a.id()]).collect();
        if stale.is_empty() {
            return;
        }
        for &a in &stale {
            for item in instance.items() {
                let current = state.agent_of(item);
                if current == a {
                    for to in instance.agents().filter(|to| *to != a) {
                        let delta = state.evaluate_shift(item, to);
                        if delta.improving() {
                            self.cache.push(CachedMove {
                                mv: Move::Shift { item, to },
                                touches: (a, to),
                                delta,
                            });
                        }
                    }
                    for other in instance.items() {
                        let q = state.agent_of(other);
                        if q == a || (self.changed[q.id()] && q.id() <= a.id()) {
                            continue;
                        }
                        let delta = state.evaluate_swap(item, other);
                        if delta.improving() {
                            self.cache.push(CachedMove {
                                mv: Move::Swap { first: item, second: other },
                                touches: (a, q),
                                delta,
                            });
                        }
                    }
                } else if !self.changed[current.id()] {
                    let delta = state.evaluate_shift(item, a);
                    if delta.improving() {
                        self.cache.push(CachedMove {
                            mv: Move::Shift { item, to: a },
                            touches: (current, a),
                            delta,
                        });
                    }
                }
            }
        }
        self.changed.iter_mut().for_each(|flag| *flag = false);
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
