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

//! # GAPS
//! GAPS is a solver library for the generalized assignment problem: assign
//! each of N items (jobs) to exactly one of M agents (resources), where each
//! item has an agent-dependent cost and weight and each agent has a capacity,
//! so that the total cost is minimized and no capacity is exceeded.
//!
//! The library provides two complementary engines behind the same `Solver`
//! abstraction:
//!
//! * `BranchAndPrice`, an exact solver. It bounds each node of its search
//!   tree with a column-generation lower bound (a Dantzig-Wolfe
//!   reformulation whose pricing subproblems are per-agent knapsacks) and
//!   branches on fractional item-agent assignments. Plug in a `NodeRanking`
//!   (`DepthFirst`, `BestFirst`, `LimitedDiscrepancy`) to control the order
//!   in which the tree is explored.
//! * `LnsSolver`, an anytime large-neighborhood-search heuristic. It runs a
//!   shift-and-swap local search with incremental move evaluation, escapes
//!   local optima through random perturbations, and spreads the resulting
//!   candidate states over a pool of workers draining a shared best-first
//!   frontier.
//!
//! Both engines accept a `Cutoff` to bound their runtime and report their
//! progress (incumbents, proven bounds) through a `SearchObserver`.
//!
//! ## Quick Example
//! The following solves a tiny instance to proven optimality with the exact
//! engine, then polishes the same instance heuristically:
//! ```
//! use std::sync::Arc;
//! use gaps::*;
//!
//! // 2 agents with capacities 5 and 7, 2 items given per-agent weights
//! // and costs (row i holds the values of every item on agent i)
//! let instance = Arc::new(Instance::new(
//!     vec![5, 7],
//!     vec![vec![2, 3], vec![3, 4]],
//!     vec![vec![11, 12], vec![5, 10]],
//! ).unwrap());
//!
//! let knapsack = DpKnapsack;
//! let lp       = DenseSimplex;
//! let mut bnp  = BranchAndPrice::custom(
//!     Arc::clone(&instance),
//!     &knapsack,
//!     &lp,
//!     &LargestFractional,
//!     &BestFirst,
//!     &NoCutoff,
//!     &NoopObserver,
//!     false,
//! );
//! let completion = bnp.minimize();
//! assert!(completion.is_exact);
//! assert_eq!(Some(15), completion.best_value);
//!
//! let config  = LnsConfigBuilder::default().nb_threads(1).build().unwrap();
//! let mut lns = LnsSolver::new(instance, config, &NoCutoff, &NoopObserver);
//! assert_eq!(Some(15), lns.minimize().best_value);
//! ```
//!
//! ## Going further / Getting a grasp on the codebase
//! The easiest way to get your way around with GAPS is probably to start
//! exploring the available APIs. You are encouraged to begin with the
//! `Instance` and `Solver` types, which define the data you feed in and the
//! results you get out. After that, it is interesting to have a look at the
//! seams: `ExactKnapsackSolver` and `LinearProgramSolver` are the pluggable
//! building blocks of the column generation, while `BranchingRule`,
//! `NodeRanking` and `Cutoff` let you customize the behavior of the tree
//! search.

mod common;
mod model;
mod abstraction;
mod implementation;

pub use common::*;
pub use model::*;
pub use abstraction::*;
pub use implementation::*;
