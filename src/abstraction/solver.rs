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

//! This module defines the `Solver` trait.

use crate::{Agent, Completion};

/// An assignment is the solver-facing shape of a solution: one optional
/// agent per item, in item order.
pub type Assignment = Vec<Option<Agent>>;

/// This is the solver abstraction. It is implemented by a structure that
/// searches for the minimum-cost feasible assignment of items to agents.
pub trait Solver {
    /// This method orders the solver to search for the optimal solution
    /// among all possibilities. It returns a structure standing for the
    /// outcome of the attempted minimization. Such a `Completion` may
    /// either be marked **exact** if the minimization has been carried out
    /// until optimality was proved. Or it can be inexact, in which case the
    /// minimization process was stopped by the satisfaction of some cutoff
    /// criterion.
    ///
    /// Along with the `is_exact` flag, the completion provides an optional
    /// `best_value`. Four cases are thus to be distinguished:
    ///
    /// * `is_exact` true and a `best_value` present: the `best_value` is
    ///   the minimum cost of a feasible assignment.
    /// * `is_exact` false and a `best_value` present: it is the cost of the
    ///   best feasible assignment known at the time of cutoff.
    /// * `is_exact` true and no `best_value`: the problem admits no
    ///   feasible assignment (UNSAT).
    /// * `is_exact` false and no `best_value`: no feasible assignment was
    ///   found before the cutoff occurred.
    fn minimize(&mut self) -> Completion;
    /// This method returns the cost of the best solution that has been
    /// found. It returns `None` when no solution is known.
    fn best_value(&self) -> Option<i64>;
    /// This method returns the best known assignment, or `None` when no
    /// feasible assignment has been found.
    fn best_solution(&self) -> Option<Assignment>;

    /// Returns the tightest lower bound that can be guaranteed so far.
    /// In case no bound has been computed, it should return `i64::MIN`.
    fn best_lower_bound(&self) -> i64;
    /// Returns the value of the best incumbent identified so far, which is
    /// an upper bound on the optimum. In case no incumbent has been found,
    /// it should return `i64::MAX`.
    fn best_upper_bound(&self) -> i64;

    /// Sets a primal (best known value and solution) of the problem.
    fn set_primal(&mut self, value: i64, solution: Assignment);

    /// Computes the optimality gap
    fn gap(&self) -> f32 {
        let ub = self.best_upper_bound();
        let lb = self.best_lower_bound();
        if ub == i64::MAX || lb == i64::MIN {
            1.0
        } else {
            let aub = ub.abs();
            let alb = lb.abs();
            let u = aub.max(alb);
            let l = aub.min(alb);
            if u == 0 {
                0.0
            } else {
                (u - l) as f32 / u as f32
            }
        }
    }
}
