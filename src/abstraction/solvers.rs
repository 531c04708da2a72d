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

//! This module defines the contracts of the two external mathematical
//! collaborators the core delegates to: an exact 0/1 knapsack solver (the
//! pricing subproblem) and a linear-program solver (the restricted master).
//!
//! Both are injected once at construction time; the algorithms never care
//! which backend sits behind the trait.

/// One candidate entry of a knapsack subproblem.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KnapsackItem {
    pub weight: i64,
    pub profit: i64,
}

/// The contract of the exact 0/1 knapsack collaborator used by the pricing
/// oracle.
///
/// # Note
/// Exactness is not optional: the validity of the column-generation dual
/// bound rests on the subproblem being solved to optimality. A heuristic
/// backend would silently produce invalid lower bounds.
pub trait ExactKnapsackSolver {
    /// Returns the indices (into `items`) of a subset maximizing total
    /// profit subject to total weight <= capacity. The empty subset is a
    /// valid answer (profit 0).
    fn solve(&self, capacity: i64, items: &[KnapsackItem]) -> Vec<usize>;
}

/// The bound of a single row of a linear program.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RowBound {
    /// The row activity must not exceed the given value.
    Upper(f64),
    /// The row activity must equal the given value.
    Equal(f64),
}

/// A column of a linear program: its objective coefficient and its sparse
/// row entries.
#[derive(Debug, Clone, PartialEq)]
pub struct LpColumn {
    pub objective: f64,
    /// (row index, coefficient) pairs; row indices must be strictly
    /// increasing.
    pub entries: Vec<(usize, f64)>,
}

/// The solution of a linear program.
#[derive(Debug, Clone)]
pub struct LpSolution {
    /// The optimal objective value.
    pub objective: f64,
    /// One dual price per row.
    pub duals: Vec<f64>,
    /// One primal value per column.
    pub primals: Vec<f64>,
}

/// The contract of the linear-program collaborator used by the restricted
/// master problem. The objective sense is always minimization and all
/// variables are implicitly nonnegative.
///
/// A backend which fails to produce a solution (infeasible, unbounded, or
/// an internal failure) returns `None`; the caller treats this as "prune",
/// never as a reason to retry or panic.
pub trait LinearProgramSolver {
    fn solve(&self, rows: &[RowBound], columns: &[LpColumn]) -> Option<LpSolution>;
}
