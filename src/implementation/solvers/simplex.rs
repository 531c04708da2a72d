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

//! This module provides the default linear-program backend: a dense,
//! two-phase tableau simplex. The restricted master problems it is asked to
//! solve are small (one row per agent plus one row per free item, a few
//! hundred columns), so a dense tableau with Bland's anti-cycling rule is
//! both simple and fast enough.

use crate::{LinearProgramSolver, LpColumn, LpSolution, RowBound};

/// Tolerance on the reduced costs and pivot elements.
const EPS: f64 = 1e-9;
/// Tolerance on the phase-1 objective when deciding feasibility.
const FEAS_EPS: f64 = 1e-7;
/// Hard cap on the number of pivots of one phase. Bland's rule guarantees
/// termination, the cap only protects against numerical stalling.
const MAX_PIVOTS: usize = 100_000;

/// _This is the default LP backend._ A two-phase dense tableau simplex,
/// minimizing, with all variables implicitly nonnegative.
///
/// The tableau is extended with one identity-origin column per row: a slack
/// for `Upper` rows and an artificial for `Equal` rows. Phase 1 minimizes
/// the sum of the artificials to find a feasible basis; phase 2 minimizes
/// the real objective with the artificials banned from re-entering. The row
/// duals are read off the final tableau as `y = c_B * B^-1`, which is the
/// current content of the identity-origin columns weighted by the basic
/// costs.
#[derive(Debug, Default, Copy, Clone)]
pub struct DenseSimplex;

impl LinearProgramSolver for DenseSimplex {
    fn solve(&self, rows: &[RowBound], columns: &[LpColumn]) -> Option<LpSolution> {
        let m = rows.len();
        let n = columns.len();
        if m == 0 {
            // no constraint: nonnegativity pins every variable at zero,
            // unless some cost is negative in which case the lp is unbounded
            if columns.iter().any(|c| c.objective < -EPS) {
                return None;
            }
            return Some(LpSolution { objective: 0.0, duals: vec![], primals: vec![0.0; n] });
        }

        // rhs and identity-origin columns (slack or artificial per row)
        let mut b = Vec::with_capacity(m);
        let mut artificial = vec![false; n + m];
        for (r, row) in rows.iter().enumerate() {
            let bound = match row {
                RowBound::Upper(v) => *v,
                RowBound::Equal(v) => {
                    artificial[n + r] = true;
                    *v
                }
            };
            // a slack/artificial start requires a nonnegative rhs; all the
            // programs built by this crate have rhs 0 or 1
            if bound < 0.0 {
                return None;
            }
            b.push(bound);
        }

        let mut a = vec![vec![0.0; n + m]; m];
        for (j, col) in columns.iter().enumerate() {
            for &(r, coef) in &col.entries {
                a[r][j] = coef;
            }
        }
        for (r, row) in a.iter_mut().enumerate() {
            row[n + r] = 1.0;
        }
        let mut basis: Vec<usize> = (n..n + m).collect();

        // phase 1: drive the artificials to zero
        if artificial.iter().any(|&x| x) {
            let c1: Vec<f64> = artificial.iter().map(|&x| if x { 1.0 } else { 0.0 }).collect();
            let none_banned = vec![false; n + m];
            run(&mut a, &mut b, &mut basis, &c1, &none_banned)?;

            let infeasibility: f64 = basis
                .iter()
                .zip(b.iter())
                .map(|(&j, &bv)| c1[j] * bv)
                .sum();
            if infeasibility > FEAS_EPS {
                return None;
            }
            // pivot zero-level artificials out of the basis where possible;
            // a row where it is not possible is redundant and harmless
            for i in 0..m {
                if artificial[basis[i]] {
                    let replacement = (0..n + m).find(|&j| !artificial[j] && a[i][j].abs() > EPS);
                    if let Some(j) = replacement {
                        pivot(&mut a, &mut b, &mut basis, i, j);
                    }
                }
            }
        }

        // phase 2: minimize the real objective, artificials locked out
        let mut c2 = vec![0.0; n + m];
        for (j, col) in columns.iter().enumerate() {
            c2[j] = col.objective;
        }
        run(&mut a, &mut b, &mut basis, &c2, &artificial)?;

        let mut primals = vec![0.0; n];
        for (i, &j) in basis.iter().enumerate() {
            if j < n {
                primals[j] = b[i];
            }
        }
        let objective = primals
            .iter()
            .zip(columns.iter())
            .map(|(x, col)| x * col.objective)
            .sum();
        let duals = (0..m)
            .map(|r| (0..m).map(|i| c2[basis[i]] * a[i][n + r]).sum())
            .collect();
        Some(LpSolution { objective, duals, primals })
    }
}

/// Runs the (minimizing) simplex iterations on the given tableau until
/// optimality. Entering column: smallest index with a negative reduced cost
/// (Bland); leaving row: smallest ratio, smallest basic index among ties
/// (Bland). Returns `None` when the program is unbounded or the pivot cap
/// is hit.
fn run(
    a: &mut [Vec<f64>],
    b: &mut [f64],
    basis: &mut [usize],
    cost: &[f64],
    banned: &[bool],
) -> Option<()> {
    let m = a.len();
    let ncols = cost.len();
    for _ in 0..MAX_PIVOTS {
        let cb: Vec<f64> = basis.iter().map(|&j| cost[j]).collect();

        let mut entering = None;
        for j in 0..ncols {
            if banned[j] || basis.contains(&j) {
                continue;
            }
            let reduced: f64 = cost[j] - (0..m).map(|i| cb[i] * a[i][j]).sum::<f64>();
            if reduced < -EPS {
                entering = Some(j);
                break;
            }
        }
        let Some(j) = entering else {
            return Some(());
        };

        let mut leaving: Option<usize> = None;
        let mut best_ratio = f64::INFINITY;
        for i in 0..m {
            if a[i][j] > EPS {
                let ratio = b[i] / a[i][j];
                let better = ratio < best_ratio - EPS;
                let tie = (ratio - best_ratio).abs() <= EPS
                    && leaving.map_or(false, |l| basis[i] < basis[l]);
                if better || tie {
                    best_ratio = ratio;
                    leaving = Some(i);
                }
            }
        }
        // no positive pivot entry: the program is unbounded below
        let i = leaving?;
        pivot(a, b, basis, i, j);
    }
    None
}

/// Performs one pivot: the variable of column `col` enters the basis in
/// place of the variable currently basic in row `row`.
fn pivot(a: &mut [Vec<f64>], b: &mut [f64], basis: &mut [usize], row: usize, col: usize) {
    let p = a[row][col];
    for v in a[row].iter_mut() {
        *v /= p;
    }
    b[row] /= p;

    let pivot_row = a[row].clone();
    let pivot_rhs = b[row];
    for i in 0..a.len() {
        if i == row {
            continue;
        }
        let factor = a[i][col];
        if factor.abs() > EPS {
            for (v, pv) in a[i].iter_mut().zip(pivot_row.iter()) {
                *v -= factor * pv;
            }
            b[i] -= factor * pivot_rhs;
        }
    }
    basis[row] = col;
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
