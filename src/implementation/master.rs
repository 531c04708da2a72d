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

//! This module provides the restricted master problem (RMP) of the
//! Dantzig-Wolfe decomposition: the adapter which owns the active column
//! pool, lays the columns out as a linear program, delegates the LP to the
//! external simplex collaborator and translates the answer back into dual
//! prices and fractional assignment values.

use fxhash::FxHashSet;

use crate::{Column, FixingSet, Instance, LinearProgramSolver, LpColumn, RowBound};

/// Activity below this threshold counts as zero.
const ACTIVITY_EPS: f64 = 1e-6;

/// The answer of one LP solve of the restricted master.
#[derive(Debug, Clone)]
pub struct MasterSolution {
    /// The LP objective (including the dummy column's contribution).
    pub objective: f64,
    /// One dual price per agent row (nonpositive at an optimum).
    pub agent_duals: Vec<f64>,
    /// One dual price per *item* (indexed by item id; forced items carry no
    /// row and read 0).
    pub item_duals: Vec<f64>,
    /// One primal value per pooled column, in pool order.
    pub primals: Vec<f64>,
    /// The primal value of the dummy feasibility column. A positive value
    /// means the pooled columns alone cannot cover every free item yet.
    pub dummy: f64,
}

impl MasterSolution {
    /// True iff the pooled columns cover every free item without help from
    /// the dummy column.
    pub fn covered(&self) -> bool {
        self.dummy <= ACTIVITY_EPS
    }
}

/// The restricted master problem for one branch-and-price node.
///
/// Row layout: one `<= 1` row per agent (a single pattern may be selected
/// per agent) followed by one `= 1` row per *free* item (each must be
/// covered exactly once). Forced items do not appear in the master at all:
/// their cost is accounted for separately and their weight shows up as the
/// reduced capacities of the pricing subproblems. A dummy column spanning
/// all item rows at prohibitive cost keeps the LP feasible before real
/// columns exist.
pub struct RestrictedMaster<'a> {
    instance: &'a Instance,
    lp: &'a dyn LinearProgramSolver,
    /// row index of each item (None for forced items)
    item_row: Vec<Option<usize>>,
    nb_rows: usize,
    dummy_cost: f64,
    columns: Vec<Column>,
    dedup: FxHashSet<Column>,
}

impl<'a> RestrictedMaster<'a> {
    pub fn new(
        instance: &'a Instance,
        lp: &'a dyn LinearProgramSolver,
        fixings: &FixingSet,
    ) -> Self {
        let mut item_row = vec![None; instance.nb_items()];
        let mut next = instance.nb_agents();
        for item in instance.items() {
            if fixings.forced(item).is_none() {
                item_row[item.id()] = Some(next);
                next += 1;
            }
        }
        RestrictedMaster {
            instance,
            lp,
            item_row,
            nb_rows: next,
            dummy_cost: (10 * instance.bound()) as f64,
            columns: vec![],
            dedup: FxHashSet::default(),
        }
    }

    /// Adds a column to the pool unless an identical one (same agent, same
    /// item subset) is already there. Returns true iff the column was new.
    pub fn add_column(&mut self, column: Column) -> bool {
        if self.dedup.contains(&column) {
            return false;
        }
        self.dedup.insert(column.clone());
        self.columns.push(column);
        true
    }

    /// The pooled columns, in insertion order (the order of
    /// `MasterSolution::primals`).
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Solves the LP relaxation over the current pool. `None` models a
    /// failure of the external collaborator and is handled by the caller by
    /// pruning, never by retrying.
    pub fn solve(&self) -> Option<MasterSolution> {
        let mut rows = vec![RowBound::Upper(1.0); self.instance.nb_agents()];
        rows.resize(self.nb_rows, RowBound::Equal(1.0));

        // the dummy comes first, then the pool in insertion order
        let dummy_entries = self
            .item_row
            .iter()
            .filter_map(|row| row.map(|r| (r, 1.0)))
            .collect();
        let mut lp_columns = vec![LpColumn {
            objective: self.dummy_cost,
            entries: dummy_entries,
        }];
        for column in &self.columns {
            let mut entries = vec![(column.agent.id(), 1.0)];
            for item in &column.items {
                // pooled columns only ever pack free items
                entries.push((self.item_row[item.id()].unwrap(), 1.0));
            }
            lp_columns.push(LpColumn { objective: column.cost as f64, entries });
        }

        let sol = self.lp.solve(&rows, &lp_columns)?;
        let item_duals = self
            .item_row
            .iter()
            .map(|row| row.map_or(0.0, |r| sol.duals[r]))
            .collect();
        Some(MasterSolution {
            objective: sol.objective,
            agent_duals: sol.duals[..self.instance.nb_agents()].to_vec(),
            item_duals,
            dummy: sol.primals[0],
            primals: sol.primals[1..].to_vec(),
        })
    }

    /// Aggregates the per-column primal values into the fractional
    /// assignment matrix `x[item][agent]` the branching rules work on.
    pub fn fractional_values(&self, sol: &MasterSolution) -> Vec<Vec<f64>> {
        let mut values = vec![vec![0.0; self.instance.nb_agents()]; self.instance.nb_items()];
        for (column, &x) in self.columns.iter().zip(sol.primals.iter()) {
            if x > ACTIVITY_EPS {
                for item in &column.items {
                    values[item.id()][column.agent.id()] += x;
                }
            }
        }
        values
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
