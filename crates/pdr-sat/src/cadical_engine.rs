//! [`SatEngine`] backed by CaDiCaL.

use tracing::trace;

use crate::{Lit, SatEngine, SolveResult, Var};

pub struct Cadical {
    solver: cadical::Solver,
    num_vars: usize,
    conflict: Vec<Lit>,
    inconsistent: bool,
}

impl Cadical {
    pub fn new() -> Self {
        Self {
            solver: cadical::Solver::new(),
            num_vars: 0,
            conflict: Vec::new(),
            inconsistent: false,
        }
    }

    /// Clauses currently held by the solver, including learnt ones it kept.
    pub fn num_clauses(&self) -> usize {
        self.solver.num_clauses()
    }
}

impl Default for Cadical {
    fn default() -> Self {
        Self::new()
    }
}

impl SatEngine for Cadical {
    fn reset(&mut self) {
        *self = Self::new();
    }

    fn new_var(&mut self) -> Var {
        let var = Var::new(self.num_vars);
        self.num_vars += 1;
        var
    }

    fn num_vars(&self) -> usize {
        self.num_vars
    }

    fn add_clause(&mut self, lits: &[Lit]) -> bool {
        debug_assert!(lits.iter().all(|l| l.var().index() < self.num_vars), "clause uses an unallocated variable");
        if lits.is_empty() {
            self.inconsistent = true;
        }
        self.solver.add_clause(lits.iter().map(|l| l.to_dimacs()));
        !self.inconsistent
    }

    fn solve(&mut self, assumptions: &[Lit], conflict_limit: Option<u64>) -> SolveResult {
        self.conflict.clear();

        if let Some(limit) = conflict_limit {
            let limit = i32::try_from(limit).unwrap_or(i32::MAX);
            // The limit only applies to the next call.
            let accepted = self.solver.set_limit("conflicts", limit).is_ok();
            debug_assert!(accepted, "conflict limit rejected");
        }

        let result = match self.solver.solve_with(assumptions.iter().map(|l| l.to_dimacs())) {
            Some(true) => SolveResult::Sat,
            Some(false) => {
                let solver = &self.solver;
                self.conflict.extend(assumptions.iter().copied().filter(|l| solver.failed(l.to_dimacs())));
                SolveResult::Unsat
            }
            None => SolveResult::Unknown,
        };
        trace!(?result, assumptions = assumptions.len(), failed = self.conflict.len(), "solve");
        result
    }

    fn value(&self, var: Var) -> Option<bool> {
        if var.index() >= self.num_vars {
            return None;
        }
        self.solver.value(var.pos().to_dimacs())
    }

    fn final_conflict(&self) -> &[Lit] {
        &self.conflict
    }
}
