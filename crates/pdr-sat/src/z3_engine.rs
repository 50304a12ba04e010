//! [`SatEngine`] backed by Z3's incremental solver.
//!
//! Written against the context-free z3 API: terms live in the thread-local
//! context, so a `Z3Engine` must stay on the thread that created it.

use std::collections::HashMap;

use z3::ast::Bool;
use z3::{Params, SatResult, Solver};

use crate::{Lit, SatEngine, SolveResult, Var};

pub struct Z3Engine {
    solver: Solver,
    vars: Vec<Bool>,
    model: Vec<Option<bool>>,
    conflict: Vec<Lit>,
}

impl Z3Engine {
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            vars: Vec::new(),
            model: Vec::new(),
            conflict: Vec::new(),
        }
    }

    fn term(&self, lit: Lit) -> Bool {
        let v = &self.vars[lit.var().index()];
        if lit.is_negated() {
            v.not()
        } else {
            v.clone()
        }
    }
}

impl Default for Z3Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl SatEngine for Z3Engine {
    fn reset(&mut self) {
        *self = Self::new();
    }

    fn new_var(&mut self) -> Var {
        let var = Var::new(self.vars.len());
        self.vars.push(Bool::new_const(format!("v{}", var.index())));
        var
    }

    fn num_vars(&self) -> usize {
        self.vars.len()
    }

    fn add_clause(&mut self, lits: &[Lit]) -> bool {
        let terms: Vec<Bool> = lits.iter().map(|&l| self.term(l)).collect();
        let refs: Vec<&Bool> = terms.iter().collect();
        self.solver.assert(&Bool::or(&refs));
        true
    }

    fn solve(&mut self, assumptions: &[Lit], conflict_limit: Option<u64>) -> SolveResult {
        self.model.clear();
        self.conflict.clear();

        let mut params = Params::new();
        let limit = conflict_limit.map_or(u32::MAX, |l| l.min(u32::MAX as u64) as u32);
        params.set_u32("max_conflicts", limit);
        self.solver.set_params(&params);

        let terms: Vec<Bool> = assumptions.iter().map(|&l| self.term(l)).collect();
        match self.solver.check_assumptions(&terms) {
            SatResult::Sat => {
                if let Some(model) = self.solver.get_model() {
                    self.model = self
                        .vars
                        .iter()
                        .map(|v| model.eval(v, true).and_then(|b| b.as_bool()))
                        .collect();
                }
                SolveResult::Sat
            }
            SatResult::Unsat => {
                let by_name: HashMap<String, Lit> = terms
                    .iter()
                    .zip(assumptions)
                    .map(|(t, &l)| (t.to_string(), l))
                    .collect();
                self.conflict = self
                    .solver
                    .get_unsat_core()
                    .iter()
                    .filter_map(|c| by_name.get(&c.to_string()).copied())
                    .collect();
                SolveResult::Unsat
            }
            SatResult::Unknown => SolveResult::Unknown,
        }
    }

    fn value(&self, var: Var) -> Option<bool> {
        self.model.get(var.index()).copied().flatten()
    }

    fn final_conflict(&self) -> &[Lit] {
        &self.conflict
    }
}
