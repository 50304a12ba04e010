//! Incremental SAT interface used by the PDR engine.
//!
//! The engine never talks to a concrete solver. Every frame owns one value
//! implementing [`SatEngine`], and all queries go through assumptions so that
//! the clause database only ever grows between [`SatEngine::reset`] calls.
//!
//! Two backends ship with the crate:
//! - [`Cadical`]: CaDiCaL through the `cadical` bindings. This is the default.
//! - `Z3Engine` (feature `z3`): the same interface on top of Z3's solver.

pub mod cadical_engine;
pub mod lit;
#[cfg(feature = "z3")]
pub mod z3_engine;

pub use cadical_engine::Cadical;
pub use lit::{Lit, Var};
#[cfg(feature = "z3")]
pub use z3_engine::Z3Engine;

/// Result of a single `solve` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveResult {
    Sat,
    Unsat,
    /// The conflict budget ran out before a decision was reached.
    Unknown,
}

/// Incremental SAT solver with assumptions.
///
/// Contract:
/// - clauses may only be added between `solve` calls;
/// - after `Sat`, [`value`](SatEngine::value) reports the model;
/// - after `Unsat`, [`final_conflict`](SatEngine::final_conflict) is a subset
///   of the assumptions (as passed in) that is already inconsistent with the
///   clause database. It may be empty when the database alone is unsat.
pub trait SatEngine {
    /// Drop every variable and clause.
    fn reset(&mut self);

    fn new_var(&mut self) -> Var;

    fn num_vars(&self) -> usize;

    /// Add a clause. Returns `false` once the database is known to be
    /// unsatisfiable at the top level.
    fn add_clause(&mut self, lits: &[Lit]) -> bool;

    /// Solve under `assumptions`. A `conflict_limit` of `Some(n)` makes the
    /// call return [`SolveResult::Unknown`] once `n` conflicts have been
    /// spent without a decision. The limit never outlives the call.
    fn solve(&mut self, assumptions: &[Lit], conflict_limit: Option<u64>) -> SolveResult;

    /// Model value of `var` after a satisfiable call.
    fn value(&self, var: Var) -> Option<bool>;

    /// Failed assumptions after an unsatisfiable call.
    fn final_conflict(&self) -> &[Lit];

    fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.value(lit.var()).map(|v| v != lit.is_negated())
    }

    /// Allocate variables until at least `n` exist.
    fn ensure_vars(&mut self, n: usize) {
        while self.num_vars() < n {
            self.new_var();
        }
    }
}
