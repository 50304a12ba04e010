//! Independent checks of verdicts, using a fresh solver and plain
//! simulation rather than any state of the run that produced them.

use pdr_aig::{Aig, Cnf};
use pdr_sat::{Lit as SatLit, SatEngine, SolveResult};
use thiserror::Error;

use crate::invariant::Invariant;
use crate::trace::Counterexample;
use crate::Verdict;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CertifyError {
    #[error("clause blocking {cube} excludes the initial state")]
    Initiation { cube: String },

    #[error("clause blocking {cube} is not preserved by the transition relation")]
    Consecution { cube: String },

    #[error("invariant does not exclude the bad states")]
    Safety,

    #[error("solver gave up while checking the invariant")]
    Inconclusive,

    #[error("counterexample step {step} has {found} inputs, expected {expected}")]
    InputWidth { step: usize, found: usize, expected: usize },

    #[error("replaying the counterexample does not reach a bad state")]
    NoViolation,
}

/// Check any verdict; aborted runs have nothing to check.
pub fn certify<S: SatEngine + Default>(aig: &Aig, verdict: &Verdict) -> Result<(), CertifyError> {
    match verdict {
        Verdict::Proved { invariant } => check_invariant::<S>(aig, invariant),
        Verdict::Disproved { cex } => check_counterexample(aig, cex),
        Verdict::Aborted { .. } => Ok(()),
    }
}

/// Initiation, consecution and safety of `invariant` for `aig`.
pub fn check_invariant<S: SatEngine + Default>(aig: &Aig, invariant: &Invariant) -> Result<(), CertifyError> {
    for cube in invariant.cubes() {
        if cube.is_initial(None) {
            return Err(CertifyError::Initiation { cube: cube.to_string() });
        }
    }

    let cnf = Cnf::new(aig);
    let mut solver = S::default();
    cnf.load(&mut solver);
    for cube in invariant.cubes() {
        let clause: Vec<SatLit> = cube
            .lits()
            .iter()
            .map(|l| !cnf.latch_lit(l.var(), l.value()))
            .collect();
        solver.add_clause(&clause);
    }

    match solver.solve(&[cnf.bad()], None) {
        SolveResult::Unsat => {}
        SolveResult::Sat => return Err(CertifyError::Safety),
        SolveResult::Unknown => return Err(CertifyError::Inconclusive),
    }

    for cube in invariant.cubes() {
        let next: Vec<SatLit> = cube
            .lits()
            .iter()
            .map(|l| cnf.next_lit(l.var(), l.value()))
            .collect();
        match solver.solve(&next, None) {
            SolveResult::Unsat => {}
            SolveResult::Sat => return Err(CertifyError::Consecution { cube: cube.to_string() }),
            SolveResult::Unknown => return Err(CertifyError::Inconclusive),
        }
    }
    Ok(())
}

/// Replay `cex` from the reset state and confirm `bad` fires at the end.
pub fn check_counterexample(aig: &Aig, cex: &Counterexample) -> Result<(), CertifyError> {
    let expected = aig.num_inputs();
    for (step, inputs) in cex.inputs().enumerate() {
        if inputs.len() != expected {
            return Err(CertifyError::InputWidth { step, found: inputs.len(), expected });
        }
    }
    let mut state = aig.initial_state();
    for inputs in &cex.transitions {
        state = aig.step(&state, inputs).0;
    }
    if aig.step(&state, &cex.bad_inputs).1 {
        Ok(())
    } else {
        Err(CertifyError::NoViolation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::{Cube, Lit};
    use pdr_aig::library;
    use pdr_sat::Cadical;

    #[test]
    fn rejects_non_inductive_invariant() {
        // Blocking only the bad state of a counter is not inductive.
        let aig = library::counter(2, 3);
        let inv = Invariant::new(vec![Cube::new(vec![Lit::new(0, true), Lit::new(1, true)], &[])], 2, 1);
        assert!(matches!(check_invariant::<Cadical>(&aig, &inv), Err(CertifyError::Consecution { .. })));
    }

    #[test]
    fn rejects_invariant_missing_safety() {
        let aig = library::stuck_at_zero();
        let inv = Invariant::new(Vec::new(), 1, 1);
        assert_eq!(check_invariant::<Cadical>(&aig, &inv), Err(CertifyError::Safety));
    }

    #[test]
    fn rejects_invariant_excluding_reset() {
        let aig = library::stuck_at_zero();
        let inv = Invariant::new(vec![Cube::new(vec![Lit::new(0, false)], &[])], 1, 1);
        assert!(matches!(check_invariant::<Cadical>(&aig, &inv), Err(CertifyError::Initiation { .. })));
    }

    #[test]
    fn accepts_inductive_invariant() {
        let aig = library::stuck_at_zero();
        let inv = Invariant::new(vec![Cube::new(vec![Lit::new(0, true)], &[])], 1, 1);
        assert_eq!(check_invariant::<Cadical>(&aig, &inv), Ok(()));
    }

    #[test]
    fn replays_counterexamples() {
        let aig = library::toggle();
        let good = Counterexample { transitions: vec![vec![]], bad_inputs: vec![], cubes: Vec::new() };
        assert_eq!(check_counterexample(&aig, &good), Ok(()));
        let short = Counterexample { transitions: Vec::new(), bad_inputs: vec![], cubes: Vec::new() };
        assert_eq!(check_counterexample(&aig, &short), Err(CertifyError::NoViolation));
        let wide = Counterexample { transitions: vec![vec![true]], bad_inputs: vec![], cubes: Vec::new() };
        assert!(matches!(check_counterexample(&aig, &wide), Err(CertifyError::InputWidth { step: 0, .. })));
    }
}
