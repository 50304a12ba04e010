//! Turning satisfying assignments into (small) predecessor cubes.

use pdr_aig::{Aig, AigLit, TernarySim};

use crate::cube::{Cube, Lit};
use crate::frames::Assignment;

pub struct Lifter {
    sim: TernarySim,
    enabled: bool,
    lits_removed: u64,
}

impl Lifter {
    pub fn new(enabled: bool) -> Self {
        Self { sim: TernarySim::new(), enabled, lits_removed: 0 }
    }

    /// Cube of states that, under the assignment's inputs, all step into
    /// `target`.
    pub fn predecessor(&mut self, aig: &Aig, assignment: &Assignment, target: &Cube, order: &[usize]) -> Cube {
        let targets: Vec<(AigLit, bool)> = target
            .lits()
            .iter()
            .map(|l| (aig.latch_next(l.var()), l.value()))
            .collect();
        self.lift(aig, assignment, &targets, order)
    }

    /// Cube of states that, under the assignment's inputs, raise `bad`.
    pub fn bad_cube(&mut self, aig: &Aig, assignment: &Assignment, order: &[usize]) -> Cube {
        self.lift(aig, assignment, &[(aig.bad(), true)], order)
    }

    fn lift(&mut self, aig: &Aig, assignment: &Assignment, targets: &[(AigLit, bool)], order: &[usize]) -> Cube {
        let kept: Vec<Option<bool>> = if self.enabled {
            self.sim.minimize(aig, &assignment.state, &assignment.inputs, targets, order)
        } else {
            assignment.state.iter().copied().map(Some).collect()
        };
        let state: Vec<Lit> = kept
            .iter()
            .enumerate()
            .filter_map(|(reg, v)| v.map(|v| Lit::new(reg, v)))
            .collect();
        self.lits_removed += (kept.len() - state.len()) as u64;
        let inputs: Vec<Lit> = assignment
            .inputs
            .iter()
            .enumerate()
            .map(|(i, &v)| Lit::new(i, v))
            .collect();
        Cube::new(state, &inputs)
    }

    pub fn runs(&self) -> u64 {
        self.sim.runs()
    }

    /// Register literals removed by lifting so far.
    pub fn lits_removed(&self) -> u64 {
        self.lits_removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdr_aig::library;

    #[test]
    fn shift_register_predecessor_needs_one_register() {
        let aig = library::shift_register(3);
        let target = Cube::new(vec![Lit::new(2, true)], &[]);
        let assignment = Assignment { state: vec![true, true, false], inputs: vec![false] };
        let mut lifter = Lifter::new(true);
        let pred = lifter.predecessor(&aig, &assignment, &target, &[0, 1, 2]);
        assert_eq!(pred.lits(), &[Lit::new(1, true)]);
        assert_eq!(pred.input_lits(), &[Lit::new(0, false)]);
        assert_eq!(lifter.lits_removed(), 2);
    }

    #[test]
    fn disabled_lifting_keeps_full_state() {
        let aig = library::shift_register(3);
        let assignment = Assignment { state: vec![false, false, true], inputs: vec![true] };
        let mut lifter = Lifter::new(false);
        let bad = lifter.bad_cube(&aig, &assignment, &[0, 1, 2]);
        assert_eq!(bad.len(), 3);
        let mut lifter = Lifter::new(true);
        let bad = lifter.bad_cube(&aig, &assignment, &[0, 1, 2]);
        assert_eq!(bad.lits(), &[Lit::new(2, true)]);
    }
}
