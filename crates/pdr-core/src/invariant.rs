use std::fmt::Write as _;

use crate::cube::{Cube, Lit};

/// Inductive invariant found at a fixed point: the conjunction of the
/// negations of its cubes.
#[derive(Debug, Clone)]
pub struct Invariant {
    cubes: Vec<Cube>,
    num_regs: usize,
    level: usize,
}

impl Invariant {
    pub(crate) fn new(mut cubes: Vec<Cube>, num_regs: usize, level: usize) -> Self {
        cubes.sort_by(Cube::compare);
        Self { cubes, num_regs, level }
    }

    /// The blocked cubes. Each one's negation is a clause of the invariant.
    pub fn cubes(&self) -> &[Cube] {
        &self.cubes
    }

    /// Clauses as literal lists (negated cubes).
    pub fn clauses(&self) -> Vec<Vec<Lit>> {
        self.cubes.iter().map(|c| c.lits().iter().map(|&l| !l).collect()).collect()
    }

    pub fn len(&self) -> usize {
        self.cubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cubes.is_empty()
    }

    /// Frame whose delta emptied.
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn num_regs(&self) -> usize {
        self.num_regs
    }

    /// Whether a concrete state satisfies every clause.
    pub fn holds(&self, state: &[bool]) -> bool {
        self.cubes
            .iter()
            .all(|c| !c.lits().iter().all(|l| state[l.var()] == l.value()))
    }

    /// Per register, the number of clauses mentioning it.
    pub fn support(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_regs];
        for c in &self.cubes {
            for l in c.lits() {
                counts[l.var()] += 1;
            }
        }
        counts
    }

    pub fn patterns(&self) -> Vec<String> {
        self.cubes.iter().map(|c| c.pattern(self.num_regs)).collect()
    }

    /// PLA-style listing: one blocked cube per line with output 1.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, ".i {}", self.num_regs);
        let _ = writeln!(out, ".o 1");
        let _ = writeln!(out, ".p {}", self.cubes.len());
        for p in self.patterns() {
            let _ = writeln!(out, "{p} 1");
        }
        let _ = writeln!(out, ".e");
        out
    }
}
