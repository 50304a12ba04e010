//! Delta-encoded frame database.
//!
//! Frame `k` stores the cubes whose blocking clause was last shown to hold up
//! to level `k`; the clause set of `R_k` is the union of the deltas at levels
//! `>= k`. Each frame owns one incremental solver holding the transition
//! relation plus every clause of `R_k`. Frame 0 has no cubes; its solver pins
//! the registers to the initial state instead.

use pdr_aig::Cnf;
use pdr_sat::{Lit as SatLit, SatEngine};
use tracing::debug;

use crate::cube::{Cube, Lit};

/// Complete state/input assignment read from a satisfiable query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub state: Vec<bool>,
    pub inputs: Vec<bool>,
}

/// Decided answer of a frame query.
#[derive(Debug, Clone)]
pub enum Answer {
    Sat(Assignment),
    /// The query cube's literals that appeared in the solver's final
    /// conflict, in cube order.
    Unsat(Vec<Lit>),
}

struct Frame<S> {
    cubes: Vec<Cube>,
    solver: S,
    activations: usize,
}

pub struct FrameDb<S> {
    frames: Vec<Frame<S>>,
    cnf: Cnf,
}

impl<S: SatEngine + Default> FrameDb<S> {
    pub fn new(cnf: Cnf) -> Self {
        Self { frames: Vec::new(), cnf }
    }

    pub fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the last frame.
    pub fn top(&self) -> usize {
        assert!(!self.frames.is_empty(), "frame database is empty");
        self.frames.len() - 1
    }

    /// Append a frame with no cubes of its own. Returns its index.
    pub fn push_frame(&mut self) -> usize {
        let k = self.frames.len();
        let solver = self.build_solver(k);
        self.frames.push(Frame { cubes: Vec::new(), solver, activations: 0 });
        k
    }

    fn build_solver(&self, k: usize) -> S {
        let mut solver = S::default();
        self.cnf.load(&mut solver);
        if k == 0 {
            for unit in self.cnf.init_units() {
                solver.add_clause(&[unit]);
            }
        } else {
            for frame in self.frames.iter().skip(k) {
                for cube in &frame.cubes {
                    solver.add_clause(&self.blocking_clause(cube));
                }
            }
        }
        solver
    }

    /// Replace frame `k`'s solver with a fresh one carrying the same clauses.
    pub fn recycle(&mut self, k: usize) {
        let solver = self.build_solver(k);
        let frame = &mut self.frames[k];
        debug!(frame = k, activations = frame.activations, "recycling frame solver");
        frame.solver = solver;
        frame.activations = 0;
    }

    /// Activation literals allocated on frame `k` since its solver was built.
    pub fn activations(&self, k: usize) -> usize {
        self.frames[k].activations
    }

    fn blocking_clause(&self, cube: &Cube) -> Vec<SatLit> {
        cube.lits()
            .iter()
            .map(|l| !self.cnf.latch_lit(l.var(), l.value()))
            .collect()
    }

    /// Delta cubes stored at `level`.
    pub fn cubes(&self, level: usize) -> &[Cube] {
        &self.frames[level].cubes
    }

    /// Number of cubes in each delta level.
    pub fn counts(&self) -> Vec<usize> {
        self.frames.iter().map(|f| f.cubes.len()).collect()
    }

    pub fn total_cubes(&self) -> usize {
        self.frames.iter().map(|f| f.cubes.len()).sum()
    }

    /// Every cube whose clause holds at `level`, i.e. the deltas at or
    /// above it.
    pub fn cubes_from(&self, level: usize) -> impl Iterator<Item = &Cube> {
        self.frames.iter().skip(level).flat_map(|f| f.cubes.iter())
    }

    /// Whether a stored cube at `level` or above already blocks `cube`.
    pub fn is_blocked(&self, level: usize, cube: &Cube) -> bool {
        self.cubes_from(level).any(|e| cube.contains(e))
    }

    /// [`is_blocked`](Self::is_blocked) for a tombstoned scratch array.
    pub fn is_blocked_loose(&self, level: usize, lits: &[Lit]) -> bool {
        self.cubes_from(level).any(|e| Cube::contains_loose(lits, e.lits()))
    }

    /// Store `cube` at `level` and add its clause to solvers `1..=level`.
    ///
    /// Returns `false` without changing anything when an existing cube at
    /// `level` or above already subsumes it. Otherwise cubes at levels
    /// `1..=level` that the new one subsumes are removed.
    pub fn add_cube(&mut self, level: usize, cube: Cube) -> bool {
        assert!(level >= 1 && level < self.frames.len(), "level {level} out of range");
        if self.is_blocked(level, &cube) {
            return false;
        }
        let clause = self.blocking_clause(&cube);
        for frame in &mut self.frames[1..=level] {
            frame.cubes.retain(|e| !e.contains(&cube));
            frame.solver.add_clause(&clause);
        }
        self.frames[level].cubes.push(cube);
        true
    }

    /// Move the cubes out of `level` for the pushing pass.
    pub fn take_level(&mut self, level: usize) -> Vec<Cube> {
        std::mem::take(&mut self.frames[level].cubes)
    }

    /// Put back the cubes of `level` that could not be pushed.
    pub fn restore_level(&mut self, level: usize, mut cubes: Vec<Cube>) {
        let frame = &mut self.frames[level];
        cubes.append(&mut frame.cubes);
        frame.cubes = cubes;
    }

    /// Move a cube taken from `level` up to `level + 1`. Solvers up to
    /// `level` already hold its clause.
    pub fn promote(&mut self, level: usize, cube: Cube) {
        let clause = self.blocking_clause(&cube);
        for frame in &mut self.frames[1..=level + 1] {
            frame.cubes.retain(|e| !e.contains(&cube));
        }
        let frame = &mut self.frames[level + 1];
        frame.solver.add_clause(&clause);
        frame.cubes.push(cube);
    }

    /// Is `R_k ∧ bad` satisfiable?
    pub fn query_bad(&mut self, k: usize, conflict_limit: Option<u64>) -> Option<Answer> {
        let cnf = &self.cnf;
        let solver = &mut self.frames[k].solver;
        match solver.solve(&[cnf.bad()], conflict_limit) {
            pdr_sat::SolveResult::Sat => Some(Answer::Sat(read_assignment(cnf, solver))),
            pdr_sat::SolveResult::Unsat => Some(Answer::Unsat(Vec::new())),
            pdr_sat::SolveResult::Unknown => None,
        }
    }

    /// Is `R_k ∧ T ∧ cube'` satisfiable? With `negate`, the clause `¬cube`
    /// is conjoined for this query only, through a fresh activation literal
    /// that is retired afterwards. `None` means the solver gave up.
    pub fn query_relative(
        &mut self,
        k: usize,
        cube: &Cube,
        negate: bool,
        conflict_limit: Option<u64>,
    ) -> Option<Answer> {
        let cnf = &self.cnf;
        let frame = &mut self.frames[k];
        let mut assumptions = Vec::with_capacity(cube.len() + 1);

        let activation = negate.then(|| {
            let act = frame.solver.new_var();
            let mut clause = Vec::with_capacity(cube.len() + 1);
            clause.push(act.neg());
            clause.extend(cube.lits().iter().map(|l| !cnf.latch_lit(l.var(), l.value())));
            frame.solver.add_clause(&clause);
            frame.activations += 1;
            act
        });
        if let Some(act) = activation {
            assumptions.push(act.pos());
        }
        let first_lit = assumptions.len();
        assumptions.extend(cube.lits().iter().map(|l| cnf.next_lit(l.var(), l.value())));

        let answer = match frame.solver.solve(&assumptions, conflict_limit) {
            pdr_sat::SolveResult::Sat => Some(Answer::Sat(read_assignment(cnf, &frame.solver))),
            pdr_sat::SolveResult::Unsat => {
                let failed = frame.solver.final_conflict();
                let core = cube
                    .lits()
                    .iter()
                    .zip(&assumptions[first_lit..])
                    .filter(|&(_, a)| failed.contains(a))
                    .map(|(&l, _)| l)
                    .collect();
                Some(Answer::Unsat(core))
            }
            pdr_sat::SolveResult::Unknown => None,
        };

        if let Some(act) = activation {
            frame.solver.add_clause(&[act.neg()]);
        }
        answer
    }
}

fn read_assignment<S: SatEngine>(cnf: &Cnf, solver: &S) -> Assignment {
    Assignment {
        state: (0..cnf.num_latches())
            .map(|i| solver.value(cnf.latch_var(i)).unwrap_or(false))
            .collect(),
        inputs: (0..cnf.num_inputs())
            .map(|i| solver.value(cnf.input_var(i)).unwrap_or(false))
            .collect(),
    }
}
