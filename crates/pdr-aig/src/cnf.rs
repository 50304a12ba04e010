//! Tseitin encoding of one transition step.
//!
//! Node `n` of the graph becomes solver variable `n`. A register's current
//! value is its node variable; its next value is the literal of its
//! next-state function. The mapping is the same for every frame solver.

use pdr_sat::{Lit, SatEngine, Var};

use crate::aig::{Aig, AigLit, AigNode};

#[derive(Debug, Clone)]
pub struct Cnf {
    num_vars: usize,
    clauses: Vec<Vec<Lit>>,
    latch_vars: Vec<Var>,
    next_lits: Vec<Lit>,
    input_vars: Vec<Var>,
    bad: Lit,
    latch_of_var: Vec<Option<usize>>,
    input_of_var: Vec<Option<usize>>,
}

fn to_lit(lit: AigLit) -> Lit {
    Var::new(lit.node()).lit(lit.is_inverted())
}

impl Cnf {
    pub fn new(aig: &Aig) -> Self {
        let num_vars = aig.num_nodes();
        let mut clauses = Vec::with_capacity(1 + 3 * aig.num_ands());
        let mut latch_of_var = vec![None; num_vars];
        let mut input_of_var = vec![None; num_vars];

        for (node, n) in aig.nodes().iter().enumerate() {
            let g = Var::new(node);
            match *n {
                AigNode::False => clauses.push(vec![g.neg()]),
                AigNode::Input { index } => input_of_var[node] = Some(index),
                AigNode::Latch { index } => latch_of_var[node] = Some(index),
                AigNode::And { left, right } => {
                    let (a, b) = (to_lit(left), to_lit(right));
                    clauses.push(vec![g.neg(), a]);
                    clauses.push(vec![g.neg(), b]);
                    clauses.push(vec![g.pos(), !a, !b]);
                }
            }
        }

        Self {
            num_vars,
            clauses,
            latch_vars: (0..aig.num_latches()).map(|i| Var::new(aig.latch(i).node())).collect(),
            next_lits: (0..aig.num_latches()).map(|i| to_lit(aig.latch_next(i))).collect(),
            input_vars: (0..aig.num_inputs()).map(|i| Var::new(aig.input(i).node())).collect(),
            bad: to_lit(aig.bad()),
            latch_of_var,
            input_of_var,
        }
    }

    /// Allocate the variables and add the transition clauses to `solver`.
    pub fn load<S: SatEngine>(&self, solver: &mut S) {
        solver.ensure_vars(self.num_vars);
        for clause in &self.clauses {
            solver.add_clause(clause);
        }
    }

    /// Unit clauses pinning every register to 0.
    pub fn init_units(&self) -> impl Iterator<Item = Lit> + '_ {
        self.latch_vars.iter().map(|v| v.neg())
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn num_latches(&self) -> usize {
        self.latch_vars.len()
    }

    pub fn num_inputs(&self) -> usize {
        self.input_vars.len()
    }

    pub fn latch_var(&self, latch: usize) -> Var {
        self.latch_vars[latch]
    }

    pub fn input_var(&self, input: usize) -> Var {
        self.input_vars[input]
    }

    /// Literal asserting that register `latch` currently holds `value`.
    pub fn latch_lit(&self, latch: usize, value: bool) -> Lit {
        self.latch_vars[latch].lit(!value)
    }

    /// Literal asserting that register `latch` holds `value` after the step.
    pub fn next_lit(&self, latch: usize, value: bool) -> Lit {
        let next = self.next_lits[latch];
        if value {
            next
        } else {
            !next
        }
    }

    pub fn bad(&self) -> Lit {
        self.bad
    }

    pub fn latch_of(&self, var: Var) -> Option<usize> {
        self.latch_of_var.get(var.index()).copied().flatten()
    }

    pub fn input_of(&self, var: Var) -> Option<usize> {
        self.input_of_var.get(var.index()).copied().flatten()
    }
}
