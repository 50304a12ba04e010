use std::collections::HashMap;
use std::fmt;
use std::ops::Not;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AigError {
    #[error("literal {lit} refers to node {node}, but the graph has {len} nodes")]
    DanglingLiteral { lit: AigLit, node: usize, len: usize },

    #[error("and node {node} reads {fanin}, which is not defined before it")]
    NotTopological { node: usize, fanin: AigLit },

    #[error("literal {0} is not a register output")]
    NotALatch(AigLit),

    #[error("register {index} has no next-state function")]
    MissingNext { index: usize },
}

/// Edge of the graph: node index plus an inversion bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AigLit(u32);

impl AigLit {
    pub const FALSE: AigLit = AigLit(0);
    pub const TRUE: AigLit = AigLit(1);

    pub fn new(node: usize, inverted: bool) -> Self {
        assert!(node < (u32::MAX >> 1) as usize, "node index {node} out of range");
        AigLit((node as u32) << 1 | inverted as u32)
    }

    pub fn node(self) -> usize {
        (self.0 >> 1) as usize
    }

    pub fn is_inverted(self) -> bool {
        self.0 & 1 == 1
    }

    pub fn is_const(self) -> bool {
        self.node() == 0
    }
}

impl Not for AigLit {
    type Output = AigLit;

    fn not(self) -> AigLit {
        AigLit(self.0 ^ 1)
    }
}

impl fmt::Display for AigLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            AigLit::FALSE => write!(f, "0"),
            AigLit::TRUE => write!(f, "1"),
            lit if lit.is_inverted() => write!(f, "!n{}", lit.node()),
            lit => write!(f, "n{}", lit.node()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AigNode {
    False,
    Input { index: usize },
    Latch { index: usize },
    And { left: AigLit, right: AigLit },
}

#[derive(Debug, Clone)]
pub struct Latch {
    pub node: usize,
    pub next: Option<AigLit>,
    pub name: String,
}

/// A sequential AIG with zero-initialised registers and one bad output.
///
/// Nodes are kept in creation order; gates can only reference nodes created
/// before them, so node order is a topological order of the combinational
/// logic. Register outputs are sources; their next-state functions close the
/// loop.
#[derive(Debug, Clone)]
pub struct Aig {
    nodes: Vec<AigNode>,
    inputs: Vec<usize>,
    input_names: Vec<String>,
    latches: Vec<Latch>,
    bad: AigLit,
    strash: HashMap<(AigLit, AigLit), AigLit>,
}

impl Default for Aig {
    fn default() -> Self {
        Self::new()
    }
}

impl Aig {
    pub fn new() -> Self {
        Self {
            nodes: vec![AigNode::False],
            inputs: Vec::new(),
            input_names: Vec::new(),
            latches: Vec::new(),
            bad: AigLit::FALSE,
            strash: HashMap::new(),
        }
    }

    pub fn add_input(&mut self, name: impl Into<String>) -> AigLit {
        let node = self.nodes.len();
        self.nodes.push(AigNode::Input { index: self.inputs.len() });
        self.inputs.push(node);
        self.input_names.push(name.into());
        AigLit::new(node, false)
    }

    /// Add a register. Its next-state function is set with [`Aig::set_next`].
    pub fn add_latch(&mut self, name: impl Into<String>) -> AigLit {
        let node = self.nodes.len();
        self.nodes.push(AigNode::Latch { index: self.latches.len() });
        self.latches.push(Latch { node, next: None, name: name.into() });
        AigLit::new(node, false)
    }

    pub fn set_next(&mut self, latch: AigLit, next: AigLit) -> Result<(), AigError> {
        if latch.is_inverted() {
            return Err(AigError::NotALatch(latch));
        }
        match self.nodes.get(latch.node()) {
            Some(&AigNode::Latch { index }) => {
                self.latches[index].next = Some(next);
                Ok(())
            }
            _ => Err(AigError::NotALatch(latch)),
        }
    }

    pub fn set_bad(&mut self, bad: AigLit) {
        self.bad = bad;
    }

    /// AND gate with constant folding and structural hashing.
    pub fn and(&mut self, a: AigLit, b: AigLit) -> AigLit {
        if a == AigLit::FALSE || b == AigLit::FALSE || a == !b {
            return AigLit::FALSE;
        }
        if a == AigLit::TRUE || a == b {
            return b;
        }
        if b == AigLit::TRUE {
            return a;
        }
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&lit) = self.strash.get(&key) {
            return lit;
        }
        let node = self.nodes.len();
        self.nodes.push(AigNode::And { left: key.0, right: key.1 });
        let lit = AigLit::new(node, false);
        self.strash.insert(key, lit);
        lit
    }

    pub fn or(&mut self, a: AigLit, b: AigLit) -> AigLit {
        !self.and(!a, !b)
    }

    pub fn xor(&mut self, a: AigLit, b: AigLit) -> AigLit {
        let l = self.and(a, !b);
        let r = self.and(!a, b);
        self.or(l, r)
    }

    pub fn xnor(&mut self, a: AigLit, b: AigLit) -> AigLit {
        !self.xor(a, b)
    }

    /// `sel ? then : other`
    pub fn mux(&mut self, sel: AigLit, then: AigLit, other: AigLit) -> AigLit {
        let l = self.and(sel, then);
        let r = self.and(!sel, other);
        self.or(l, r)
    }

    pub fn and_all(&mut self, lits: impl IntoIterator<Item = AigLit>) -> AigLit {
        lits.into_iter().fold(AigLit::TRUE, |acc, l| self.and(acc, l))
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_latches(&self) -> usize {
        self.latches.len()
    }

    pub fn num_ands(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, AigNode::And { .. })).count()
    }

    pub fn node(&self, index: usize) -> &AigNode {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[AigNode] {
        &self.nodes
    }

    pub fn input(&self, index: usize) -> AigLit {
        AigLit::new(self.inputs[index], false)
    }

    pub fn input_name(&self, index: usize) -> &str {
        &self.input_names[index]
    }

    pub fn latch(&self, index: usize) -> AigLit {
        AigLit::new(self.latches[index].node, false)
    }

    pub fn latches(&self) -> &[Latch] {
        &self.latches
    }

    /// Next-state function of register `index`. A register without one
    /// keeps its value; [`Aig::validate`] rejects that case before solving.
    pub fn latch_next(&self, index: usize) -> AigLit {
        let latch = &self.latches[index];
        latch.next.unwrap_or(AigLit::new(latch.node, false))
    }

    pub fn bad(&self) -> AigLit {
        self.bad
    }

    /// Check that every edge points at an existing node, gates are in
    /// topological order, and every register has a next-state function.
    pub fn validate(&self) -> Result<(), AigError> {
        let len = self.nodes.len();
        let in_range = |lit: AigLit| {
            if lit.node() < len {
                Ok(())
            } else {
                Err(AigError::DanglingLiteral { lit, node: lit.node(), len })
            }
        };
        for (node, n) in self.nodes.iter().enumerate() {
            if let AigNode::And { left, right } = *n {
                for fanin in [left, right] {
                    in_range(fanin)?;
                    if fanin.node() >= node {
                        return Err(AigError::NotTopological { node, fanin });
                    }
                }
            }
        }
        for (index, latch) in self.latches.iter().enumerate() {
            in_range(latch.next.ok_or(AigError::MissingNext { index })?)?;
        }
        in_range(self.bad)
    }

    /// Two-valued evaluation of every node.
    pub fn simulate(&self, state: &[bool], inputs: &[bool]) -> Vec<bool> {
        assert_eq!(state.len(), self.latches.len(), "state width mismatch");
        assert_eq!(inputs.len(), self.inputs.len(), "input width mismatch");
        let mut values = Vec::with_capacity(self.nodes.len());
        for n in &self.nodes {
            let v = match *n {
                AigNode::False => false,
                AigNode::Input { index } => inputs[index],
                AigNode::Latch { index } => state[index],
                AigNode::And { left, right } => lit_value(&values, left) && lit_value(&values, right),
            };
            values.push(v);
        }
        values
    }

    /// One clock step: the successor state and whether `bad` fired in the
    /// current state under `inputs`.
    pub fn step(&self, state: &[bool], inputs: &[bool]) -> (Vec<bool>, bool) {
        let values = self.simulate(state, inputs);
        let next = (0..self.latches.len())
            .map(|i| lit_value(&values, self.latch_next(i)))
            .collect();
        (next, lit_value(&values, self.bad))
    }

    pub fn initial_state(&self) -> Vec<bool> {
        vec![false; self.latches.len()]
    }
}

/// Value of `lit` given per-node values.
pub fn lit_value(values: &[bool], lit: AigLit) -> bool {
    values[lit.node()] != lit.is_inverted()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_folds_constants_and_hashes() {
        let mut aig = Aig::new();
        let a = aig.add_input("a");
        let b = aig.add_input("b");
        assert_eq!(aig.and(a, AigLit::FALSE), AigLit::FALSE);
        assert_eq!(aig.and(AigLit::TRUE, a), a);
        assert_eq!(aig.and(a, !a), AigLit::FALSE);
        assert_eq!(aig.and(a, a), a);
        let g = aig.and(a, b);
        assert_eq!(aig.and(b, a), g);
        assert_eq!(aig.num_ands(), 1);
    }

    #[test]
    fn step_computes_next_state_and_bad() {
        let mut aig = Aig::new();
        let i = aig.add_input("i");
        let r = aig.add_latch("r");
        let nx = aig.xor(r, i);
        aig.set_next(r, nx).unwrap();
        aig.set_bad(r);
        aig.validate().unwrap();

        let (next, bad) = aig.step(&[false], &[true]);
        assert_eq!(next, vec![true]);
        assert!(!bad);
        let (next, bad) = aig.step(&[true], &[true]);
        assert_eq!(next, vec![false]);
        assert!(bad);
    }

    #[test]
    fn validate_rejects_malformed_systems() {
        let mut aig = Aig::new();
        let r = aig.add_latch("r");
        assert_eq!(aig.validate(), Err(AigError::MissingNext { index: 0 }));
        aig.set_next(r, AigLit::new(42, false)).unwrap();
        assert!(matches!(aig.validate(), Err(AigError::DanglingLiteral { node: 42, .. })));
        aig.set_next(r, !r).unwrap();
        aig.set_bad(AigLit::new(9, true));
        assert!(matches!(aig.validate(), Err(AigError::DanglingLiteral { .. })));

        let i = aig.add_input("i");
        assert_eq!(aig.set_next(i, r), Err(AigError::NotALatch(i)));
        assert_eq!(aig.set_next(!r, r), Err(AigError::NotALatch(!r)));
    }
}
