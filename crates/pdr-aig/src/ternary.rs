//! Three-valued simulation over {0, 1, X}.

use crate::aig::{Aig, AigLit, AigNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ternary {
    Zero,
    One,
    X,
}

impl Ternary {
    pub fn from_bool(b: bool) -> Self {
        if b {
            Ternary::One
        } else {
            Ternary::Zero
        }
    }

    pub fn to_bool(self) -> Option<bool> {
        match self {
            Ternary::Zero => Some(false),
            Ternary::One => Some(true),
            Ternary::X => None,
        }
    }

    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Ternary::Zero, _) | (_, Ternary::Zero) => Ternary::Zero,
            (Ternary::One, Ternary::One) => Ternary::One,
            _ => Ternary::X,
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Ternary::Zero => Ternary::One,
            Ternary::One => Ternary::Zero,
            Ternary::X => Ternary::X,
        }
    }

    fn of_lit(values: &[Ternary], lit: AigLit) -> Self {
        let v = values[lit.node()];
        if lit.is_inverted() {
            v.negate()
        } else {
            v
        }
    }
}

/// Reusable simulation buffer plus a run counter.
#[derive(Debug, Default)]
pub struct TernarySim {
    values: Vec<Ternary>,
    runs: u64,
}

impl TernarySim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn simulate(&mut self, aig: &Aig, state: &[Ternary], inputs: &[Ternary]) {
        assert_eq!(state.len(), aig.num_latches(), "state width mismatch");
        assert_eq!(inputs.len(), aig.num_inputs(), "input width mismatch");
        self.runs += 1;
        self.values.clear();
        for n in aig.nodes() {
            let v = match *n {
                AigNode::False => Ternary::Zero,
                AigNode::Input { index } => inputs[index],
                AigNode::Latch { index } => state[index],
                AigNode::And { left, right } => {
                    Ternary::of_lit(&self.values, left).and(Ternary::of_lit(&self.values, right))
                }
            };
            self.values.push(v);
        }
    }

    /// Value of `lit` after the last [`simulate`](Self::simulate).
    pub fn lit(&self, lit: AigLit) -> Ternary {
        Ternary::of_lit(&self.values, lit)
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Starting from a complete state/input assignment under which every
    /// `(lit, value)` target holds, set registers to X one at a time in
    /// `order`, keeping each X only if all targets remain determined to
    /// their values. Returns the surviving register values (`None` = X).
    pub fn minimize(
        &mut self,
        aig: &Aig,
        state: &[bool],
        inputs: &[bool],
        targets: &[(AigLit, bool)],
        order: &[usize],
    ) -> Vec<Option<bool>> {
        let ins: Vec<Ternary> = inputs.iter().map(|&b| Ternary::from_bool(b)).collect();
        let mut cur: Vec<Ternary> = state.iter().map(|&b| Ternary::from_bool(b)).collect();
        let holds = |sim: &Self| targets.iter().all(|&(lit, v)| sim.lit(lit) == Ternary::from_bool(v));

        self.simulate(aig, &cur, &ins);
        assert!(holds(&*self), "assignment does not reach the simulation target");

        for &latch in order {
            let saved = cur[latch];
            cur[latch] = Ternary::X;
            self.simulate(aig, &cur, &ins);
            if !holds(&*self) {
                cur[latch] = saved;
            }
        }
        cur.into_iter().map(Ternary::to_bool).collect()
    }
}
