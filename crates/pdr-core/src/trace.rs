use crate::cube::Cube;
use crate::obligation::Obligation;

/// Input sequence driving the system from reset into a bad state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counterexample {
    /// Inputs applied on each transition, first step first.
    pub transitions: Vec<Vec<bool>>,
    /// Inputs under which the final state raises `bad`.
    pub bad_inputs: Vec<bool>,
    /// Lifted state cubes along the trace, reset side first.
    pub cubes: Vec<Cube>,
}

impl Counterexample {
    /// Rebuild the trace from the obligation whose cube contains an
    /// initial state. Its chain leads up to the bad-state obligation.
    pub(crate) fn from_chain(first: &Obligation, num_inputs: usize) -> Self {
        let chain: Vec<&Obligation> = first.chain().collect();
        let (last, steps) = chain.split_last().expect("obligation chain is never empty");
        Self {
            transitions: steps.iter().map(|o| decode_inputs(o.cube(), num_inputs)).collect(),
            bad_inputs: decode_inputs(last.cube(), num_inputs),
            cubes: chain.iter().map(|o| o.cube().clone()).collect(),
        }
    }

    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Every input vector, transitions followed by the bad-state inputs.
    pub fn inputs(&self) -> impl Iterator<Item = &[bool]> {
        self.transitions
            .iter()
            .map(Vec::as_slice)
            .chain(std::iter::once(self.bad_inputs.as_slice()))
    }
}

fn decode_inputs(cube: &Cube, num_inputs: usize) -> Vec<bool> {
    let mut values = vec![false; num_inputs];
    for l in cube.input_lits() {
        values[l.var()] = l.value();
    }
    values
}
