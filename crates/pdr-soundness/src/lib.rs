use std::collections::HashSet;

use pdr_aig::{Aig, AigLit};
use pdr_core::certify::certify;
use pdr_core::{check, PdrConfig, Verdict};
use pdr_sat::Cadical;

/// Largest register/input counts `explore` accepts.
pub const MAX_EXPLICIT_LATCHES: usize = 16;
pub const MAX_EXPLICIT_INPUTS: usize = 8;

/// Plain-data description of a random circuit. Every index is taken modulo
/// the number of signals defined so far, so any recipe builds a valid AIG.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub inputs: usize,
    pub latches: usize,
    pub gates: Vec<(usize, bool, usize, bool)>,
    pub nexts: Vec<(usize, bool)>,
    pub bad: (usize, bool),
}

pub fn build(recipe: &Recipe) -> Aig {
    let mut aig = Aig::new();
    let mut signals: Vec<AigLit> = vec![AigLit::FALSE];
    signals.extend((0..recipe.inputs).map(|i| aig.add_input(format!("i{i}"))));
    let latches: Vec<AigLit> = (0..recipe.latches).map(|i| aig.add_latch(format!("r{i}"))).collect();
    signals.extend(&latches);
    for &(a, na, b, nb) in &recipe.gates {
        let pick = |idx: usize, neg: bool| {
            let s = signals[idx % signals.len()];
            if neg {
                !s
            } else {
                s
            }
        };
        let (x, y) = (pick(a, na), pick(b, nb));
        let g = aig.and(x, y);
        signals.push(g);
    }
    let pick = |(idx, neg): (usize, bool)| {
        let s = signals[idx % signals.len()];
        if neg {
            !s
        } else {
            s
        }
    };
    for (k, &latch) in latches.iter().enumerate() {
        let next = recipe.nexts.get(k).copied().map_or(latch, pick);
        // Latch literals come from add_latch, so this cannot fail.
        let _ = aig.set_next(latch, next);
    }
    aig.set_bad(pick(recipe.bad));
    aig
}

/// Result of exhaustive breadth-first exploration.
#[derive(Debug, Clone)]
pub enum Reachability {
    Safe { reachable: HashSet<u64> },
    /// `depth` transitions reach a state where some input raises `bad`.
    Unsafe { depth: usize },
}

fn unpack(bits: u64, width: usize) -> Vec<bool> {
    (0..width).map(|i| bits >> i & 1 == 1).collect()
}

fn pack(values: &[bool]) -> u64 {
    values
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &b)| acc | (b as u64) << i)
}

pub fn explore(aig: &Aig) -> Result<Reachability, String> {
    let (nl, ni) = (aig.num_latches(), aig.num_inputs());
    if nl > MAX_EXPLICIT_LATCHES || ni > MAX_EXPLICIT_INPUTS {
        return Err(format!("system too large for explicit exploration: {nl} registers, {ni} inputs"));
    }
    let input_vectors: Vec<Vec<bool>> = (0..1u64 << ni).map(|bits| unpack(bits, ni)).collect();
    let mut reachable = HashSet::from([0u64]);
    let mut layer = vec![0u64];
    let mut depth = 0;
    while !layer.is_empty() {
        let mut next_layer = Vec::new();
        for &state in &layer {
            let values = unpack(state, nl);
            for inputs in &input_vectors {
                let (next, bad) = aig.step(&values, inputs);
                if bad {
                    return Ok(Reachability::Unsafe { depth });
                }
                let packed = pack(&next);
                if reachable.insert(packed) {
                    next_layer.push(packed);
                }
            }
        }
        layer = next_layer;
        depth += 1;
    }
    Ok(Reachability::Safe { reachable })
}

/// Run PDR on `aig` and compare against exhaustive exploration: verdicts
/// must agree, counterexamples must be shortest and replay, invariants must
/// certify and hold in every reachable state.
pub fn cross_check(aig: &Aig, config: &PdrConfig) -> Result<Verdict, String> {
    let verdict = check(aig, config).map_err(|e| e.to_string())?;
    certify::<Cadical>(aig, &verdict).map_err(|e| e.to_string())?;
    match (&verdict, explore(aig)?) {
        (Verdict::Proved { invariant }, Reachability::Safe { reachable }) => {
            let nl = aig.num_latches();
            if let Some(&bad) = reachable.iter().find(|&&s| !invariant.holds(&unpack(s, nl))) {
                return Err(format!("invariant excludes reachable state {:?}", unpack(bad, nl)));
            }
        }
        (Verdict::Disproved { cex }, Reachability::Unsafe { depth }) => {
            if cex.len() != depth {
                return Err(format!("counterexample has {} steps, shortest is {depth}", cex.len()));
            }
        }
        (Verdict::Aborted { reason, .. }, _) => return Err(format!("run aborted: {reason}")),
        (Verdict::Proved { .. }, Reachability::Unsafe { depth }) => {
            return Err(format!("proved, but a bad state is reachable in {depth} steps"))
        }
        (Verdict::Disproved { cex }, Reachability::Safe { .. }) => {
            return Err(format!("disproved with {} steps, but no bad state is reachable", cex.len()))
        }
    }
    Ok(verdict)
}
