//! Small parameterised circuits used by tests, benches and fuzzing.

use crate::aig::{Aig, AigLit};

/// One register toggling every step; bad when it is 1.
pub fn toggle() -> Aig {
    let mut aig = Aig::new();
    let r = aig.add_latch("r");
    set_next(&mut aig, r, !r);
    aig.set_bad(r);
    aig
}

/// `r' = r & i`: the register can never leave 0. Bad when it is 1.
pub fn stuck_at_zero() -> Aig {
    let mut aig = Aig::new();
    let i = aig.add_input("i");
    let r = aig.add_latch("r");
    let next = aig.and(r, i);
    set_next(&mut aig, r, next);
    aig.set_bad(r);
    aig
}

/// Free-running `bits`-wide binary counter, bad when it equals `target`.
pub fn counter(bits: usize, target: u64) -> Aig {
    let mut aig = Aig::new();
    let regs: Vec<AigLit> = (0..bits).map(|i| aig.add_latch(format!("b{i}"))).collect();
    let mut carry = AigLit::TRUE;
    for &r in &regs {
        let next = aig.xor(r, carry);
        set_next(&mut aig, r, next);
        carry = aig.and(r, carry);
    }
    let matches: Vec<AigLit> = regs
        .iter()
        .enumerate()
        .map(|(i, &r)| if target >> i & 1 == 1 { r } else { !r })
        .collect();
    let bad = aig.and_all(matches);
    aig.set_bad(bad);
    aig
}

/// Counter with an enable input that resets to 0 once it reaches `wrap`.
/// Bad when it equals `target`; unreachable whenever `target > wrap`.
pub fn wrapping_counter(bits: usize, wrap: u64, target: u64) -> Aig {
    let mut aig = Aig::new();
    let en = aig.add_input("en");
    let regs: Vec<AigLit> = (0..bits).map(|i| aig.add_latch(format!("b{i}"))).collect();
    let eq = |aig: &mut Aig, value: u64| {
        let lits: Vec<AigLit> = regs
            .iter()
            .enumerate()
            .map(|(i, &r)| if value >> i & 1 == 1 { r } else { !r })
            .collect();
        aig.and_all(lits)
    };
    let at_wrap = eq(&mut aig, wrap);
    let mut carry = en;
    for &r in &regs {
        let inc = aig.xor(r, carry);
        let next = aig.and(inc, !at_wrap);
        set_next(&mut aig, r, next);
        carry = aig.and(r, carry);
    }
    let bad = eq(&mut aig, target);
    aig.set_bad(bad);
    aig
}

/// `len` registers shifting an input bit along; bad when the last one is 1.
pub fn shift_register(len: usize) -> Aig {
    let mut aig = Aig::new();
    let i = aig.add_input("in");
    let regs: Vec<AigLit> = (0..len).map(|k| aig.add_latch(format!("s{k}"))).collect();
    let mut prev = i;
    for &r in &regs {
        set_next(&mut aig, r, prev);
        prev = r;
    }
    aig.set_bad(prev);
    aig
}

/// `len` stations passing a single token around a ring. Bad when two
/// stations hold a token at once.
pub fn token_ring(len: usize) -> Aig {
    assert!(len >= 2, "a ring needs at least two stations");
    let mut aig = Aig::new();
    // Station 0 holds the token in the initial state, encoded inverted.
    let regs: Vec<AigLit> = (0..len).map(|k| aig.add_latch(format!("t{k}"))).collect();
    let holds: Vec<AigLit> = regs
        .iter()
        .enumerate()
        .map(|(k, &r)| if k == 0 { !r } else { r })
        .collect();
    for k in 0..len {
        let from = holds[(k + len - 1) % len];
        let next = if k == 0 { !from } else { from };
        set_next(&mut aig, regs[k], next);
    }
    let mut bad = AigLit::FALSE;
    for a in 0..len {
        for b in a + 1..len {
            let both = aig.and(holds[a], holds[b]);
            bad = aig.or(bad, both);
        }
    }
    aig.set_bad(bad);
    aig
}

fn set_next(aig: &mut Aig, latch: AigLit, next: AigLit) {
    aig.set_next(latch, next)
        .unwrap_or_else(|e| unreachable!("library circuit is well formed: {e}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_bad_step(aig: &Aig, max: usize) -> Option<usize> {
        let mut state = aig.initial_state();
        let inputs = vec![true; aig.num_inputs()];
        for k in 0..max {
            let (next, bad) = aig.step(&state, &inputs);
            if bad {
                return Some(k);
            }
            state = next;
        }
        None
    }

    #[test]
    fn circuits_validate() {
        for aig in [toggle(), stuck_at_zero(), counter(3, 5), wrapping_counter(3, 4, 6), shift_register(4), token_ring(3)] {
            aig.validate().unwrap();
        }
    }

    #[test]
    fn counter_reaches_target_after_target_steps() {
        assert_eq!(first_bad_step(&counter(3, 5), 20), Some(5));
        assert_eq!(first_bad_step(&toggle(), 5), Some(1));
        assert_eq!(first_bad_step(&shift_register(3), 10), Some(3));
    }

    #[test]
    fn guarded_circuits_stay_safe_on_a_long_run() {
        assert_eq!(first_bad_step(&wrapping_counter(3, 4, 6), 50), None);
        assert_eq!(first_bad_step(&token_ring(4), 50), None);
        assert_eq!(first_bad_step(&stuck_at_zero(), 50), None);
    }
}
