//! End-to-end runs of the PDR engine on small circuits.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use pdr_aig::{library, Aig, AigLit};
use pdr_core::certify::{check_counterexample, check_invariant};
use pdr_core::{check, AbortReason, Cube, CsvSink, PdrConfig, PdrError, Pdr, StatsSink, Verdict};
use pdr_sat::Cadical;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn run(aig: &Aig, config: PdrConfig) -> Verdict {
    init_tracing();
    check(aig, &config).expect("system is well formed")
}

fn expect_proved(aig: &Aig, config: PdrConfig) -> pdr_core::Invariant {
    match run(aig, config) {
        Verdict::Proved { invariant } => {
            check_invariant::<Cadical>(aig, &invariant).expect("invariant certifies");
            invariant
        }
        other => panic!("expected Proved, got: {other:?}"),
    }
}

fn expect_disproved(aig: &Aig, config: PdrConfig) -> pdr_core::Counterexample {
    match run(aig, config) {
        Verdict::Disproved { cex } => {
            check_counterexample(aig, &cex).expect("trace replays");
            cex
        }
        other => panic!("expected Disproved, got: {other:?}"),
    }
}

// =============================================================================
// Single-register systems
// =============================================================================

#[test]
fn toggling_register_is_caught_after_one_step() {
    let cex = expect_disproved(&library::toggle(), PdrConfig::default());
    assert_eq!(cex.len(), 1);
    assert!(cex.bad_inputs.is_empty());
}

#[test]
fn register_stuck_at_zero_is_proved() {
    let inv = expect_proved(&library::stuck_at_zero(), PdrConfig::default());
    assert_eq!(inv.len(), 1);
    assert_eq!(inv.patterns(), vec!["1".to_string()]);
    assert!(inv.holds(&[false]));
    assert!(!inv.holds(&[true]));
}

#[test]
fn constant_false_bad_needs_no_clauses() {
    let mut aig = Aig::new();
    let r = aig.add_latch("r");
    aig.set_next(r, !r).unwrap();
    aig.set_bad(AigLit::FALSE);
    let inv = expect_proved(&aig, PdrConfig::default());
    assert!(inv.is_empty());
}

#[test]
fn bad_initial_state_gives_empty_trace() {
    let mut aig = Aig::new();
    let i = aig.add_input("i");
    let r = aig.add_latch("r");
    aig.set_next(r, r).unwrap();
    let bad = aig.and(!r, i);
    aig.set_bad(bad);

    let cex = expect_disproved(&aig, PdrConfig::default());
    assert_eq!(cex.len(), 0);
    assert_eq!(cex.bad_inputs, vec![true]);
}

// =============================================================================
// Counters and shift registers
// =============================================================================

#[test]
fn two_bit_counter_reaches_three_in_three_steps() {
    let cex = expect_disproved(&library::counter(2, 3), PdrConfig::default());
    assert_eq!(cex.len(), 3);
}

#[test]
fn counterexamples_are_shortest() {
    assert_eq!(expect_disproved(&library::counter(4, 9), PdrConfig::default()).len(), 9);
    assert_eq!(expect_disproved(&library::shift_register(4), PdrConfig::default()).len(), 4);
}

#[test]
fn wrapping_counter_never_reaches_six() {
    let aig = library::wrapping_counter(3, 4, 6);
    let inv = expect_proved(&aig, PdrConfig::default());
    let mut state = aig.initial_state();
    for step in 0..20 {
        assert!(inv.holds(&state), "reachable state at step {step} violates the invariant");
        state = aig.step(&state, &[step % 3 != 0]).0;
    }
}

#[test]
fn token_ring_is_proved() {
    let inv = expect_proved(&library::token_ring(4), PdrConfig::default());
    assert!(!inv.is_empty());
}

// =============================================================================
// Configuration variants agree
// =============================================================================

fn variants() -> Vec<PdrConfig> {
    let base = PdrConfig { verify_result: true, ..PdrConfig::default() };
    vec![
        base.clone(),
        PdrConfig { use_core: false, ..base.clone() },
        PdrConfig { use_ternary: false, ..base.clone() },
        PdrConfig { generalize: false, ..base.clone() },
        PdrConfig { use_intersection: true, ..base.clone() },
        PdrConfig { recycle_limit: 2, ..base.clone() },
        PdrConfig { track_lineage: true, verbose: true, ..base },
    ]
}

#[test]
fn every_variant_reaches_the_same_verdicts() {
    for config in variants() {
        let label = format!("{config:?}");
        assert!(run(&library::wrapping_counter(3, 4, 6), config.clone()).is_proved(), "{label}");
        assert!(run(&library::token_ring(3), config.clone()).is_proved(), "{label}");
        match run(&library::counter(3, 5), config) {
            Verdict::Disproved { cex } => assert_eq!(cex.len(), 5, "{label}"),
            other => panic!("expected Disproved with {label}, got: {other:?}"),
        }
    }
}

#[test]
fn runs_are_deterministic() {
    let aig = library::wrapping_counter(4, 9, 12);
    let a = expect_proved(&aig, PdrConfig::default());
    let b = expect_proved(&aig, PdrConfig::default());
    assert_eq!(a.dump(), b.dump());
}

#[test]
fn lineage_does_not_change_results() {
    let aig = library::token_ring(4);
    let plain = expect_proved(&aig, PdrConfig::default());
    let tracked = expect_proved(&aig, PdrConfig { track_lineage: true, ..PdrConfig::default() });
    assert_eq!(plain.dump(), tracked.dump());
}

// =============================================================================
// Resource limits
// =============================================================================

#[test]
fn zero_conflict_budget_aborts_on_first_blocking_query() {
    init_tracing();
    let aig = library::counter(3, 6);
    let config = PdrConfig { conflict_limit: Some(0), ..PdrConfig::default() };
    let mut pdr = Pdr::<Cadical>::start(&aig, config, None).unwrap();
    match pdr.run() {
        Verdict::Aborted { reason, frames } => {
            assert_eq!(reason, AbortReason::ConflictLimit { frame: 0 });
            assert_eq!(frames, 2);
        }
        other => panic!("expected Aborted, got: {other:?}"),
    }
    assert_eq!(pdr.num_frames(), 2);
    let stats = pdr.stop();
    assert_eq!(stats.sat_calls_unknown, 1);
}

#[test]
fn zero_conflict_budget_on_two_bit_counter() {
    let aig = library::counter(2, 3);
    let config = PdrConfig { conflict_limit: Some(0), ..PdrConfig::default() };
    let mut pdr = Pdr::<Cadical>::start(&aig, config, None).unwrap();
    assert!(matches!(
        pdr.run(),
        Verdict::Aborted { reason: AbortReason::ConflictLimit { frame: 0 }, frames: 2 }
    ));
    // Partial frames stay readable after the abort.
    assert_eq!(pdr.num_frames(), 2);
    assert_eq!(pdr.stop().sat_calls_unknown, 1);
}

#[test]
fn elapsed_deadline_aborts() {
    let config = PdrConfig { time_limit: Some(Duration::ZERO), ..PdrConfig::default() };
    match run(&library::counter(4, 15), config) {
        Verdict::Aborted { reason, .. } => assert_eq!(reason, AbortReason::Timeout),
        other => panic!("expected Aborted, got: {other:?}"),
    }
}

#[test]
fn cancellation_flag_aborts() {
    let flag = Arc::new(AtomicBool::new(true));
    let config = PdrConfig { cancel: Some(flag), ..PdrConfig::default() };
    match run(&library::counter(4, 15), config) {
        Verdict::Aborted { reason, .. } => assert_eq!(reason, AbortReason::Cancelled),
        other => panic!("expected Aborted, got: {other:?}"),
    }
}

#[test]
fn frame_limit_aborts_and_keeps_frames() {
    init_tracing();
    let config = PdrConfig { max_frames: Some(3), ..PdrConfig::default() };
    let mut pdr = Pdr::<Cadical>::start(&library::counter(4, 15), config, None).unwrap();
    let verdict = pdr.run();
    assert!(matches!(verdict, Verdict::Aborted { reason: AbortReason::FrameLimit { frames: 3 }, .. }));
    assert_eq!(pdr.num_frames(), 3);
    assert!((1..3).any(|level| !pdr.cubes(level).is_empty()));
    // A finished handle reports the same verdict again.
    assert!(matches!(pdr.run(), Verdict::Aborted { .. }));
}

// =============================================================================
// Start-up validation and priorities
// =============================================================================

#[test]
fn malformed_system_is_rejected() {
    let mut aig = Aig::new();
    aig.add_latch("r");
    assert!(matches!(
        Pdr::<Cadical>::start(&aig, PdrConfig::default(), None),
        Err(PdrError::System(_))
    ));
}

#[test]
fn priority_hints_must_cover_every_register() {
    let aig = library::counter(3, 6);
    assert!(matches!(
        Pdr::<Cadical>::start(&aig, PdrConfig::default(), Some(&[1, 2])),
        Err(PdrError::PriorityHints { expected: 3, found: 2 })
    ));
}

#[test]
fn priorities_grow_with_derived_clauses() {
    let aig = library::token_ring(3);
    let mut pdr = Pdr::<Cadical>::start(&aig, PdrConfig::default(), Some(&[5, 0, 0])).unwrap();
    assert!(pdr.run().is_proved());
    assert!(pdr.priorities()[0] >= 5);
    assert!(pdr.priorities().iter().sum::<u32>() > 5);
}

#[test]
fn saturated_priority_hints_still_prove() {
    let aig = library::wrapping_counter(3, 4, 6);
    let mut pdr = Pdr::<Cadical>::start(&aig, PdrConfig::default(), Some(&[u32::MAX; 3])).unwrap();
    assert!(pdr.run().is_proved());
    assert!(pdr.priorities().iter().all(|&p| p == u32::MAX));
}

#[test]
fn saturated_priority_shift_still_finds_trace() {
    let config = PdrConfig { prio_shift: u32::MAX, ..PdrConfig::default() };
    match run(&library::counter(3, 6), config) {
        Verdict::Disproved { cex } => assert_eq!(cex.len(), 6),
        other => panic!("expected Disproved, got: {other:?}"),
    }
}

// =============================================================================
// Statistics sinks
// =============================================================================

#[derive(Default)]
struct Events {
    obligations: Vec<(usize, usize)>,
    cubes: Vec<usize>,
}

struct Recording(Rc<RefCell<Events>>);

impl StatsSink for Recording {
    fn obligation_derived(&mut self, frame: usize, _: &Cube, depth: usize) -> io::Result<()> {
        self.0.borrow_mut().obligations.push((frame, depth));
        Ok(())
    }

    fn cube_derived(&mut self, level: usize, _: &Cube) -> io::Result<()> {
        self.0.borrow_mut().cubes.push(level);
        Ok(())
    }
}

struct Broken {
    calls: Rc<RefCell<usize>>,
}

impl StatsSink for Broken {
    fn obligation_derived(&mut self, _: usize, _: &Cube, _: usize) -> io::Result<()> {
        *self.calls.borrow_mut() += 1;
        Err(io::Error::other("disk full"))
    }

    fn cube_derived(&mut self, _: usize, _: &Cube) -> io::Result<()> {
        *self.calls.borrow_mut() += 1;
        Err(io::Error::other("disk full"))
    }
}

#[test]
fn sink_sees_obligations_and_cubes() {
    init_tracing();
    let events = Rc::new(RefCell::new(Events::default()));
    let aig = library::wrapping_counter(3, 4, 6);
    let mut pdr =
        Pdr::<Cadical>::with_sink(&aig, PdrConfig::default(), None, Box::new(Recording(events.clone()))).unwrap();
    assert!(pdr.run().is_proved());
    let stats = pdr.stop();
    let events = events.borrow();
    assert_eq!(events.cubes.len() as u64, stats.cubes);
    assert_eq!(events.obligations.len() as u64, stats.blocks + stats.obligations);
    assert!(events.obligations.iter().all(|&(frame, _)| frame >= 1));
}

#[test]
fn failing_sink_is_disabled_and_run_continues() {
    init_tracing();
    let calls = Rc::new(RefCell::new(0));
    let aig = library::wrapping_counter(3, 4, 6);
    let sink = Box::new(Broken { calls: calls.clone() });
    let mut pdr = Pdr::<Cadical>::with_sink(&aig, PdrConfig::default(), None, sink).unwrap();
    assert!(pdr.run().is_proved());
    assert_eq!(*calls.borrow(), 1);
}

#[test]
fn csv_sink_writes_rows() {
    let aig = library::counter(2, 3);
    let sink = CsvSink::new(Vec::new(), aig.num_latches()).unwrap();
    let mut pdr = Pdr::<Cadical>::with_sink(&aig, PdrConfig::default(), None, Box::new(sink)).unwrap();
    assert!(pdr.run().is_disproved());
    assert!(pdr.stats().blocks >= 1);
}
