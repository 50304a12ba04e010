//! Criterion benchmarks for the PDR engine.
//!
//! Run with: cargo bench -p pdr-core

use criterion::{criterion_group, criterion_main, Criterion};
use pdr_aig::{library, Aig};
use pdr_core::{check, PdrConfig};

fn bench_check(c: &mut Criterion, name: &str, aig: Aig, config: PdrConfig) {
    c.bench_function(name, |b| {
        b.iter(|| {
            let verdict = check(&aig, &config).unwrap();
            assert!(!verdict.is_aborted());
        })
    });
}

fn benchmarks(c: &mut Criterion) {
    let default = PdrConfig::default();

    let no_lifting = PdrConfig {
        use_ternary: false,
        ..Default::default()
    };

    let intersect = PdrConfig {
        use_intersection: true,
        ..Default::default()
    };

    // Proofs
    bench_check(c, "wrapping_counter_4b", library::wrapping_counter(4, 9, 12), default.clone());
    bench_check(c, "wrapping_counter_5b", library::wrapping_counter(5, 20, 27), default.clone());
    bench_check(c, "token_ring_6", library::token_ring(6), default.clone());
    bench_check(c, "wrapping_counter_5b_intersect", library::wrapping_counter(5, 20, 27), intersect);

    // Counterexamples
    bench_check(c, "counter_5b_to_21", library::counter(5, 21), default.clone());
    bench_check(c, "shift_register_12", library::shift_register(12), default);
    bench_check(c, "counter_5b_to_21_no_lifting", library::counter(5, 21), no_lifting);
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
