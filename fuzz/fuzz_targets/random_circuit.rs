#![no_main]
use libfuzzer_sys::fuzz_target;
use pdr_soundness::{build, cross_check, Recipe};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let inputs = (data[0] % 3) as usize;
    let latches = 1 + (data[1] % 6) as usize;
    let bad = (data[2] as usize, data[3] & 1 == 1);
    let body = &data[4..];
    let nexts: Vec<(usize, bool)> = body
        .iter()
        .take(latches)
        .map(|&b| ((b >> 1) as usize, b & 1 == 1))
        .collect();
    let gates: Vec<(usize, bool, usize, bool)> = body
        .get(latches..)
        .unwrap_or_default()
        .chunks_exact(2)
        .take(24)
        .map(|c| ((c[0] >> 1) as usize, c[0] & 1 == 1, (c[1] >> 1) as usize, c[1] & 1 == 1))
        .collect();
    let recipe = Recipe { inputs, latches, gates, nexts, bad };
    let aig = build(&recipe);
    let config = pdr_core::PdrConfig {
        time_limit: Some(std::time::Duration::from_secs(2)),
        ..pdr_core::PdrConfig::default()
    };
    if let Err(e) = cross_check(&aig, &config) {
        if !e.starts_with("run aborted") {
            panic!("recipe {recipe:?}: {e}");
        }
    }
});
