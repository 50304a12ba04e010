#![no_main]
use std::collections::{BTreeMap, HashSet};

use libfuzzer_sys::fuzz_target;
use pdr_core::{Cube, Lit};

fn cube_from(bytes: &[u8]) -> Cube {
    let lits: BTreeMap<usize, bool> = bytes.iter().map(|&b| ((b >> 1) as usize % 40, b & 1 == 1)).collect();
    Cube::new(lits.into_iter().map(|(v, b)| Lit::new(v, b)).collect(), &[])
}

fuzz_target!(|data: &[u8]| {
    let split = data.first().map_or(0, |&b| b as usize % (data.len().max(1)));
    let (left, right) = data.split_at(split);
    let a = cube_from(left);
    let b = cube_from(right);

    let naive = b.lits().iter().all(|l| a.lits().contains(l));
    assert_eq!(a.contains(&b), naive);
    assert_eq!(Cube::contains_loose(a.lits(), b.lits()), naive);
    if naive {
        assert_eq!(a.signature() & b.signature(), b.signature());
    }

    let common = Cube::intersect(&a, &b, &HashSet::new()).unwrap();
    assert!(a.contains(&common) && b.contains(&common));
    assert_eq!(Cube::compare(&a, &b), Cube::compare(&b, &a).reverse());

    if !a.is_empty() {
        let shorter = a.create_from(0);
        assert!(shorter.len() + 1 == a.len() && shorter.contains(&shorter));
        assert!(a.contains(&shorter));
    }
});
