//! Cubes: shared, immutable conjunctions of register literals.
//!
//! A cube stores a sorted, duplicate-free prefix of state literals followed by
//! an unsorted suffix of input literals. Only the state prefix takes part in
//! equality, comparison, containment and signatures; the input suffix
//! travels with obligation cubes so a counterexample can be rebuilt.
//!
//! Literal encoding is `2 * register + c` where `c = 1` means the register is
//! 0. The all-zero initial state therefore satisfies a cube exactly when every
//! literal is complemented.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Not;
use std::rc::Rc;

/// Cubes are limited to fewer than 2^30 literals.
const MAX_LITS: usize = 1 << 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit(u32);

impl Lit {
    /// Tombstone marking a dropped slot in a scratch literal array. Sorts
    /// after every real literal.
    pub const UNDEF: Lit = Lit(u32::MAX);

    /// Literal asserting that `var` (register or input index) equals `value`.
    pub fn new(var: usize, value: bool) -> Self {
        assert!(var < MAX_LITS, "variable index {var} out of range");
        Lit((var as u32) << 1 | (!value) as u32)
    }

    pub fn from_code(code: u32) -> Self {
        Lit(code)
    }

    pub fn code(self) -> u32 {
        self.0
    }

    pub fn var(self) -> usize {
        (self.0 >> 1) as usize
    }

    /// True when the literal asserts the register is 0.
    pub fn is_compl(self) -> bool {
        self.0 & 1 == 1
    }

    pub fn value(self) -> bool {
        !self.is_compl()
    }

    pub fn is_undef(self) -> bool {
        self == Lit::UNDEF
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        debug_assert!(!self.is_undef());
        Lit(self.0 ^ 1)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_undef() {
            write!(f, "_")
        } else if self.is_compl() {
            write!(f, "!{}", self.var())
        } else {
            write!(f, "{}", self.var())
        }
    }
}

fn signature(lits: &[Lit]) -> u64 {
    lits.iter()
        .filter(|l| !l.is_undef())
        .fold(0, |sign, l| sign | 1 << (l.code() % 63))
}

fn assert_sorted_unique(lits: &[Lit]) {
    assert!(
        lits.windows(2).all(|w| w[0] < w[1]),
        "cube state literals must be unique"
    );
    assert!(!lits.contains(&Lit::UNDEF), "tombstone literal in cube constructor");
}

struct CubeData {
    sign: u64,
    n_lits: usize,
    lits: Box<[Lit]>,
}

/// Reference-counted cube. `Clone` takes a reference; dropping releases it.
#[derive(Clone)]
pub struct Cube(Rc<CubeData>);

impl Cube {
    fn from_parts(state: Vec<Lit>, inputs: &[Lit]) -> Self {
        assert!(state.len() + inputs.len() < MAX_LITS, "cube too large");
        let sign = signature(&state);
        let n_lits = state.len();
        let mut lits = state;
        lits.extend_from_slice(inputs);
        Cube(Rc::new(CubeData { sign, n_lits, lits: lits.into_boxed_slice() }))
    }

    /// Build a cube from state literals (any order) and input literals.
    pub fn new(mut state: Vec<Lit>, inputs: &[Lit]) -> Self {
        state.sort_unstable();
        assert_sorted_unique(&state);
        Self::from_parts(state, inputs)
    }

    /// Copy without the state literal at position `remove`. The input
    /// suffix is dropped.
    pub fn create_from(&self, remove: usize) -> Cube {
        assert!(remove < self.len(), "literal index {remove} out of range");
        let state: Vec<Lit> = self
            .lits()
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != remove)
            .map(|(_, &l)| l)
            .collect();
        Self::from_parts(state, &[])
    }

    /// Cube over `lits`, which must be a subset of this cube's state
    /// literals. The input suffix is kept.
    pub fn create_subset(&self, lits: &[Lit]) -> Cube {
        assert!(lits.len() <= self.len(), "subset larger than the cube");
        let mut state = lits.to_vec();
        state.sort_unstable();
        assert_sorted_unique(&state);
        debug_assert!(state.iter().all(|l| self.lits().binary_search(l).is_ok()));
        Self::from_parts(state, self.input_lits())
    }

    /// Deep copy with its own reference count.
    pub fn dup(&self) -> Cube {
        Cube(Rc::new(CubeData {
            sign: self.0.sign,
            n_lits: self.0.n_lits,
            lits: self.0.lits.clone(),
        }))
    }

    /// Literals common to both cubes, or `None` when a literal of `keep`
    /// would be dropped from either side.
    pub fn intersect(a: &Cube, b: &Cube, keep: &HashSet<Lit>) -> Option<Cube> {
        let (p, q) = (a.lits(), b.lits());
        let mut common = Vec::with_capacity(p.len().min(q.len()));
        let (mut i, mut j) = (0, 0);
        while i < p.len() && j < q.len() {
            match p[i].cmp(&q[j]) {
                Ordering::Equal => {
                    common.push(p[i]);
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    if keep.contains(&p[i]) {
                        return None;
                    }
                    i += 1;
                }
                Ordering::Greater => {
                    if keep.contains(&q[j]) {
                        return None;
                    }
                    j += 1;
                }
            }
        }
        if p[i..].iter().chain(&q[j..]).any(|l| keep.contains(l)) {
            return None;
        }
        Some(Self::from_parts(common, &[]))
    }

    /// Whether every state literal of `other` occurs in `self`, i.e. `self`
    /// describes a subset of the states `other` describes.
    pub fn contains(&self, other: &Cube) -> bool {
        let (old, new) = (self.lits(), other.lits());
        if old.len() < new.len() || self.0.sign & other.0.sign != other.0.sign {
            return false;
        }
        let mut i = 0;
        for &l in new {
            while i < old.len() && old[i] < l {
                i += 1;
            }
            if i == old.len() || old[i] != l {
                return false;
            }
            i += 1;
        }
        true
    }

    /// [`contains`](Cube::contains) over raw sorted literal slices, ignoring
    /// [`Lit::UNDEF`] tombstones on both sides.
    pub fn contains_loose(old: &[Lit], new: &[Lit]) -> bool {
        let mut rest = old.iter().copied().filter(|l| !l.is_undef());
        'next: for l in new.iter().copied().filter(|l| !l.is_undef()) {
            for o in rest.by_ref() {
                match o.cmp(&l) {
                    Ordering::Equal => continue 'next,
                    Ordering::Greater => return false,
                    Ordering::Less => {}
                }
            }
            return false;
        }
        true
    }

    /// Deterministic total order over state literals: at the first
    /// differing position the larger literal sorts first; a proper prefix
    /// sorts first.
    pub fn compare(a: &Cube, b: &Cube) -> Ordering {
        for (x, y) in a.lits().iter().zip(b.lits()) {
            match x.cmp(y) {
                Ordering::Greater => return Ordering::Less,
                Ordering::Less => return Ordering::Greater,
                Ordering::Equal => {}
            }
        }
        a.len().cmp(&b.len())
    }

    /// Whether the all-zero initial state satisfies the cube, optionally
    /// ignoring the literal at position `ignore`.
    pub fn is_initial(&self, ignore: Option<usize>) -> bool {
        self.lits()
            .iter()
            .enumerate()
            .all(|(i, l)| Some(i) == ignore || l.is_compl())
    }

    pub fn refs(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn ptr_eq(a: &Cube, b: &Cube) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Number of state literals.
    pub fn len(&self) -> usize {
        self.0.n_lits
    }

    pub fn is_empty(&self) -> bool {
        self.0.n_lits == 0
    }

    pub fn lits(&self) -> &[Lit] {
        &self.0.lits[..self.0.n_lits]
    }

    pub fn input_lits(&self) -> &[Lit] {
        &self.0.lits[self.0.n_lits..]
    }

    pub fn signature(&self) -> u64 {
        self.0.sign
    }

    /// Register pattern such as `1-0`: one character per register.
    pub fn pattern(&self, num_regs: usize) -> String {
        let mut chars = vec![b'-'; num_regs];
        for l in self.lits() {
            assert!(l.var() < num_regs, "register {} out of range", l.var());
            chars[l.var()] = if l.is_compl() { b'0' } else { b'1' };
        }
        String::from_utf8(chars).unwrap_or_default()
    }
}

/// Equality and hashing look at the state literals only, like
/// [`Cube::compare`] and the lineage tables. The input suffix is witness
/// data for counterexamples, not part of the state set.
impl PartialEq for Cube {
    fn eq(&self, other: &Self) -> bool {
        self.lits() == other.lits()
    }
}

impl Eq for Cube {}

impl Hash for Cube {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lits().hash(state);
    }
}

impl fmt::Debug for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cube[")?;
        for (i, l) in self.lits().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{l}")?;
        }
        if !self.input_lits().is_empty() {
            write!(f, " |")?;
            for l in self.input_lits() {
                write!(f, " {l}")?;
            }
        }
        write!(f, "]")
    }
}

impl fmt::Display for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lits: Vec<String> = self.lits().iter().map(Lit::to_string).collect();
        write!(f, "{{{}}}", lits.join(" "))
    }
}
