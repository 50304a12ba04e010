use std::fmt;
use std::ops::Not;

/// Solver variable, numbered from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(u32);

impl Var {
    pub fn new(index: usize) -> Self {
        assert!(index < i32::MAX as usize, "variable index {index} out of range");
        Var(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn lit(self, negated: bool) -> Lit {
        Lit::new(self, negated)
    }

    pub fn pos(self) -> Lit {
        Lit::new(self, false)
    }

    pub fn neg(self) -> Lit {
        Lit::new(self, true)
    }
}

/// Solver literal: `2 * var + negated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit(u32);

impl Lit {
    pub fn new(var: Var, negated: bool) -> Self {
        Lit(var.0 << 1 | negated as u32)
    }

    pub fn var(self) -> Var {
        Var(self.0 >> 1)
    }

    pub fn is_negated(self) -> bool {
        self.0 & 1 == 1
    }

    /// Dense index, suitable for per-literal tables.
    pub fn code(self) -> usize {
        self.0 as usize
    }

    /// DIMACS integer: variables are one-based, negation is a minus sign.
    pub fn to_dimacs(self) -> i32 {
        let v = self.var().index() as i32 + 1;
        if self.is_negated() {
            -v
        } else {
            v
        }
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit(self.0 ^ 1)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}
