//! Sequential circuits as And-Inverter Graphs.
//!
//! An [`Aig`] is a transition system: primary inputs, registers (latches)
//! that all start at 0, two-input AND gates, and a single `bad` output that a
//! safety property requires to stay 0. [`Cnf`] turns the combinational part
//! into clauses for a [`pdr_sat::SatEngine`], and [`TernarySim`] evaluates it
//! over {0, 1, X} for cube lifting.

pub mod aig;
pub mod cnf;
pub mod library;
pub mod ternary;

pub use aig::{Aig, AigError, AigLit, AigNode, Latch};
pub use cnf::Cnf;
pub use ternary::{Ternary, TernarySim};
