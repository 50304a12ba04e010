//! Property-directed reachability (IC3) for safety properties of
//! And-Inverter Graph transition systems.
//!
//! Given a system whose registers start at 0 and a `bad` output, [`check`]
//! (or a [`Pdr`] handle for finer control) returns one of:
//! - [`Verdict::Proved`] with an inductive [`Invariant`],
//! - [`Verdict::Disproved`] with a replayable [`Counterexample`],
//! - [`Verdict::Aborted`] when a resource limit or cancellation fires.
//!
//! Frames are delta-encoded (each blocked cube lives at the highest level
//! where its clause is known to hold) and each frame keeps its own
//! incremental solver behind the [`pdr_sat::SatEngine`] trait.

pub mod certify;
pub mod config;
pub mod cube;
pub mod engine;
pub mod frames;
mod generalize;
pub mod invariant;
pub mod lift;
pub mod lineage;
pub mod obligation;
pub mod stats;
pub mod trace;

use std::fmt;

use thiserror::Error;

pub use certify::CertifyError;
pub use config::PdrConfig;
pub use cube::{Cube, Lit};
pub use engine::{check, Pdr};
pub use invariant::Invariant;
pub use lineage::{CubeTable, LineageTree};
pub use obligation::{Obligation, ObligationQueue};
pub use stats::{CsvSink, NullSink, PdrStats, StatsSink};
pub use trace::Counterexample;

#[derive(Debug, Error)]
pub enum PdrError {
    #[error("malformed system: {0}")]
    System(#[from] pdr_aig::AigError),

    #[error("expected {expected} register priorities, got {found}")]
    PriorityHints { expected: usize, found: usize },
}

pub type PdrResult<T> = Result<T, PdrError>;

/// Why a run stopped without a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// A relative-induction query exceeded the conflict budget.
    ConflictLimit { frame: usize },
    Timeout,
    FrameLimit { frames: usize },
    Cancelled,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::ConflictLimit { frame } => write!(f, "conflict limit reached in frame {frame}"),
            AbortReason::Timeout => write!(f, "time limit reached"),
            AbortReason::FrameLimit { frames } => write!(f, "frame limit of {frames} reached"),
            AbortReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Verdict {
    Proved { invariant: Invariant },
    Disproved { cex: Counterexample },
    Aborted { reason: AbortReason, frames: usize },
}

impl Verdict {
    pub fn is_proved(&self) -> bool {
        matches!(self, Verdict::Proved { .. })
    }

    pub fn is_disproved(&self) -> bool {
        matches!(self, Verdict::Disproved { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Verdict::Aborted { .. })
    }
}
