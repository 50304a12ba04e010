use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a PDR run.
#[derive(Debug, Clone)]
pub struct PdrConfig {
    /// Conflict budget for each relative-induction query (blocking,
    /// generalization and pushing). Exceeding it aborts the run. Property
    /// queries at the top frame are not limited.
    pub conflict_limit: Option<u64>,
    /// Wall-clock budget for `run`.
    pub time_limit: Option<Duration>,
    /// Give up once this many frames exist.
    pub max_frames: Option<usize>,
    /// Priority added to a predecessor obligation over its parent.
    pub prio_shift: u32,
    /// Shrink blocked cubes to the literals in the solver's final conflict.
    pub use_core: bool,
    /// Lift predecessor states with ternary simulation.
    pub use_ternary: bool,
    /// Try intersecting blocked cubes with clauses of the previous frame
    /// before dropping literals one by one.
    pub use_intersection: bool,
    /// Drop literals from blocked cubes while they stay relatively inductive.
    pub generalize: bool,
    /// Rebuild a frame solver after this many activation literals.
    pub recycle_limit: usize,
    /// Check every verdict independently before returning it.
    pub verify_result: bool,
    /// Maintain the cube table and lineage tree.
    pub track_lineage: bool,
    /// Emit one info line per completed frame.
    pub verbose: bool,
    /// External cancellation flag, polled between solver calls.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for PdrConfig {
    fn default() -> Self {
        Self {
            conflict_limit: None,
            time_limit: None,
            max_frames: None,
            prio_shift: 1,
            use_core: true,
            use_ternary: true,
            use_intersection: false,
            generalize: true,
            recycle_limit: 300,
            verify_result: false,
            track_lineage: false,
            verbose: false,
            cancel: None,
        }
    }
}
