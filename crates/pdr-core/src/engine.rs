//! The induction driver.
//!
//! Each outer iteration asks whether the top frame intersects the bad
//! states. A satisfying assignment is lifted to a bad cube and blocked
//! recursively through the obligation queue; an unsatisfiable answer opens
//! a new frame and pushes clauses forward until some delta level empties.

use std::io;
use std::sync::atomic::Ordering as AtomicOrdering;
use std::time::{Duration, Instant};

use pdr_aig::{Aig, Cnf};
use pdr_sat::{Cadical, SatEngine};
use tracing::{debug, info, trace, warn};

use crate::certify;
use crate::config::PdrConfig;
use crate::cube::{Cube, Lit};
use crate::frames::{Answer, FrameDb};
use crate::invariant::Invariant;
use crate::lift::Lifter;
use crate::lineage::{CubeTable, LineageTree};
use crate::obligation::{Obligation, ObligationQueue};
use crate::stats::{NullSink, PdrStats, StatsSink};
use crate::trace::Counterexample;
use crate::{AbortReason, PdrError, PdrResult, Verdict};

pub struct Pdr<S: SatEngine + Default = Cadical> {
    pub(crate) aig: Aig,
    pub(crate) config: PdrConfig,
    pub(crate) frames: FrameDb<S>,
    pub(crate) prio: Vec<u32>,
    pub(crate) stats: PdrStats,
    queue: ObligationQueue,
    lifter: Lifter,
    sink: Box<dyn StatsSink>,
    sink_failed: bool,
    table: CubeTable,
    lineage: LineageTree,
    deadline: Option<Instant>,
    verdict: Option<Verdict>,
}

impl<S: SatEngine + Default> Pdr<S> {
    /// Validate the system and set up a run. `prio_hints`, when given,
    /// seeds one priority per register; low-priority registers are dropped
    /// first during generalization.
    pub fn start(system: &Aig, config: PdrConfig, prio_hints: Option<&[u32]>) -> PdrResult<Self> {
        Self::with_sink(system, config, prio_hints, Box::new(NullSink))
    }

    pub fn with_sink(
        system: &Aig,
        config: PdrConfig,
        prio_hints: Option<&[u32]>,
        sink: Box<dyn StatsSink>,
    ) -> PdrResult<Self> {
        system.validate()?;
        let num_regs = system.num_latches();
        let prio = match prio_hints {
            Some(h) if h.len() != num_regs => {
                return Err(PdrError::PriorityHints { expected: num_regs, found: h.len() })
            }
            Some(h) => h.to_vec(),
            None => vec![0; num_regs],
        };
        info!(
            inputs = system.num_inputs(),
            registers = num_regs,
            ands = system.num_ands(),
            "starting PDR"
        );
        Ok(Self {
            aig: system.clone(),
            frames: FrameDb::new(Cnf::new(system)),
            prio,
            stats: PdrStats::default(),
            queue: ObligationQueue::new(),
            lifter: Lifter::new(config.use_ternary),
            sink,
            sink_failed: false,
            table: CubeTable::default(),
            lineage: LineageTree::default(),
            deadline: None,
            verdict: None,
            config,
        })
    }

    /// Run to a verdict. A finished run returns its verdict again.
    pub fn run(&mut self) -> Verdict {
        if let Some(verdict) = &self.verdict {
            return verdict.clone();
        }
        let started = Instant::now();
        self.deadline = self.config.time_limit.map(|limit| started + limit);

        let verdict = self.solve();

        self.stats.time_total += started.elapsed();
        self.stats.frames = self.frames.len();
        self.stats.queue_high_water = self.queue.high_water();
        self.stats.ternary_runs = self.lifter.runs();
        self.stats.ternary_lits_removed = self.lifter.lits_removed();
        if let Err(e) = self.sink.flush() {
            self.sink_error(e);
        }

        match &verdict {
            Verdict::Proved { invariant } => {
                info!(frames = self.frames.len(), clauses = invariant.len(), "property proved")
            }
            Verdict::Disproved { cex } => info!(length = cex.len(), "property disproved"),
            Verdict::Aborted { reason, frames } => info!(%reason, frames, "run aborted"),
        }
        if self.config.verify_result {
            if let Err(e) = certify::certify::<S>(&self.aig, &verdict) {
                panic!("PDR verdict failed independent checking: {e}");
            }
            debug!("verdict certified");
        }
        self.verdict = Some(verdict.clone());
        verdict
    }

    /// Finish the run and hand back its statistics.
    pub fn stop(self) -> PdrStats {
        debug!(stats = %self.stats, "PDR stopped");
        self.stats
    }

    pub fn stats(&self) -> &PdrStats {
        &self.stats
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Delta cubes at `level`. Readable after an abort.
    pub fn cubes(&self, level: usize) -> &[Cube] {
        self.frames.cubes(level)
    }

    pub fn priorities(&self) -> &[u32] {
        &self.prio
    }

    pub fn cube_table(&self) -> &CubeTable {
        &self.table
    }

    pub fn lineage(&self) -> &LineageTree {
        &self.lineage
    }

    fn solve(&mut self) -> Verdict {
        if self.frames.is_empty() {
            self.frames.push_frame();
        }
        loop {
            if let Err(reason) = self.check_interrupt() {
                return self.abort(reason);
            }
            let k = self.frames.top();
            let answer = match self.query_bad(k) {
                Ok(answer) => answer,
                Err(reason) => return self.abort(reason),
            };
            match answer {
                Answer::Sat(assignment) => {
                    let order = self.register_order();
                    let cube = self.lifter.bad_cube(&self.aig, &assignment, &order);
                    self.stats.blocks += 1;
                    if k == 0 || cube.is_initial(None) {
                        let obl = Obligation::new(k, 0, cube, None);
                        return self.disproved(&obl);
                    }
                    match self.block_cube(cube) {
                        Ok(None) => {}
                        Ok(Some(first)) => return self.disproved(&first),
                        Err(reason) => return self.abort(reason),
                    }
                }
                Answer::Unsat(_) => {
                    if self.config.verbose {
                        info!(frame = k, cubes = ?self.frames.counts(), obligations = self.stats.obligations, "frame complete");
                    }
                    if self.config.max_frames.is_some_and(|max| self.frames.len() >= max) {
                        return self.abort(AbortReason::FrameLimit { frames: self.frames.len() });
                    }
                    self.frames.push_frame();
                    debug!(frame = k + 1, "opened frame");
                    let started = Instant::now();
                    let pushed = self.push_clauses();
                    self.stats.time_push += started.elapsed();
                    match pushed {
                        Ok(Some(level)) => return self.proved(level),
                        Ok(None) => {}
                        Err(reason) => return self.abort(reason),
                    }
                }
            }
        }
    }

    /// Block `cube` at the top frame. Returns the obligation whose cube
    /// holds an initial state when the cube turns out to be reachable.
    fn block_cube(&mut self, cube: Cube) -> Result<Option<Obligation>, AbortReason> {
        let top = self.frames.top();
        let root = Obligation::new(top, 0, cube, None);
        self.note_obligation(&root);
        self.queue.push(root);

        while let Some(obl) = self.queue.pop() {
            self.check_interrupt()?;
            let k = obl.frame();
            debug_assert!(k > 0);
            if self.frames.is_blocked(k, obl.cube()) {
                trace!(frame = k, cube = %obl.cube(), "already blocked");
                continue;
            }
            match self.query_relative(k - 1, obl.cube(), true)? {
                Answer::Unsat(core) => {
                    let started = Instant::now();
                    let generalized = self.generalize(k, obl.cube(), &core);
                    self.stats.time_generalize += started.elapsed();
                    let cube = generalized?;
                    let level = self.push_level(k, &cube, top)?;
                    self.store_cube(level, cube);
                }
                Answer::Sat(assignment) => {
                    let order = self.register_order();
                    let pred = self.lifter.predecessor(&self.aig, &assignment, obl.cube(), &order);
                    let prio = obl.prio().saturating_add(self.config.prio_shift);
                    let pred = Obligation::new(k - 1, prio, pred, Some(obl.clone()));
                    self.stats.obligations += 1;
                    self.note_obligation(&pred);
                    if k == 1 || pred.cube().is_initial(None) {
                        self.queue.clear();
                        return Ok(Some(pred));
                    }
                    self.queue.push(obl);
                    self.queue.push(pred);
                }
            }
        }
        Ok(None)
    }

    /// Highest level `<= top` at which `cube` is still blocked, starting
    /// from `level`.
    fn push_level(&mut self, mut level: usize, cube: &Cube, top: usize) -> Result<usize, AbortReason> {
        while level < top {
            match self.query_relative(level, cube, true)? {
                Answer::Unsat(_) => level += 1,
                Answer::Sat(_) => break,
            }
        }
        Ok(level)
    }

    fn store_cube(&mut self, level: usize, cube: Cube) {
        trace!(level, cube = %cube, "blocked");
        if !self.frames.add_cube(level, cube.clone()) {
            return;
        }
        self.stats.cubes += 1;
        for l in cube.lits() {
            let p = &mut self.prio[l.var()];
            *p = p.saturating_add(1);
        }
        self.emit(|sink| sink.cube_derived(level, &cube));
    }

    fn note_obligation(&mut self, obl: &Obligation) {
        let depth = obl.depth();
        let frame = obl.frame();
        self.emit(|sink| sink.obligation_derived(frame, obl.cube(), depth));
        if self.config.track_lineage {
            self.table.update(obl.cube());
            self.lineage.insert(obl.cube(), obl.next().map(Obligation::cube));
        }
    }

    /// Push every delta cube as far as it goes. Returns the first level
    /// whose delta ends up empty.
    fn push_clauses(&mut self) -> Result<Option<usize>, AbortReason> {
        let top = self.frames.top();
        for level in 1..top {
            let mut cubes = self.frames.take_level(level);
            cubes.sort_by(Cube::compare);
            let mut kept = Vec::new();
            let mut pending = cubes.into_iter();
            while let Some(cube) = pending.next() {
                if self.frames.is_blocked(level + 1, &cube) {
                    continue;
                }
                match self.query_relative(level, &cube, false) {
                    Ok(Answer::Unsat(_)) => self.frames.promote(level, cube),
                    Ok(Answer::Sat(_)) => kept.push(cube),
                    Err(reason) => {
                        kept.push(cube);
                        kept.extend(pending);
                        self.frames.restore_level(level, kept);
                        return Err(reason);
                    }
                }
            }
            let emptied = kept.is_empty();
            self.frames.restore_level(level, kept);
            if emptied {
                return Ok(Some(level));
            }
        }
        Ok(None)
    }

    fn query_bad(&mut self, k: usize) -> Result<Answer, AbortReason> {
        self.check_interrupt()?;
        let started = Instant::now();
        let answer = self.frames.query_bad(k, None);
        self.stats.record_call(answer.as_ref(), started.elapsed());
        let answer = answer.ok_or(AbortReason::ConflictLimit { frame: k })?;
        self.check_interrupt()?;
        Ok(answer)
    }

    pub(crate) fn query_relative(&mut self, k: usize, cube: &Cube, negate: bool) -> Result<Answer, AbortReason> {
        self.check_interrupt()?;
        if self.frames.activations(k) >= self.config.recycle_limit {
            self.frames.recycle(k);
            self.stats.solver_restarts += 1;
        }
        let started = Instant::now();
        let answer = self.frames.query_relative(k, cube, negate, self.config.conflict_limit);
        self.stats.record_call(answer.as_ref(), started.elapsed());
        let answer = answer.ok_or(AbortReason::ConflictLimit { frame: k })?;
        self.check_interrupt()?;
        Ok(answer)
    }

    fn check_interrupt(&self) -> Result<(), AbortReason> {
        if self
            .config
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(AtomicOrdering::Relaxed))
        {
            return Err(AbortReason::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(AbortReason::Timeout);
        }
        Ok(())
    }

    /// Registers by ascending priority, ties by index.
    pub(crate) fn register_order(&self) -> Vec<usize> {
        let mut regs: Vec<usize> = (0..self.prio.len()).collect();
        regs.sort_by_key(|&r| (self.prio[r], r));
        regs
    }

    fn proved(&mut self, level: usize) -> Verdict {
        let cubes: Vec<Cube> = self.frames.cubes_from(level + 1).cloned().collect();
        Verdict::Proved { invariant: Invariant::new(cubes, self.aig.num_latches(), level) }
    }

    fn disproved(&mut self, first: &Obligation) -> Verdict {
        self.queue.clear();
        Verdict::Disproved { cex: Counterexample::from_chain(first, self.aig.num_inputs()) }
    }

    fn abort(&mut self, reason: AbortReason) -> Verdict {
        self.queue.clear();
        Verdict::Aborted { reason, frames: self.frames.len() }
    }

    fn emit(&mut self, event: impl FnOnce(&mut dyn StatsSink) -> io::Result<()>) {
        if self.sink_failed {
            return;
        }
        if let Err(e) = event(self.sink.as_mut()) {
            self.sink_error(e);
        }
    }

    fn sink_error(&mut self, e: io::Error) {
        if !self.sink_failed {
            warn!(error = %e, "statistics sink failed; disabling it");
            self.sink_failed = true;
        }
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }
}

/// Prove or refute `system`'s safety property with the default solver.
pub fn check(system: &Aig, config: &PdrConfig) -> PdrResult<Verdict> {
    let mut pdr = Pdr::<Cadical>::start(system, config.clone(), None)?;
    let verdict = pdr.run();
    pdr.stop();
    Ok(verdict)
}

pub(crate) fn literal_order(prio: &[u32], lits: &[Lit]) -> Vec<usize> {
    let mut positions: Vec<usize> = (0..lits.len()).collect();
    positions.sort_by_key(|&i| (prio[lits[i].var()], lits[i]));
    positions
}
