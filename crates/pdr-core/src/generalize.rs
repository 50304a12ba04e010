//! Shrinking blocked cubes into stronger clauses.
//!
//! Three stages run on a cube `c` that was just shown blocked at frame `k`:
//! core reduction keeps the literals from the solver's final conflict,
//! intersection tries the common part with a cube of frame `k - 1`, and
//! the literal-dropping pass removes one literal at a time while the rest
//! stays relatively inductive. No stage ever yields a cube containing the
//! initial state.
//!
//! Dropping order is register priority ascending, then literal code. Other
//! orders give different (equally valid) clauses.

use std::collections::HashSet;

use pdr_sat::SatEngine;
use smallvec::SmallVec;

use crate::cube::{Cube, Lit};
use crate::engine::{literal_order, Pdr};
use crate::frames::Answer;
use crate::AbortReason;

/// Candidate cubes tried by the intersection stage.
const INTERSECTION_TRIES: usize = 8;

impl<S: SatEngine + Default> Pdr<S> {
    pub(crate) fn generalize(&mut self, k: usize, cube: &Cube, core: &[Lit]) -> Result<Cube, AbortReason> {
        let mut cur = cube.clone();
        if self.config.use_core {
            cur = reduce_by_core(&cur, core);
        }
        if !self.config.generalize {
            return Ok(cur);
        }
        if self.config.use_intersection {
            if let Some(smaller) = self.intersect_with_previous(k, &cur, core)? {
                cur = smaller;
            }
        }
        self.drop_literals(k, cur)
    }

    fn intersect_with_previous(&mut self, k: usize, cube: &Cube, core: &[Lit]) -> Result<Option<Cube>, AbortReason> {
        let keep: HashSet<Lit> = core.iter().copied().collect();
        let mut candidates = self.frames.cubes(k - 1).to_vec();
        candidates.sort_by(Cube::compare);
        for other in candidates.iter().take(INTERSECTION_TRIES) {
            let Some(common) = Cube::intersect(cube, other, &keep) else {
                continue;
            };
            if common.is_empty() || common.len() >= cube.len() || common.is_initial(None) {
                continue;
            }
            if let Answer::Unsat(_) = self.query_relative(k - 1, &common, true)? {
                return Ok(Some(common));
            }
        }
        Ok(None)
    }

    fn drop_literals(&mut self, k: usize, mut cur: Cube) -> Result<Cube, AbortReason> {
        // Scratch copy of cur's literals; dropped ones become tombstones.
        let mut work: Vec<Lit> = cur.lits().to_vec();
        let order = literal_order(&self.prio, &work);
        for pos in order {
            if work[pos].is_undef() || cur.len() <= 1 {
                continue;
            }
            let saved = work[pos];
            work[pos] = Lit::UNDEF;
            let candidate: SmallVec<[Lit; 16]> = work.iter().copied().filter(|l| !l.is_undef()).collect();
            if candidate.iter().all(|l| l.is_compl()) {
                work[pos] = saved;
                continue;
            }
            let next = cur.create_subset(&candidate);
            if self.frames.is_blocked_loose(k, &work) {
                cur = next;
                continue;
            }
            match self.query_relative(k - 1, &next, true)? {
                Answer::Unsat(core) if self.config.use_core && core.len() < next.len() => {
                    let reduced = reduce_by_core(&next, &core);
                    for slot in work.iter_mut().filter(|l| !l.is_undef()) {
                        if reduced.lits().binary_search(slot).is_err() {
                            *slot = Lit::UNDEF;
                        }
                    }
                    cur = reduced;
                }
                Answer::Unsat(_) => cur = next,
                Answer::Sat(_) => work[pos] = saved,
            }
        }
        Ok(cur)
    }
}

/// Keep only the core literals, re-adding one positive literal of `cube`
/// when the core alone would admit the initial state.
pub(crate) fn reduce_by_core(cube: &Cube, core: &[Lit]) -> Cube {
    if core.len() >= cube.len() {
        return cube.clone();
    }
    let mut lits: SmallVec<[Lit; 16]> = core.iter().copied().collect();
    if lits.iter().all(|l| l.is_compl()) {
        if let Some(&positive) = cube.lits().iter().find(|l| !l.is_compl()) {
            lits.push(positive);
        }
    }
    cube.create_subset(&lits)
}
