//! Run statistics and the optional per-event statistics sink.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::cube::Cube;
use crate::frames::Answer;

/// Counters and timings for one run.
#[derive(Debug, Clone, Default)]
pub struct PdrStats {
    /// Bad cubes handed to the blocking loop.
    pub blocks: u64,
    /// Predecessor obligations derived.
    pub obligations: u64,
    /// Cubes added to the frame database.
    pub cubes: u64,
    pub sat_calls: u64,
    pub sat_calls_sat: u64,
    pub sat_calls_unsat: u64,
    pub sat_calls_unknown: u64,
    /// Frame solvers rebuilt after too many activation literals.
    pub solver_restarts: u64,
    pub frames: usize,
    pub queue_high_water: usize,
    pub ternary_runs: u64,
    pub ternary_lits_removed: u64,
    pub time_sat: Duration,
    pub time_sat_sat: Duration,
    pub time_sat_unsat: Duration,
    pub time_generalize: Duration,
    pub time_push: Duration,
    pub time_total: Duration,
}

impl PdrStats {
    pub(crate) fn record_call(&mut self, answer: Option<&Answer>, elapsed: Duration) {
        self.sat_calls += 1;
        self.time_sat += elapsed;
        match answer {
            Some(Answer::Sat(_)) => {
                self.sat_calls_sat += 1;
                self.time_sat_sat += elapsed;
            }
            Some(Answer::Unsat(_)) => {
                self.sat_calls_unsat += 1;
                self.time_sat_unsat += elapsed;
            }
            None => self.sat_calls_unknown += 1,
        }
    }
}

impl fmt::Display for PdrStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "frames {}  blocks {}  obligations {}  cubes {}  queue max {}",
            self.frames, self.blocks, self.obligations, self.cubes, self.queue_high_water
        )?;
        writeln!(
            f,
            "sat calls {} (sat {}, unsat {}, unknown {})  restarts {}",
            self.sat_calls, self.sat_calls_sat, self.sat_calls_unsat, self.sat_calls_unknown, self.solver_restarts
        )?;
        writeln!(f, "ternary runs {}  lits removed {}", self.ternary_runs, self.ternary_lits_removed)?;
        write!(
            f,
            "time: sat {:.3}s (sat {:.3}s, unsat {:.3}s)  generalize {:.3}s  push {:.3}s  total {:.3}s",
            self.time_sat.as_secs_f64(),
            self.time_sat_sat.as_secs_f64(),
            self.time_sat_unsat.as_secs_f64(),
            self.time_generalize.as_secs_f64(),
            self.time_push.as_secs_f64(),
            self.time_total.as_secs_f64()
        )
    }
}

/// Receives one event per derived obligation and per stored cube.
///
/// A sink that returns an error is disabled for the rest of the run.
pub trait StatsSink {
    fn obligation_derived(&mut self, frame: usize, cube: &Cube, depth: usize) -> io::Result<()>;

    fn cube_derived(&mut self, level: usize, cube: &Cube) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct NullSink;

impl StatsSink for NullSink {
    fn obligation_derived(&mut self, _: usize, _: &Cube, _: usize) -> io::Result<()> {
        Ok(())
    }

    fn cube_derived(&mut self, _: usize, _: &Cube) -> io::Result<()> {
        Ok(())
    }
}

/// Writes `level,cube,depth` rows with cubes as register patterns. Rows for
/// stored cubes leave the depth column empty.
pub struct CsvSink<W: Write> {
    out: W,
    num_regs: usize,
}

impl<W: Write> CsvSink<W> {
    pub fn new(mut out: W, num_regs: usize) -> io::Result<Self> {
        writeln!(out, "level,cube,depth")?;
        Ok(Self { out, num_regs })
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl CsvSink<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>, num_regs: usize) -> io::Result<Self> {
        Self::new(BufWriter::new(File::create(path)?), num_regs)
    }
}

impl<W: Write> StatsSink for CsvSink<W> {
    fn obligation_derived(&mut self, frame: usize, cube: &Cube, depth: usize) -> io::Result<()> {
        writeln!(self.out, "{},{},{}", frame, cube.pattern(self.num_regs), depth)
    }

    fn cube_derived(&mut self, level: usize, cube: &Cube) -> io::Result<()> {
        writeln!(self.out, "{},{},", level, cube.pattern(self.num_regs))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
