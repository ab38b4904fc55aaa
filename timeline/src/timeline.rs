//! The recorded run: one initial snapshot and its delta log.

use std::fmt;

use crate::{
    delta::Delta,
    engine::{Diagnostic, LineMap},
    error::Result,
    replay,
    state::MachineState,
};

/// How a recorded run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The program executed its halt request.
    Halted,
    /// The program waits on input that was never supplied.
    Blocked,
    /// Recording stopped after the configured number of steps; the program
    /// may not have finished.
    StepCapReached,
    /// The engine could not execute the next instruction. The timeline holds
    /// every step up to the fault.
    Faulted(String),
    /// Recording was cancelled between two steps.
    Cancelled,
}

impl RunStatus {
    /// Whether the program ran to a normal stop.
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Halted | Self::Blocked)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Halted => f.write_str("halted"),
            Self::Blocked => f.write_str("blocked on input"),
            Self::StepCapReached => f.write_str("stopped at step cap"),
            Self::Faulted(message) => write!(f, "faulted: {message}"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// An immutable record of one program run.
///
/// Step `k` is the machine after `k` instructions; step 0 is the initial
/// snapshot and `deltas()[k - 1]` is the transition into step `k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    initial: MachineState,
    deltas: Vec<Delta>,
    status: RunStatus,
    diagnostics: Vec<Diagnostic>,
    line_map: LineMap,
}

impl Timeline {
    pub const fn initial_state(&self) -> &MachineState {
        &self.initial
    }

    pub fn deltas(&self) -> &[Delta] {
        &self.deltas
    }

    /// The delta leading into `step`. Step 0 has none.
    pub fn delta_into(&self, step: usize) -> Option<&Delta> {
        step.checked_sub(1).and_then(|i| self.deltas.get(i))
    }

    pub fn total_steps(&self) -> usize {
        self.deltas.len()
    }

    pub const fn status(&self) -> &RunStatus {
        &self.status
    }

    /// Assembler messages for the source this timeline was recorded from.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub const fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    /// Source line of the instruction executed to reach `step`, if known.
    pub fn source_line(&self, step: usize) -> Option<usize> {
        let delta = self.delta_into(step)?;
        self.line_map.get(&delta.instr_addr()).copied()
    }

    /// Reconstructs the machine at `step`.
    pub fn state_at_step(&self, step: usize) -> Result<MachineState> {
        replay::state_at_step(self, step)
    }
}

/// Append-only delta log used while a run is in progress.
#[derive(Debug)]
pub(crate) struct TimelineRecorder {
    initial: MachineState,
    deltas: Vec<Delta>,
}

impl TimelineRecorder {
    pub(crate) fn new(initial: MachineState) -> Self {
        Self {
            initial,
            deltas: Vec::new(),
        }
    }

    pub(crate) fn initial_state(&self) -> &MachineState {
        &self.initial
    }

    pub(crate) fn push(&mut self, delta: Delta) {
        self.deltas.push(delta);
    }

    pub(crate) fn len(&self) -> usize {
        self.deltas.len()
    }

    pub(crate) fn finish(
        self,
        status: RunStatus,
        diagnostics: Vec<Diagnostic>,
        line_map: LineMap,
    ) -> Timeline {
        Timeline {
            initial: self.initial,
            deltas: self.deltas,
            status,
            diagnostics,
            line_map,
        }
    }
}
