//! The seams between the timeline and the machine it records.
//!
//! The timeline never decodes instructions itself. It relies on an
//! [`ExecutionEngine`] to advance a [`MachineState`] one instruction at a time
//! and on a [`ProgramAssembler`] to turn source text into object code.

use std::{collections::BTreeMap, fmt};

use crate::{
    access::StepAccess,
    state::{Address, MachineState, Word},
};

/// Executes a program one instruction at a time.
pub trait ExecutionEngine {
    type Error: std::error::Error;

    /// Returns the machine as it is before any program is loaded. Also rewinds
    /// any engine-side state (such as pending input) to its start.
    fn reset_state(&mut self) -> MachineState;

    /// Executes exactly one instruction, mutating `state` in place, and
    /// reports the cells it touched.
    fn execute_one(&mut self, state: &mut MachineState) -> Result<StepAccess, Self::Error>;

    /// Whether `state` can make no further progress.
    fn is_halted(&self, state: &MachineState) -> bool;
}

/// Maps the address of each emitted word to its 1-based source line.
pub type LineMap = BTreeMap<Address, usize>;

/// A message reported by the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based source line, or 0 for messages about the module as a whole.
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            f.write_str(&self.message)
        } else {
            write!(f, "line {}: {}", self.line, self.message)
        }
    }
}

/// Output of a [`ProgramAssembler`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyOutput {
    /// Words to load at address 0.
    pub object_code: Vec<Word>,
    pub error_count: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub line_map: LineMap,
}

/// Translates program text into object code.
pub trait ProgramAssembler {
    fn assemble(&self, module_name: &str, source: &str) -> AssemblyOutput;
}
