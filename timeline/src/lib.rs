//! Snapshot/delta timelines for stepping backwards and forwards through a
//! program run.
//!
//! A run is recorded once: the machine is captured in full before the first
//! instruction, and every executed instruction then contributes a sparse
//! [`Delta`] holding only the cells it changed. The machine at any step is
//! rebuilt by replaying deltas onto a copy of the initial snapshot.
//!
//! The crate does not know any instruction set. Execution and assembly are
//! supplied through the [`ExecutionEngine`] and [`ProgramAssembler`] traits.
//!
//! ```ignore
//! let mut session = Session::new(engine, assembler);
//! session.run(source)?;
//! session.go_to_end();
//! let halted = session.current_state().unwrap().halted;
//! ```

mod access;
mod config;
mod delta;
mod engine;
mod error;
mod navigator;
mod replay;
mod run;
mod session;
mod state;
mod timeline;

#[cfg(test)]
mod test_utils;

pub use access::{RegisterSet, StepAccess};
pub use config::{MemoryScan, TimelineConfig, DEFAULT_STEP_CAP};
pub use delta::{compute_delta, Delta};
pub use engine::{AssemblyOutput, Diagnostic, ExecutionEngine, LineMap, ProgramAssembler};
pub use error::{AssemblyFailure, Result, RunError, TimelineError};
pub use navigator::Navigator;
pub use replay::{state_at_step, state_at_step_into};
pub use run::{record, run, run_with_cancel};
pub use session::Session;
pub use state::{
    Address, ControlRegisters, Flags, MachineState, RegIndex, Word, MEMORY_WORDS, REGISTER_COUNT,
};
pub use timeline::{RunStatus, Timeline};
