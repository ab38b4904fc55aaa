//! Interpreter for the reference machine.
//!
//! Each executed instruction goes through an [`ExecContext`], which applies
//! its effects to the [`MachineState`](steptrace_timeline::MachineState) and
//! records which registers and memory words it touched, so the timeline can
//! build a sparse delta without scanning the whole machine.

pub(crate) mod branch;
pub(crate) mod context;
pub(crate) mod emulator;
pub(crate) mod integer_ops;
pub(crate) mod logic;
pub(crate) mod mv;
pub(crate) mod trap;

#[cfg(test)]
pub(crate) mod test_utils;

pub use emulator::{Emulator, InputQueue, InterpreterError};
