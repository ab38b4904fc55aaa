//! Assembler and interpreter for a small 16-bit register machine, plugged
//! into `steptrace` timelines.
//!
//! [`Assembler`] turns source text into object code and [`Emulator`] executes
//! it one instruction at a time, reporting what each instruction wrote. Both
//! implement the timeline traits, so a [`Session`] can record a run and step
//! through it in either direction.

mod assembler;
mod execution;
mod opcodes;
mod parser;
mod stats;
mod util;

pub use assembler::{AssembledProgram, Assembler};
pub use execution::{Emulator, InputQueue, InterpreterError};
pub use opcodes::{fields, Format, Instruction, Opcode, RX_OP_FIELD};
pub use parser::{BadArgumentError, Error as ParseError};
pub use stats::OpcodeStats;
pub use util::init_logger;

/// A debugging session over the reference machine.
pub type Session = steptrace_timeline::Session<Emulator, Assembler>;
