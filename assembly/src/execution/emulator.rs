use steptrace_timeline::{Address, ExecutionEngine, Flags, MachineState, StepAccess, Word};
use thiserror::Error;
use tracing::{instrument, trace};

use super::{branch, context::ExecContext, integer_ops, logic, mv, trap};
use crate::{
    opcodes::{Instruction, Opcode},
    stats::OpcodeStats,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpreterError {
    #[error("Invalid instruction {word:#06x} at {addr:#06x}")]
    InvalidOpcode { word: Word, addr: Address },

    #[error("Division by zero at {addr:#06x}")]
    DivideByZero { addr: Address },

    #[error("Unknown trap code {code} at {addr:#06x}")]
    UnknownTrap { code: Word, addr: Address },
}

/// Words served to `trap` read requests, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputQueue {
    words: Vec<Word>,
    next: usize,
}

impl InputQueue {
    pub fn new(words: Vec<Word>) -> Self {
        Self {
            words,
            next: 0,
        }
    }

    pub fn next_word(&mut self) -> Option<Word> {
        let word = self.words.get(self.next).copied()?;
        self.next += 1;
        Some(word)
    }

    pub fn remaining(&self) -> usize {
        self.words.len() - self.next
    }

    /// Makes every word available again.
    pub fn rewind(&mut self) {
        self.next = 0;
    }
}

/// The reference machine's interpreter.
///
/// Holds what lives outside the machine state: the input stream and the
/// per-opcode execution counts. Both are reset along with the machine.
#[derive(Debug, Default)]
pub struct Emulator {
    input: InputQueue,
    stats: OpcodeStats,
}

impl Emulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(words: Vec<Word>) -> Self {
        Self {
            input: InputQueue::new(words),
            stats: OpcodeStats::default(),
        }
    }

    pub const fn input(&self) -> &InputQueue {
        &self.input
    }

    pub const fn stats(&self) -> &OpcodeStats {
        &self.stats
    }

    /// Executes the instruction at `state.pc`.
    pub fn step(&mut self, state: &mut MachineState) -> Result<StepAccess, InterpreterError> {
        let mut ctx = ExecContext::new(state, &mut self.input);
        let word = ctx.fetch();
        ctx.ir = word;
        let instruction = Instruction::decode(word, || ctx.fetch()).ok_or(
            InterpreterError::InvalidOpcode {
                word,
                addr: ctx.instr_addr,
            },
        )?;

        instruction.execute(&mut ctx)?;
        self.stats.record(instruction.opcode());
        ctx.instr_count += 1;
        Ok(ctx.finish())
    }

    /// Runs `state` directly, without recording, until it halts or
    /// `max_steps` instructions have executed. Returns the number executed.
    pub fn run(
        &mut self,
        state: &mut MachineState,
        max_steps: usize,
    ) -> Result<usize, InterpreterError> {
        let mut steps = 0;
        while steps < max_steps && !self.is_halted(state) {
            self.step(state)?;
            steps += 1;
        }
        Ok(steps)
    }
}

impl ExecutionEngine for Emulator {
    type Error = InterpreterError;

    fn reset_state(&mut self) -> MachineState {
        self.input.rewind();
        self.stats = OpcodeStats::default();
        MachineState::new()
    }

    fn execute_one(&mut self, state: &mut MachineState) -> Result<StepAccess, Self::Error> {
        self.step(state)
    }

    fn is_halted(&self, state: &MachineState) -> bool {
        state.halted || state.blocked
    }
}

impl Instruction {
    /// Applies this instruction through `ctx`. The instruction words have
    /// already been fetched.
    #[instrument(level = "trace", skip_all, fields(instr = %self))]
    pub(crate) fn execute(self, ctx: &mut ExecContext) -> Result<(), InterpreterError> {
        match self {
            Instruction::Rrr { opcode, d, a, b } => match opcode {
                Opcode::Add => integer_ops::add(ctx, d, a, b),
                Opcode::Sub => integer_ops::sub(ctx, d, a, b),
                Opcode::Mul => integer_ops::mul(ctx, d, a, b),
                Opcode::Div => integer_ops::div(ctx, d, a, b)?,
                Opcode::Cmp => integer_ops::cmp(ctx, a, b),
                Opcode::And => logic::and(ctx, d, a, b),
                Opcode::Or => logic::or(ctx, d, a, b),
                Opcode::Xor => logic::xor(ctx, d, a, b),
                Opcode::Trap => trap::trap(ctx, d, a)?,
                _ => unreachable!("{opcode} is not a register instruction"),
            },
            Instruction::Rx { opcode, d, a, disp } => match opcode {
                Opcode::Lea => mv::lea(ctx, d, a, disp),
                Opcode::Load => mv::load(ctx, d, a, disp),
                Opcode::Store => mv::store(ctx, d, a, disp),
                Opcode::Jump => branch::jump(ctx, a, disp),
                Opcode::Jumpz => branch::jumpz(ctx, d, a, disp),
                Opcode::Jumpnz => branch::jumpnz(ctx, d, a, disp),
                Opcode::Jal => branch::jal(ctx, d, a, disp),
                Opcode::Jumplt => branch::jump_on_flag(ctx, Flags::LT, a, disp),
                Opcode::Jumpeq => branch::jump_on_flag(ctx, Flags::EQ, a, disp),
                Opcode::Jumpgt => branch::jump_on_flag(ctx, Flags::GT, a, disp),
                _ => unreachable!("{opcode} is not a memory instruction"),
            },
        }
        trace!(pc = ctx.pc, "executed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::test_utils::load;

    #[test]
    fn test_step_reports_writes() {
        // load R1,x ; store R1,y ; trap R0,R0,R0 ; x: data 5 ; y: data 0
        let mut state = load(&[0xf101, 5, 0xf102, 6, 0xd000, 5, 0]);
        let mut emulator = Emulator::new();

        let access = emulator.step(&mut state).unwrap();
        assert_eq!(state.reg(1), 5);
        assert_eq!(state.pc, 2);
        assert_eq!(state.ir, 0xf101);
        assert!(access.written_registers.contains(1));
        assert!(access.written_addresses.is_empty());

        let access = emulator.step(&mut state).unwrap();
        assert_eq!(state.mem(6), 5);
        assert_eq!(access.written_addresses.as_slice(), &[6]);

        emulator.step(&mut state).unwrap();
        assert!(emulator.is_halted(&state));
        assert_eq!(state.instr_count, 3);
        assert_eq!(emulator.stats().count(Opcode::Load), 1);
        assert_eq!(emulator.stats().total(), 3);
    }

    #[test]
    fn test_invalid_opcode() {
        let mut state = load(&[0x8000]);
        assert_eq!(
            Emulator::new().step(&mut state),
            Err(InterpreterError::InvalidOpcode {
                word: 0x8000,
                addr: 0
            })
        );
    }

    #[test]
    fn test_run_and_reset() {
        // R1 := 1 ; R2 := input ; trap read again, which blocks
        let program = [0xf100, 1, 0xd120, 0xd120, 0xd000];
        let mut emulator = Emulator::with_input(vec![42]);
        let mut state = load(&program);
        assert_eq!(emulator.run(&mut state, 100), Ok(3));
        assert_eq!(state.reg(2), 42);
        assert!(state.blocked);
        assert_eq!(state.pc, 3);
        assert_eq!(emulator.input().remaining(), 0);

        let state = emulator.reset_state();
        assert_eq!(state, MachineState::new());
        assert_eq!(emulator.input().remaining(), 1);
        assert_eq!(emulator.stats().total(), 0);
    }
}
