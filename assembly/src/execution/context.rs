use std::ops::{Deref, DerefMut};

use steptrace_timeline::{Address, Flags, MachineState, RegIndex, StepAccess, Word};

use super::emulator::InputQueue;

/// Execution context for a single instruction.
///
/// Register and memory accesses go through the context so that every write is
/// reported in the resulting [`StepAccess`].
pub(crate) struct ExecContext<'a> {
    state: &'a mut MachineState,
    pub input: &'a mut InputQueue,
    /// Address the current instruction was fetched from.
    pub instr_addr: Address,
    access: StepAccess,
}

impl<'a> ExecContext<'a> {
    pub fn new(state: &'a mut MachineState, input: &'a mut InputQueue) -> Self {
        let instr_addr = state.pc;
        Self {
            state,
            input,
            instr_addr,
            access: StepAccess::default(),
        }
    }

    /// Reads the word at `pc` and advances `pc` past it.
    pub fn fetch(&mut self) -> Word {
        let word = self.state.mem(self.state.pc);
        self.state.pc = self.state.pc.wrapping_add(1);
        word
    }

    /// Reads a register. `R0` always reads as zero.
    pub fn load_reg(&mut self, index: RegIndex) -> Word {
        self.access.read_registers.insert(index);
        if index == 0 {
            0
        } else {
            self.state.reg(index)
        }
    }

    /// Writes a register. Writes to `R0` are discarded.
    pub fn store_reg(&mut self, index: RegIndex, value: Word) {
        if index != 0 {
            self.access.written_registers.insert(index);
            self.state.set_reg(index, value);
        }
    }

    /// Computes `disp + R[index]` and latches it in `adr`.
    pub fn effective_address(&mut self, disp: Word, index: RegIndex) -> Address {
        let addr = disp.wrapping_add(self.load_reg(index));
        self.state.control.adr = addr;
        addr
    }

    pub fn load_mem(&mut self, addr: Address) -> Word {
        let value = self.state.mem(addr);
        self.state.control.dat = value;
        value
    }

    pub fn store_mem(&mut self, addr: Address, value: Word) {
        self.access.written_addresses.push(addr);
        self.state.control.dat = value;
        self.state.set_mem(addr, value);
    }

    pub fn jump_to(&mut self, target: Address) {
        self.state.pc = target;
    }

    /// Replaces the `lt`, `eq` and `gt` flags with the signed comparison of
    /// `lhs` against `rhs`.
    pub fn set_comparison(&mut self, lhs: Word, rhs: Word) {
        let (lhs, rhs) = (lhs as i16, rhs as i16);
        let flags = &mut self.state.flags;
        flags.set(Flags::LT, lhs < rhs);
        flags.set(Flags::EQ, lhs == rhs);
        flags.set(Flags::GT, lhs > rhs);
    }

    pub fn finish(self) -> StepAccess {
        self.access
    }
}

impl Deref for ExecContext<'_> {
    type Target = MachineState;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl DerefMut for ExecContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}
