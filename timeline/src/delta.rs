//! Per-instruction change records.
//!
//! A [`Delta`] holds only the registers and memory words whose value differs
//! between the state before and after an instruction. The scalar fields
//! (pc, ir, flags, control words, halted/blocked, instruction count) are few,
//! so they are stored in every delta whether they changed or not, and replay
//! simply overwrites them.

use std::collections::BTreeMap;

use crate::{
    access::{RegisterSet, StepAccess},
    config::MemoryScan,
    state::{Address, ControlRegisters, Flags, MachineState, RegIndex, Word, MEMORY_WORDS},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    pc: Address,
    ir: Word,
    instr_addr: Address,
    changed_registers: BTreeMap<RegIndex, Word>,
    changed_memory: BTreeMap<Address, Word>,
    flags: Flags,
    control: ControlRegisters,
    halted: bool,
    blocked: bool,
    instr_count: u64,
    fetched: RegisterSet,
    stored: RegisterSet,
}

/// Computes the delta between two states, inspecting only the memory words
/// listed in `access`.
pub fn compute_delta(before: &MachineState, after: &MachineState, access: &StepAccess) -> Delta {
    Delta::compute(before, after, access, MemoryScan::WriteSet)
}

impl Delta {
    /// Computes the change record for the instruction that turned `before`
    /// into `after`.
    ///
    /// `access` supplies the fetched/stored register annotations and, under
    /// [`MemoryScan::WriteSet`], the memory words to compare.
    pub fn compute(
        before: &MachineState,
        after: &MachineState,
        access: &StepAccess,
        scan: MemoryScan,
    ) -> Self {
        let changed_registers = before
            .registers()
            .iter()
            .zip(after.registers())
            .enumerate()
            .filter(|(_, (old, new))| old != new)
            .map(|(index, (_, &new))| (index as RegIndex, new))
            .collect();

        let changed_memory = match scan {
            MemoryScan::WriteSet => access
                .written_addresses
                .iter()
                .filter(|&&addr| before.mem(addr) != after.mem(addr))
                .map(|&addr| (addr, after.mem(addr)))
                .collect(),
            MemoryScan::Full => (0..MEMORY_WORDS)
                .map(|addr| addr as Address)
                .filter(|&addr| before.mem(addr) != after.mem(addr))
                .map(|addr| (addr, after.mem(addr)))
                .collect(),
        };

        Self {
            pc: after.pc,
            ir: after.ir,
            instr_addr: before.pc,
            changed_registers,
            changed_memory,
            flags: after.flags,
            control: after.control,
            halted: after.halted,
            blocked: after.blocked,
            instr_count: after.instr_count,
            fetched: access.read_registers,
            stored: access.written_registers,
        }
    }

    /// Replays this delta onto `state`.
    ///
    /// Scalar fields are overwritten unconditionally; registers and memory
    /// words not listed in the delta keep their current value.
    pub fn apply(&self, state: &mut MachineState) {
        state.pc = self.pc;
        state.ir = self.ir;
        state.flags = self.flags;
        state.control = self.control;
        state.halted = self.halted;
        state.blocked = self.blocked;
        state.instr_count = self.instr_count;

        for (&index, &value) in &self.changed_registers {
            state.set_reg(index, value);
        }
        for (&addr, &value) in &self.changed_memory {
            state.set_mem(addr, value);
        }
    }

    /// Program counter after the instruction.
    pub const fn pc(&self) -> Address {
        self.pc
    }

    /// Instruction register after the instruction.
    pub const fn ir(&self) -> Word {
        self.ir
    }

    /// Address the instruction was fetched from.
    pub const fn instr_addr(&self) -> Address {
        self.instr_addr
    }

    pub const fn changed_registers(&self) -> &BTreeMap<RegIndex, Word> {
        &self.changed_registers
    }

    pub const fn changed_memory(&self) -> &BTreeMap<Address, Word> {
        &self.changed_memory
    }

    pub const fn flags(&self) -> Flags {
        self.flags
    }

    pub const fn control(&self) -> ControlRegisters {
        self.control
    }

    pub const fn halted(&self) -> bool {
        self.halted
    }

    pub const fn blocked(&self) -> bool {
        self.blocked
    }

    /// Cumulative number of instructions executed, this one included.
    pub const fn instr_count(&self) -> u64 {
        self.instr_count
    }

    /// Registers the instruction read.
    pub const fn fetched(&self) -> RegisterSet {
        self.fetched
    }

    /// Registers the instruction wrote, whether or not their value changed.
    pub const fn stored(&self) -> RegisterSet {
        self.stored
    }

    /// Number of register and memory cells carried by this delta.
    pub fn changed_cells(&self) -> usize {
        self.changed_registers.len() + self.changed_memory.len()
    }
}
