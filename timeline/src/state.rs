//! Full machine snapshots.
//!
//! A [`MachineState`] owns every cell of the machine: it is never shared
//! between steps, so a reconstructed state can be handed to a caller and
//! mutated freely without affecting the timeline it came from.

use std::fmt;

use bitflags::bitflags;

/// A machine word.
pub type Word = u16;

/// A memory address. Memory holds exactly one word per address.
pub type Address = u16;

/// Index of a general register.
pub type RegIndex = u8;

/// Number of general registers.
pub const REGISTER_COUNT: usize = 16;

/// Number of words of memory.
pub const MEMORY_WORDS: usize = 1 << 16;

bitflags! {
    /// Condition flags set by arithmetic and comparison instructions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u8 {
        /// Unsigned carry (or borrow, for subtraction).
        const CARRY = 1 << 0;
        /// Signed overflow.
        const OVERFLOW = 1 << 1;
        /// Signed less-than.
        const LT = 1 << 2;
        /// Equal.
        const EQ = 1 << 3;
        /// Signed greater-than.
        const GT = 1 << 4;
    }
}

/// Control and status words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ControlRegisters {
    /// Effective address of the last memory-format instruction.
    pub adr: Word,
    /// Last data word transferred between a register and memory.
    pub dat: Word,
    /// Code of the last trap request.
    pub status: Word,
}

/// A complete, independently owned copy of the machine.
#[derive(PartialEq, Eq)]
pub struct MachineState {
    registers: [Word; REGISTER_COUNT],
    memory: Vec<Word>,
    pub flags: Flags,
    pub control: ControlRegisters,
    pub pc: Address,
    pub ir: Word,
    /// Number of instructions executed since the state was reset.
    pub instr_count: u64,
    pub halted: bool,
    /// Set when the machine waits on input that is not available.
    pub blocked: bool,
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MachineState {
    fn clone(&self) -> Self {
        Self {
            registers: self.registers,
            memory: self.memory.clone(),
            flags: self.flags,
            control: self.control,
            pc: self.pc,
            ir: self.ir,
            instr_count: self.instr_count,
            halted: self.halted,
            blocked: self.blocked,
        }
    }

    // Reuses the memory allocation of `self`.
    fn clone_from(&mut self, source: &Self) {
        self.registers = source.registers;
        self.memory.clone_from(&source.memory);
        self.flags = source.flags;
        self.control = source.control;
        self.pc = source.pc;
        self.ir = source.ir;
        self.instr_count = source.instr_count;
        self.halted = source.halted;
        self.blocked = source.blocked;
    }
}

impl MachineState {
    /// Creates a state with every cell set to zero.
    pub fn new() -> Self {
        Self {
            registers: [0; REGISTER_COUNT],
            memory: vec![0; MEMORY_WORDS],
            flags: Flags::empty(),
            control: ControlRegisters::default(),
            pc: 0,
            ir: 0,
            instr_count: 0,
            halted: false,
            blocked: false,
        }
    }

    /// Reads a register. Panics if `index >= REGISTER_COUNT`.
    pub fn reg(&self, index: RegIndex) -> Word {
        self.registers[index as usize]
    }

    /// Writes a register. Panics if `index >= REGISTER_COUNT`.
    pub fn set_reg(&mut self, index: RegIndex, value: Word) {
        self.registers[index as usize] = value;
    }

    pub const fn registers(&self) -> &[Word; REGISTER_COUNT] {
        &self.registers
    }

    pub fn mem(&self, addr: Address) -> Word {
        self.memory[addr as usize]
    }

    pub fn set_mem(&mut self, addr: Address, value: Word) {
        self.memory[addr as usize] = value;
    }

    pub fn memory(&self) -> &[Word] {
        &self.memory
    }

    /// Copies `words` into memory starting at address 0.
    ///
    /// Returns `false`, leaving memory untouched, if `words` does not fit.
    pub fn load_program(&mut self, words: &[Word]) -> bool {
        if words.len() > MEMORY_WORDS {
            return false;
        }
        self.memory[..words.len()].copy_from_slice(words);
        true
    }

    /// Iterates over the non-zero memory words, in address order.
    pub fn nonzero_memory(&self) -> impl Iterator<Item = (Address, Word)> + '_ {
        self.memory
            .iter()
            .enumerate()
            .filter(|&(_, &word)| word != 0)
            .map(|(addr, &word)| (addr as Address, word))
    }
}

impl fmt::Debug for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 64K words of memory are not useful in test output.
        f.debug_struct("MachineState")
            .field("pc", &format_args!("{:#06x}", self.pc))
            .field("ir", &format_args!("{:#06x}", self.ir))
            .field("registers", &self.registers)
            .field("flags", &self.flags)
            .field("control", &self.control)
            .field("instr_count", &self.instr_count)
            .field("halted", &self.halted)
            .field("blocked", &self.blocked)
            .field("nonzero_memory", &self.nonzero_memory().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_zeroed() {
        let state = MachineState::new();
        assert!(state.registers().iter().all(|&r| r == 0));
        assert_eq!(state.memory().len(), MEMORY_WORDS);
        assert_eq!(state.nonzero_memory().count(), 0);
        assert!(state.flags.is_empty());
        assert!(!state.halted && !state.blocked);
    }

    #[test]
    fn test_clones_are_independent() {
        let mut original = MachineState::new();
        original.set_reg(3, 7);
        original.set_mem(0xfff0, 9);

        let mut copy = original.clone();
        copy.set_reg(3, 8);
        copy.set_mem(0xfff0, 10);

        assert_eq!(original.reg(3), 7);
        assert_eq!(original.mem(0xfff0), 9);
        assert_ne!(original, copy);

        copy.clone_from(&original);
        assert_eq!(original, copy);
    }

    #[test]
    fn test_load_program() {
        let mut state = MachineState::new();
        assert!(state.load_program(&[1, 2, 3]));
        assert_eq!(&state.memory()[..4], &[1, 2, 3, 0]);

        let too_big = vec![1; MEMORY_WORDS + 1];
        assert!(!state.load_program(&too_big));
        assert_eq!(state.mem(3), 0);
    }
}
