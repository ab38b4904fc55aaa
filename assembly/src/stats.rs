use std::fmt;

use strum::{EnumCount, IntoEnumIterator};
use tracing::info;

use crate::opcodes::Opcode;

/// Number of times each opcode has been executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeStats {
    counts: [u64; Opcode::COUNT],
}

impl Default for OpcodeStats {
    fn default() -> Self {
        Self {
            counts: [0; Opcode::COUNT],
        }
    }
}

impl OpcodeStats {
    pub(crate) fn record(&mut self, opcode: Opcode) {
        self.counts[u8::from(opcode) as usize] += 1;
    }

    pub fn count(&self, opcode: Opcode) -> u64 {
        self.counts[u8::from(opcode) as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Opcodes that were executed at least once, with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (Opcode, u64)> + '_ {
        Opcode::iter()
            .map(|opcode| (opcode, self.count(opcode)))
            .filter(|&(_, count)| count > 0)
    }

    pub fn log_summary(&self) {
        for (opcode, count) in self.iter() {
            info!(%opcode, count, "executed");
        }
    }
}

impl fmt::Display for OpcodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (opcode, count) in self.iter() {
            writeln!(f, "{:<8}{count:>8}", opcode.mnemonic())?;
        }
        write!(f, "{:<8}{:>8}", "total", self.total())
    }
}
