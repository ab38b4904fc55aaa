use std::fmt;

use num_enum::IntoPrimitive;
use smallvec::{smallvec, SmallVec};
use steptrace_timeline::{Address, MachineState, RegIndex, Word};
use strum_macros::{EnumCount, EnumIter, EnumString, IntoStaticStr};

/// Value of the `op` field marking a two-word memory-format instruction.
pub const RX_OP_FIELD: u8 = 0xf;

/// Instruction layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One word: `op d a b`.
    Rrr,
    /// Two words: `0xf d a sub-op`, followed by a displacement word.
    Rx,
}

/// Instruction mnemonics.
///
/// The discriminant is a dense index in `0..Opcode::COUNT` used for
/// per-opcode tables. The machine encoding is given by [`Opcode::code`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumCount,
    EnumIter,
    EnumString,
    IntoStaticStr,
    IntoPrimitive,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[repr(u8)]
pub enum Opcode {
    // Register instructions
    Add,
    Sub,
    Mul,
    Div,
    Cmp,
    And,
    Or,
    Xor,
    Trap,

    // Memory and control instructions
    Lea,
    Load,
    Store,
    Jump,
    Jumpz,
    Jumpnz,
    Jal,
    Jumplt,
    Jumpeq,
    Jumpgt,
}

impl Opcode {
    pub const fn format(self) -> Format {
        match self {
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Cmp
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Trap => Format::Rrr,
            _ => Format::Rx,
        }
    }

    /// The 4-bit code of this instruction: the `op` field for register
    /// instructions, the secondary opcode in the `b` field for memory ones.
    pub const fn code(self) -> u8 {
        match self {
            Opcode::Add => 0x0,
            Opcode::Sub => 0x1,
            Opcode::Mul => 0x2,
            Opcode::Div => 0x3,
            Opcode::Cmp => 0x4,
            Opcode::And => 0x5,
            Opcode::Or => 0x6,
            Opcode::Xor => 0x7,
            Opcode::Trap => 0xd,
            Opcode::Lea => 0x0,
            Opcode::Load => 0x1,
            Opcode::Store => 0x2,
            Opcode::Jump => 0x3,
            Opcode::Jumpz => 0x4,
            Opcode::Jumpnz => 0x5,
            Opcode::Jal => 0x6,
            Opcode::Jumplt => 0x7,
            Opcode::Jumpeq => 0x8,
            Opcode::Jumpgt => 0x9,
        }
    }

    /// Decodes the `op` field, and the `b` field for memory instructions.
    pub const fn from_fields(op: u8, b: u8) -> Option<Self> {
        let opcode = match (op, b) {
            (0x0, _) => Opcode::Add,
            (0x1, _) => Opcode::Sub,
            (0x2, _) => Opcode::Mul,
            (0x3, _) => Opcode::Div,
            (0x4, _) => Opcode::Cmp,
            (0x5, _) => Opcode::And,
            (0x6, _) => Opcode::Or,
            (0x7, _) => Opcode::Xor,
            (0xd, _) => Opcode::Trap,
            (RX_OP_FIELD, 0x0) => Opcode::Lea,
            (RX_OP_FIELD, 0x1) => Opcode::Load,
            (RX_OP_FIELD, 0x2) => Opcode::Store,
            (RX_OP_FIELD, 0x3) => Opcode::Jump,
            (RX_OP_FIELD, 0x4) => Opcode::Jumpz,
            (RX_OP_FIELD, 0x5) => Opcode::Jumpnz,
            (RX_OP_FIELD, 0x6) => Opcode::Jal,
            (RX_OP_FIELD, 0x7) => Opcode::Jumplt,
            (RX_OP_FIELD, 0x8) => Opcode::Jumpeq,
            (RX_OP_FIELD, 0x9) => Opcode::Jumpgt,
            _ => return None,
        };
        Some(opcode)
    }

    /// Returns the number of operands written in assembly.
    pub const fn num_args(self) -> usize {
        match self {
            Opcode::Cmp => 2,
            Opcode::Jump | Opcode::Jumplt | Opcode::Jumpeq | Opcode::Jumpgt => 1,
            Opcode::Lea
            | Opcode::Load
            | Opcode::Store
            | Opcode::Jumpz
            | Opcode::Jumpnz
            | Opcode::Jal => 2,
            _ => 3,
        }
    }

    /// Number of words the instruction occupies.
    pub const fn size(self) -> usize {
        match self.format() {
            Format::Rrr => 1,
            Format::Rx => 2,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Rrr {
        opcode: Opcode,
        d: RegIndex,
        a: RegIndex,
        b: RegIndex,
    },
    Rx {
        opcode: Opcode,
        d: RegIndex,
        a: RegIndex,
        disp: Word,
    },
}

/// Splits a word into its `op d a b` nibbles.
pub const fn fields(word: Word) -> [u8; 4] {
    [
        (word >> 12) as u8 & 0xf,
        (word >> 8) as u8 & 0xf,
        (word >> 4) as u8 & 0xf,
        word as u8 & 0xf,
    ]
}

const fn pack(op: u8, d: u8, a: u8, b: u8) -> Word {
    ((op as Word & 0xf) << 12)
        | ((d as Word & 0xf) << 8)
        | ((a as Word & 0xf) << 4)
        | (b as Word & 0xf)
}

impl Instruction {
    pub const fn opcode(&self) -> Opcode {
        match self {
            Instruction::Rrr { opcode, .. } | Instruction::Rx { opcode, .. } => *opcode,
        }
    }

    pub fn encode(&self) -> SmallVec<[Word; 2]> {
        match *self {
            Instruction::Rrr { opcode, d, a, b } => smallvec![pack(opcode.code(), d, a, b)],
            Instruction::Rx { opcode, d, a, disp } => {
                smallvec![pack(RX_OP_FIELD, d, a, opcode.code()), disp]
            }
        }
    }

    /// Decodes the instruction starting with `word`. `next` is only consulted
    /// for memory-format instructions, to fetch the displacement.
    pub fn decode(word: Word, next: impl FnOnce() -> Word) -> Option<Self> {
        let [op, d, a, b] = fields(word);
        let opcode = Opcode::from_fields(op, b)?;
        Some(match opcode.format() {
            Format::Rrr => Instruction::Rrr { opcode, d, a, b },
            Format::Rx => Instruction::Rx {
                opcode,
                d,
                a,
                disp: next(),
            },
        })
    }

    /// Decodes the instruction stored at `addr` without executing it.
    pub fn at(state: &MachineState, addr: Address) -> Option<Self> {
        Self::decode(state.mem(addr), || state.mem(addr.wrapping_add(1)))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Rrr {
                opcode: opcode @ Opcode::Cmp,
                a,
                b,
                ..
            } => write!(f, "{opcode} R{a},R{b}"),
            Instruction::Rrr { opcode, d, a, b } => write!(f, "{opcode} R{d},R{a},R{b}"),
            Instruction::Rx { opcode, d, a, disp } => match opcode.num_args() {
                1 => write!(f, "{opcode} ${disp:04x}[R{a}]"),
                _ => write!(f, "{opcode} R{d},${disp:04x}[R{a}]"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::{EnumCount, IntoEnumIterator};

    use super::*;

    #[test]
    fn test_fields_decode_back() {
        for opcode in Opcode::iter() {
            let instr = match opcode.format() {
                Format::Rrr => Instruction::Rrr {
                    opcode,
                    d: 3,
                    a: 14,
                    b: 7,
                },
                Format::Rx => Instruction::Rx {
                    opcode,
                    d: 3,
                    a: 14,
                    disp: 0xbeef,
                },
            };
            let words = instr.encode();
            assert_eq!(words.len(), opcode.size());
            let decoded = Instruction::decode(words[0], || words[1]);
            assert_eq!(decoded, Some(instr), "{opcode}");
        }
    }

    #[test]
    fn test_invalid_fields() {
        assert_eq!(Opcode::from_fields(0x8, 0), None);
        assert_eq!(Opcode::from_fields(0xe, 0), None);
        assert_eq!(Opcode::from_fields(RX_OP_FIELD, 0xa), None);
        assert_eq!(Instruction::decode(0xf00f, || 0), None);
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Opcode::from_str("JUMPNZ"), Ok(Opcode::Jumpnz));
        assert_eq!(Opcode::from_str("store"), Ok(Opcode::Store));
        assert!(Opcode::from_str("halt").is_err());
        assert_eq!(Opcode::Jumpgt.to_string(), "jumpgt");
        assert_eq!(u8::from(Opcode::Jumpgt) as usize, Opcode::COUNT - 1);
        assert_ne!(u8::from(Opcode::Trap), Opcode::Trap.code());
    }

    #[test]
    fn test_disassembly() {
        let add = Instruction::Rrr {
            opcode: Opcode::Add,
            d: 3,
            a: 1,
            b: 2,
        };
        assert_eq!(add.to_string(), "add R3,R1,R2");
        let load = Instruction::Rx {
            opcode: Opcode::Load,
            d: 1,
            a: 0,
            disp: 5,
        };
        assert_eq!(load.to_string(), "load R1,$0005[R0]");
        let jump = Instruction::Rx {
            opcode: Opcode::Jump,
            d: 0,
            a: 2,
            disp: 0x10,
        };
        assert_eq!(jump.to_string(), "jump $0010[R2]");
    }
}
