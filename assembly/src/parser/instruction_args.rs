use std::str::FromStr;

use steptrace_timeline::{RegIndex, Word, REGISTER_COUNT};
use thiserror::Error;

/// A general register operand, written `R0`..`R15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Register(pub(crate) RegIndex);

/// A word-sized operand: a literal or a label to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Value {
    Literal(Word),
    Label(String),
}

/// An operand as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Operand {
    Register(Register),
    Value(Value),
    /// `disp[Rn]`
    Indexed(Value, Register),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BadArgumentError {
    #[error("Invalid register: {0}")]
    Register(String),

    #[error("Invalid literal: {0}")]
    Literal(String),

    #[error("Expected a register, found {0}")]
    ExpectedRegister(String),

    #[error("Expected an address, found {0}")]
    ExpectedAddress(String),
}

impl FromStr for Register {
    type Err = BadArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix(['r', 'R'])
            .ok_or_else(|| BadArgumentError::Register(s.to_string()))?;
        match digits.parse::<usize>() {
            Ok(index) if index < REGISTER_COUNT => Ok(Register(index as RegIndex)),
            _ => Err(BadArgumentError::Register(s.to_string())),
        }
    }
}

impl FromStr for Value {
    type Err = BadArgumentError;

    /// Parses `$hex`, a signed decimal in `-32768..=65535`, or a label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || BadArgumentError::Literal(s.to_string());
        if let Some(hex) = s.strip_prefix('$') {
            return Word::from_str_radix(hex, 16).map(Value::Literal).map_err(|_| bad());
        }
        if s.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
            let value: i32 = s.parse().map_err(|_| bad())?;
            return match value {
                -32768..=-1 => Ok(Value::Literal(value as i16 as Word)),
                0..=65535 => Ok(Value::Literal(value as Word)),
                _ => Err(bad()),
            };
        }
        Ok(Value::Label(s.to_string()))
    }
}

impl Operand {
    pub(crate) fn as_register(&self) -> Result<Register, BadArgumentError> {
        match self {
            Operand::Register(register) => Ok(*register),
            other => Err(BadArgumentError::ExpectedRegister(other.to_string())),
        }
    }

    /// Accepts `disp[Rn]`, or a bare `disp` meaning `disp[R0]`.
    pub(crate) fn as_address(&self) -> Result<(Value, Register), BadArgumentError> {
        match self {
            Operand::Indexed(disp, index) => Ok((disp.clone(), *index)),
            Operand::Value(disp) => Ok((disp.clone(), Register(0))),
            other => Err(BadArgumentError::ExpectedAddress(other.to_string())),
        }
    }

    pub(crate) fn as_value(&self) -> Result<Value, BadArgumentError> {
        match self {
            Operand::Value(value) => Ok(value.clone()),
            other => Err(BadArgumentError::Literal(other.to_string())),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Literal(word) => write!(f, "{word}"),
            Value::Label(label) => f.write_str(label),
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Register(Register(index)) => write!(f, "R{index}"),
            Operand::Value(value) => write!(f, "{value}"),
            Operand::Indexed(disp, Register(index)) => write!(f, "{disp}[R{index}]"),
        }
    }
}
