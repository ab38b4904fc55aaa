use std::collections::HashMap;
use std::str::FromStr;

use steptrace_timeline::{Address, LineMap, Word, MEMORY_WORDS};
use thiserror::Error;

use super::instruction_args::{BadArgumentError, Operand, Register, Value};
use super::{ParsedLine, Statement};
use crate::opcodes::{Format, Instruction, Opcode};

/// Mnemonic of the directive placing literal words in the image.
const DATA_DIRECTIVE: &str = "data";

/// What a statement emits, before labels are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InstructionKind {
    Rrr {
        opcode: Opcode,
        d: Register,
        a: Register,
        b: Register,
    },
    Rx {
        opcode: Opcode,
        d: Register,
        disp: Value,
        index: Register,
    },
    Data(Vec<Value>),
}

/// A parsed source line, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InstructionWithLine {
    pub(crate) line: usize,
    pub(crate) label: Option<String>,
    pub(crate) kind: Option<InstructionKind>,
}

/// Assembled words, the resolved labels, and the address to line mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ProgramImage {
    pub(crate) words: Vec<Word>,
    pub(crate) labels: Labels,
    pub(crate) line_map: LineMap,
}

/// A mapping from label names to their address.
pub(crate) type Labels = HashMap<String, Address>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Unknown instruction: {0}")]
    UnknownInstruction(String),

    #[error("Wrong number of arguments for {instruction}: expected {expected}, found {found}")]
    WrongNumberOfArguments {
        instruction: String,
        expected: usize,
        found: usize,
    },

    #[error("Bad argument: {0}")]
    BadArgument(#[from] BadArgumentError),

    #[error("Duplicate label: {0}")]
    DuplicateLabel(String),

    #[error("Undefined label: {0}")]
    UndefinedLabel(String),

    #[error("Program does not fit in memory ({0} words)")]
    ProgramTooLarge(usize),
}

impl InstructionKind {
    pub(crate) fn from_statement(statement: &Statement) -> Result<Self, Error> {
        let Statement { mnemonic, operands } = statement;
        if mnemonic.eq_ignore_ascii_case(DATA_DIRECTIVE) {
            if operands.is_empty() {
                return Err(Error::WrongNumberOfArguments {
                    instruction: DATA_DIRECTIVE.to_string(),
                    expected: 1,
                    found: 0,
                });
            }
            let values = operands
                .iter()
                .map(Operand::as_value)
                .collect::<Result<_, _>>()?;
            return Ok(InstructionKind::Data(values));
        }

        let opcode = Opcode::from_str(mnemonic)
            .map_err(|_| Error::UnknownInstruction(mnemonic.clone()))?;
        if operands.len() != opcode.num_args() {
            return Err(Error::WrongNumberOfArguments {
                instruction: opcode.to_string(),
                expected: opcode.num_args(),
                found: operands.len(),
            });
        }

        let kind = match (opcode.format(), operands.as_slice()) {
            // cmp Ra,Rb
            (Format::Rrr, [a, b]) => InstructionKind::Rrr {
                opcode,
                d: Register(0),
                a: a.as_register()?,
                b: b.as_register()?,
            },
            (Format::Rrr, [d, a, b]) => InstructionKind::Rrr {
                opcode,
                d: d.as_register()?,
                a: a.as_register()?,
                b: b.as_register()?,
            },
            // jump disp[Ra]
            (Format::Rx, [address]) => {
                let (disp, index) = address.as_address()?;
                InstructionKind::Rx {
                    opcode,
                    d: Register(0),
                    disp,
                    index,
                }
            }
            (Format::Rx, [d, address]) => {
                let (disp, index) = address.as_address()?;
                InstructionKind::Rx {
                    opcode,
                    d: d.as_register()?,
                    disp,
                    index,
                }
            }
            _ => unreachable!("operand count checked against num_args"),
        };
        Ok(kind)
    }

    /// Number of words emitted.
    pub(crate) fn size(&self) -> usize {
        match self {
            InstructionKind::Rrr { opcode, .. } | InstructionKind::Rx { opcode, .. } => {
                opcode.size()
            }
            InstructionKind::Data(values) => values.len(),
        }
    }
}

impl InstructionWithLine {
    pub(crate) fn new(line: usize, parsed: ParsedLine) -> Result<Self, Error> {
        let kind = parsed
            .statement
            .as_ref()
            .map(InstructionKind::from_statement)
            .transpose()?;
        Ok(Self {
            line,
            label: parsed.label,
            kind,
        })
    }
}

fn resolve(labels: &Labels, value: &Value) -> Result<Word, Error> {
    match value {
        Value::Literal(word) => Ok(*word),
        Value::Label(label) => labels
            .get(label)
            .copied()
            .ok_or_else(|| Error::UndefinedLabel(label.clone())),
    }
}

/// First pass: assign an address to every label.
///
/// Returns the labels and the per-line errors found.
fn get_labels(instructions: &[InstructionWithLine]) -> (Labels, Vec<(usize, Error)>) {
    let mut labels = HashMap::new();
    let mut errors = Vec::new();
    let mut address = 0usize;
    for instruction in instructions {
        if let Some(label) = &instruction.label {
            if address >= MEMORY_WORDS {
                errors.push((instruction.line, Error::ProgramTooLarge(address)));
            } else if labels.insert(label.clone(), address as Address).is_some() {
                errors.push((instruction.line, Error::DuplicateLabel(label.clone())));
            }
        }
        address += instruction.kind.as_ref().map_or(0, InstructionKind::size);
    }
    if address > MEMORY_WORDS {
        errors.push((0, Error::ProgramTooLarge(address)));
    }
    (labels, errors)
}

/// Second pass: emit the words of `instruction` at the end of `image`.
fn encode_instruction(
    image: &mut ProgramImage,
    instruction: &InstructionWithLine,
) -> Result<(), Error> {
    let Some(kind) = &instruction.kind else {
        return Ok(());
    };
    let start = image.words.len();
    match kind {
        InstructionKind::Rrr { opcode, d, a, b } => {
            let inst = Instruction::Rrr {
                opcode: *opcode,
                d: d.0,
                a: a.0,
                b: b.0,
            };
            image.words.extend(inst.encode());
        }
        InstructionKind::Rx {
            opcode,
            d,
            disp,
            index,
        } => {
            let inst = Instruction::Rx {
                opcode: *opcode,
                d: d.0,
                a: index.0,
                disp: resolve(&image.labels, disp)?,
            };
            image.words.extend(inst.encode());
        }
        InstructionKind::Data(values) => {
            for value in values {
                let word = resolve(&image.labels, value)?;
                image.words.push(word);
            }
        }
    }
    for address in start..image.words.len() {
        image.line_map.insert(address as Address, instruction.line);
    }
    Ok(())
}

/// Builds the program image, collecting every error with its line number.
///
/// Words of lines that fail to encode are replaced by zeros so the addresses
/// of later lines stay in place, and errors from all lines are reported.
pub(crate) fn get_full_prom_and_labels(
    instructions: &[InstructionWithLine],
) -> Result<ProgramImage, Vec<(usize, Error)>> {
    let (labels, mut errors) = get_labels(instructions);
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut image = ProgramImage {
        labels,
        ..Default::default()
    };
    for instruction in instructions {
        let start = image.words.len();
        if let Err(err) = encode_instruction(&mut image, instruction) {
            errors.push((instruction.line, err));
            let size = instruction.kind.as_ref().map_or(0, InstructionKind::size);
            image.words.resize(start + size, 0);
        }
    }

    if errors.is_empty() {
        Ok(image)
    } else {
        Err(errors)
    }
}

impl std::fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstructionKind::Rrr {
                opcode: opcode @ Opcode::Cmp,
                a,
                b,
                ..
            } => write!(f, "{opcode} R{},R{}", a.0, b.0),
            InstructionKind::Rrr { opcode, d, a, b } => {
                write!(f, "{opcode} R{},R{},R{}", d.0, a.0, b.0)
            }
            InstructionKind::Rx {
                opcode,
                d,
                disp,
                index,
            } => match opcode.num_args() {
                1 => write!(f, "{opcode} {disp}[R{}]", index.0),
                _ => write!(f, "{opcode} R{},{disp}[R{}]", d.0, index.0),
            },
            InstructionKind::Data(values) => {
                write!(f, "{DATA_DIRECTIVE}")?;
                for (i, value) in values.iter().enumerate() {
                    let sep = if i == 0 { " " } else { "," };
                    write!(f, "{sep}{value}")?;
                }
                Ok(())
            }
        }
    }
}
