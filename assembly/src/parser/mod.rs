use std::str::FromStr;

use pest::{iterators::Pair, Parser};

mod instruction_args;
mod instructions_with_labels;

use instruction_args::{Operand, Register, Value};
pub use instruction_args::BadArgumentError;
pub use instructions_with_labels::Error;
pub(crate) use instructions_with_labels::{
    get_full_prom_and_labels, InstructionWithLine, ProgramImage,
};

#[derive(pest_derive::Parser)]
#[grammar = "parser/asm.pest"]
struct AsmParser;

/// One source line, split into its optional label and statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ParsedLine {
    pub(crate) label: Option<String>,
    pub(crate) statement: Option<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Statement {
    pub(crate) mnemonic: String,
    pub(crate) operands: Vec<Operand>,
}

#[inline]
fn get_first_inner<'a>(pair: Pair<'a, Rule>) -> Option<Pair<'a, Rule>> {
    pair.into_inner().next()
}

fn parse_value(pair: Pair<'_, Rule>) -> Result<Value, Error> {
    Ok(Value::from_str(pair.as_str())?)
}

fn parse_operand(pair: Pair<'_, Rule>) -> Result<Operand, Error> {
    let text = pair.as_str().to_string();
    let inner = get_first_inner(pair).ok_or_else(|| Error::Syntax(text.clone()))?;
    match inner.as_rule() {
        Rule::register => Ok(Operand::Register(Register::from_str(inner.as_str())?)),
        Rule::value => Ok(Operand::Value(parse_value(inner)?)),
        Rule::indexed => {
            let mut parts = inner.into_inner();
            let (Some(disp), Some(index)) = (parts.next(), parts.next()) else {
                return Err(Error::Syntax(text));
            };
            Ok(Operand::Indexed(
                parse_value(disp)?,
                Register::from_str(index.as_str())?,
            ))
        }
        _ => Err(Error::Syntax(text)),
    }
}

fn parse_statement(pair: Pair<'_, Rule>) -> Result<Statement, Error> {
    let mut inner = pair.into_inner();
    let mnemonic = inner
        .next()
        .ok_or(Error::Syntax(String::new()))?
        .as_str()
        .to_string();
    let operands = inner.map(parse_operand).collect::<Result<_, _>>()?;
    Ok(Statement { mnemonic, operands })
}

/// Parses a single source line (without its line terminator).
pub(crate) fn parse_line(input: &str) -> Result<ParsedLine, Error> {
    let line = AsmParser::parse(Rule::line, input)
        .map_err(|err| Error::Syntax(err.variant.message().into_owned()))?
        .next()
        .ok_or_else(|| Error::Syntax(input.to_string()))?;

    let mut parsed = ParsedLine::default();
    for pair in line.into_inner() {
        match pair.as_rule() {
            Rule::label => {
                let name = get_first_inner(pair).ok_or_else(|| Error::Syntax(input.to_string()))?;
                parsed.label = Some(name.as_str().to_string());
            }
            Rule::statement => parsed.statement = Some(parse_statement(pair)?),
            Rule::EOI => (),
            _ => return Err(Error::Syntax(pair.as_str().to_string())),
        }
    }
    Ok(parsed)
}

/// Parses every line of `input`, pairing each result with its 1-based line
/// number.
pub(crate) fn parse_program(input: &str) -> Vec<(usize, Result<ParsedLine, Error>)> {
    input
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, parse_line(line)))
        .collect()
}
