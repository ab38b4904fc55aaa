use steptrace_timeline::{Address, AssemblyOutput, Diagnostic, LineMap, ProgramAssembler, Word};
use tracing::{debug, instrument};

use crate::parser::{
    get_full_prom_and_labels, parse_program, Error, InstructionWithLine, ProgramImage,
};

/// Object code with its symbol table and source line mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledProgram {
    image: ProgramImage,
}

impl AssembledProgram {
    pub fn object_code(&self) -> &[Word] {
        &self.image.words
    }

    /// Address of `label`, if the program defines it.
    pub fn label(&self, label: &str) -> Option<Address> {
        self.image.labels.get(label).copied()
    }

    pub const fn line_map(&self) -> &LineMap {
        &self.image.line_map
    }
}

/// Two-pass assembler for the reference machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Assembler;

fn to_diagnostics(errors: Vec<(usize, Error)>) -> Vec<Diagnostic> {
    errors
        .into_iter()
        .map(|(line, err)| Diagnostic {
            line,
            message: err.to_string(),
        })
        .collect()
}

impl Assembler {
    /// Assembles `source`, returning every diagnostic if any line is wrong.
    pub fn from_code(source: &str) -> Result<AssembledProgram, Vec<Diagnostic>> {
        let mut instructions = Vec::new();
        let mut errors = Vec::new();
        for (line, parsed) in parse_program(source) {
            match parsed.and_then(|parsed| InstructionWithLine::new(line, parsed)) {
                Ok(instruction) => instructions.push(instruction),
                Err(err) => errors.push((line, err)),
            }
        }
        if !errors.is_empty() {
            return Err(to_diagnostics(errors));
        }

        let image = get_full_prom_and_labels(&instructions).map_err(to_diagnostics)?;
        Ok(AssembledProgram { image })
    }
}

impl ProgramAssembler for Assembler {
    #[instrument(level = "debug", skip_all, fields(module = module_name))]
    fn assemble(&self, module_name: &str, source: &str) -> AssemblyOutput {
        match Self::from_code(source) {
            Ok(program) => {
                debug!(words = program.object_code().len(), "assembled");
                AssemblyOutput {
                    object_code: program.image.words,
                    error_count: 0,
                    diagnostics: Vec::new(),
                    line_map: program.image.line_map,
                }
            }
            Err(diagnostics) => AssemblyOutput {
                error_count: diagnostics.len(),
                diagnostics,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_output() {
        let output = Assembler.assemble("main", "load R1,x\ntrap R0,R0,R0\nx: data 42\n");
        assert_eq!(output.error_count, 0);
        assert_eq!(output.object_code, vec![0xf101, 3, 0xd000, 42]);
        assert_eq!(output.line_map.get(&2), Some(&2));
        assert_eq!(output.line_map.get(&3), Some(&3));
    }

    #[test]
    fn test_diagnostics_carry_lines() {
        let output = Assembler.assemble("main", "add R1,R2,R3\nbogus R1\n\nadd R1,R2\n");
        assert_eq!(output.error_count, 2);
        assert!(output.object_code.is_empty());
        assert_eq!(output.diagnostics[0].line, 2);
        assert_eq!(output.diagnostics[1].line, 4);
        assert!(output.diagnostics[0].to_string().starts_with("line 2: Unknown instruction"));
    }

    #[test]
    fn test_labels() {
        let program = Assembler::from_code("start: add R1,R1,R1\nend: jump start").unwrap();
        assert_eq!(program.label("start"), Some(0));
        assert_eq!(program.label("end"), Some(1));
        assert_eq!(program.label("missing"), None);
        assert_eq!(program.object_code().len(), 3);
        assert_eq!(program.line_map().get(&2), Some(&2));
    }
}
