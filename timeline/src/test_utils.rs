//! A scripted engine for exercising the timeline without a real instruction
//! set. Instruction `i` of the script runs when `pc == i`.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
    access::StepAccess,
    config::TimelineConfig,
    engine::{AssemblyOutput, ExecutionEngine, ProgramAssembler},
    run::record,
    state::{Address, MachineState, RegIndex, Word},
    timeline::Timeline,
};

#[derive(Debug, Clone, Copy)]
pub(crate) enum ScriptOp {
    SetReg(RegIndex, Word),
    SetMem(Address, Word),
    Jump(Address),
    Halt,
    Block,
    Fault,
}

#[derive(Debug, Error)]
pub(crate) enum ScriptError {
    #[error("scripted fault at {0}")]
    Fault(Address),
    #[error("pc {0} is past the end of the script")]
    OffScript(Address),
}

pub(crate) struct ScriptEngine {
    script: Vec<ScriptOp>,
    executed: usize,
}

impl ScriptEngine {
    pub(crate) fn new(script: Vec<ScriptOp>) -> Self {
        Self {
            script,
            executed: 0,
        }
    }

    pub(crate) fn executed(&self) -> usize {
        self.executed
    }
}

impl ExecutionEngine for ScriptEngine {
    type Error = ScriptError;

    fn reset_state(&mut self) -> MachineState {
        self.executed = 0;
        MachineState::new()
    }

    fn execute_one(&mut self, state: &mut MachineState) -> Result<StepAccess, ScriptError> {
        let pc = state.pc;
        let op = *self
            .script
            .get(pc as usize)
            .ok_or(ScriptError::OffScript(pc))?;
        let mut access = StepAccess::default();

        state.ir = pc;
        state.pc = pc + 1;
        match op {
            ScriptOp::SetReg(index, value) => {
                state.set_reg(index, value);
                access.written_registers.insert(index);
            }
            ScriptOp::SetMem(addr, value) => {
                state.set_mem(addr, value);
                state.control.dat = value;
                access.written_addresses.push(addr);
            }
            ScriptOp::Jump(target) => state.pc = target,
            ScriptOp::Halt => state.halted = true,
            ScriptOp::Block => state.blocked = true,
            ScriptOp::Fault => return Err(ScriptError::Fault(pc)),
        }
        state.instr_count += 1;
        self.executed += 1;
        Ok(access)
    }

    fn is_halted(&self, state: &MachineState) -> bool {
        state.halted || state.blocked
    }
}

/// Treats the source as whitespace-separated words, one per line-map entry.
pub(crate) struct ScriptAssembler;

impl ProgramAssembler for ScriptAssembler {
    fn assemble(&self, _module_name: &str, source: &str) -> AssemblyOutput {
        let object_code: Vec<Word> = source
            .split_whitespace()
            .filter_map(|word| word.parse().ok())
            .collect();
        let line_map: BTreeMap<Address, usize> =
            (0..object_code.len()).map(|addr| (addr as Address, 1)).collect();
        AssemblyOutput {
            object_code,
            line_map,
            ..Default::default()
        }
    }
}

pub(crate) fn record_script(script: &[ScriptOp]) -> Timeline {
    let mut engine = ScriptEngine::new(script.to_vec());
    let initial = engine.reset_state();
    record(&mut engine, initial, &TimelineConfig::default())
}
