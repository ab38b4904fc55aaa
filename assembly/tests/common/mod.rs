#![allow(dead_code)]

use steptrace_asm::{Assembler, Emulator};
use steptrace_timeline::{run, MachineState, Timeline, TimelineConfig, Word};

pub const SUM: &str = include_str!("../../../demos/sum.asm");
pub const COUNTDOWN: &str = include_str!("../../../demos/countdown.asm");
pub const ECHO_SUM: &str = include_str!("../../../demos/echo_sum.asm");

/// Records `source` with the default configuration.
pub fn record(source: &str, input: &[Word]) -> anyhow::Result<Timeline> {
    record_with(source, input, &TimelineConfig::default())
}

pub fn record_with(
    source: &str,
    input: &[Word],
    config: &TimelineConfig,
) -> anyhow::Result<Timeline> {
    let mut emulator = Emulator::with_input(input.to_vec());
    Ok(run(&mut emulator, &Assembler, "test", source, config)?)
}

/// Executes `source` directly for `steps` instructions, without a timeline.
pub fn execute_directly(
    source: &str,
    input: &[Word],
    steps: usize,
) -> anyhow::Result<MachineState> {
    let program = Assembler::from_code(source)
        .map_err(|diagnostics| anyhow::anyhow!("{diagnostics:?}"))?;
    let mut state = MachineState::new();
    anyhow::ensure!(state.load_program(program.object_code()));
    Emulator::with_input(input.to_vec()).run(&mut state, steps)?;
    Ok(state)
}

/// Cells recorded in a delta whose value equals the one at the step before.
/// Empty for a well-formed timeline.
pub fn unchanged_cells(timeline: &Timeline) -> anyhow::Result<Vec<String>> {
    let mut unchanged = Vec::new();
    for (i, delta) in timeline.deltas().iter().enumerate() {
        let before = timeline.state_at_step(i)?;
        for (&index, &value) in delta.changed_registers() {
            if before.reg(index) == value {
                unchanged.push(format!("step {}: R{index} = {value}", i + 1));
            }
        }
        for (&addr, &value) in delta.changed_memory() {
            if before.mem(addr) == value {
                unchanged.push(format!("step {}: mem[{addr:#06x}] = {value}", i + 1));
            }
        }
    }
    Ok(unchanged)
}
