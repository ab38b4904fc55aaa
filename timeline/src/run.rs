//! Drives an execution engine and records its run as a [`Timeline`].

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, instrument, trace, warn};

use crate::{
    config::TimelineConfig,
    delta::Delta,
    engine::{Diagnostic, ExecutionEngine, LineMap, ProgramAssembler},
    error::{AssemblyFailure, RunError},
    state::MachineState,
    timeline::{RunStatus, Timeline, TimelineRecorder},
};

/// Assembles `source`, loads it into a freshly reset machine and records its
/// execution until it halts or `config.step_cap` instructions have run.
///
/// Fails before executing anything if the source does not assemble.
pub fn run<E, A>(
    engine: &mut E,
    assembler: &A,
    module_name: &str,
    source: &str,
    config: &TimelineConfig,
) -> Result<Timeline, RunError>
where
    E: ExecutionEngine,
    A: ProgramAssembler + ?Sized,
{
    run_with_cancel(
        engine,
        assembler,
        module_name,
        source,
        config,
        &AtomicBool::new(false),
    )
}

/// Like [`run`], but stops with [`RunStatus::Cancelled`] as soon as `cancel`
/// is observed set between two instructions.
#[instrument(level = "debug", skip_all, fields(module = module_name))]
pub fn run_with_cancel<E, A>(
    engine: &mut E,
    assembler: &A,
    module_name: &str,
    source: &str,
    config: &TimelineConfig,
    cancel: &AtomicBool,
) -> Result<Timeline, RunError>
where
    E: ExecutionEngine,
    A: ProgramAssembler + ?Sized,
{
    let output = assembler.assemble(module_name, source);
    if output.error_count > 0 {
        warn!(errors = output.error_count, "assembly failed");
        return Err(AssemblyFailure {
            module: module_name.to_string(),
            error_count: output.error_count,
            diagnostics: output.diagnostics,
        }
        .into());
    }

    let mut initial = engine.reset_state();
    if !initial.load_program(&output.object_code) {
        return Err(RunError::ProgramTooLarge {
            words: output.object_code.len(),
        });
    }
    debug!(words = output.object_code.len(), "program loaded");

    Ok(record_inner(
        engine,
        initial,
        config,
        cancel,
        output.diagnostics,
        output.line_map,
    ))
}

/// Records the execution of whatever program `initial` already holds.
pub fn record<E: ExecutionEngine>(
    engine: &mut E,
    initial: MachineState,
    config: &TimelineConfig,
) -> Timeline {
    record_inner(
        engine,
        initial,
        config,
        &AtomicBool::new(false),
        Vec::new(),
        LineMap::new(),
    )
}

fn record_inner<E: ExecutionEngine>(
    engine: &mut E,
    initial: MachineState,
    config: &TimelineConfig,
    cancel: &AtomicBool,
    diagnostics: Vec<Diagnostic>,
    line_map: LineMap,
) -> Timeline {
    let mut recorder = TimelineRecorder::new(initial);
    // `state` is what the engine mutates; `previous` trails one step behind and
    // is advanced by applying each new delta, which avoids a full copy per step.
    let mut state = recorder.initial_state().clone();
    let mut previous = state.clone();

    let status = loop {
        if engine.is_halted(&state) {
            break if state.blocked {
                RunStatus::Blocked
            } else {
                RunStatus::Halted
            };
        }
        if recorder.len() >= config.step_cap {
            warn!(step_cap = config.step_cap, "step cap reached");
            break RunStatus::StepCapReached;
        }
        if cancel.load(Ordering::Relaxed) {
            info!(steps = recorder.len(), "run cancelled");
            break RunStatus::Cancelled;
        }

        let access = match engine.execute_one(&mut state) {
            Ok(access) => access,
            Err(err) => {
                warn!(step = recorder.len(), pc = state.pc, %err, "execution fault");
                break RunStatus::Faulted(err.to_string());
            }
        };

        let delta = Delta::compute(&previous, &state, &access, config.memory_scan);
        trace!(
            step = recorder.len() + 1,
            instr_addr = delta.instr_addr(),
            changed = delta.changed_cells(),
            "recorded delta"
        );
        delta.apply(&mut previous);
        recorder.push(delta);
    };

    info!(steps = recorder.len(), %status, "run recorded");
    recorder.finish(status, diagnostics, line_map)
}
