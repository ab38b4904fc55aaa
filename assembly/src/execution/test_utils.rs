use steptrace_timeline::{MachineState, StepAccess, Word};

use super::{context::ExecContext, emulator::InputQueue};

/// A zeroed machine with `program` loaded at address 0.
pub(crate) fn load(program: &[Word]) -> MachineState {
    let mut state = MachineState::new();
    assert!(state.load_program(program));
    state
}

/// Runs `f` against a context over a zeroed machine, returning what it
/// recorded.
pub(crate) fn with_context(f: impl FnOnce(&mut ExecContext)) -> StepAccess {
    with_context_and_input(&[], f)
}

pub(crate) fn with_context_and_input(
    input: &[Word],
    f: impl FnOnce(&mut ExecContext),
) -> StepAccess {
    let mut state = MachineState::new();
    let mut input = InputQueue::new(input.to_vec());
    let mut ctx = ExecContext::new(&mut state, &mut input);
    f(&mut ctx);
    ctx.finish()
}
