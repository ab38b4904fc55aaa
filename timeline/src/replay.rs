//! State reconstruction by delta replay.
//!
//! Every reconstruction starts from the timeline's single initial snapshot and
//! applies deltas in order, so its cost is linear in the requested step.
//! Callers that jump around a long timeline should keep the states they need.

use std::ops::Range;

use tracing::trace;

use crate::{
    error::{Result, TimelineError},
    state::MachineState,
    timeline::Timeline,
};

fn check_step(timeline: &Timeline, step: usize) -> Result<()> {
    let total_steps = timeline.total_steps();
    if step > total_steps {
        return Err(TimelineError::OutOfRange { step, total_steps });
    }
    Ok(())
}

/// Returns a freshly owned copy of the machine after `step` instructions.
pub fn state_at_step(timeline: &Timeline, step: usize) -> Result<MachineState> {
    check_step(timeline, step)?;
    let mut state = timeline.initial_state().clone();
    replay_range(timeline, &mut state, 0..step);
    Ok(state)
}

/// Like [`state_at_step`], but reuses the allocation of `buf`.
///
/// On error `buf` is left untouched.
pub fn state_at_step_into(timeline: &Timeline, step: usize, buf: &mut MachineState) -> Result<()> {
    check_step(timeline, step)?;
    buf.clone_from(timeline.initial_state());
    replay_range(timeline, buf, 0..step);
    Ok(())
}

/// Applies `deltas[range]` onto `state`, which must be the machine at step
/// `range.start`.
pub(crate) fn replay_range(timeline: &Timeline, state: &mut MachineState, range: Range<usize>) {
    trace!(from = range.start, to = range.end, "replaying deltas");
    for delta in &timeline.deltas()[range] {
        delta.apply(state);
    }
}
