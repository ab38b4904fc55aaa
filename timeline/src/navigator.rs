//! Cursor over a recorded [`Timeline`].

use std::{
    cell::{Ref, RefCell},
    sync::Arc,
};

use tracing::trace;

use crate::{
    delta::Delta,
    error::{Result, TimelineError},
    replay,
    state::MachineState,
    timeline::Timeline,
};

/// The last reconstructed state, keyed by its step.
#[derive(Debug)]
struct Memo {
    step: usize,
    state: MachineState,
    /// Number of times the memo had to be brought to a new step.
    refreshes: usize,
}

/// Tracks the current step of a timeline and reconstructs the machine there
/// on demand.
///
/// The current step always lies in `0..=total_steps`. Reconstructed states
/// are memoized, so reading the current state repeatedly without moving
/// replays nothing.
#[derive(Debug)]
pub struct Navigator {
    timeline: Arc<Timeline>,
    current: usize,
    memo: RefCell<Memo>,
}

impl Navigator {
    /// Creates a navigator positioned at step 0.
    pub fn new(timeline: Arc<Timeline>) -> Self {
        let memo = Memo {
            step: 0,
            state: timeline.initial_state().clone(),
            refreshes: 0,
        };
        Self {
            timeline,
            current: 0,
            memo: RefCell::new(memo),
        }
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    pub const fn current_step(&self) -> usize {
        self.current
    }

    pub fn total_steps(&self) -> usize {
        self.timeline.total_steps()
    }

    pub fn can_step_forward(&self) -> bool {
        self.current < self.total_steps()
    }

    pub const fn can_step_backward(&self) -> bool {
        self.current > 0
    }

    /// Moves to step `step`. Out-of-range requests leave the navigator where
    /// it was.
    pub fn go_to_step(&mut self, step: usize) -> Result<()> {
        let total_steps = self.total_steps();
        if step > total_steps {
            return Err(TimelineError::OutOfRange { step, total_steps });
        }
        self.current = step;
        Ok(())
    }

    /// Advances one step. Returns `false` if already at the last step.
    pub fn next_step(&mut self) -> bool {
        if !self.can_step_forward() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Goes back one step. Returns `false` if already at step 0.
    pub fn prev_step(&mut self) -> bool {
        if !self.can_step_backward() {
            return false;
        }
        self.current -= 1;
        true
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }

    pub fn go_to_end(&mut self) {
        self.current = self.total_steps();
    }

    /// The machine at the current step.
    pub fn current_state(&self) -> Ref<'_, MachineState> {
        self.refresh_memo();
        Ref::map(self.memo.borrow(), |memo| &memo.state)
    }

    /// An owned copy of the machine one step before the current one, or
    /// `None` at step 0.
    pub fn previous_state(&self) -> Option<MachineState> {
        let step = self.current.checked_sub(1)?;
        if self.memo.borrow().step == step {
            return Some(self.memo.borrow().state.clone());
        }
        replay::state_at_step(&self.timeline, step).ok()
    }

    /// The delta that led into the current step, or `None` at step 0.
    pub fn current_delta(&self) -> Option<&Delta> {
        self.timeline.delta_into(self.current)
    }

    /// Brings the memo to the current step. Moving forward continues replay
    /// from the memoized state; moving backward replays from the initial
    /// snapshot into the memo's buffer.
    ///
    /// A fresh memo is only borrowed shared, so earlier reads may still be
    /// held. Moving the cursor takes `&mut self`, which releases them.
    fn refresh_memo(&self) {
        if self.memo.borrow().step == self.current {
            return;
        }

        let mut memo = self.memo.borrow_mut();
        trace!(from = memo.step, to = self.current, "refreshing memoized state");
        let memo = &mut *memo;
        let start = if self.current > memo.step {
            memo.step
        } else {
            memo.state.clone_from(self.timeline.initial_state());
            0
        };
        replay::replay_range(&self.timeline, &mut memo.state, start..self.current);
        memo.step = self.current;
        memo.refreshes += 1;
    }

    #[cfg(test)]
    fn memo_refreshes(&self) -> usize {
        self.memo.borrow().refreshes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{record_script, ScriptOp};

    fn navigator() -> Navigator {
        let timeline = record_script(&[
            ScriptOp::SetReg(1, 1),
            ScriptOp::SetReg(2, 2),
            ScriptOp::SetMem(0x10, 3),
            ScriptOp::SetReg(1, 4),
            ScriptOp::Halt,
        ]);
        Navigator::new(Arc::new(timeline))
    }

    #[test]
    fn test_bounds() {
        let mut nav = navigator();
        assert_eq!(nav.current_step(), 0);
        assert!(!nav.can_step_backward());
        assert!(!nav.prev_step());
        assert_eq!(nav.current_step(), 0);

        for expected in 1..=5 {
            assert!(nav.next_step());
            assert_eq!(nav.current_step(), expected);
        }
        assert!(!nav.can_step_forward());
        assert!(!nav.next_step());
        assert_eq!(nav.current_step(), 5);

        assert_eq!(
            nav.go_to_step(6),
            Err(TimelineError::OutOfRange {
                step: 6,
                total_steps: 5
            })
        );
        assert_eq!(nav.current_step(), 5);

        nav.reset();
        assert_eq!(nav.current_step(), 0);
        nav.go_to_end();
        assert_eq!(nav.current_step(), 5);
    }

    #[test]
    fn test_current_and_previous() {
        let mut nav = navigator();
        assert!(nav.current_delta().is_none());
        assert!(nav.previous_state().is_none());
        assert_eq!(&*nav.current_state(), nav.timeline().initial_state());

        nav.go_to_step(3).unwrap();
        assert_eq!(nav.current_state().mem(0x10), 3);
        assert_eq!(nav.current_state().reg(2), 2);
        let previous = nav.previous_state().unwrap();
        assert_eq!(previous.mem(0x10), 0);
        assert_eq!(previous.reg(2), 2);
        assert_eq!(
            nav.current_delta().map(|d| d.changed_memory().len()),
            Some(1)
        );

        nav.go_to_end();
        assert!(nav.current_state().halted);
        assert!(!nav.previous_state().unwrap().halted);
    }

    #[test]
    fn test_repeated_reads_are_memoized() {
        let mut nav = navigator();
        nav.go_to_step(4).unwrap();
        let first = nav.current_state().clone();
        let _ = nav.current_state();
        let _ = nav.current_state();
        assert_eq!(nav.memo_refreshes(), 1);
        assert_eq!(*nav.current_state(), first);

        // Moving away and back costs one refresh per distinct read.
        nav.prev_step();
        nav.next_step();
        let _ = nav.current_state();
        assert_eq!(nav.memo_refreshes(), 1);

        nav.reset();
        let _ = nav.current_state();
        assert_eq!(nav.memo_refreshes(), 2);
    }

    #[test]
    fn test_overlapping_reads() {
        let mut nav = navigator();
        nav.go_to_step(2).unwrap();
        let first = nav.current_state();
        let second = nav.current_state();
        assert_eq!(*first, *second);
        assert_eq!(second.reg(2), 2);
        let previous = nav.previous_state().unwrap();
        assert_eq!(previous.reg(1), first.reg(1));
        drop((first, second));
        assert_eq!(nav.memo_refreshes(), 1);
    }

    #[test]
    fn test_memo_matches_fresh_replay() {
        let mut nav = navigator();
        let total = nav.total_steps();
        for step in [3, 1, 5, 0, 2, 4, 4, 5] {
            nav.go_to_step(step).unwrap();
            assert_eq!(
                *nav.current_state(),
                replay::state_at_step(nav.timeline(), step).unwrap()
            );
        }
        assert_eq!(nav.current_step(), total);
    }
}
