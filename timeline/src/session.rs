//! The public debugging facade: run a program, then move through its
//! timeline.

use std::{
    cell::Ref,
    sync::{atomic::AtomicBool, Arc},
};

use tracing::debug;

use crate::{
    config::TimelineConfig,
    delta::Delta,
    engine::{ExecutionEngine, ProgramAssembler},
    error::{Result, RunError, TimelineError},
    navigator::Navigator,
    run::run_with_cancel,
    state::MachineState,
    timeline::Timeline,
};

const DEFAULT_MODULE_NAME: &str = "main";

/// Owns an engine and an assembler, and at most one live timeline.
///
/// Every [`run`](Self::run) replaces the previous timeline and its navigation
/// state wholesale. Before the first successful run, or after
/// [`clear`](Self::clear), the session is empty: observers report step 0 of 0
/// and navigation has no effect.
pub struct Session<E, A> {
    engine: E,
    assembler: A,
    config: TimelineConfig,
    module_name: String,
    navigator: Option<Navigator>,
}

impl<E, A> Session<E, A>
where
    E: ExecutionEngine,
    A: ProgramAssembler,
{
    pub fn new(engine: E, assembler: A) -> Self {
        Self::with_config(engine, assembler, TimelineConfig::default())
    }

    pub fn with_config(engine: E, assembler: A, config: TimelineConfig) -> Self {
        Self {
            engine,
            assembler,
            config,
            module_name: DEFAULT_MODULE_NAME.to_string(),
            navigator: None,
        }
    }

    /// Sets the module name passed to the assembler.
    pub fn with_module_name(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = module_name.into();
        self
    }

    pub const fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TimelineConfig {
        &mut self.config
    }

    pub const fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Assembles and records `source`, then positions the new timeline at
    /// step 0.
    ///
    /// The previous timeline is discarded whether or not this run succeeds.
    pub fn run(&mut self, source: &str) -> Result<Arc<Timeline>, RunError> {
        self.run_with_cancel(source, &AtomicBool::new(false))
    }

    /// Like [`run`](Self::run), stopping early once `cancel` is set.
    pub fn run_with_cancel(
        &mut self,
        source: &str,
        cancel: &AtomicBool,
    ) -> Result<Arc<Timeline>, RunError> {
        self.navigator = None;
        let timeline = Arc::new(run_with_cancel(
            &mut self.engine,
            &self.assembler,
            &self.module_name,
            source,
            &self.config,
            cancel,
        )?);
        debug!(steps = timeline.total_steps(), "new timeline");
        self.navigator = Some(Navigator::new(timeline.clone()));
        Ok(timeline)
    }

    /// Discards the current timeline.
    pub fn clear(&mut self) {
        self.navigator = None;
    }
}

impl<E, A> Session<E, A> {
    pub fn timeline(&self) -> Option<&Arc<Timeline>> {
        self.navigator.as_ref().map(Navigator::timeline)
    }

    pub const fn navigator(&self) -> Option<&Navigator> {
        self.navigator.as_ref()
    }

    pub fn current_step(&self) -> usize {
        self.navigator.as_ref().map_or(0, Navigator::current_step)
    }

    pub fn total_steps(&self) -> usize {
        self.navigator.as_ref().map_or(0, Navigator::total_steps)
    }

    pub fn current_state(&self) -> Option<Ref<'_, MachineState>> {
        self.navigator.as_ref().map(Navigator::current_state)
    }

    pub fn previous_state(&self) -> Option<MachineState> {
        self.navigator.as_ref()?.previous_state()
    }

    pub fn current_delta(&self) -> Option<&Delta> {
        self.navigator.as_ref()?.current_delta()
    }

    pub fn can_step_forward(&self) -> bool {
        self.navigator.as_ref().is_some_and(Navigator::can_step_forward)
    }

    pub fn can_step_backward(&self) -> bool {
        self.navigator
            .as_ref()
            .is_some_and(Navigator::can_step_backward)
    }

    pub fn next_step(&mut self) -> bool {
        self.navigator.as_mut().is_some_and(Navigator::next_step)
    }

    pub fn prev_step(&mut self) -> bool {
        self.navigator.as_mut().is_some_and(Navigator::prev_step)
    }

    pub fn go_to_step(&mut self, step: usize) -> Result<()> {
        self.navigator
            .as_mut()
            .ok_or(TimelineError::NoTimeline)?
            .go_to_step(step)
    }

    pub fn reset(&mut self) {
        if let Some(navigator) = self.navigator.as_mut() {
            navigator.reset();
        }
    }

    pub fn go_to_end(&mut self) {
        if let Some(navigator) = self.navigator.as_mut() {
            navigator.go_to_end();
        }
    }
}
