//! Recording options.

/// Default upper bound on the number of instructions recorded per run.
pub const DEFAULT_STEP_CAP: usize = 100_000;

/// Which memory words are compared when computing a delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemoryScan {
    /// Only the addresses the engine reports as written.
    #[default]
    WriteSet,
    /// Every address. O(memory size) per instruction; useful to check an
    /// engine's write reporting.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineConfig {
    /// Maximum number of instructions to record. Reaching it ends the run with
    /// [`RunStatus::StepCapReached`](crate::RunStatus::StepCapReached).
    pub step_cap: usize,
    pub memory_scan: MemoryScan,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            step_cap: DEFAULT_STEP_CAP,
            memory_scan: MemoryScan::default(),
        }
    }
}

impl TimelineConfig {
    pub fn with_step_cap(mut self, step_cap: usize) -> Self {
        self.step_cap = step_cap;
        self
    }

    pub fn with_memory_scan(mut self, memory_scan: MemoryScan) -> Self {
        self.memory_scan = memory_scan;
        self
    }
}
