//! Error types for recording and navigating timelines.

use thiserror::Error;

use crate::engine::Diagnostic;

/// Errors raised while reconstructing or navigating a timeline.
///
/// These never leave a navigator in a modified state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    /// The requested step is outside `0..=total_steps`.
    #[error("step {step} is out of range (timeline has {total_steps} steps)")]
    OutOfRange { step: usize, total_steps: usize },

    /// Navigation was requested before any program was run.
    #[error("no timeline has been recorded")]
    NoTimeline,
}

/// The program did not assemble. No execution took place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{module}: assembly failed with {error_count} error(s)")]
pub struct AssemblyFailure {
    pub module: String,
    pub error_count: usize,
    /// Diagnostics exactly as reported by the assembler.
    pub diagnostics: Vec<Diagnostic>,
}

/// Errors that prevent a run from producing a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error(transparent)]
    Assembly(#[from] AssemblyFailure),

    #[error("object code of {words} words does not fit in memory")]
    ProgramTooLarge { words: usize },
}

pub type Result<T, E = TimelineError> = std::result::Result<T, E>;
