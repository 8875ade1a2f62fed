use std::fmt;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Discovery,
    Filtering,
    Validation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Discovery => write!(f, "discovery"),
            Stage::Filtering => write!(f, "filtering"),
            Stage::Validation => write!(f, "validation"),
        }
    }
}

/// Everything the pipeline reports while it runs.
///
/// Events are informational only; a sink that drops them does not change the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A stage began with `total` units of work (domains or URLs).
    StageStarted { stage: Stage, total: usize },
    /// `completed` of `total` units are finished.
    StageProgress {
        stage: Stage,
        completed: usize,
        total: usize,
    },
    /// A stage finished; `kept` is the number of items it passed on.
    StageCompleted { stage: Stage, kept: usize },
    /// The archive answered for `domain`.
    DomainFetched {
        domain: String,
        candidates: usize,
        matched: usize,
    },
    /// The archive query for `domain` failed; the run continues without it.
    DomainFailed { domain: String, reason: String },
    /// The run was cancelled; results gathered so far are kept.
    Cancelled,
}
