//! Fetcher core: pure URL classification, input parsing and the progress state machine.
mod event;
mod lines;
mod progress;
mod signature;

pub use event::{PipelineEvent, Stage};
pub use lines::{dedupe_preserving_order, parse_lines};
pub use progress::{ProgressState, ProgressView, StageView};
pub use signature::{TypeSignatures, DEFAULT_EXTENSIONS};
