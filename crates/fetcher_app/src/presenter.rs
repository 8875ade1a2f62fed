//! Turns pipeline events into progress log lines on a dedicated thread.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use fetch_logging::{fetch_debug, fetch_info, fetch_warn};
use fetcher_core::{PipelineEvent, ProgressState, ProgressView, Stage};

/// Percentage step between validation progress lines.
const PROGRESS_STEP: u8 = 10;

/// Consumes events until every sender is dropped, then returns the final view.
pub fn spawn(events: mpsc::Receiver<PipelineEvent>) -> JoinHandle<ProgressView> {
    thread::spawn(move || {
        let mut state = ProgressState::new();
        let mut last_reported = 0u8;
        while let Ok(event) = events.recv() {
            state.apply(&event);
            match &event {
                PipelineEvent::StageStarted { stage, total } => {
                    last_reported = 0;
                    fetch_info!("Starting {} of {} {}", stage, total, unit(*stage));
                }
                PipelineEvent::StageProgress { stage, .. } => {
                    let view = state.view().stage(*stage);
                    let bucket = view.percent() / PROGRESS_STEP * PROGRESS_STEP;
                    if *stage == Stage::Validation && bucket > last_reported {
                        last_reported = bucket;
                        fetch_info!(
                            "Checking URLs: {}% ({}/{})",
                            bucket,
                            view.completed,
                            view.total
                        );
                    }
                }
                PipelineEvent::StageCompleted { stage, kept } => {
                    fetch_info!("Finished {}: {} kept", stage, kept);
                }
                PipelineEvent::DomainFetched {
                    domain,
                    candidates,
                    matched,
                } => {
                    fetch_debug!("{}: {} candidates, {} matched", domain, candidates, matched);
                }
                PipelineEvent::DomainFailed { domain, reason } => {
                    fetch_warn!("Skipped {}: {}", domain, reason);
                }
                PipelineEvent::Cancelled => {
                    fetch_warn!("Cancelled; results so far are kept");
                }
            }
        }
        state.view()
    })
}

fn unit(stage: Stage) -> &'static str {
    match stage {
        Stage::Discovery => "domains",
        Stage::Filtering | Stage::Validation => "URLs",
    }
}
