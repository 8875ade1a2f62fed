use std::collections::BTreeMap;

use crate::{PipelineEvent, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageView {
    pub started: bool,
    pub finished: bool,
    pub completed: usize,
    pub total: usize,
    pub kept: Option<usize>,
}

impl StageView {
    /// Whole-number completion percentage; an empty stage counts as done.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let pct = self.completed.min(self.total) * 100 / self.total;
        pct as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressView {
    pub stages: BTreeMap<Stage, StageView>,
    pub candidates: usize,
    pub matched: usize,
    pub failed_domains: Vec<(String, String)>,
    pub cancelled: bool,
}

impl ProgressView {
    pub fn stage(&self, stage: Stage) -> StageView {
        self.stages.get(&stage).copied().unwrap_or_default()
    }
}

/// Folds pipeline events into a view for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressState {
    view: ProgressView,
    dirty: bool,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { stage, total } => {
                let entry = self.view.stages.entry(*stage).or_default();
                *entry = StageView {
                    started: true,
                    total: *total,
                    ..StageView::default()
                };
            }
            PipelineEvent::StageProgress {
                stage,
                completed,
                total,
            } => {
                let entry = self.view.stages.entry(*stage).or_default();
                entry.started = true;
                entry.total = *total;
                // Completions can be reported out of order; never move backwards.
                entry.completed = entry.completed.max(*completed);
            }
            PipelineEvent::StageCompleted { stage, kept } => {
                let entry = self.view.stages.entry(*stage).or_default();
                entry.started = true;
                entry.finished = true;
                entry.kept = Some(*kept);
            }
            PipelineEvent::DomainFetched {
                candidates,
                matched,
                ..
            } => {
                self.view.candidates += candidates;
                self.view.matched += matched;
            }
            PipelineEvent::DomainFailed { domain, reason } => {
                self.view
                    .failed_domains
                    .push((domain.clone(), reason.clone()));
            }
            PipelineEvent::Cancelled => {
                self.view.cancelled = true;
            }
        }
        self.dirty = true;
    }

    pub fn view(&self) -> ProgressView {
        self.view.clone()
    }

    /// Returns whether any event arrived since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
