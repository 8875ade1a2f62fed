use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use fetch_logging::{fetch_debug, fetch_error, fetch_info, fetch_warn};
use fetcher_core::{PipelineEvent, Stage};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{EventSink, LivenessProbe};

#[derive(Debug, Clone)]
pub struct ValidatorSettings {
    /// Upper bound on probes in flight at any moment.
    pub workers: usize,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self { workers: 20 }
    }
}

type WorkQueue = Arc<Mutex<VecDeque<String>>>;

/// Probes a candidate set with a fixed pool of workers and keeps the live URLs.
///
/// Workers pull from one shared queue and report to one collector, so a slow
/// probe only holds up its own worker. Output is in completion order.
pub struct Validator {
    probe: Arc<dyn LivenessProbe>,
    settings: ValidatorSettings,
}

impl Validator {
    pub fn new(probe: Arc<dyn LivenessProbe>, settings: ValidatorSettings) -> Self {
        Self { probe, settings }
    }

    pub fn workers(&self) -> usize {
        self.settings.workers.max(1)
    }

    /// Returns the subset of `urls` whose probe succeeded.
    ///
    /// Once `cancel` fires no further probes start and in-flight ones are
    /// abandoned; URLs confirmed before that point are still returned.
    pub async fn validate(
        &self,
        urls: Vec<String>,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Vec<String> {
        let total = urls.len();
        sink.emit(PipelineEvent::StageStarted {
            stage: Stage::Validation,
            total,
        });
        if total == 0 {
            sink.emit(PipelineEvent::StageCompleted {
                stage: Stage::Validation,
                kept: 0,
            });
            return Vec::new();
        }

        let workers = self.workers().min(total);
        fetch_info!("Validating {} URLs with {} workers", total, workers);

        let queue: WorkQueue = Arc::new(Mutex::new(VecDeque::from(urls)));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<(String, bool)>();
        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            pool.spawn(run_worker(
                worker_id,
                self.probe.clone(),
                queue.clone(),
                result_tx.clone(),
                cancel.clone(),
            ));
        }
        // The channel closes once the last worker exits.
        drop(result_tx);

        let mut valid = Vec::new();
        let mut completed = 0;
        while let Some((url, alive)) = result_rx.recv().await {
            completed += 1;
            if alive {
                valid.push(url);
            }
            sink.emit(PipelineEvent::StageProgress {
                stage: Stage::Validation,
                completed,
                total,
            });
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(err) = joined {
                fetch_error!("Validation worker ended abnormally: {}", err);
            }
        }

        if cancel.is_cancelled() {
            fetch_warn!(
                "Validation cancelled after {} of {} URLs",
                completed,
                total
            );
        }
        fetch_info!("{} of {} URLs are valid", valid.len(), total);
        sink.emit(PipelineEvent::StageCompleted {
            stage: Stage::Validation,
            kept: valid.len(),
        });
        valid
    }
}

async fn run_worker(
    worker_id: usize,
    probe: Arc<dyn LivenessProbe>,
    queue: WorkQueue,
    results: mpsc::UnboundedSender<(String, bool)>,
    cancel: CancellationToken,
) {
    let mut probed = 0usize;
    while !cancel.is_cancelled() {
        let Some(url) = next_url(&queue) else {
            break;
        };
        let alive = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            alive = probe.check(&url) => alive,
        };
        probed += 1;
        if results.send((url, alive)).is_err() {
            break;
        }
    }
    fetch_debug!("Worker {} finished after {} probes", worker_id, probed);
}

fn next_url(queue: &WorkQueue) -> Option<String> {
    // The lock is never held across a probe, so a poisoned queue is still consistent.
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}
