use std::sync::Arc;

use fetch_logging::{fetch_error, fetch_info, fetch_warn};
use fetcher_core::{dedupe_preserving_order, PipelineEvent, Stage, TypeSignatures};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{
    ArchiveIndex, ArchiveSettings, CdxArchiveClient, EventSink, FetchError, HeadProbe,
    LivenessProbe, NullEventSink, ProbeClientError, ProbeSettings, Validator, ValidatorSettings,
};

/// Which network client could not be built.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("archive client setup failed: {0}")]
    Archive(#[source] FetchError),
    #[error(transparent)]
    Probe(#[from] ProbeClientError),
}

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub archive: ArchiveSettings,
    pub probe: ProbeSettings,
    pub validator: ValidatorSettings,
    pub signatures: TypeSignatures,
    /// Probe and report repeated URLs once per occurrence instead of once.
    pub keep_duplicates: bool,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSet {
    /// Confirmed URLs in the order their probes completed.
    pub urls: Vec<String>,
    /// Raw URLs seen before filtering.
    pub candidates: usize,
    /// URLs submitted to validation.
    pub filtered: usize,
    pub failed_domains: Vec<(String, FetchError)>,
    pub cancelled: bool,
}

/// Archive discovery, type filtering and liveness validation, in that order.
pub struct Pipeline {
    archive: Arc<dyn ArchiveIndex>,
    validator: Validator,
    signatures: TypeSignatures,
    keep_duplicates: bool,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(
        archive: Arc<dyn ArchiveIndex>,
        probe: Arc<dyn LivenessProbe>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            archive,
            validator: Validator::new(probe, config.validator.clone()),
            signatures: config.signatures.clone(),
            keep_duplicates: config.keep_duplicates,
            sink: Arc::new(NullEventSink),
            cancel: CancellationToken::new(),
        }
    }

    /// Builds a pipeline backed by the CDX archive client and HEAD probes.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, SetupError> {
        let archive = CdxArchiveClient::new(config.archive.clone()).map_err(SetupError::Archive)?;
        let probe = HeadProbe::new(config.probe.clone())?;
        Ok(Self::new(Arc::new(archive), Arc::new(probe), config))
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Discovers, filters and validates URLs for every domain.
    ///
    /// Domains are queried one at a time; a failed query is recorded and the
    /// run moves on. Validation happens once, over the combined set.
    pub async fn run(&self, domains: &[String]) -> ResultSet {
        let total = domains.len();
        let mut result = ResultSet::default();
        let mut working = Vec::new();

        self.sink.emit(PipelineEvent::StageStarted {
            stage: Stage::Discovery,
            total,
        });
        for (index, domain) in domains.iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }
            fetch_info!("Processing {} ({}/{})", domain, index + 1, total);

            let fetched = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                fetched = self.archive.fetch(domain) => fetched,
            };
            match fetched {
                Ok(candidates) => {
                    let candidate_count = candidates.len();
                    let matched = self.signatures.filter(candidates);
                    fetch_info!(
                        "{} of {} URLs for {} matched file types",
                        matched.len(),
                        candidate_count,
                        domain
                    );
                    result.candidates += candidate_count;
                    self.sink.emit(PipelineEvent::DomainFetched {
                        domain: domain.clone(),
                        candidates: candidate_count,
                        matched: matched.len(),
                    });
                    working.extend(matched);
                }
                Err(err) => {
                    fetch_error!("Archive query for {} failed: {}", domain, err);
                    self.sink.emit(PipelineEvent::DomainFailed {
                        domain: domain.clone(),
                        reason: err.to_string(),
                    });
                    result.failed_domains.push((domain.clone(), err));
                }
            }
            self.sink.emit(PipelineEvent::StageProgress {
                stage: Stage::Discovery,
                completed: index + 1,
                total,
            });
        }
        self.sink.emit(PipelineEvent::StageCompleted {
            stage: Stage::Discovery,
            kept: working.len(),
        });

        self.validate_into(working, result).await
    }

    /// Filters and validates a caller-supplied URL list, skipping discovery.
    pub async fn run_from_url_list(&self, urls: Vec<String>) -> ResultSet {
        let urls: Vec<String> = urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        let result = ResultSet {
            candidates: urls.len(),
            ..ResultSet::default()
        };

        self.sink.emit(PipelineEvent::StageStarted {
            stage: Stage::Filtering,
            total: urls.len(),
        });
        let matched = self.signatures.filter(urls);
        fetch_info!(
            "{} of {} URLs matched file types",
            matched.len(),
            result.candidates
        );
        self.sink.emit(PipelineEvent::StageCompleted {
            stage: Stage::Filtering,
            kept: matched.len(),
        });

        self.validate_into(matched, result).await
    }

    async fn validate_into(&self, working: Vec<String>, mut result: ResultSet) -> ResultSet {
        let working = if self.keep_duplicates {
            working
        } else {
            let before = working.len();
            let unique = dedupe_preserving_order(working);
            if unique.len() < before {
                fetch_info!("Dropped {} duplicate URLs", before - unique.len());
            }
            unique
        };
        result.filtered = working.len();

        result.urls = self
            .validator
            .validate(working, self.sink.as_ref(), &self.cancel)
            .await;

        if self.cancel.is_cancelled() {
            fetch_warn!(
                "Run cancelled; keeping {} confirmed URLs",
                result.urls.len()
            );
            result.cancelled = true;
            self.sink.emit(PipelineEvent::Cancelled);
        }
        fetch_info!("Total valid URLs: {}", result.urls.len());
        result
    }
}
