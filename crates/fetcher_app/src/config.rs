use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use fetch_logging::fetch_info;
use fetcher_engine::{PipelineConfig, TypeSignatures};
use ron::extensions::Extensions;
use serde::Deserialize;

use crate::cli::Cli;

/// Tuning read from a RON file. Every field is optional; values given on the
/// command line win over the file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub archive_endpoint: Option<String>,
    pub archive_timeout_secs: Option<f64>,
    pub max_attempts: Option<u32>,
    pub backoff_secs: Option<f64>,
    pub probe_timeout_secs: Option<f64>,
    pub follow_redirects: Option<bool>,
    pub workers: Option<usize>,
    pub extensions: Option<Vec<String>>,
    pub keep_duplicates: Option<bool>,
}

pub fn load(path: &Path) -> anyhow::Result<FileConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let config =
        parse(&text).with_context(|| format!("parsing config file {}", path.display()))?;
    fetch_info!("Loaded settings from {:?}", path);
    Ok(config)
}

pub fn parse(text: &str) -> anyhow::Result<FileConfig> {
    let options = ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
    Ok(options.from_str(text)?)
}

/// Layers defaults, then the config file, then command line flags.
pub fn resolve(file: FileConfig, cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut config = PipelineConfig::default();

    if let Some(endpoint) = cli.archive_endpoint.clone().or(file.archive_endpoint) {
        config.archive.endpoint = endpoint;
    }
    if let Some(timeout) = pick_secs(
        cli.archive_timeout,
        file.archive_timeout_secs,
        "archive_timeout_secs",
    )? {
        config.archive.request_timeout = timeout;
    }
    if let Some(attempts) = cli.max_attempts.or(file.max_attempts) {
        if attempts == 0 {
            bail!("max attempts must be at least 1");
        }
        config.archive.max_attempts = attempts;
    }
    if let Some(backoff) = pick_secs(cli.backoff, file.backoff_secs, "backoff_secs")? {
        config.archive.backoff_base = backoff;
    }
    if let Some(timeout) = pick_secs(
        cli.probe_timeout,
        file.probe_timeout_secs,
        "probe_timeout_secs",
    )? {
        config.probe.timeout = timeout;
    }
    config.probe.follow_redirects =
        cli.follow_redirects || file.follow_redirects.unwrap_or(false);
    if let Some(workers) = cli.workers.or(file.workers) {
        if workers == 0 {
            bail!("workers must be at least 1");
        }
        config.validator.workers = workers;
    }
    if let Some(extensions) = cli.extensions.clone().or(file.extensions) {
        let signatures = TypeSignatures::new(extensions);
        if signatures.is_empty() {
            bail!("the extension list is empty");
        }
        config.signatures = signatures;
    }
    config.keep_duplicates = cli.keep_duplicates || file.keep_duplicates.unwrap_or(false);

    Ok(config)
}

fn pick_secs(
    flag: Option<Duration>,
    file_secs: Option<f64>,
    field: &str,
) -> anyhow::Result<Option<Duration>> {
    if flag.is_some() {
        return Ok(flag);
    }
    file_secs
        .map(|secs| {
            Duration::try_from_secs_f64(secs)
                .with_context(|| format!("{field} must be a non-negative number of seconds"))
        })
        .transpose()
}
