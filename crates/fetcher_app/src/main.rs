mod cli;
mod config;
mod presenter;

use std::process::ExitCode;
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use fetch_logging::{fetch_error, fetch_info, fetch_warn, LogDestination};
use fetcher_core::ProgressView;
use fetcher_engine::{
    load_domain_directory, load_lines, write_results, CancellationToken, ChannelEventSink,
    Pipeline,
};

use crate::cli::{Cli, InputSource};

/// What the pipeline starts from.
enum Work {
    Domains(Vec<String>),
    Urls(Vec<String>),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let destination = match &cli.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    fetch_logging::initialize(fetch_logging::level_for_verbosity(cli.verbose), destination);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            fetch_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let file_config = match &cli.config {
        Some(path) => config::load(path)?,
        None => config::FileConfig::default(),
    };
    let pipeline_config = config::resolve(file_config, &cli)?;

    let source = cli
        .input
        .source()
        .ok_or_else(|| anyhow!("no input given"))?;
    let work = load_work(source)?;

    let (event_tx, event_rx) = mpsc::channel();
    let presenter = presenter::spawn(event_rx);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            fetch_warn!("Interrupted; stopping after confirmed URLs");
            interrupt.cancel();
        }
    });

    let pipeline = Pipeline::from_config(&pipeline_config)
        .context("setting up HTTP clients")?
        .with_sink(Arc::new(ChannelEventSink::new(event_tx)))
        .with_cancellation(cancel);

    let result = match work {
        Work::Domains(domains) => pipeline.run(&domains).await,
        Work::Urls(urls) => pipeline.run_from_url_list(urls).await,
    };
    // Closes the event channel so the presenter can finish.
    drop(pipeline);
    wait_for_presenter(presenter).await?;

    write_results(&cli.output, &result.urls)
        .with_context(|| format!("writing results to {}", cli.output.display()))?;

    for (domain, err) in &result.failed_domains {
        fetch_warn!("Could not query {}: {}", domain, err);
    }
    fetch_info!(
        "Total valid URLs: {} (from {} candidates, {} checked, {} domain(s) failed)",
        result.urls.len(),
        result.candidates,
        result.filtered,
        result.failed_domains.len()
    );

    if result.cancelled {
        return Ok(ExitCode::from(130));
    }
    Ok(ExitCode::SUCCESS)
}

/// Joins the presenter thread without blocking a runtime worker.
async fn wait_for_presenter(presenter: JoinHandle<ProgressView>) -> anyhow::Result<ProgressView> {
    tokio::task::spawn_blocking(move || presenter.join())
        .await
        .context("waiting for progress presenter")?
        .map_err(|_| anyhow!("progress presenter panicked"))
}

fn load_work(source: InputSource) -> anyhow::Result<Work> {
    let work = match source {
        InputSource::Domain(domain) => {
            let domain = domain.trim();
            if domain.is_empty() {
                bail!("domain must not be empty");
            }
            Work::Domains(vec![domain.to_string()])
        }
        InputSource::DomainFile(path) => Work::Domains(
            load_lines(&path).with_context(|| format!("loading domains from {}", path.display()))?,
        ),
        InputSource::UrlFile(path) => Work::Urls(
            load_lines(&path).with_context(|| format!("loading URLs from {}", path.display()))?,
        ),
        InputSource::DomainDir(dir) => {
            let domains = load_domain_directory(&dir)
                .with_context(|| format!("loading domain lists from {}", dir.display()))?;
            fetch_info!("Processing {} domains from directory", domains.len());
            Work::Domains(domains)
        }
    };
    Ok(work)
}
