use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser};

/// Find archived files of interest under a set of domains and keep the ones still online.
#[derive(Debug, Parser)]
#[command(name = "filefetcher", version)]
pub struct Cli {
    #[command(flatten)]
    pub input: InputArgs,

    /// Where to write the confirmed URLs, one per line.
    #[arg(short, long, default_value = "valid_urls.txt")]
    pub output: PathBuf,

    /// RON file with defaults for any of the tuning options below.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Probes in flight at once.
    #[arg(short, long)]
    pub workers: Option<usize>,

    #[arg(long, value_name = "URL")]
    pub archive_endpoint: Option<String>,

    #[arg(long, value_name = "SECS", value_parser = parse_secs)]
    pub archive_timeout: Option<Duration>,

    /// Archive attempts per domain, including the first.
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Pause before the first archive retry; doubles on each further retry.
    #[arg(long, value_name = "SECS", value_parser = parse_secs)]
    pub backoff: Option<Duration>,

    #[arg(long, value_name = "SECS", value_parser = parse_secs)]
    pub probe_timeout: Option<Duration>,

    /// Treat a redirect to a live resource as alive.
    #[arg(long)]
    pub follow_redirects: bool,

    /// Replace the file-type signature set, e.g. `pdf,sql,env`.
    #[arg(long, value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Probe and report repeated URLs once per occurrence.
    #[arg(long)]
    pub keep_duplicates: bool,

    /// Also write the log to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Repeat for more detail (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// A single domain, e.g. example.com.
    #[arg(short, long)]
    pub domain: Option<String>,

    /// File with one domain per line.
    #[arg(long, value_name = "FILE")]
    pub domain_file: Option<PathBuf>,

    /// File with one URL per line; skips the archive lookup.
    #[arg(long, value_name = "FILE")]
    pub url_file: Option<PathBuf>,

    /// Directory whose `*.txt` domain lists are merged.
    #[arg(long, value_name = "DIR")]
    pub domain_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Domain(String),
    DomainFile(PathBuf),
    UrlFile(PathBuf),
    DomainDir(PathBuf),
}

impl InputArgs {
    pub fn source(&self) -> Option<InputSource> {
        if let Some(domain) = &self.domain {
            return Some(InputSource::Domain(domain.clone()));
        }
        if let Some(path) = &self.domain_file {
            return Some(InputSource::DomainFile(path.clone()));
        }
        if let Some(path) = &self.url_file {
            return Some(InputSource::UrlFile(path.clone()));
        }
        self.domain_dir.clone().map(InputSource::DomainDir)
    }
}

pub(crate) fn parse_secs(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{raw}` is not a number of seconds"))?;
    Duration::try_from_secs_f64(secs).map_err(|err| format!("`{raw}`: {err}"))
}
