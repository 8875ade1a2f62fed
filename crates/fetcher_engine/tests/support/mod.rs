#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

use fetcher_engine::{ArchiveIndex, EventSink, FetchError, LivenessProbe, PipelineEvent};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(fetch_logging::initialize_for_tests);
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Probe with a fixed ground truth and optional per-URL latency.
#[derive(Default)]
pub struct FakeProbe {
    alive: HashSet<String>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeProbe {
    pub fn alive(urls: &[&str]) -> Self {
        Self {
            alive: urls.iter().map(|url| url.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl LivenessProbe for FakeProbe {
    async fn check(&self, url: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .get(url)
            .copied()
            .unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.alive.contains(url)
    }
}

/// Archive with canned answers per domain; unknown domains return no URLs.
#[derive(Default)]
pub struct FakeArchive {
    answers: HashMap<String, Result<Vec<String>, FetchError>>,
    delay: Duration,
    queried: Mutex<Vec<String>>,
}

impl FakeArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_urls(mut self, domain: &str, urls: &[&str]) -> Self {
        self.answers.insert(domain.to_string(), Ok(strings(urls)));
        self
    }

    pub fn with_error(mut self, domain: &str, err: FetchError) -> Self {
        self.answers.insert(domain.to_string(), Err(err));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ArchiveIndex for FakeArchive {
    async fn fetch(&self, domain: &str) -> Result<Vec<String>, FetchError> {
        self.queried.lock().unwrap().push(domain.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answers
            .get(domain)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
