use std::sync::mpsc;

use fetcher_core::PipelineEvent;

/// Receiver of pipeline events. Implementations must not block for long;
/// they are called from the validation collector.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<PipelineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: PipelineEvent) {
        // A dropped receiver only means nobody is watching.
        let _ = self.tx.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: PipelineEvent) {}
}
