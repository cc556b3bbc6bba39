//! Optional progress reporting for embedders.

use tokio::sync::mpsc::UnboundedSender;

use crate::stats::RunStatsSnapshot;

/// Milestones emitted while a run is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    SearchStarted { total_queries: usize },
    SearchCompleted { businesses_found: usize },
    FilterCompleted { without_website: usize },
    BusinessProcessed { name: String, index: usize, total: usize },
    RunCompleted { stats: RunStatsSnapshot },
}

/// Fire-and-forget event sink. A closed or absent receiver never slows the
/// run down, and send failures are ignored on purpose.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    sender: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    #[must_use]
    pub fn none() -> Self {
        Self { sender: None }
    }

    #[must_use]
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self { sender: Some(sender) }
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}
