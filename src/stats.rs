use crate::models::StatsSnapshot;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::trace;

/// One-way notifier for aggregate counters. Holds no state of its own; a
/// listener that has gone away is silently ignored.
#[derive(Clone, Default)]
pub struct StatsEmitter {
    tx: Option<UnboundedSender<StatsSnapshot>>,
}

impl StatsEmitter {
    pub fn channel() -> (StatsEmitter, UnboundedReceiver<StatsSnapshot>) {
        let (tx, rx) = unbounded_channel();
        (StatsEmitter { tx: Some(tx) }, rx)
    }

    pub fn emit(&self, snapshot: StatsSnapshot) {
        trace!(?snapshot, "emitting stats");
        if let Some(tx) = &self.tx {
            let _ = tx.send(snapshot);
        }
    }
}
