//! `MainDispatcher` implementations.

use bundlehost_api::{MainDispatcher, MainTask};
use tokio::sync::mpsc;

/// Runs every task immediately on the posting thread.
///
/// Correct only when the caller already is the dispatch thread.
#[derive(Debug, Default)]
pub struct InlineDispatcher;

impl MainDispatcher for InlineDispatcher {
    fn post(&self, task: MainTask) {
        task();
    }
}

/// Queues tasks for a dispatch thread that drains a [`MainLoop`].
#[derive(Clone)]
pub struct QueueDispatcher {
    tx: mpsc::UnboundedSender<MainTask>,
}

/// Receiving end of a [`QueueDispatcher`], owned by the dispatch thread.
pub struct MainLoop {
    rx: mpsc::UnboundedReceiver<MainTask>,
}

impl QueueDispatcher {
    pub fn new() -> (Self, MainLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, MainLoop { rx })
    }
}

impl MainDispatcher for QueueDispatcher {
    fn post(&self, task: MainTask) {
        if self.tx.send(task).is_err() {
            tracing::warn!("Main loop is gone; dropping posted task");
        }
    }
}

impl MainLoop {
    /// Run every task queued so far. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Run tasks until every dispatcher handle is dropped.
    pub async fn run(mut self) {
        while let Some(task) = self.rx.recv().await {
            task();
        }
    }
}
