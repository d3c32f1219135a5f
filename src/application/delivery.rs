//! The delivery context: a serial queue of callback jobs, drained by the
//! host on its UI thread (or a task standing in for it).
//!
//! Jobs run one at a time, in the order they were posted. The pipeline posts
//! as dispatches complete, so deliveries follow completion order.

use tokio::sync::mpsc;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Sending half, cloned into every dispatch.
#[derive(Clone)]
pub struct DeliveryContext {
    sender: mpsc::UnboundedSender<Job>,
}

/// Receiving half, owned by whoever represents the UI context.
pub struct DeliveryLoop {
    receiver: mpsc::UnboundedReceiver<Job>,
}

/// Creates a connected delivery context and loop.
pub fn delivery_channel() -> (DeliveryContext, DeliveryLoop) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (DeliveryContext { sender }, DeliveryLoop { receiver })
}

impl DeliveryContext {
    /// Queues `job`. Returns false if the loop has been dropped, in which
    /// case the job is discarded.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> bool {
        if self.sender.send(Box::new(job)).is_err() {
            tracing::error!("delivery loop is gone, callback discarded");
            return false;
        }
        true
    }
}

impl DeliveryLoop {
    /// Runs jobs until every [`DeliveryContext`] has been dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.receiver.recv().await {
            job();
        }
    }

    /// Waits for and runs a single job. Returns false once all senders are gone.
    pub async fn run_next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Runs every job already queued without waiting; returns how many ran.
    /// Meant to be called from a host event loop tick.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }
}
