//! The single task that runs every job of one factory and its resolvers.
//!
//! Jobs never get a task of their own. They are posted to a [`JobSequence`]
//! and polled one at a time from a `FuturesUnordered`, in the order they are
//! woken. The engine's replies wake jobs in the order it sends them, so
//! completion callbacks run in that order too, and never concurrently.

use crate::base::neterror::NetError;
use futures::future::{AbortHandle, Abortable, BoxFuture};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::future::Future;
use tokio::sync::mpsc;

/// Posts jobs onto the sequence task. Clones share the same task.
#[derive(Debug, Clone)]
pub(crate) struct JobSequence {
    jobs: mpsc::UnboundedSender<BoxFuture<'static, ()>>,
}

impl JobSequence {
    /// Spawns the sequence task on the current Tokio runtime.
    ///
    /// The task ends once every handle is gone and the last job finished.
    pub(crate) fn spawn() -> Self {
        let (jobs, incoming) = mpsc::unbounded_channel();
        tokio::spawn(run(incoming));
        Self { jobs }
    }

    /// Queues `job` behind every job posted before it.
    ///
    /// Aborting the returned handle drops the job, and everything it owns,
    /// the next time the sequence would have polled it.
    pub(crate) fn post<F>(&self, job: F) -> Result<AbortHandle, NetError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (abort, registration) = AbortHandle::new_pair();
        let job = Abortable::new(job, registration);
        let job: BoxFuture<'static, ()> = Box::pin(async move {
            let _ = job.await;
        });
        if self.jobs.send(job).is_err() {
            tracing::warn!("job sequence is gone; job not started");
            return Err(NetError::PacScriptTerminated);
        }
        Ok(abort)
    }
}

async fn run(mut incoming: mpsc::UnboundedReceiver<BoxFuture<'static, ()>>) {
    let mut running = FuturesUnordered::new();
    loop {
        tokio::select! {
            biased;
            Some(()) = running.next(), if !running.is_empty() => {}
            job = incoming.recv() => match job {
                Some(job) => running.push(job),
                None => break,
            },
        }
    }
    while running.next().await.is_some() {}
    tracing::trace!("job sequence finished");
}
