//! Write-behind persistence worker.
//!
//! One task per container drains a `watch` channel. The channel holds only
//! the newest job, so snapshots enqueued while a write is in flight collapse
//! into the latest one.

use crate::model::snapshot::PersistedSnapshot;
use crate::repo::snapshot_repo::SnapshotRepository;
use crate::service::durable_store::DurableStore;
use log::{debug, error, info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
struct PersistJob {
    seq: u64,
    snapshot: Option<Arc<PersistedSnapshot>>,
}

/// Producer side of the worker, owned by the container.
pub(crate) struct PersistQueue {
    jobs: watch::Sender<PersistJob>,
    finished: watch::Receiver<u64>,
    last_seq: u64,
}

impl PersistQueue {
    /// Spawns the worker on the current tokio runtime.
    pub(crate) fn spawn<R>(durable: Arc<DurableStore<R>>) -> Self
    where
        R: SnapshotRepository + 'static,
    {
        let (jobs, job_rx) = watch::channel(PersistJob::default());
        let (finished_tx, finished) = watch::channel(0);
        tokio::spawn(run_worker(durable, job_rx, finished_tx));

        Self {
            jobs,
            finished,
            last_seq: 0,
        }
    }

    /// Schedules `snapshot` for writing and returns immediately.
    pub(crate) fn enqueue(&mut self, snapshot: PersistedSnapshot) {
        self.last_seq += 1;
        let job = PersistJob {
            seq: self.last_seq,
            snapshot: Some(Arc::new(snapshot)),
        };
        if self.jobs.send(job).is_err() {
            warn!(
                "event=persist_enqueue module=store status=dropped seq={} reason=worker_stopped",
                self.last_seq
            );
        }
    }

    /// Resolves once every snapshot enqueued so far has been written or has
    /// failed. Does not borrow the queue.
    pub(crate) fn flush(&self) -> impl Future<Output = ()> + Send + 'static {
        let target = self.last_seq;
        let mut finished = self.finished.clone();
        async move {
            let reached = finished.wait_for(|seq| *seq >= target).await.map(drop);
            if reached.is_err() {
                debug!("event=persist_flush module=store status=worker_stopped target_seq={target}");
            }
        }
    }
}

async fn run_worker<R>(
    durable: Arc<DurableStore<R>>,
    mut jobs: watch::Receiver<PersistJob>,
    finished: watch::Sender<u64>,
) where
    R: SnapshotRepository + 'static,
{
    debug!("event=persist_worker module=store status=start");
    let mut last_seq = 0;
    let mut writes = 0u64;
    let mut coalesced = 0u64;

    // Returns Ok for an unseen job even after the sender is gone, so the last
    // snapshot is still written on shutdown.
    while jobs.changed().await.is_ok() {
        let job = jobs.borrow_and_update().clone();
        let Some(snapshot) = job.snapshot else {
            continue;
        };
        coalesced += job.seq.saturating_sub(last_seq + 1);
        last_seq = job.seq;

        let store = Arc::clone(&durable);
        let persisted = match tokio::task::spawn_blocking(move || store.save(&snapshot)).await {
            Ok(persisted) => persisted,
            Err(err) => {
                error!(
                    "event=persist_worker module=store status=error seq={} error={}",
                    job.seq, err
                );
                false
            }
        };
        if persisted {
            writes += 1;
        }
        finished.send_replace(job.seq);
    }

    info!(
        "event=persist_worker module=store status=stop writes={} coalesced={} last_seq={}",
        writes, coalesced, last_seq
    );
}
