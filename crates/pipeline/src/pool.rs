//! Fixed-size pool of queue workers.

use crate::worker::SearchWorker;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A set of [`SearchWorker`] tasks sharing one queue.
pub struct WorkerPool {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` copies of `worker` on the current runtime.
    pub fn spawn(size: usize, worker: SearchWorker) -> Self {
        let (shutdown, receiver) = watch::channel(false);
        let size = size.max(1);

        let handles = (0..size)
            .map(|i| {
                let worker = worker.clone().named(format!("worker-{}", i + 1));
                tokio::spawn(worker.run(receiver.clone()))
            })
            .collect();

        tracing::info!("Started {} search workers", size);
        Self { shutdown, handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Signal every worker to stop and wait for them.
    ///
    /// A job in progress finishes its current attempt first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);

        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker task ended abnormally: {}", e);
            }
        }

        tracing::info!("Search workers stopped");
    }
}
