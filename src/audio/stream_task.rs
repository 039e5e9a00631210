use std::time::Duration as StdDuration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace};

const LOG_TARGET: &str = "r_ambient::audio::stream_task";

const STOP_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Owns the spawned task that streams one source to the device.
#[derive(Debug)]
pub struct StreamTask {
    task_handle: JoinHandle<()>,
    shutdown_tx: broadcast::Sender<()>,
    source_id: String,
}

impl StreamTask {
    /// Spawns `body`, handing it the shutdown receiver it must honour.
    pub fn spawn<F, Fut>(source_id: &str, body: F) -> Self
    where
        F: FnOnce(broadcast::Receiver<()>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        debug!(target: LOG_TARGET, source = %source_id, "Spawning stream task.");
        Self {
            task_handle: tokio::spawn(body(shutdown_rx)),
            shutdown_tx,
            source_id: source_id.to_string(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task_handle.is_finished()
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Signals shutdown and waits for the task, aborting it after a timeout.
    #[instrument(skip(self), fields(source = %self.source_id))]
    pub async fn stop(mut self) {
        if let Err(e) = self.shutdown_tx.send(()) {
            // Receiver is gone when the task already finished on its own.
            trace!(target: LOG_TARGET, "Shutdown signal not delivered: {}", e);
        }

        tokio::select! {
            biased;
            result = &mut self.task_handle => match result {
                Ok(()) => debug!(target: LOG_TARGET, "Stream task finished."),
                Err(e) if e.is_cancelled() => info!(target: LOG_TARGET, "Stream task was cancelled."),
                Err(e) => error!(target: LOG_TARGET, "Stream task failed: {:?}", e),
            },
            _ = tokio::time::sleep(STOP_TIMEOUT) => {
                error!(target: LOG_TARGET, "Stream task did not stop within {:?}; aborting.", STOP_TIMEOUT);
                self.task_handle.abort();
            }
        }
    }
}
