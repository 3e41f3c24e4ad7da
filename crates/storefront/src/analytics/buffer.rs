//! Batched click ingestion.
//!
//! Clicks are queued to a background task that holds them until either the
//! batch is full or the flush interval has passed since the first queued
//! click. Flushed batches are logged and appended to the [`ClickStore`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use super::{ClickEvent, ClickStore, ClickSummary};
use crate::config::ClickConfig;

const QUEUE_DEPTH: usize = 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("click buffer has shut down")]
    Closed,
}

enum Command {
    Track(ClickEvent),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to the click buffer task. Clones share the task and the store.
#[derive(Clone)]
pub struct ClickBuffer {
    commands: mpsc::Sender<Command>,
    store: Arc<Mutex<ClickStore>>,
}

impl ClickBuffer {
    /// Start the buffer task on the current runtime.
    #[must_use]
    pub fn spawn(config: &ClickConfig) -> Self {
        let (commands, rx) = mpsc::channel(QUEUE_DEPTH);
        let store = Arc::new(Mutex::new(ClickStore::new(
            config.store_capacity,
            config.session_capacity,
        )));

        let worker = Worker {
            rx,
            store: Arc::clone(&store),
            pending: Vec::with_capacity(config.batch_size),
            batch_size: config.batch_size.max(1),
            flush_interval: config.flush_interval,
        };
        tokio::spawn(worker.run());

        Self { commands, store }
    }

    /// Queue a validated click.
    ///
    /// # Errors
    ///
    /// Returns `Closed` after [`shutdown`](Self::shutdown).
    pub async fn track(&self, event: ClickEvent) -> Result<(), BufferError> {
        self.commands
            .send(Command::Track(event))
            .await
            .map_err(|_| BufferError::Closed)
    }

    /// Flush whatever is queued and wait until it reached the store.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.commands.send(Command::Flush(done)).await.is_ok() {
            let _ = wait.await;
        }
    }

    /// Flush remaining clicks and stop the task.
    pub async fn shutdown(&self) {
        let (done, wait) = oneshot::channel();
        if self.commands.send(Command::Shutdown(done)).await.is_ok() {
            let _ = wait.await;
        }
    }

    #[must_use]
    pub fn summary(&self) -> ClickSummary {
        self.store().summary()
    }

    /// Number of clicks that reached the store.
    #[must_use]
    pub fn stored(&self) -> usize {
        self.store().len()
    }

    fn store(&self) -> MutexGuard<'_, ClickStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Worker {
    rx: mpsc::Receiver<Command>,
    store: Arc<Mutex<ClickStore>>,
    pending: Vec<ClickEvent>,
    batch_size: usize,
    flush_interval: Duration,
}

impl Worker {
    async fn run(mut self) {
        // Set when the first click of a batch arrives
        let mut deadline: Option<Instant> = None;

        loop {
            let timer = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(Command::Track(event)) => {
                        if self.pending.is_empty() {
                            deadline = Some(Instant::now() + self.flush_interval);
                        }
                        self.pending.push(event);
                        if self.pending.len() >= self.batch_size {
                            self.flush("batch full");
                            deadline = None;
                        }
                    }
                    Some(Command::Flush(done)) => {
                        self.flush("requested");
                        deadline = None;
                        let _ = done.send(());
                    }
                    Some(Command::Shutdown(done)) => {
                        self.flush("shutdown");
                        self.rx.close();
                        let _ = done.send(());
                        break;
                    }
                    None => {
                        self.flush("shutdown");
                        break;
                    }
                },
                () = timer => {
                    self.flush("interval");
                    deadline = None;
                }
            }
        }

        info!("Click buffer stopped");
    }

    fn flush(&mut self, reason: &'static str) {
        if self.pending.is_empty() {
            return;
        }

        let batch = std::mem::take(&mut self.pending);
        debug!(count = batch.len(), reason, "Flushing click batch");
        for click in &batch {
            debug!(
                event = click.event_name(),
                page = %click.page,
                session_id = %click.session_id,
                is_mobile = click.is_mobile(),
                "Click"
            );
        }

        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(batch);
    }
}
