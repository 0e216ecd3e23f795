//! Debounced background persistence
//!
//! The workspace hands every serialized value to the [`Autosaver`] right
//! after a mutation. A background task holds the latest payload per key and
//! writes it once the key has been quiet for the configured delay, so a
//! burst of edits produces one write. Failed writes are logged and reported
//! on a `watch` channel; they never touch in-memory state.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::storage::error::StorageError;
use crate::storage::key_value::KeyValueStore;

/// Last known persistence state, for a status indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing scheduled yet
    Idle,
    /// Changes are waiting for the debounce delay
    Pending,
    Saved { at: DateTime<Utc> },
    /// The most recent write failed; the message is user-facing
    Failed(String),
}

enum Command {
    Save { key: String, value: String },
    Flush(oneshot::Sender<Result<(), StorageError>>),
}

/// Handle to the background save task
///
/// Dropping the handle closes the channel; the task writes whatever is
/// still pending and exits.
#[derive(Debug)]
pub struct Autosaver {
    tx: mpsc::UnboundedSender<Command>,
    status_rx: watch::Receiver<SaveStatus>,
    handle: JoinHandle<()>,
}

impl Autosaver {
    /// Spawn the save task on the current tokio runtime
    pub fn spawn<S>(store: S, delay: Duration) -> Self
    where
        S: KeyValueStore + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SaveStatus::Idle);
        let handle = tokio::spawn(run(store, delay, rx, status_tx));
        Self {
            tx,
            status_rx,
            handle,
        }
    }

    /// Queue `value` for `key`, replacing any payload still pending for it
    pub fn schedule(&self, key: impl Into<String>, value: String) {
        let key = key.into();
        if self.tx.send(Command::Save { key, value }).is_err() {
            tracing::warn!("Autosave task has stopped; change not persisted");
        }
    }

    /// Write everything pending now and wait for the result
    ///
    /// Returns the first failure among the flushed writes.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply_tx))
            .map_err(|_| StorageError::unavailable("autosave task has stopped"))?;
        reply_rx
            .await
            .map_err(|_| StorageError::unavailable("autosave task has stopped"))?
    }

    pub fn status(&self) -> SaveStatus {
        self.status_rx.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.status_rx.clone()
    }

    /// Flush, then stop the task and wait for it to exit
    pub async fn shutdown(self) -> Result<(), StorageError> {
        let result = self.flush().await;
        drop(self.tx);
        if let Err(e) = self.handle.await {
            tracing::warn!("Autosave task ended abnormally: {}", e);
        }
        result
    }
}

async fn run<S: KeyValueStore>(
    store: S,
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
    status_tx: watch::Sender<SaveStatus>,
) {
    // key -> (latest payload, write deadline)
    let mut pending: BTreeMap<String, (String, Instant)> = BTreeMap::new();

    loop {
        let next_deadline = pending.values().map(|(_, deadline)| *deadline).min();

        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Save { key, value }) => {
                    pending.insert(key, (value, Instant::now() + delay));
                    status_tx.send_replace(SaveStatus::Pending);
                }
                Some(Command::Flush(reply)) => {
                    let batch = std::mem::take(&mut pending);
                    let result = write_batch(&store, batch, &status_tx).await;
                    let _ = reply.send(result);
                }
                None => {
                    let batch = std::mem::take(&mut pending);
                    let _ = write_batch(&store, batch, &status_tx).await;
                    break;
                }
            },
            _ = sleep_until(next_deadline.unwrap_or_else(Instant::now)), if next_deadline.is_some() => {
                let now = Instant::now();
                let (due, waiting): (BTreeMap<_, _>, BTreeMap<_, _>) = std::mem::take(&mut pending)
                    .into_iter()
                    .partition(|(_, (_, deadline))| *deadline <= now);
                pending = waiting;
                let _ = write_batch(&store, due, &status_tx).await;
                if !pending.is_empty() {
                    status_tx.send_if_modified(|status| {
                        if matches!(status, SaveStatus::Saved { .. }) {
                            *status = SaveStatus::Pending;
                            return true;
                        }
                        false
                    });
                }
            }
        }
    }

    tracing::debug!("Autosave task stopped");
}

async fn write_batch<S: KeyValueStore>(
    store: &S,
    batch: BTreeMap<String, (String, Instant)>,
    status_tx: &watch::Sender<SaveStatus>,
) -> Result<(), StorageError> {
    if batch.is_empty() {
        return Ok(());
    }

    let mut first_error = None;
    for (key, (value, _)) in batch {
        if let Err(e) = store.save(&key, &value).await {
            tracing::warn!("Failed to persist '{}': {}", key, e);
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => {
            status_tx.send_replace(SaveStatus::Failed(e.to_string()));
            Err(e)
        }
        None => {
            status_tx.send_replace(SaveStatus::Saved { at: Utc::now() });
            Ok(())
        }
    }
}
