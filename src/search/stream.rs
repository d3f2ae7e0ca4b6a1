use super::{Entry, SearchCursor};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Async adapter over a [`SearchCursor`].
///
/// The cursor is drained on a blocking worker; each record is copied into an
/// [`Entry`] and sent over a bounded channel. The worker releases the cursor
/// when the results run out or the stream is dropped. Dropping the stream
/// does not interrupt an `advance` that is already waiting on the store.
pub struct RecordStream {
    /// Receiver for entries
    receiver: mpsc::Receiver<Entry>,
    /// Worker draining the cursor
    task_handle: JoinHandle<()>,
}

impl RecordStream {
    /// Start draining `cursor`, buffering up to `capacity` entries.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(cursor: SearchCursor, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));

        let task_handle = tokio::task::spawn_blocking(move || {
            let mut delivered = 0usize;
            while let Some(record) = cursor.advance() {
                if tx.blocking_send(record.to_entry()).is_err() {
                    // Receiver dropped, exit
                    debug!("Record stream receiver dropped after {} entries", delivered);
                    break;
                }
                delivered += 1;
            }
            // Records are reclaimed together with their response
            cursor.release();
            debug!("Record stream finished after {} entries", delivered);
        });

        Self {
            receiver: rx,
            task_handle,
        }
    }

    /// Receive the next entry
    ///
    /// # Returns
    /// * `Some(Entry)` - Next entry
    /// * `None` - The cursor is exhausted
    pub async fn next(&mut self) -> Option<Entry> {
        self.receiver.recv().await
    }

    /// Stop the stream and wait until the worker has released the cursor
    pub async fn close(self) {
        let Self {
            receiver,
            task_handle,
        } = self;
        drop(receiver);
        if let Err(e) = task_handle.await {
            warn!("Record stream worker failed: {}", e);
        }
    }
}
