use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::storage::SaveReport;
use crate::store::SharedStore;

struct PendingNotes {
    id: String,
    notes: String,
    task: JoinHandle<()>,
}

/// Collapses rapid note edits into a single store write.
///
/// Each edit restarts the timer; the write happens once no edit has arrived
/// for the debounce window. [`flush`](Self::flush) writes immediately.
pub struct NoteDebouncer {
    store: SharedStore,
    delay: Duration,
    pending: Option<PendingNotes>,
}

impl NoteDebouncer {
    pub fn new(store: SharedStore, delay: Duration) -> Self {
        Self {
            store,
            delay,
            pending: None,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().map_or(false, |p| !p.task.is_finished())
    }

    /// Record new notes for `id` and restart the timer.
    pub async fn edit(&mut self, id: &str, notes: String) {
        match self.pending.take() {
            Some(prev) if prev.id != id => {
                self.pending = Some(prev);
                self.flush().await;
            }
            Some(prev) => prev.task.abort(),
            None => {}
        }

        let store = self.store.clone();
        let delay = self.delay;
        let task_id = id.to_string();
        let task_notes = notes.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(id = %task_id, "debounced notes write");
            store.lock().await.update_notes(&task_id, task_notes).await;
        });

        self.pending = Some(PendingNotes {
            id: id.to_string(),
            notes,
            task,
        });
    }

    /// Write pending notes now. `None` if nothing was pending.
    pub async fn flush(&mut self) -> Option<SaveReport> {
        let pending = self.pending.take()?;
        if pending.task.is_finished() {
            return None;
        }
        pending.task.abort();
        self.store
            .lock()
            .await
            .update_notes(&pending.id, pending.notes)
            .await
    }
}
