//! Power dialer: a cursor over a fixed list of leads.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

mod call;
mod debounce;

pub use call::{call_url, format_phone_for_call, DEFAULT_CALL_URL_BASE};
pub use debounce::NoteDebouncer;

pub type SharedSession = Arc<Mutex<DialerSession>>;

/// Position within the leads being dialed.
///
/// The session holds ids only; record data is always read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialerSession {
    ids: Vec<String>,
    index: usize,
}

impl DialerSession {
    /// Start at `start` when it points inside the list, otherwise at the first lead.
    pub fn new(ids: Vec<String>, start: Option<i64>) -> Self {
        let index = start
            .and_then(|s| usize::try_from(s).ok())
            .filter(|s| *s < ids.len())
            .unwrap_or(0);
        Self { ids, index }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current_id(&self) -> Option<&str> {
        self.ids.get(self.index).map(String::as_str)
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.ids.len()
    }

    /// One-based position and total, for "Lead 3 of 40".
    pub fn progress(&self) -> (usize, usize) {
        if self.ids.is_empty() {
            (0, 0)
        } else {
            (self.index + 1, self.ids.len())
        }
    }

    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn prev(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn jump(&mut self, index: usize) -> bool {
        if index >= self.ids.len() {
            return false;
        }
        self.index = index;
        true
    }

    /// Advance only if the cursor is still where the advance was scheduled.
    pub fn advance_if(&mut self, from: usize) -> bool {
        self.index == from && self.next()
    }
}

/// Move to the next lead after `delay`, unless the user navigated away first.
///
/// Resolves to whether the cursor moved.
pub fn schedule_advance(session: SharedSession, from: usize, delay: Duration) -> JoinHandle<bool> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        session.lock().await.advance_if(from)
    })
}

/// Replace a pending advance with a new one. The previous task is aborted so
/// only the latest advance can move the cursor.
pub fn reschedule_advance(
    previous: Option<JoinHandle<bool>>,
    session: SharedSession,
    from: usize,
    delay: Duration,
) -> JoinHandle<bool> {
    if let Some(previous) = previous {
        previous.abort();
    }
    schedule_advance(session, from, delay)
}
