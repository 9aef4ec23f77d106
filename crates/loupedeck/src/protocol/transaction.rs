//! Transaction IDs and the pending-response table.
//!
//! The ID counter and the callback table sit behind one lock so that handing
//! out an ID and registering its callback can never interleave with the
//! receive loop consuming a response.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::Frame;

/// Callback run once with the device's response to a request.
pub type ResponseCallback = Box<dyn FnOnce(Frame) + Send>;

/// Rolling 8-bit transaction ID allocator. Wraps 255 -> 1, never yields 0.
#[derive(Debug, Default, Clone)]
pub struct TransactionIds {
    last: u8,
}

impl TransactionIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u8 {
        self.last = self.last.wrapping_add(1);
        if self.last == 0 {
            self.last = 1;
        }
        self.last
    }
}

#[derive(Default)]
struct State {
    ids: TransactionIds,
    pending: HashMap<u8, ResponseCallback>,
}

/// Shared transaction state for one session.
#[derive(Default)]
pub struct Transactions {
    state: Mutex<State>,
}

impl Transactions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next free ID and register `callback` for it.
    ///
    /// IDs still waiting for a response are skipped. Only when all 255 are
    /// pending is the callback on the next ID in sequence dropped and the
    /// ID reused.
    pub fn begin(&self, callback: Option<ResponseCallback>) -> u8 {
        let mut state = self.state.lock();
        let first = state.ids.next_id();
        let mut id = first;
        while state.pending.contains_key(&id) {
            id = state.ids.next_id();
            if id == first {
                break;
            }
        }

        let stale = match callback {
            Some(callback) => state.pending.insert(id, callback),
            None => state.pending.remove(&id),
        };
        if stale.is_some() {
            tracing::warn!(
                transaction_id = id,
                "all transaction IDs pending, dropping a callback"
            );
        }
        id
    }

    /// Remove and return the callback for `id`. ID 0 never matches.
    pub fn complete(&self, id: u8) -> Option<ResponseCallback> {
        if id == 0 {
            return None;
        }
        self.state.lock().pending.remove(&id)
    }

    /// Drop the callback for `id` without running it. Returns whether one
    /// was registered.
    pub fn cancel(&self, id: u8) -> bool {
        self.state.lock().pending.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: u8) -> bool {
        self.state.lock().pending.contains_key(&id)
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Drop every pending callback without running it. Returns how many
    /// were dropped.
    pub fn clear(&self) -> usize {
        let pending = std::mem::take(&mut self.state.lock().pending);
        pending.len()
    }
}

impl std::fmt::Debug for Transactions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Transactions")
            .field("last_id", &state.ids.last)
            .field("pending", &state.pending.len())
            .finish()
    }
}
