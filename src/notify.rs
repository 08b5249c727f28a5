use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::debug;

const LISTENER_BUFFER: usize = 32;

struct Listener {
    id: u64,
    tx: mpsc::Sender<String>,
}

/// Process-owned set of live notification listeners. Broadcast never blocks
/// the caller; a listener whose send fails (disconnected receiver or a
/// saturated buffer) is dropped from the set on the spot.
pub struct NotificationHub {
    listeners: Mutex<Vec<Listener>>,
    next_id: AtomicU64,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn register(&self) -> (u64, mpsc::Receiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(LISTENER_BUFFER);
        self.lock().push(Listener { id, tx });
        (id, rx)
    }

    pub fn unregister(&self, id: u64) {
        self.lock().retain(|listener| listener.id != id);
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    /// Attempts delivery to every registered listener and returns how many
    /// accepted the message. Per-listener failures are swallowed and logged;
    /// they never abort delivery to the remaining listeners.
    pub fn broadcast(&self, message: &str) -> usize {
        let mut delivered = 0;
        self.lock().retain(|listener| {
            match listener.tx.try_send(message.to_string()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(err) => {
                    debug!(listener_id = listener.id, "dropping notification listener: {err}");
                    false
                }
            }
        });
        delivered
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Listener>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}
