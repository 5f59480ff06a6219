//! One-shot stop signal for a session driver.
//!
//! A [`Gate`] starts open and can be closed exactly once. Closing again is a
//! no-op. Observing the state never blocks, and [`Gate::closed`] lets async
//! code wait for the close.

use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

/// A one-shot, idempotent, thread-safe stop signal.
///
/// The underlying watch channel is created lazily under the lock, so a gate
/// that is never observed or closed allocates nothing.
#[derive(Debug, Default)]
pub struct Gate {
    signal: Mutex<Option<watch::Sender<bool>>>,
}

impl Gate {
    /// Create a new open gate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            signal: Mutex::new(None),
        }
    }

    fn with_signal<T>(&self, f: impl FnOnce(&watch::Sender<bool>) -> T) -> T {
        let mut guard = self.signal.lock().unwrap_or_else(PoisonError::into_inner);
        let signal = guard.get_or_insert_with(|| watch::channel(false).0);
        f(signal)
    }

    /// Close the gate.
    ///
    /// Returns `true` if this call performed the close, `false` if the gate
    /// was already closed.
    pub fn close(&self) -> bool {
        self.with_signal(|signal| {
            signal.send_if_modified(|closed| {
                if *closed {
                    false
                } else {
                    *closed = true;
                    true
                }
            })
        })
    }

    /// Check whether the gate is closed without blocking.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.with_signal(|signal| *signal.borrow())
    }

    /// Wait until the gate is closed.
    pub async fn closed(&self) {
        let mut rx = self.with_signal(watch::Sender::subscribe);
        // The sender lives as long as the gate, so this only fails if the
        // gate itself is dropped while waiting.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn starts_open() {
        let gate = Gate::new();
        assert!(!gate.is_closed());
    }

    #[test]
    fn close_is_idempotent() {
        let gate = Gate::new();
        assert!(gate.close());
        assert!(!gate.close());
        assert!(!gate.close());
        assert!(gate.is_closed());
    }

    #[test]
    fn concurrent_close_happens_once() {
        let gate = Arc::new(Gate::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                std::thread::spawn(move || gate.close())
            })
            .collect();

        let closes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|closed| *closed)
            .count();

        assert_eq!(closes, 1);
        assert!(gate.is_closed());
    }

    #[tokio::test]
    async fn closed_wakes_waiters() {
        let gate = Arc::new(Gate::new());
        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.closed().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        gate.close();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn closed_returns_immediately_when_already_closed() {
        let gate = Gate::new();
        gate.close();
        tokio::time::timeout(Duration::from_millis(100), gate.closed())
            .await
            .expect("already closed");
    }
}
