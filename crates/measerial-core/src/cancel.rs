use crossbeam_channel::{bounded, Receiver, Sender};
use std::time::{Duration, Instant};

/// Checked by the acquisition loop between reads.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Receiver<Instant>,
}

/// Fires the paired [`CancelToken`].
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Sender<Instant>,
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = bounded(1);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        // A full channel means it already fired.
        let _ = self.tx.try_send(Instant::now());
    }
}

impl CancelToken {
    /// A token that fires by itself once `limit` has passed.
    pub fn after(limit: Duration) -> Self {
        Self {
            rx: crossbeam_channel::after(limit),
        }
    }

    /// Never consumes the signal, so every clone observes it.
    pub fn is_cancelled(&self) -> bool {
        !self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_cancelled() {
        let (handle, token) = cancel_pair();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        handle.cancel();
        handle.cancel();
        assert!(token.is_cancelled());
        assert!(clone.is_cancelled());
    }

    #[test]
    fn dropped_handle_does_not_cancel() {
        let (handle, token) = cancel_pair();
        drop(handle);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn deadline_token() {
        let token = CancelToken::after(Duration::from_millis(10));
        assert!(!token.is_cancelled());
        std::thread::sleep(Duration::from_millis(30));
        assert!(token.is_cancelled());
    }
}
