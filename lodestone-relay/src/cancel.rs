//! Cancellation of in-flight scans.
//!
//! A scan suspends at every RPC boundary; the token is checked at each of
//! them, so cancellation takes effect at the next network round-trip and
//! the caller never receives partial results.

use tokio::sync::watch;

/// Handle held by the controller to abort a scan.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation to every token cloned from this handle.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Token carried through a scan.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Create a connected handle/token pair.
    pub fn channel() -> (CancelHandle, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelToken { rx })
    }

    /// A token that never fires.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        CancelToken { rx }
    }

    /// Whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_propagates_to_clones() {
        let (handle, token) = CancelToken::channel();
        let clone = token.clone();
        assert!(!token.is_cancelled());

        handle.cancel();
        assert!(token.is_cancelled());
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_never_token() {
        assert!(!CancelToken::never().is_cancelled());
    }
}
