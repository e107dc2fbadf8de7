use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A flag that asks a running `RETR` transfer to stop.
///
/// Clones share the flag, so a token handed to another thread can cancel a transfer that is
/// blocked in [`Session::retr`](crate::Session::retr). The flag is checked between reads; a read
/// that is already blocked finishes (or times out) first.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be used for the next transfer.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
