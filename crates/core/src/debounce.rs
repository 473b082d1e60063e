//! Trailing-edge debounce for free-text search input.
//!
//! Every `push` cancels the pending timer and arms a new one; only a value
//! that survives the full quiet period is delivered on the receiver. Dropping
//! the `Debouncer` cancels whatever is pending.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default quiet period before a search term is committed.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Delays values until input has been quiet for `delay`.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    tx: mpsc::UnboundedSender<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer and the receiver its committed values arrive on.
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { delay, tx, pending: None }, rx)
    }

    /// Record a new input value, restarting the quiet period.
    pub fn push(&mut self, value: T) {
        self.cancel();

        let tx = self.tx.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver may be gone if the owner is shutting down.
            let _ = tx.send(value);
        }));
    }

    /// Cancel the pending timer, if any. Returns `true` if a value was dropped.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_emits_last_value_once() {
        let (mut debouncer, mut rx) = Debouncer::new(DEFAULT_SEARCH_DEBOUNCE);

        debouncer.push("a".to_string());
        tokio::time::sleep(Duration::from_millis(40)).await;
        debouncer.push("ab".to_string());
        tokio::time::sleep(Duration::from_millis(40)).await;
        debouncer.push("abc".to_string());

        assert_eq!(rx.recv().await.as_deref(), Some("abc"));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_only_after_quiet_period() {
        let (mut debouncer, mut rx) = Debouncer::new(Duration::from_millis(250));
        debouncer.push(1);

        tokio::time::sleep(Duration::from_millis(249)).await;
        assert!(rx.try_recv().is_err());
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(rx.try_recv().ok(), Some(1));
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_emit_separately() {
        let (mut debouncer, mut rx) = Debouncer::new(Duration::from_millis(250));
        debouncer.push("naruto");
        assert_eq!(rx.recv().await, Some("naruto"));
        debouncer.push("bleach");
        assert_eq!(rx.recv().await, Some("bleach"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_value() {
        let (mut debouncer, mut rx) = Debouncer::new(Duration::from_millis(250));
        debouncer.push("x");
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_timer() {
        let (mut debouncer, mut rx) = Debouncer::new(Duration::from_millis(250));
        debouncer.push("x");
        drop(debouncer);

        assert_eq!(rx.recv().await, None);
    }
}
