use std::time::Duration;

use tokio::time::{Instant, sleep_until};

/// Holds the most recent value until it has been quiet for `delay`.
///
/// Every [`push`](Debouncer::push) replaces the pending value and restarts the
/// window, so only the last value of a burst is ever released.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.delay));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Releases the pending value if its window has elapsed.
    pub fn take_ready(&mut self) -> Option<T> {
        match self.deadline() {
            Some(deadline) if Instant::now() >= deadline => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    /// Waits for the pending value to settle. Returns `None` when nothing is pending.
    pub async fn settled(&mut self) -> Option<T> {
        let deadline = self.deadline()?;
        sleep_until(deadline).await;
        self.take_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn only_last_value_in_window_is_released() {
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        debouncer.push("p");
        tokio::time::advance(Duration::from_millis(200)).await;
        debouncer.push("po");
        tokio::time::advance(Duration::from_millis(200)).await;
        debouncer.push("pot");

        assert_eq!(debouncer.take_ready(), None);
        tokio::time::advance(Duration::from_millis(499)).await;
        assert_eq!(debouncer.take_ready(), None);
        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(debouncer.take_ready(), Some("pot"));
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn settled_waits_out_the_window() {
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        assert_eq!(debouncer.settled().await, None);

        let start = Instant::now();
        debouncer.push(42);
        assert_eq!(debouncer.settled().await, Some(42));
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_value() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.push(1);
        debouncer.cancel();
        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(debouncer.take_ready(), None);
    }
}
