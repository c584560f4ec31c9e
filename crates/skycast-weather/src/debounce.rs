//! Delay-and-supersede primitive for input-driven calls.
//!
//! One pending timer slot plus a generation counter. Arming a new timer bumps
//! the generation and cancels the previous timer; a timer that wakes up with
//! a stale generation does nothing. Once a timer has fired its task runs to
//! completion; only unfired timers can be cancelled.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Inner {
    generation: AtomicU64,
    pending: Mutex<Option<(u64, CancellationToken)>>,
}

/// At most one pending invocation at any time. Must be used inside a tokio runtime.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    inner: Arc<Inner>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: Arc::new(Inner::default()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Generation of the most recently armed (or cancelled) timer.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// True while a timer is armed and has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.inner.pending.lock().is_some()
    }

    /// Arm the timer with the default delay. Returns the new generation.
    pub fn schedule<F, Fut>(&self, task: F) -> u64
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.schedule_after(self.delay, task)
    }

    /// Cancel any unfired timer and arm a new one for `task`.
    pub fn schedule_after<F, Fut>(&self, delay: Duration, task: F) -> u64
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let generation = {
            let mut pending = self.inner.pending.lock();
            if let Some((_, previous)) = pending.take() {
                previous.cancel();
            }
            let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *pending = Some((generation, token.clone()));
            generation
        };

        let inner = self.inner.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::trace!("Debounced call {} cancelled", generation);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            {
                let mut pending = inner.pending.lock();
                if inner.generation.load(Ordering::SeqCst) != generation {
                    return;
                }
                if matches!(pending.as_ref(), Some((g, _)) if *g == generation) {
                    pending.take();
                }
            }

            task().await;
        });

        generation
    }

    /// Discard the pending call, if any, without running it.
    pub fn cancel(&self) {
        let mut pending = self.inner.pending.lock();
        if let Some((_, token)) = pending.take() {
            token.cancel();
        }
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn push(log: &Log, name: &'static str) -> impl FnOnce() -> std::future::Ready<()> + Send + 'static {
        let log = log.clone();
        move || {
            log.lock().push(name);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_quiet_period() {
        let log = Log::default();
        let debouncer = Debouncer::new(Duration::from_millis(300));

        debouncer.schedule(push(&log, "a"));
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(log.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(*log.lock(), vec!["a"]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_schedule_supersedes_pending() {
        let log = Log::default();
        let debouncer = Debouncer::new(Duration::from_millis(300));

        let first = debouncer.schedule(push(&log, "L"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = debouncer.schedule(push(&log, "Lo"));
        assert!(second > first);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*log.lock(), vec!["Lo"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending() {
        let log = Log::default();
        let debouncer = Debouncer::new(Duration::from_millis(300));

        debouncer.schedule(push(&log, "a"));
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(log.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_all_fire() {
        let log = Log::default();
        let debouncer = Debouncer::new(Duration::from_millis(300));

        debouncer.schedule(push(&log, "a"));
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.schedule(push(&log, "b"));
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(*log.lock(), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fired_task_is_not_interrupted() {
        let done = Arc::new(AtomicU64::new(0));
        let debouncer = Debouncer::new(Duration::from_millis(100));

        let slow = done.clone();
        debouncer.schedule(move || async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            slow.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        debouncer.cancel();
        let fast = done.clone();
        debouncer.schedule(move || async move {
            fast.fetch_add(10, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(done.load(Ordering::SeqCst), 11);
    }
}
