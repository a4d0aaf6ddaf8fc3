use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::Result;

/// Latest result of a polled fetcher. A failed poll keeps the previous data.
#[derive(Debug, Clone)]
pub struct PollState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub polls: u64,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self { data: None, loading: false, error: None, polls: 0 }
    }
}

/// Runs a fetcher immediately and then every `period` until stopped or dropped.
pub struct Poller<T> {
    state_rx: watch::Receiver<PollState<T>>,
    task: JoinHandle<()>,
}

impl<T> Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn spawn<F, Fut>(mut fetcher: F, period: Duration) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (state_tx, state_rx) = watch::channel(PollState::default());
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                state_tx.send_modify(|s| s.loading = true);
                let result = fetcher().await;
                state_tx.send_modify(|s| {
                    s.loading = false;
                    s.polls += 1;
                    match result {
                        Ok(data) => {
                            s.data = Some(data);
                            s.error = None;
                        }
                        Err(e) => {
                            warn!("poll failed: {e}");
                            s.error = Some(e.to_string());
                        }
                    }
                });
                debug!("poll complete");
            }
        });
        Self { state_rx, task }
    }

    pub fn state(&self) -> PollState<T> {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState<T>> {
        self.state_rx.clone()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use crate::error::AppError;

    #[tokio::test(start_paused = true)]
    async fn polls_immediately_then_on_period() {
        let counter = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&counter);
        let poller = Poller::spawn(
            move || {
                let c = Arc::clone(&c);
                async move { Ok(c.fetch_add(1, Ordering::SeqCst) + 1) }
            },
            Duration::from_secs(5),
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        let s = poller.state();
        assert_eq!(s.data, Some(1));
        assert_eq!(s.polls, 1);
        assert!(!s.loading);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(poller.state().data, Some(3));

        poller.stop();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_previous_data() {
        let counter = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&counter);
        let poller = Poller::spawn(
            move || {
                let n = c.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Ok("first".to_string())
                    } else {
                        Err(AppError::Fetch("timeout".to_string()))
                    }
                }
            },
            Duration::from_secs(1),
        );

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let s = poller.state();
        assert_eq!(s.data.as_deref(), Some("first"));
        assert_eq!(s.error.as_deref(), Some("Fetch failed: timeout"));
        assert_eq!(s.polls, 2);
    }
}
