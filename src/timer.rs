// One-shot delayed message, cancelled when rescheduled or dropped.
use std::time::Duration;

use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct AutoClear {
    cancellation_token: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl AutoClear {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends `message` after `delay`. Replaces any pending schedule.
    pub fn schedule<T: Send + 'static>(
        &mut self,
        delay: Duration,
        sender: UnboundedSender<T>,
        message: T,
    ) {
        self.cancel();
        let token = CancellationToken::new();
        let child = token.clone();
        self.task = Some(tokio::spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    // The receiver may be gone during shutdown.
                    let _ = sender.send(message);
                }
            }
        }));
        self.cancellation_token = Some(token);
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.cancellation_token.take() {
            token.cancel();
        }
        self.task = None;
    }

    pub fn is_pending(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for AutoClear {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn fires_after_the_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = AutoClear::new();
        timer.schedule(Duration::from_millis(200), tx, "clear");
        assert!(timer.is_pending());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(rx.recv().await, Some("clear"));
    }

    #[tokio::test]
    async fn rescheduling_cancels_the_previous_message() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = AutoClear::new();
        timer.schedule(Duration::from_millis(20), tx.clone(), 1);
        timer.schedule(Duration::from_millis(60), tx, 2);

        assert_eq!(rx.recv().await, Some(2));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropping_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel::<u8>();
        {
            let mut timer = AutoClear::new();
            timer.schedule(Duration::from_millis(20), tx, 7);
            timer.cancel();
            assert!(!timer.is_pending());
        }
        // Every sender is gone once the task finished, so recv ends.
        assert_eq!(rx.recv().await, None);
    }
}
