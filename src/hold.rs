use crate::events::{HostEvent, PanelMessage};
use async_channel::Sender;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Deferred promotion of a held slot into its ready state.
///
/// The task only sleeps and posts [`PanelMessage::HoldElapsed`] to the owner
/// queue. Each arm gets a new generation; [`HoldTimer::accept`] rejects
/// messages from cancelled or superseded arms, so a post that races a
/// cancel is harmless.
pub struct HoldTimer {
    runtime: Handle,
    tx: Sender<HostEvent>,
    delay: Duration,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl HoldTimer {
    pub fn new(runtime: Handle, tx: Sender<HostEvent>, delay: Duration) -> Self {
        Self {
            runtime,
            tx,
            delay,
            generation: 0,
            pending: None,
        }
    }

    /// Takes effect on the next arm.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn arm(&mut self) -> u64 {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let tx = self.tx.clone();
        let delay = self.delay;
        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if tx
                .send(PanelMessage::HoldElapsed { generation }.into())
                .await
                .is_err()
            {
                log::debug!("Hold timer {} fired after the queue closed", generation);
            }
        }));
        generation
    }

    /// Returns whether a pending arm was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    /// Consumes the pending arm if `generation` is the live one.
    pub fn accept(&mut self, generation: u64) -> bool {
        if self.pending.is_some() && generation == self.generation {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

impl Drop for HoldTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn timer() -> (HoldTimer, async_channel::Receiver<HostEvent>) {
        let (tx, rx) = async_channel::unbounded();
        let timer = HoldTimer::new(Handle::current(), tx, Duration::from_millis(200));
        (timer, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (mut timer, rx) = timer();
        let start = Instant::now();
        let generation = timer.arm();

        let event = rx.recv().await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(
            event,
            HostEvent::Panel(PanelMessage::HoldElapsed { generation })
        );
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(210));
        assert!(timer.accept(generation));
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_posts() {
        let (mut timer, rx) = timer();
        timer.arm();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(timer.cancel());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
        assert!(!timer.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_supersedes_previous() {
        let (mut timer, rx) = timer();
        let first = timer.arm();
        let second = timer.arm();
        assert_ne!(first, second);

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            HostEvent::Panel(PanelMessage::HoldElapsed { generation: second })
        );
        assert!(!timer.accept(first));
        assert!(timer.accept(second));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_message_is_rejected_after_cancel() {
        let (mut timer, _rx) = timer();
        let generation = timer.arm();
        timer.cancel();
        assert!(!timer.accept(generation));
    }
}
