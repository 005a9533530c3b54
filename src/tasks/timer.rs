use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Owned handle to a scheduled task. Dropping the handle cancels the task,
/// and cancelling an already finished or cancelled task is a no-op.
#[derive(Debug, Default)]
pub struct TaskHandle {
    handle: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: Some(tokio::spawn(future)),
        }
    }

    /// Send `message` once after `delay`.
    pub fn after<T>(delay: Duration, tx: UnboundedSender<T>, message: T) -> Self
    where
        T: Send + 'static,
    {
        Self::spawn(async move {
            time::sleep(delay).await;
            // Receiver gone means the owner was torn down
            let _ = tx.send(message);
        })
    }

    /// Send a fresh message every `period`, first one a full period from now.
    /// Stops on its own once the receiver is gone.
    pub fn every<T, F>(period: Duration, tx: UnboundedSender<T>, mut message: F) -> Self
    where
        T: Send + 'static,
        F: FnMut() -> T + Send + 'static,
    {
        Self::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(message()).is_err() {
                    break;
                }
            }
        })
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Returns whether a task was still attached.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
