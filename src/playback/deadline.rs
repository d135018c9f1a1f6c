use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub type FireCallback = Box<dyn FnOnce() + Send + 'static>;

/// Single-slot countdown. Arming replaces (and cancels) whatever was pending,
/// so at most one callback is ever outstanding.
pub trait DeadlineTimer: Send {
    fn arm(&mut self, delay: Duration, on_fire: FireCallback);

    /// No-op if nothing is pending or the callback was already dispatched.
    fn cancel(&mut self);

    fn is_pending(&self) -> bool;
}

/// Deadline on the tokio clock. The callback runs on the blocking pool, since
/// it takes locks and talks to the player.
pub struct TokioDeadlineTimer {
    runtime: Handle,
    pending: Option<JoinHandle<()>>,
}

impl TokioDeadlineTimer {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            pending: None,
        }
    }
}

impl DeadlineTimer for TokioDeadlineTimer {
    fn arm(&mut self, delay: Duration, on_fire: FireCallback) {
        self.cancel();
        let runtime = self.runtime.clone();
        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // Once dispatched, aborting this task no longer stops the callback
            runtime.spawn_blocking(on_fire);
        }));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for TokioDeadlineTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
