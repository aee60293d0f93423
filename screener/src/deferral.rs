use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Sleep};

/// A single cancellable timer.
///
/// At most one deferral is pending; scheduling again replaces it. A cancelled
/// or never-scheduled deferral never fires, so [`Deferral::wait`] pends forever
/// and is meant to be guarded with [`Deferral::is_pending`] inside
/// `tokio::select!`.
#[derive(Debug, Default)]
pub struct Deferral {
    timer: Option<Pin<Box<Sleep>>>,
}

impl Deferral {
    /// Nothing scheduled.
    #[must_use]
    pub const fn new() -> Self {
        Self { timer: None }
    }

    /// Arm the timer to fire after `delay`, replacing any pending one.
    pub fn schedule(&mut self, delay: Duration) {
        let deadline = Instant::now() + delay;
        match self.timer.as_mut() {
            Some(timer) => timer.as_mut().reset(deadline),
            None => self.timer = Some(Box::pin(tokio::time::sleep_until(deadline))),
        }
    }

    /// Disarm the timer. A no-op when nothing is pending.
    pub fn cancel(&mut self) {
        self.timer = None;
    }

    /// True while a timer is armed.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.timer.is_some()
    }

    /// Resolve when the pending timer fires, disarming it.
    pub async fn wait(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.as_mut().await;
                self.timer = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
