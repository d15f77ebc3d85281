use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Cooperative cancellation shared between the scheduler and whoever may
/// ask it to stop (signal handlers, key input).
///
/// Clones share the same flag. Once requested, a stop cannot be withdrawn.
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self) -> MutexGuard<'_, bool> {
        // A poisoned flag is still a valid bool.
        self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Ask the scheduler to stop and wake it if it is waiting.
    pub fn request_stop(&self) {
        *self.flag() = true;
        self.inner.1.notify_all();
    }

    pub fn is_stop_requested(&self) -> bool {
        *self.flag()
    }

    /// Wait up to `timeout`, returning early only if a stop is requested.
    ///
    /// Returns `true` when a stop was requested. Spurious wakeups resume the
    /// wait, so without a stop this never returns before `timeout` elapsed.
    /// A timeout too large to express as a deadline waits until stopped.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait_until_stopped();
            return true;
        };
        let mut stopped = self.flag();
        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            stopped = match self.inner.1.wait_timeout(stopped, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }

    fn wait_until_stopped(&self) {
        let mut stopped = self.flag();
        while !*stopped {
            stopped = match self.inner.1.wait(stopped) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }
}
