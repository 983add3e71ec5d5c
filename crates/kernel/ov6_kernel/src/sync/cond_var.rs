use core::sync::atomic::{AtomicU64, Ordering};

use super::SpinLockGuard;
use crate::proc::ops::{self, SleepError};

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("waiting process already killed")]
    WaitingProcessAlreadyKilled,
}

/// A condition variable tied to a [`SpinLock`](super::SpinLock), identified
/// by its own address as the sleep channel.
pub struct SpinLockCondVar {
    counter: AtomicU64,
}

impl SpinLockCondVar {
    pub const fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    /// Releases `guard` and sleeps until [`notify`](Self::notify) is called,
    /// then reacquires the lock.
    ///
    /// Loops internally against wakeups that turn out to have been for a
    /// stale generation of the condition, so callers only need their own
    /// `while !condition { guard = cv.wait(guard)? }` loop.
    pub fn wait<'a, T>(
        &self,
        mut guard: SpinLockGuard<'a, T>,
    ) -> Result<SpinLockGuard<'a, T>, (SpinLockGuard<'a, T>, WaitError)> {
        let seen = self.counter.load(Ordering::Relaxed);
        loop {
            guard = match ops::sleep(self, guard) {
                Ok(guard) => guard,
                Err((guard, SleepError::SleepingProcessAlreadyKilled)) => {
                    return Err((guard, WaitError::WaitingProcessAlreadyKilled));
                }
            };
            if self.counter.load(Ordering::Relaxed) != seen {
                return Ok(guard);
            }
        }
    }

    /// Wakes every process sleeping on this condition variable.
    pub fn notify(&self) {
        self.counter.fetch_add(1, Ordering::Relaxed);
        ops::wakeup(self);
    }
}

impl Default for SpinLockCondVar {
    fn default() -> Self {
        Self::new()
    }
}
