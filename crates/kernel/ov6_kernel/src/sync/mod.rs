//! Locking primitives shared across the kernel.
//!
//! [`SpinLock`] is the workhorse: interrupts stay disabled for the duration
//! of the critical section, which is what makes it safe to take from both
//! ordinary kernel code and interrupt handlers. [`SpinLockCondVar`] builds a
//! condition variable on top of it using the scheduler's sleep channels.

mod cond_var;
mod sleep_lock;
mod spin_lock;

pub use self::{
    cond_var::{SpinLockCondVar, WaitError},
    sleep_lock::SleepLockError,
    spin_lock::{SpinLock, SpinLockGuard, TryLockError},
};
