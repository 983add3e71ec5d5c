use core::{
    cell::UnsafeCell,
    ops::{Deref, DerefMut},
};

use mutex_api::Mutex;

use crate::{
    cpu::{self, INVALID_CPUID},
    interrupt,
};

#[derive(Debug, thiserror::Error)]
#[error("lock already held")]
pub struct TryLockError;

#[derive(Default)]
struct RawSpinLock {
    locked: core::sync::atomic::AtomicBool,
    cpuid: UnsafeCell<usize>,
}

unsafe impl Sync for RawSpinLock {}

impl RawSpinLock {
    const fn new() -> Self {
        Self {
            locked: core::sync::atomic::AtomicBool::new(false),
            cpuid: UnsafeCell::new(INVALID_CPUID),
        }
    }

    fn try_acquire(&self) -> Result<(), TryLockError> {
        use core::sync::atomic::Ordering;

        // Disable interrupts to avoid deadlocking with an interrupt handler
        // that wants the same lock.
        let int_guard = interrupt::push_disabled();

        assert!(!self.holding());

        if self.locked.swap(true, Ordering::Acquire) {
            drop(int_guard);
            return Err(TryLockError);
        }

        unsafe {
            *self.cpuid.get() = cpu::id();
        }

        int_guard.forget(); // drop would re-enable interrupts early.

        Ok(())
    }

    /// Spins until the lock is acquired.
    pub(crate) fn acquire(&self) {
        use core::sync::atomic::Ordering;

        let int_guard = interrupt::push_disabled();

        assert!(!self.holding());

        while self.locked.swap(true, Ordering::Acquire) {}

        unsafe {
            *self.cpuid.get() = cpu::id();
        }

        int_guard.forget();
    }

    pub(crate) fn release(&self) {
        use core::sync::atomic::Ordering;

        assert!(self.holding());

        unsafe {
            *self.cpuid.get() = INVALID_CPUID;
        }

        self.locked.store(false, Ordering::Release);

        unsafe {
            interrupt::pop_disabled();
        }
    }

    /// Interrupts must be off.
    pub(crate) fn holding(&self) -> bool {
        use core::sync::atomic::Ordering;

        assert!(!interrupt::is_enabled());
        self.locked.load(Ordering::Relaxed) && unsafe { *self.cpuid.get() } == cpu::id()
    }
}

/// A mutex that spins while the lock is held, disabling interrupts on this
/// hart for the duration to avoid deadlocking with an interrupt handler.
#[derive(Default)]
pub struct SpinLock<T> {
    lock: RawSpinLock,
    value: UnsafeCell<T>,
}

unsafe impl<T> Sync for SpinLock<T> where T: Send {}

impl<T> SpinLock<T> {
    pub const fn new(value: T) -> Self {
        Self {
            lock: RawSpinLock::new(),
            value: UnsafeCell::new(value),
        }
    }

    pub fn try_lock(&self) -> Result<SpinLockGuard<'_, T>, TryLockError> {
        self.lock.try_acquire()?;
        Ok(SpinLockGuard { lock: self })
    }

    /// Spins until the lock is acquired.
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        self.lock.acquire();
        SpinLockGuard { lock: self }
    }

    /// # Safety
    /// The caller must already be holding the lock, e.g. because it was
    /// entered via the scheduler while still holding it.
    pub unsafe fn remember_locked(&self) -> SpinLockGuard<'_, T> {
        assert!(self.lock.holding());
        SpinLockGuard { lock: self }
    }
}

impl<T> Mutex for SpinLock<T> {
    type Data = T;
    type Guard<'a>
        = SpinLockGuard<'a, T>
    where
        T: 'a;

    fn new(data: Self::Data) -> Self {
        Self::new(data)
    }

    fn lock(&self) -> Self::Guard<'_> {
        self.lock()
    }
}

pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

unsafe impl<T> Send for SpinLockGuard<'_, T> where T: Send {}
unsafe impl<T> Sync for SpinLockGuard<'_, T> where T: Sync {}

impl<T> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.lock.release();
    }
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<'a, T> SpinLockGuard<'a, T> {
    /// Releases the lock and returns a reference to it, for code that must
    /// give the lock up and reacquire it later (see `proc::ops::sleep`).
    pub fn into_lock(self) -> &'a SpinLock<T> {
        let lock = self.lock;
        drop(self);
        lock
    }
}
