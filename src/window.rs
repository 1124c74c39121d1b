//! Elastic concurrency window for the upload engine.
//!
//! [`WindowBudget`] bounds how many upload chunks may be in flight at once.
//! The budget starts at one permitted window and grows toward its capacity
//! as chunks succeed; the first request timeout permanently freezes growth
//! and shrinks the budget by one, trading throughput for stability on a
//! congested link.
//!
//! Acquire/release is a counting gate built on [`tokio::sync::Notify`]
//! rather than a semaphore, because the number of permits has to change
//! while waiters are parked.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Elastic in-flight window budget.
#[derive(Debug)]
pub struct WindowBudget {
    /// Hard ceiling the budget can grow to.
    capacity: u32,
    /// Currently permitted number of in-flight windows.
    allowed: AtomicU32,
    /// Currently occupied windows.
    active: AtomicU32,
    /// Once set, the budget never grows again.
    frozen: AtomicBool,
    notify: Notify,
}

impl WindowBudget {
    /// Create a budget with the given ceiling, starting at one permitted
    /// window.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity: capacity.max(1),
            allowed: AtomicU32::new(1),
            active: AtomicU32::new(0),
            frozen: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Try to occupy a window without waiting.
    pub fn try_acquire(&self) -> bool {
        let mut current = self.active.load(Ordering::Acquire);
        loop {
            if current >= self.allowed.load(Ordering::Acquire) {
                return false;
            }
            match self.active.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Occupy a window, waiting until one frees up.
    ///
    /// Returns `false` when `cancel` fires before a window becomes
    /// available.
    pub async fn acquire(&self, cancel: &CancellationToken) -> bool {
        loop {
            // Arm the waiter before re-checking, so a release between the
            // check and the await cannot be lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.try_acquire() {
                return true;
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = cancel.cancelled() => return false,
            }
        }
    }

    /// Release a previously acquired window.
    pub fn release(&self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
        self.notify.notify_waiters();
    }

    /// Permit one more in-flight window.
    ///
    /// No-op once the budget is frozen or already at capacity. Returns
    /// whether the budget actually grew.
    pub fn grow(&self) -> bool {
        if self.frozen.load(Ordering::Acquire) {
            return false;
        }
        let mut current = self.allowed.load(Ordering::Acquire);
        loop {
            if current >= self.capacity {
                return false;
            }
            match self.allowed.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    tracing::debug!(allowed = current + 1, "window budget grew");
                    self.notify.notify_waiters();
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Freeze growth and shrink the permitted window count by one, never
    /// below one.
    pub fn back_off(&self) {
        self.frozen.store(true, Ordering::Release);
        let mut current = self.allowed.load(Ordering::Acquire);
        loop {
            if current <= 1 {
                return;
            }
            match self.allowed.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    tracing::debug!(allowed = current - 1, "window budget backed off");
                    return;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Currently occupied windows.
    pub fn active(&self) -> u32 {
        self.active.load(Ordering::Acquire)
    }

    /// Currently permitted windows.
    pub fn allowed(&self) -> u32 {
        self.allowed.load(Ordering::Acquire)
    }

    /// Hard ceiling.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Whether growth has been frozen by a back-off.
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }
}
