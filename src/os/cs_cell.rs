//! Critical section protected cell

use core::cell::UnsafeCell;

use crate::os::critical::CriticalSection;

/// Data that may only be touched while interrupts are masked.
///
/// Callers must not hold two references obtained from the same cell at once;
/// every kernel path takes the reference, uses it, and lets it go before
/// calling out.
pub struct CsCell<T>(UnsafeCell<T>);

unsafe impl<T: Send> Sync for CsCell<T> {}

impl<T> CsCell<T> {
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    /// Borrow the contents for the lifetime of the critical section
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    pub fn get<'cs>(&'cs self, _cs: &'cs CriticalSection) -> &'cs mut T {
        unsafe { &mut *self.0.get() }
    }
}
