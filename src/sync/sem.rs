//! Binary semaphore
//!
//! Event signalling between an interrupt and the task that services it.
//! The semaphore holds at most one token: giving to a full semaphore is
//! absorbed, so a burst of interrupts before the task runs collapses into
//! a single wake-up.

use crate::os::critical::{critical_section, is_isr_context, CriticalSection};
use crate::os::cs_cell::CsCell;
use crate::os::error::{OsError, OsResult};
use crate::os::kernel::{self, IsrYield, KERNEL, SCHED};
use crate::os::sched::{self, WaitList};
use crate::os::types::{OsObjType, OsPendOn, OsPendStatus, OsPrio, Timeout};

struct SemInner {
    obj_type: OsObjType,
    available: bool,
    waiters: WaitList,
    name: &'static str,
}

// SAFETY: only reached through the critical-section cell
unsafe impl Send for SemInner {}

impl SemInner {
    fn check(&self) -> OsResult<()> {
        if self.obj_type != OsObjType::Sem {
            return Err(OsError::ObjNotCreated);
        }
        Ok(())
    }
}

/// Binary semaphore, created empty
pub struct BinarySemaphore {
    inner: CsCell<SemInner>,
}

/// What a take attempt did inside the critical section
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum TakeStep {
    Taken,
    Parked,
}

impl BinarySemaphore {
    pub const fn new() -> Self {
        BinarySemaphore {
            inner: CsCell::new(SemInner {
                obj_type: OsObjType::None,
                available: false,
                waiters: WaitList::new(),
                name: "",
            }),
        }
    }

    /// Create the semaphore with no token available
    ///
    /// # Returns
    /// * `Err(OsError::CreateIsr)` - Called from an interrupt
    /// * `Err(OsError::ObjCreated)` - Already created
    pub fn create(&self, name: &'static str) -> OsResult<()> {
        if is_isr_context() {
            return Err(OsError::CreateIsr);
        }

        critical_section(|cs| {
            let sem = self.inner.get(cs);
            if sem.obj_type == OsObjType::Sem {
                return Err(OsError::ObjCreated);
            }
            sem.obj_type = OsObjType::Sem;
            sem.available = false;
            sem.waiters = WaitList::new();
            sem.name = name;
            Ok(())
        })?;

        crate::debug!("semaphore '{}' created", name);
        Ok(())
    }

    /// Take the token, waiting up to `timeout` for it.
    ///
    /// # Returns
    /// * `Ok(())` - Token taken
    /// * `Err(OsError::PendWouldBlock)` - `Timeout::NoWait` and no token
    /// * `Err(OsError::Timeout)` - No token before the deadline
    /// * `Err(OsError::PendIsr)` - Called from an interrupt
    /// * `Err(OsError::OsNotRunning)` - Would block before `os_start`
    /// * `Err(OsError::PendAbort)` - Resumed without a give or a timeout
    pub fn take(&self, timeout: Timeout) -> OsResult<()> {
        if is_isr_context() {
            return Err(OsError::PendIsr);
        }

        if critical_section(|cs| self.try_take_or_park(cs, timeout))? == TakeStep::Taken {
            return Ok(());
        }

        sched::os_sched();

        // The giver hands the token straight to the woken waiter
        match kernel::current_pend_status() {
            OsPendStatus::Timeout => Err(OsError::Timeout),
            OsPendStatus::Ok => Ok(()),
            OsPendStatus::Waiting => Err(OsError::PendAbort),
        }
    }

    pub(crate) fn try_take_or_park(
        &self,
        cs: &CriticalSection,
        timeout: Timeout,
    ) -> OsResult<TakeStep> {
        let sem = self.inner.get(cs);
        sem.check()?;

        if sem.available {
            sem.available = false;
            return Ok(TakeStep::Taken);
        }

        if timeout == Timeout::NoWait {
            return Err(OsError::PendWouldBlock);
        }

        if !KERNEL.is_running() {
            return Err(OsError::OsNotRunning);
        }

        let cur = unsafe { kernel::tcb_cur_ptr() }.ok_or(OsError::OsNotRunning)?;
        unsafe {
            SCHED.get(cs).park(
                cur,
                &mut sem.waiters,
                OsPendOn::Semaphore,
                timeout,
                KERNEL.tick_get(),
            );
        }
        Ok(TakeStep::Parked)
    }

    /// Release the token from task context.
    ///
    /// Wakes the most urgent waiter if there is one, otherwise leaves the
    /// token available. Giving an available semaphore changes nothing.
    pub fn give(&self) -> OsResult<()> {
        let woken = critical_section(|cs| self.give_inner(cs))?;
        if woken.is_some() {
            sched::os_sched();
        }
        Ok(())
    }

    /// Release the token from an interrupt handler.
    ///
    /// Returns whether the woken task should preempt the interrupted one;
    /// hand the hint to [`kernel::os_yield_from_isr`] before returning.
    pub fn give_from_isr(&self) -> OsResult<IsrYield> {
        let woken = critical_section(|cs| self.give_inner(cs))?;
        Ok(IsrYield::for_woken(woken))
    }

    fn give_inner(&self, cs: &CriticalSection) -> OsResult<Option<OsPrio>> {
        let sem = self.inner.get(cs);
        sem.check()?;

        let woken = SCHED.get(cs).wake_one(&mut sem.waiters);
        if woken.is_none() {
            sem.available = true;
        }
        Ok(woken)
    }

    pub fn name(&self) -> &'static str {
        critical_section(|cs| self.inner.get(cs).name)
    }

    /// Whether a take would succeed without waiting
    pub fn is_available(&self) -> bool {
        critical_section(|cs| self.inner.get(cs).available)
    }

    #[cfg(test)]
    pub(crate) fn has_waiters(&self) -> bool {
        critical_section(|cs| !self.inner.get(cs).waiters.is_empty())
    }
}

impl Default for BinarySemaphore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use core::ptr::NonNull;

    use super::*;
    use crate::os::kernel::test_support::{fresh_kernel, run_as};
    use crate::os::task::OsTcb;
    use crate::os::time::expire_deadlines;

    #[test]
    fn token_never_counts_past_one() {
        let _k = fresh_kernel();
        static SEM: BinarySemaphore = BinarySemaphore::new();
        SEM.create("press").unwrap();

        assert_eq!(SEM.take(Timeout::NoWait), Err(OsError::PendWouldBlock));
        SEM.give().unwrap();
        SEM.give().unwrap();
        assert!(SEM.is_available());
        assert_eq!(SEM.take(Timeout::NoWait), Ok(()));
        assert_eq!(SEM.take(Timeout::NoWait), Err(OsError::PendWouldBlock));
    }

    #[test]
    fn uncreated_semaphore_is_rejected() {
        let _k = fresh_kernel();
        static SEM: BinarySemaphore = BinarySemaphore::new();
        assert_eq!(SEM.give(), Err(OsError::ObjNotCreated));
        SEM.create("once").unwrap();
        assert_eq!(SEM.create("twice"), Err(OsError::ObjCreated));
    }

    #[test]
    fn blocking_take_before_start_is_refused() {
        let _k = fresh_kernel();
        static SEM: BinarySemaphore = BinarySemaphore::new();
        SEM.create("early").unwrap();
        assert_eq!(SEM.take(Timeout::Forever), Err(OsError::OsNotRunning));
    }

    #[test]
    fn give_from_isr_hands_token_to_parked_task() {
        let _k = fresh_kernel();
        static SEM: BinarySemaphore = BinarySemaphore::new();
        SEM.create("button").unwrap();

        let mut waiter = OsTcb::new();
        waiter.prio = 3;
        let ptr = NonNull::from(&mut waiter);
        critical_section(|cs| unsafe { SCHED.get(cs).make_ready(ptr) });
        run_as(ptr);

        let step = critical_section(|cs| SEM.try_take_or_park(cs, Timeout::Forever));
        assert_eq!(step, Ok(TakeStep::Parked));
        assert!(SEM.has_waiters());
        assert!(unsafe { ptr.as_ref().is_pending() });

        // The interrupted context is the idle task
        let mut idle = OsTcb::new();
        idle.prio = crate::os::config::CFG_PRIO_IDLE;
        run_as(NonNull::from(&mut idle));

        let hint = SEM.give_from_isr().unwrap();
        assert!(hint.is_required());
        assert!(!SEM.has_waiters());
        assert!(!SEM.is_available());
        unsafe {
            assert!(ptr.as_ref().is_ready());
            assert_eq!(ptr.as_ref().pend_status, OsPendStatus::Ok);
        }

        KERNEL.set_running(false);
    }

    #[test]
    fn resuming_without_a_give_is_not_a_token() {
        let _k = fresh_kernel();
        static SEM: BinarySemaphore = BinarySemaphore::new();
        SEM.create("press").unwrap();

        let mut waiter = OsTcb::new();
        waiter.prio = 4;
        let ptr = NonNull::from(&mut waiter);
        critical_section(|cs| unsafe { SCHED.get(cs).make_ready(ptr) });
        run_as(ptr);

        // No context switch happens off target, so the take comes straight
        // back while the task is still parked
        assert_eq!(SEM.take(Timeout::Forever), Err(OsError::PendAbort));
        assert!(SEM.has_waiters());
        assert!(!SEM.is_available());

        KERNEL.set_running(false);
    }

    #[test]
    fn timed_take_expires() {
        let _k = fresh_kernel();
        static SEM: BinarySemaphore = BinarySemaphore::new();
        SEM.create("timed").unwrap();

        let mut waiter = OsTcb::new();
        waiter.prio = 4;
        let ptr = NonNull::from(&mut waiter);
        critical_section(|cs| unsafe { SCHED.get(cs).make_ready(ptr) });
        run_as(ptr);

        let step = critical_section(|cs| SEM.try_take_or_park(cs, Timeout::Ticks(5)));
        assert_eq!(step, Ok(TakeStep::Parked));

        critical_section(|cs| expire_deadlines(SCHED.get(cs), 4));
        assert!(SEM.has_waiters());

        critical_section(|cs| expire_deadlines(SCHED.get(cs), 5));
        assert!(!SEM.has_waiters());
        unsafe {
            assert!(ptr.as_ref().is_ready());
            assert_eq!(ptr.as_ref().pend_status, OsPendStatus::Timeout);
        }
        assert_eq!(kernel::current_pend_status(), OsPendStatus::Timeout);

        KERNEL.set_running(false);
    }
}
