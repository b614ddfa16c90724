//! Bounded message queue
//!
//! FIFO of owned values between tasks and interrupts. Values move in on
//! `send` and out on `receive`; a send that cannot complete hands the value
//! back inside the error, so nothing is copied or leaked.
//!
//! Waiters are parked by priority. A woken sender or receiver retries its
//! operation, since a more urgent task may have used the slot first; the
//! retry waits only for what is left of the original timeout.

use core::fmt;

use heapless::Deque;

use crate::os::critical::{critical_section, is_isr_context, CriticalSection};
use crate::os::cs_cell::CsCell;
use crate::os::error::{OsError, OsResult};
use crate::os::kernel::{self, IsrYield, KERNEL, SCHED};
use crate::os::sched::{self, WaitList};
use crate::os::time::Deadline;
use crate::os::types::{OsObjType, OsPendOn, OsPendStatus, OsPrio, Timeout};

/// A send that did not happen. The value is returned to the caller.
#[derive(PartialEq, Eq)]
pub enum SendError<T> {
    /// Queue full and the caller would not wait
    Full(T),
    /// Still full when the deadline passed
    Timeout(T),
    /// Refused by the kernel: not created, not running, or wrong context
    Os(OsError, T),
}

impl<T> SendError<T> {
    /// Take back the value that was not sent
    pub fn into_inner(self) -> T {
        match self {
            SendError::Full(v) | SendError::Timeout(v) | SendError::Os(_, v) => v,
        }
    }

    /// Kernel error code equivalent
    pub fn error(&self) -> OsError {
        match self {
            SendError::Full(_) => OsError::PendWouldBlock,
            SendError::Timeout(_) => OsError::Timeout,
            SendError::Os(e, _) => *e,
        }
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Full(_) => f.write_str("Full(..)"),
            SendError::Timeout(_) => f.write_str("Timeout(..)"),
            SendError::Os(e, _) => write!(f, "Os({:?}, ..)", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl<T> defmt::Format for SendError<T> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.error())
    }
}

pub(crate) enum SendStep<T> {
    /// Enqueued; carries the priority of a receiver that was woken
    Sent(Option<OsPrio>),
    /// The caller is parked on the queue and keeps the value for its retry
    Parked(T),
}

pub(crate) enum RecvStep<T> {
    Received(T, Option<OsPrio>),
    Parked,
}

struct QueueInner<T, const N: usize> {
    obj_type: OsObjType,
    items: Deque<T, N>,
    senders: WaitList,
    receivers: WaitList,
    name: &'static str,
}

// SAFETY: only reached through the critical-section cell
unsafe impl<T: Send, const N: usize> Send for QueueInner<T, N> {}

impl<T, const N: usize> QueueInner<T, N> {
    fn check(&self) -> OsResult<()> {
        if self.obj_type != OsObjType::Queue {
            return Err(OsError::ObjNotCreated);
        }
        Ok(())
    }
}

/// Bounded FIFO of `N` values of `T`
pub struct Queue<T, const N: usize> {
    inner: CsCell<QueueInner<T, N>>,
}

impl<T, const N: usize> Queue<T, N> {
    pub const fn new() -> Self {
        Queue {
            inner: CsCell::new(QueueInner {
                obj_type: OsObjType::None,
                items: Deque::new(),
                senders: WaitList::new(),
                receivers: WaitList::new(),
                name: "",
            }),
        }
    }

    /// Create the queue empty
    ///
    /// # Returns
    /// * `Err(OsError::CreateIsr)` - Called from an interrupt
    /// * `Err(OsError::ObjCreated)` - Already created
    pub fn create(&self, name: &'static str) -> OsResult<()> {
        if is_isr_context() {
            return Err(OsError::CreateIsr);
        }

        critical_section(|cs| {
            let q = self.inner.get(cs);
            if q.obj_type == OsObjType::Queue {
                return Err(OsError::ObjCreated);
            }
            q.obj_type = OsObjType::Queue;
            q.items.clear();
            q.senders = WaitList::new();
            q.receivers = WaitList::new();
            q.name = name;
            Ok(())
        })?;

        crate::debug!("queue '{}' created, {} slots", name, N);
        Ok(())
    }

    /// Append `value`, waiting up to `timeout` for a free slot.
    ///
    /// A woken sender that finds the slot taken again waits only for what
    /// is left of `timeout`.
    pub fn send(&self, value: T, timeout: Timeout) -> Result<(), SendError<T>> {
        if is_isr_context() {
            return Err(SendError::Os(OsError::PendIsr, value));
        }

        let deadline = Deadline::start(timeout, KERNEL.tick_get());
        let mut value = value;
        let mut wait = timeout;
        let mut expired = false;
        loop {
            match critical_section(|cs| self.try_send_or_park(cs, value, wait)) {
                Ok(SendStep::Sent(woken)) => {
                    if woken.is_some() {
                        sched::os_sched();
                    }
                    return Ok(());
                }
                Ok(SendStep::Parked(v)) => value = v,
                Err(SendError::Full(v)) if expired => return Err(SendError::Timeout(v)),
                Err(e) => return Err(e),
            }

            sched::os_sched();

            match kernel::current_pend_status() {
                OsPendStatus::Ok => {}
                OsPendStatus::Timeout => return Err(SendError::Timeout(value)),
                OsPendStatus::Waiting => return Err(SendError::Os(OsError::PendAbort, value)),
            }

            wait = match deadline.remaining(KERNEL.tick_get()) {
                Some(left) => left,
                None => {
                    expired = true;
                    Timeout::NoWait
                }
            };
        }
    }

    /// Append `value` from an interrupt handler. Never waits.
    pub fn send_from_isr(&self, value: T) -> Result<IsrYield, SendError<T>> {
        critical_section(|cs| {
            let q = self.inner.get(cs);
            if let Err(e) = q.check() {
                return Err(SendError::Os(e, value));
            }
            q.items.push_back(value).map_err(SendError::Full)?;
            let woken = SCHED.get(cs).wake_one(&mut q.receivers);
            Ok(IsrYield::for_woken(woken))
        })
    }

    pub(crate) fn try_send_or_park(
        &self,
        cs: &CriticalSection,
        value: T,
        timeout: Timeout,
    ) -> Result<SendStep<T>, SendError<T>> {
        let q = self.inner.get(cs);
        if let Err(e) = q.check() {
            return Err(SendError::Os(e, value));
        }

        let value = match q.items.push_back(value) {
            Ok(()) => {
                let woken = SCHED.get(cs).wake_one(&mut q.receivers);
                return Ok(SendStep::Sent(woken));
            }
            Err(value) => value,
        };

        if timeout == Timeout::NoWait {
            return Err(SendError::Full(value));
        }
        if !KERNEL.is_running() {
            return Err(SendError::Os(OsError::OsNotRunning, value));
        }
        let Some(cur) = (unsafe { kernel::tcb_cur_ptr() }) else {
            return Err(SendError::Os(OsError::OsNotRunning, value));
        };

        unsafe {
            SCHED.get(cs).park(
                cur,
                &mut q.senders,
                OsPendOn::QueueSpace,
                timeout,
                KERNEL.tick_get(),
            );
        }
        Ok(SendStep::Parked(value))
    }

    /// Remove the oldest value, waiting up to `timeout` for one to arrive.
    ///
    /// # Returns
    /// * `Err(OsError::PendWouldBlock)` - `Timeout::NoWait` and empty
    /// * `Err(OsError::Timeout)` - Still empty when the deadline passed
    /// * `Err(OsError::PendIsr)` - Called from an interrupt
    /// * `Err(OsError::OsNotRunning)` - Would block before `os_start`
    /// * `Err(OsError::PendAbort)` - Resumed without a send or a timeout
    pub fn receive(&self, timeout: Timeout) -> OsResult<T> {
        if is_isr_context() {
            return Err(OsError::PendIsr);
        }

        let deadline = Deadline::start(timeout, KERNEL.tick_get());
        let mut wait = timeout;
        let mut expired = false;
        loop {
            match critical_section(|cs| self.try_receive_or_park(cs, wait)) {
                Ok(RecvStep::Received(value, woken)) => {
                    if woken.is_some() {
                        sched::os_sched();
                    }
                    return Ok(value);
                }
                Ok(RecvStep::Parked) => {}
                Err(OsError::PendWouldBlock) if expired => return Err(OsError::Timeout),
                Err(e) => return Err(e),
            }

            sched::os_sched();

            match kernel::current_pend_status() {
                OsPendStatus::Ok => {}
                OsPendStatus::Timeout => return Err(OsError::Timeout),
                OsPendStatus::Waiting => return Err(OsError::PendAbort),
            }

            wait = match deadline.remaining(KERNEL.tick_get()) {
                Some(left) => left,
                None => {
                    expired = true;
                    Timeout::NoWait
                }
            };
        }
    }

    /// Remove the oldest value from an interrupt handler, if any.
    pub fn receive_from_isr(&self) -> OsResult<(T, IsrYield)> {
        critical_section(|cs| {
            let q = self.inner.get(cs);
            q.check()?;
            let value = q.items.pop_front().ok_or(OsError::PendWouldBlock)?;
            let woken = SCHED.get(cs).wake_one(&mut q.senders);
            Ok((value, IsrYield::for_woken(woken)))
        })
    }

    pub(crate) fn try_receive_or_park(
        &self,
        cs: &CriticalSection,
        timeout: Timeout,
    ) -> OsResult<RecvStep<T>> {
        let q = self.inner.get(cs);
        q.check()?;

        if let Some(value) = q.items.pop_front() {
            let woken = SCHED.get(cs).wake_one(&mut q.senders);
            return Ok(RecvStep::Received(value, woken));
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
                &mut q.receivers,
                OsPendOn::QueueData,
                timeout,
                KERNEL.tick_get(),
            );
        }
        Ok(RecvStep::Parked)
    }

    pub fn name(&self) -> &'static str {
        critical_section(|cs| self.inner.get(cs).name)
    }

    /// Number of values waiting
    pub fn len(&self) -> usize {
        critical_section(|cs| self.inner.get(cs).items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        critical_section(|cs| self.inner.get(cs).items.is_full())
    }

    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[cfg(test)]
    pub(crate) fn has_waiting_senders(&self) -> bool {
        critical_section(|cs| !self.inner.get(cs).senders.is_empty())
    }

    #[cfg(test)]
    pub(crate) fn has_waiting_receivers(&self) -> bool {
        critical_section(|cs| !self.inner.get(cs).receivers.is_empty())
    }
}

impl<T, const N: usize> Default for Queue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
