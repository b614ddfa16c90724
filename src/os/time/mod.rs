//! Time management
//!
//! The tick list holds every task with a deadline (sleepers and timed
//! waiters) sorted by wake-up tick, so each tick only looks at the head.

use core::ptr::NonNull;

use crate::os::critical::{critical_section, is_isr_context};
use crate::os::error::{OsError, OsResult};
use crate::os::kernel::{self, IsrYield, KERNEL, SCHED};
use crate::os::sched::{self, SchedState};
use crate::os::task::OsTcb;
use crate::os::types::{ms_to_ticks, OsPendStatus, OsTaskState, OsTick, Timeout};

/// `now` is at or past `deadline`, modulo tick wrap-around
#[inline(always)]
fn reached(now: OsTick, deadline: OsTick) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}

/// End of a timed wait as an absolute tick, fixed when the wait begins so a
/// retry does not restart the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Deadline {
    timeout: Timeout,
    at: OsTick,
}

impl Deadline {
    pub(crate) fn start(timeout: Timeout, now: OsTick) -> Self {
        let at = match timeout {
            Timeout::Ticks(ticks) => now.wrapping_add(ticks),
            Timeout::NoWait | Timeout::Forever => now,
        };
        Deadline { timeout, at }
    }

    /// What is left of the wait at `now`; `None` once the deadline passed
    pub(crate) fn remaining(&self, now: OsTick) -> Option<Timeout> {
        match self.timeout {
            Timeout::Ticks(_) if reached(now, self.at) => None,
            Timeout::Ticks(_) => Some(Timeout::Ticks(self.at.wrapping_sub(now))),
            other => Some(other),
        }
    }
}

/// Deadline-ordered list of tasks waiting for a tick
#[derive(Debug)]
pub struct TickList {
    head: Option<NonNull<OsTcb>>,
}

impl TickList {
    pub const fn new() -> Self {
        TickList { head: None }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Earliest deadline, if anyone is waiting
    pub fn next_deadline(&self) -> Option<OsTick> {
        self.head.map(|tcb| unsafe { tcb.as_ref().wake_at })
    }

    /// # Safety
    /// `tcb` must be valid and not on the tick list.
    pub unsafe fn insert(&mut self, tcb: NonNull<OsTcb>, wake_at: OsTick) {
        let node = unsafe { &mut *tcb.as_ptr() };
        node.wake_at = wake_at;

        let mut prev: Option<NonNull<OsTcb>> = None;
        let mut next = self.head;
        while let Some(cur) = next {
            let cur_ref = unsafe { cur.as_ref() };
            // Equal deadlines keep arrival order.
            if (wake_at.wrapping_sub(cur_ref.wake_at) as i32) < 0 {
                break;
            }
            prev = next;
            next = cur_ref.tick_next_ptr;
        }

        node.tick_prev_ptr = prev;
        node.tick_next_ptr = next;
        match prev {
            Some(p) => unsafe { (*p.as_ptr()).tick_next_ptr = Some(tcb) },
            None => self.head = Some(tcb),
        }
        if let Some(n) = next {
            unsafe { (*n.as_ptr()).tick_prev_ptr = Some(tcb) };
        }
    }

    /// # Safety
    /// `tcb` must be valid and on this list.
    pub unsafe fn remove(&mut self, tcb: NonNull<OsTcb>) {
        let node = unsafe { &mut *tcb.as_ptr() };
        match node.tick_prev_ptr {
            Some(p) => unsafe { (*p.as_ptr()).tick_next_ptr = node.tick_next_ptr },
            None => self.head = node.tick_next_ptr,
        }
        if let Some(n) = node.tick_next_ptr {
            unsafe { (*n.as_ptr()).tick_prev_ptr = node.tick_prev_ptr };
        }
        node.tick_prev_ptr = None;
        node.tick_next_ptr = None;
    }

    /// Detach the head if its deadline has been reached
    pub fn pop_expired(&mut self, now: OsTick) -> Option<NonNull<OsTcb>> {
        let head = self.head?;
        if !reached(now, unsafe { head.as_ref().wake_at }) {
            return None;
        }
        unsafe { self.remove(head) };
        Some(head)
    }
}

impl Default for TickList {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Send for TickList {}

/// Ready every task whose deadline is `now`. Timed waiters are pulled off
/// their object's wait list and see [`OsPendStatus::Timeout`].
pub(crate) fn expire_deadlines(sched: &mut SchedState, now: OsTick) {
    while let Some(tcb_ptr) = sched.tick_list().pop_expired(now) {
        let tcb = unsafe { &mut *tcb_ptr.as_ptr() };
        match tcb.task_state {
            OsTaskState::Delayed => unsafe { sched.make_ready(tcb_ptr) },
            OsTaskState::PendTimeout => {
                // Already off the tick list; make `wake` skip it.
                tcb.task_state = OsTaskState::Pend;
                unsafe { sched.wake(tcb_ptr, OsPendStatus::Timeout) };
            }
            _ => {}
        }
    }
}

/// Time delay in ticks
///
/// The calling task leaves the ready list and sleeps on the tick list.
///
/// # Returns
/// * `Ok(())` - Delay completed (immediately for `ticks == 0`)
/// * `Err(OsError::TimeDlyIsr)` - Cannot delay from ISR
/// * `Err(OsError::OsNotRunning)` - Scheduler not started
pub fn os_time_dly(ticks: OsTick) -> OsResult<()> {
    if is_isr_context() {
        return Err(OsError::TimeDlyIsr);
    }

    if !KERNEL.is_running() {
        return Err(OsError::OsNotRunning);
    }

    if ticks == 0 {
        return Ok(());
    }

    critical_section(|cs| {
        let sched = SCHED.get(cs);
        if let Some(cur) = unsafe { kernel::tcb_cur_ptr() } {
            unsafe {
                sched.make_unready(cur);
                (*cur.as_ptr()).task_state = OsTaskState::Delayed;
                sched
                    .tick_list()
                    .insert(cur, KERNEL.tick_get().wrapping_add(ticks));
            }
        }
    });

    sched::os_sched();
    Ok(())
}

/// Time delay in milliseconds
pub fn os_time_dly_ms(ms: u32) -> OsResult<()> {
    os_time_dly(ms_to_ticks(ms))
}

/// Convert milliseconds to ticks, rounding up
#[inline]
pub fn os_ms_to_ticks(ms: u32) -> OsTick {
    ms_to_ticks(ms)
}

/// Get current tick count
#[inline]
pub fn os_time_get() -> OsTick {
    KERNEL.tick_get()
}

/// Tick handler: advance time, wake expired deadlines, slice time.
pub fn os_tick_handler() {
    if !KERNEL.is_running() {
        return;
    }

    let now = KERNEL.tick_increment();

    let preempt = critical_section(|cs| {
        let sched = SCHED.get(cs);
        expire_deadlines(sched, now);
        let rotate = sched::os_sched_round_robin(sched);
        rotate || sched.prio_table().get_highest() < unsafe { kernel::prio_cur() }
    });

    kernel::os_yield_from_isr(IsrYield::from_preemption(preempt));
}

/// SysTick interrupt handler
#[no_mangle]
pub extern "C" fn SysTick() {
    os_tick_handler();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::config::CFG_TIME_QUANTA_DEFAULT;
    use crate::os::kernel::test_support::{fresh_kernel, run_as};
    use crate::port::take_switch_request;

    #[test]
    fn deadlines_pop_in_order() {
        let mut a = OsTcb::new();
        let mut b = OsTcb::new();
        let mut c = OsTcb::new();
        let (pa, pb, pc) = (
            NonNull::from(&mut a),
            NonNull::from(&mut b),
            NonNull::from(&mut c),
        );

        let mut list = TickList::new();
        unsafe {
            list.insert(pa, 30);
            list.insert(pb, 10);
            list.insert(pc, 20);
        }
        assert_eq!(list.next_deadline(), Some(10));

        assert_eq!(list.pop_expired(9), None);
        assert_eq!(list.pop_expired(10), Some(pb));
        assert_eq!(list.pop_expired(25), Some(pc));
        assert_eq!(list.pop_expired(25), None);
        assert_eq!(list.pop_expired(31), Some(pa));
        assert!(list.is_empty());
    }

    #[test]
    fn deadlines_survive_wraparound() {
        let mut a = OsTcb::new();
        let mut b = OsTcb::new();
        let (pa, pb) = (NonNull::from(&mut a), NonNull::from(&mut b));

        let mut list = TickList::new();
        unsafe {
            list.insert(pa, 5); // after the wrap
            list.insert(pb, OsTick::MAX - 2);
        }
        assert_eq!(list.pop_expired(OsTick::MAX), Some(pb));
        assert_eq!(list.pop_expired(OsTick::MAX), None);
        assert_eq!(list.pop_expired(5), Some(pa));
    }

    #[test]
    fn deadline_counts_down_across_retries() {
        let d = Deadline::start(Timeout::Ticks(100), 10);
        assert_eq!(d.remaining(10), Some(Timeout::Ticks(100)));
        assert_eq!(d.remaining(70), Some(Timeout::Ticks(40)));
        assert_eq!(d.remaining(110), None);

        let wrapped = Deadline::start(Timeout::Ticks(10), OsTick::MAX - 4);
        assert_eq!(wrapped.remaining(2), Some(Timeout::Ticks(3)));
        assert_eq!(wrapped.remaining(5), None);

        let forever = Deadline::start(Timeout::Forever, 0);
        assert_eq!(forever.remaining(u32::MAX), Some(Timeout::Forever));
    }

    #[test]
    fn tick_wakes_urgent_sleeper_and_preempts() {
        let _k = fresh_kernel();

        let mut sleeper = OsTcb::new();
        sleeper.prio = 2;
        let sleeper = NonNull::from(&mut sleeper);
        critical_section(|cs| unsafe { SCHED.get(cs).make_ready(sleeper) });
        run_as(sleeper);
        os_time_dly(3).unwrap();
        assert!(unsafe { sleeper.as_ref().is_delayed() });

        let mut busy = OsTcb::new();
        busy.prio = 10;
        let busy = NonNull::from(&mut busy);
        critical_section(|cs| unsafe { SCHED.get(cs).make_ready(busy) });
        run_as(busy);
        take_switch_request();

        os_tick_handler();
        os_tick_handler();
        assert!(!take_switch_request());

        os_tick_handler();
        assert!(unsafe { sleeper.as_ref().is_ready() });
        assert!(take_switch_request());

        KERNEL.set_running(false);
    }

    #[test]
    fn equal_priorities_rotate_after_quantum() {
        let _k = fresh_kernel();

        let mut a = OsTcb::new();
        let mut b = OsTcb::new();
        for tcb in [&mut a, &mut b] {
            tcb.prio = 5;
            tcb.time_quanta = CFG_TIME_QUANTA_DEFAULT;
            tcb.time_quanta_ctr = CFG_TIME_QUANTA_DEFAULT;
        }
        let (a, b) = (NonNull::from(&mut a), NonNull::from(&mut b));
        critical_section(|cs| unsafe {
            SCHED.get(cs).make_ready(a);
            SCHED.get(cs).make_ready(b);
        });
        run_as(a);
        take_switch_request();

        for _ in 1..CFG_TIME_QUANTA_DEFAULT {
            os_tick_handler();
            assert!(!take_switch_request());
        }

        os_tick_handler();
        assert!(take_switch_request());
        critical_section(|cs| {
            let list = SCHED.get(cs).rdy_list(5);
            assert_eq!(list.head(), Some(b));
            assert_eq!(list.len(), 2);
        });

        KERNEL.set_running(false);
    }

    #[test]
    fn ms_conversion_rounds_up() {
        assert_eq!(os_ms_to_ticks(0), 0);
        assert_eq!(os_ms_to_ticks(1), 1);
        assert_eq!(os_ms_to_ticks(500), 500);
    }
}
