//! Scheduler
//!
//! Fixed-priority preemptive scheduling with round-robin between tasks of
//! equal priority. Tasks leave the CPU only at the documented suspension
//! points: semaphore take, queue send/receive with a wait, and delays.

mod rdy_list;
mod wait_list;

pub use rdy_list::ReadyList;
pub use wait_list::WaitList;

use core::ptr::NonNull;

use crate::os::config::{CFG_PRIO_MAX, CFG_SCHED_ROUND_ROBIN_EN};
use crate::os::critical::{critical_section, is_isr_context};
use crate::os::kernel::{self, KERNEL, SCHED};
use crate::os::prio::PrioTable;
use crate::os::task::OsTcb;
use crate::os::time::TickList;
use crate::os::types::{OsPendOn, OsPendStatus, OsPrio, OsTaskState, OsTick, Timeout};

/// Everything the scheduler owns, kept behind one critical-section cell
pub struct SchedState {
    prio_tbl: PrioTable,
    rdy_list: [ReadyList; CFG_PRIO_MAX],
    tick_list: TickList,
}

impl SchedState {
    pub const fn new() -> Self {
        Self {
            prio_tbl: PrioTable::new(),
            rdy_list: [ReadyList::new(); CFG_PRIO_MAX],
            tick_list: TickList::new(),
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline(always)]
    pub fn prio_table(&self) -> &PrioTable {
        &self.prio_tbl
    }

    #[inline(always)]
    pub fn rdy_list(&self, prio: OsPrio) -> &ReadyList {
        &self.rdy_list[prio as usize]
    }

    #[inline(always)]
    pub fn tick_list(&mut self) -> &mut TickList {
        &mut self.tick_list
    }

    /// Head of the highest non-empty ready list
    pub fn highest_ready(&self) -> Option<NonNull<OsTcb>> {
        let prio = self.prio_tbl.get_highest();
        self.rdy_list[prio as usize].head()
    }

    /// Put `tcb` on its ready list.
    ///
    /// # Safety
    /// `tcb` must be valid and not already ready.
    pub unsafe fn make_ready(&mut self, tcb: NonNull<OsTcb>) {
        let node = unsafe { &mut *tcb.as_ptr() };
        node.task_state = OsTaskState::Ready;
        unsafe { self.rdy_list[node.prio as usize].push_back(tcb) };
        self.prio_tbl.insert(node.prio);
    }

    /// Take `tcb` off its ready list.
    ///
    /// # Safety
    /// `tcb` must be valid and currently ready.
    pub unsafe fn make_unready(&mut self, tcb: NonNull<OsTcb>) {
        let prio = unsafe { tcb.as_ref().prio };
        let list = &mut self.rdy_list[prio as usize];
        unsafe { list.unlink(tcb) };
        if list.is_empty() {
            self.prio_tbl.remove(prio);
        }
    }

    /// Park a ready task on `waiters` until it is woken or `timeout` runs out.
    ///
    /// # Safety
    /// `tcb` must be valid and ready; `waiters` must outlive the wait.
    pub unsafe fn park(
        &mut self,
        tcb: NonNull<OsTcb>,
        waiters: &mut WaitList,
        on: OsPendOn,
        timeout: Timeout,
        now: OsTick,
    ) {
        unsafe { self.make_unready(tcb) };

        let node = unsafe { &mut *tcb.as_ptr() };
        node.pend_on = on;
        node.pend_status = OsPendStatus::Waiting;

        match timeout {
            Timeout::Ticks(ticks) => {
                node.task_state = OsTaskState::PendTimeout;
                unsafe { self.tick_list.insert(tcb, now.wrapping_add(ticks)) };
            }
            Timeout::Forever | Timeout::NoWait => {
                node.task_state = OsTaskState::Pend;
            }
        }

        unsafe { waiters.insert(tcb) };
    }

    /// Wake a parked task: detach it from its wait list and the tick list,
    /// record why it woke, and make it ready.
    ///
    /// # Safety
    /// `tcb` must be valid and parked.
    pub unsafe fn wake(&mut self, tcb: NonNull<OsTcb>, status: OsPendStatus) {
        let node = unsafe { &mut *tcb.as_ptr() };

        if let Some(list) = node.wait_list {
            unsafe { (*list.as_ptr()).remove(tcb) };
        }
        if node.task_state == OsTaskState::PendTimeout {
            unsafe { self.tick_list.remove(tcb) };
        }

        node.pend_on = OsPendOn::Nothing;
        node.pend_status = status;
        unsafe { self.make_ready(tcb) };
    }

    /// Pop the most urgent waiter of `waiters` and ready it. Returns its
    /// priority so callers in ISR context can decide whether to yield.
    pub fn wake_one(&mut self, waiters: &mut WaitList) -> Option<OsPrio> {
        let tcb = waiters.pop()?;
        unsafe {
            self.wake(tcb, OsPendStatus::Ok);
            Some(tcb.as_ref().prio)
        }
    }
}

impl Default for SchedState {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: only touched with interrupts masked
unsafe impl Send for SchedState {}

/// Main scheduling point
///
/// Picks the highest priority ready task and pends a context switch if it
/// is not the one running. The switch itself happens in PendSV as soon as
/// interrupts are unmasked. No-op from ISR context; interrupts use
/// [`kernel::os_yield_from_isr`] instead.
pub fn os_sched() {
    if !KERNEL.is_running() || is_isr_context() {
        return;
    }

    critical_section(|cs| {
        let sched = SCHED.get(cs);
        if let Some(high_rdy) = sched.highest_ready() {
            let prio = sched.prio_table().get_highest();
            unsafe {
                kernel::set_high_rdy(high_rdy, prio);
                if Some(high_rdy) != kernel::tcb_cur_ptr() {
                    crate::port::os_ctx_sw();
                }
            }
        }
    });
}

/// Time-slice accounting, called once per tick with interrupts masked.
///
/// Returns true when the running task used up its quantum and a peer of
/// the same priority has been moved in front of it.
pub(crate) fn os_sched_round_robin(sched: &mut SchedState) -> bool {
    if !CFG_SCHED_ROUND_ROBIN_EN {
        return false;
    }

    let Some(cur_ptr) = (unsafe { kernel::tcb_cur_ptr() }) else {
        return false;
    };
    let cur = unsafe { &mut *cur_ptr.as_ptr() };
    if cur.task_state != OsTaskState::Ready {
        return false;
    }

    cur.time_quanta_ctr = cur.time_quanta_ctr.saturating_sub(1);
    if cur.time_quanta_ctr > 0 {
        return false;
    }
    cur.time_quanta_ctr = cur.time_quanta;

    let list = &mut sched.rdy_list[cur.prio as usize];
    if list.len() < 2 {
        return false;
    }
    unsafe { list.rotate(cur_ptr) };
    true
}
