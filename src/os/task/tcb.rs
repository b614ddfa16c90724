//! Task Control Block (TCB) definition

use core::ptr::NonNull;

use crate::os::sched::WaitList;
use crate::os::types::{OsPendOn, OsPendStatus, OsPrio, OsStkElement, OsTaskState, OsTick};

/// Task Control Block
///
/// `stk_ptr` must stay the first field: PendSV loads and stores it at
/// offset 0.
#[repr(C)]
pub struct OsTcb {
    /// Saved stack pointer while switched out
    pub stk_ptr: *mut OsStkElement,
    pub stk_base: *mut OsStkElement,
    /// Stack size in words
    pub stk_size: usize,

    pub name: &'static str,

    // Ready list links
    pub next_ptr: Option<NonNull<OsTcb>>,
    pub prev_ptr: Option<NonNull<OsTcb>>,

    // Wait list links, and the list itself for timeout removal
    pub wait_next_ptr: Option<NonNull<OsTcb>>,
    pub wait_prev_ptr: Option<NonNull<OsTcb>>,
    pub wait_list: Option<NonNull<WaitList>>,
    pub pend_on: OsPendOn,
    pub pend_status: OsPendStatus,

    // Tick list links
    pub tick_next_ptr: Option<NonNull<OsTcb>>,
    pub tick_prev_ptr: Option<NonNull<OsTcb>>,
    /// Tick at which a sleep or timed wait ends
    pub wake_at: OsTick,

    pub prio: OsPrio,
    pub task_state: OsTaskState,

    // Time slicing
    pub time_quanta: OsTick,
    pub time_quanta_ctr: OsTick,
}

impl OsTcb {
    /// Create a new, uninitialized TCB
    pub const fn new() -> Self {
        OsTcb {
            stk_ptr: core::ptr::null_mut(),
            stk_base: core::ptr::null_mut(),
            stk_size: 0,

            name: "",

            next_ptr: None,
            prev_ptr: None,

            wait_next_ptr: None,
            wait_prev_ptr: None,
            wait_list: None,
            pend_on: OsPendOn::Nothing,
            pend_status: OsPendStatus::Ok,

            tick_next_ptr: None,
            tick_prev_ptr: None,
            wake_at: 0,

            prio: 0,
            task_state: OsTaskState::Ready,

            time_quanta: 0,
            time_quanta_ctr: 0,
        }
    }

    /// Reset to default values
    pub fn init(&mut self) {
        *self = Self::new();
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.task_state == OsTaskState::Ready
    }

    /// Parked on a kernel object, with or without deadline
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self.task_state, OsTaskState::Pend | OsTaskState::PendTimeout)
    }

    #[inline]
    pub fn is_delayed(&self) -> bool {
        self.task_state == OsTaskState::Delayed
    }
}

impl Default for OsTcb {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Send for OsTcb {}
unsafe impl Sync for OsTcb {}
