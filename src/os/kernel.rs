//! Global kernel state and initialization
//!
//! This module owns the kernel flags, the scheduler state and the CPU
//! context-switch record shared with the port layer.

use core::ptr::{addr_of_mut, NonNull};
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::os::config::{CFG_CPU_CLOCK_HZ, CFG_IDLE_STK_SIZE, CFG_PRIO_IDLE, CFG_TICK_RATE_HZ};
use crate::os::critical::critical_section;
use crate::os::cs_cell::CsCell;
use crate::os::error::{OsError, OsResult};
use crate::os::sched::SchedState;
use crate::os::task::{self, OsTcb};
use crate::os::types::{OsPendStatus, OsPrio, OsStkElement, OsTick};

// ============ Kernel Flags ============

/// Atomic kernel flags
pub struct KernelFlags {
    initialized: AtomicBool,
    running: AtomicBool,
    tick_counter: AtomicU32,
}

impl KernelFlags {
    const fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            running: AtomicBool::new(false),
            tick_counter: AtomicU32::new(0),
        }
    }

    fn reset(&self) {
        self.initialized.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        self.tick_counter.store(0, Ordering::SeqCst);
    }

    /// Check if the OS is running
    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Check if OS is initialized
    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Get current tick count
    #[inline(always)]
    pub fn tick_get(&self) -> OsTick {
        self.tick_counter.load(Ordering::Relaxed)
    }

    /// Increment and return tick count
    #[inline(always)]
    pub(crate) fn tick_increment(&self) -> OsTick {
        self.tick_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    #[inline(always)]
    pub(crate) fn set_initialized(&self, val: bool) {
        self.initialized.store(val, Ordering::SeqCst);
    }

    #[inline(always)]
    pub(crate) fn set_running(&self, val: bool) {
        self.running.store(val, Ordering::SeqCst);
    }
}

// ============ Global Instances ============

/// Global kernel flags
pub(crate) static KERNEL: KernelFlags = KernelFlags::new();

/// Global scheduler state
pub(crate) static SCHED: CsCell<SchedState> = CsCell::new(SchedState::new());

static mut IDLE_TCB: OsTcb = OsTcb::new();
static mut IDLE_STK: [OsStkElement; CFG_IDLE_STK_SIZE] = [0; CFG_IDLE_STK_SIZE];

// ============ CPU/Context Switch State ============

/// Context switch record read by PendSV.
///
/// Layout is fixed: `tcb_cur` at 0, `tcb_high_rdy` at 4, `prio_cur` at 8,
/// `prio_high_rdy` at 9.
#[repr(C)]
pub struct CpuState {
    /// Running task
    pub tcb_cur: *mut OsTcb,
    /// Task PendSV will switch to
    pub tcb_high_rdy: *mut OsTcb,
    pub prio_cur: OsPrio,
    pub prio_high_rdy: OsPrio,
}

impl CpuState {
    pub const fn new() -> Self {
        Self {
            tcb_cur: core::ptr::null_mut(),
            tcb_high_rdy: core::ptr::null_mut(),
            prio_cur: CFG_PRIO_IDLE,
            prio_high_rdy: CFG_PRIO_IDLE,
        }
    }
}

impl Default for CpuState {
    fn default() -> Self {
        Self::new()
    }
}

/// Global CPU state instance
#[no_mangle]
#[used]
pub static mut CPU_STATE: CpuState = CpuState::new();

#[inline(always)]
fn cpu_state() -> *mut CpuState {
    addr_of_mut!(CPU_STATE)
}

/// Running task, if the scheduler has started one
#[inline]
pub(crate) unsafe fn tcb_cur_ptr() -> Option<NonNull<OsTcb>> {
    NonNull::new(unsafe { (*cpu_state()).tcb_cur })
}

/// Priority of the running task
#[inline]
pub(crate) unsafe fn prio_cur() -> OsPrio {
    unsafe { (*cpu_state()).prio_cur }
}

/// Outcome of the running task's last wait
pub(crate) fn current_pend_status() -> OsPendStatus {
    critical_section(|_cs| match unsafe { tcb_cur_ptr() } {
        Some(tcb) => unsafe { tcb.as_ref().pend_status },
        None => OsPendStatus::Ok,
    })
}

/// Nominate the next task for PendSV
#[inline]
pub(crate) unsafe fn set_high_rdy(tcb: NonNull<OsTcb>, prio: OsPrio) {
    let cpu = cpu_state();
    unsafe {
        (*cpu).tcb_high_rdy = tcb.as_ptr();
        (*cpu).prio_high_rdy = prio;
    }
}

// ============ ISR hand-off ============

/// Whether an ISR-side hand-off readied a task that should preempt the one
/// that was interrupted.
///
/// Returned by every `*_from_isr` call; pass it to [`os_yield_from_isr`]
/// before leaving the handler.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IsrYield(bool);

impl IsrYield {
    /// Nothing was woken
    pub const NONE: IsrYield = IsrYield(false);

    /// Compare a freshly woken task's priority with the interrupted task.
    pub(crate) fn for_woken(prio: Option<OsPrio>) -> Self {
        match prio {
            Some(p) => IsrYield(p < unsafe { prio_cur() }),
            None => IsrYield::NONE,
        }
    }

    pub(crate) const fn from_preemption(needed: bool) -> Self {
        IsrYield(needed)
    }

    /// A higher-priority task is now ready
    #[inline]
    pub fn is_required(self) -> bool {
        self.0
    }

    /// Combine hints from several hand-offs in one handler
    #[inline]
    pub fn merge(self, other: IsrYield) -> IsrYield {
        IsrYield(self.0 || other.0)
    }
}

/// Request a context switch once the current interrupt returns.
///
/// PendSV runs at the lowest exception priority, so the switch happens
/// after every active handler has finished, never in the middle of one.
pub fn os_yield_from_isr(hint: IsrYield) {
    if !hint.is_required() || !KERNEL.is_running() {
        return;
    }

    critical_section(|cs| {
        let sched = SCHED.get(cs);
        if let Some(high_rdy) = sched.highest_ready() {
            let prio = sched.prio_table().get_highest();
            unsafe {
                set_high_rdy(high_rdy, prio);
                if Some(high_rdy) != tcb_cur_ptr() {
                    crate::port::os_int_ctx_sw();
                }
            }
        }
    });
}

// ============ Initialization ============

/// Runs whenever nothing else is ready
fn os_idle_task(_: *mut ()) -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}

/// Initialize the kernel
///
/// Must be called before any other kernel function. Clears the scheduler
/// and creates the idle task.
///
/// # Returns
/// * `Ok(())` - Initialization successful
/// * `Err(OsError::OsRunning)` - OS is already running
pub fn os_init() -> OsResult<()> {
    if KERNEL.is_running() {
        return Err(OsError::OsRunning);
    }

    KERNEL.reset();
    critical_section(|cs| {
        SCHED.get(cs).reset();
        unsafe { *cpu_state() = CpuState::new() };
    });

    unsafe {
        task::task_init(
            NonNull::new_unchecked(addr_of_mut!(IDLE_TCB)),
            &mut *addr_of_mut!(IDLE_STK),
            "Idle",
            os_idle_task,
            core::ptr::null_mut(),
            CFG_PRIO_IDLE,
        )?;
    }

    KERNEL.set_initialized(true);
    Ok(())
}

/// Start multitasking
///
/// Switches to the highest priority ready task and never returns on the
/// target.
///
/// # Returns
/// * `Err(OsError::OsNotInit)` - OS not initialized
/// * `Err(OsError::OsRunning)` - OS is already running
/// * `Err(OsError::OsNoAppTask)` - Only the idle task exists
pub fn os_start() -> OsResult<()> {
    if !KERNEL.is_initialized() {
        return Err(OsError::OsNotInit);
    }

    if KERNEL.is_running() {
        return Err(OsError::OsRunning);
    }

    critical_section(|cs| {
        let sched = SCHED.get(cs);
        let prio = sched.prio_table().get_highest();
        if prio == CFG_PRIO_IDLE {
            return Err(OsError::OsNoAppTask);
        }
        let first = sched.highest_ready().ok_or(OsError::OsNoAppTask)?;
        unsafe { set_high_rdy(first, prio) };
        KERNEL.set_running(true);
        Ok(())
    })?;

    crate::info!("kernel starting");

    crate::port::os_cpu_systick_init(CFG_CPU_CLOCK_HZ / CFG_TICK_RATE_HZ);
    unsafe { crate::port::os_start_high_rdy() }
}
