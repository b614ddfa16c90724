//! Port layer - CPU-specific implementations
//!
//! Context switching, SysTick setup and initial stack frames. Off target a
//! stub stands in so the kernel data structures can be tested on the host.

#[cfg(target_arch = "arm")]
pub mod cortex_m4;

#[cfg(target_arch = "arm")]
pub use cortex_m4::*;

#[cfg(not(target_arch = "arm"))]
pub mod stub {
    use core::sync::atomic::{AtomicBool, Ordering};

    use crate::os::task::OsTaskFn;
    use crate::os::types::OsStkElement;

    static SWITCH_PENDING: AtomicBool = AtomicBool::new(false);

    pub unsafe fn os_start_high_rdy() -> ! {
        panic!("os_start_high_rdy not available on this platform");
    }

    pub fn os_ctx_sw() {
        SWITCH_PENDING.store(true, Ordering::SeqCst);
    }

    pub fn os_int_ctx_sw() {
        SWITCH_PENDING.store(true, Ordering::SeqCst);
    }

    /// Whether a context switch was requested since the last call
    pub fn take_switch_request() -> bool {
        SWITCH_PENDING.swap(false, Ordering::SeqCst)
    }

    pub unsafe fn os_task_stk_init(
        _task_fn: OsTaskFn,
        _arg: *mut (),
        stack: &mut [OsStkElement],
    ) -> *mut OsStkElement {
        let top = stack.len() - 1;
        &mut stack[top] as *mut OsStkElement
    }

    pub fn os_cpu_systick_init(_reload: u32) {}
}

#[cfg(not(target_arch = "arm"))]
pub use stub::*;
