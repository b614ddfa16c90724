//! Task management
//!
//! Tasks are created once, before or after `os_start`, from static TCB and
//! stack storage. They never return and are never deleted.

mod tcb;

pub use tcb::OsTcb;

use core::ptr::NonNull;

use crate::os::config::{CFG_PRIO_IDLE, CFG_PRIO_MAX, CFG_STK_SIZE_MIN, CFG_TIME_QUANTA_DEFAULT};
use crate::os::critical::{critical_section, is_isr_context};
use crate::os::error::{OsError, OsResult};
use crate::os::kernel::{KERNEL, SCHED};
use crate::os::types::{OsPrio, OsStkElement};

/// Task entry point function type
pub type OsTaskFn = fn(*mut ()) -> !;

/// Fill in `tcb`, build the initial exception frame and make the task ready.
///
/// # Safety
/// `tcb` and `stack` must stay valid for the life of the kernel.
pub(crate) unsafe fn task_init(
    tcb: NonNull<OsTcb>,
    stack: &mut [OsStkElement],
    name: &'static str,
    task_fn: OsTaskFn,
    arg: *mut (),
    prio: OsPrio,
) -> OsResult<()> {
    if stack.len() < CFG_STK_SIZE_MIN {
        return Err(OsError::StkSizeInvalid);
    }

    if prio as usize >= CFG_PRIO_MAX {
        return Err(OsError::PrioInvalid);
    }

    critical_section(|cs| {
        let node = unsafe { &mut *tcb.as_ptr() };
        node.init();

        node.name = name;
        node.prio = prio;
        node.time_quanta = CFG_TIME_QUANTA_DEFAULT;
        node.time_quanta_ctr = CFG_TIME_QUANTA_DEFAULT;

        node.stk_base = stack.as_mut_ptr();
        node.stk_size = stack.len();
        node.stk_ptr = unsafe { crate::port::os_task_stk_init(task_fn, arg, stack) };

        unsafe { SCHED.get(cs).make_ready(tcb) };
    });

    crate::debug!("task {=str} created at prio {=u8}", name, prio);
    Ok(())
}

/// Create a new task
///
/// # Arguments
/// * `tcb` - Static Task Control Block
/// * `stack` - Static stack array
/// * `name` - Task name for debugging
/// * `task_fn` - Task entry point
/// * `prio` - Task priority (0 = highest; the lowest level is the idle task's)
///
/// # Example
/// ```ignore
/// static mut TASK_TCB: OsTcb = OsTcb::new();
/// static mut TASK_STK: [OsStkElement; 256] = [0; 256];
///
/// fn my_task(_: *mut ()) -> ! {
///     loop { /* ... */ }
/// }
///
/// os_task_create(
///     unsafe { &mut *addr_of_mut!(TASK_TCB) },
///     unsafe { &mut *addr_of_mut!(TASK_STK) },
///     "MyTask",
///     my_task,
///     5,
/// ).expect("Task creation failed");
/// ```
pub fn os_task_create(
    tcb: &'static mut OsTcb,
    stack: &'static mut [OsStkElement],
    name: &'static str,
    task_fn: OsTaskFn,
    prio: OsPrio,
) -> OsResult<()> {
    os_task_create_with_arg(tcb, stack, name, task_fn, core::ptr::null_mut(), prio)
}

/// Create a new task whose entry point receives `arg`
pub fn os_task_create_with_arg(
    tcb: &'static mut OsTcb,
    stack: &'static mut [OsStkElement],
    name: &'static str,
    task_fn: OsTaskFn,
    arg: *mut (),
    prio: OsPrio,
) -> OsResult<()> {
    if is_isr_context() {
        return Err(OsError::TaskCreateIsr);
    }

    if prio == CFG_PRIO_IDLE {
        return Err(OsError::PrioIdle);
    }

    unsafe { task_init(NonNull::from(tcb), stack, name, task_fn, arg, prio)? };

    if KERNEL.is_running() {
        crate::os::sched::os_sched();
    }
    Ok(())
}
