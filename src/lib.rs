//! Interrupt-driven temperature acquisition on a small preemptive kernel
//!
//! The crate is split in layers:
//! - `os`: priority-based preemptive scheduling, delays and the tick
//! - `sync`: binary semaphore and bounded queue, usable from interrupts
//! - `port`: Cortex-M4F context switch
//! - `bsp`: LEDs, USART2, ADC1 and the user button on the Nucleo-L476RG
//! - `app`: the acquisition pipeline tasks and their configuration

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

// ============ Critical Section ============

#[cfg(target_arch = "arm")]
mod cs_impl {
    use cortex_m::interrupt;
    use cortex_m::register::primask;
    use critical_section::{set_impl, Impl, RawRestoreState};

    struct SingleCoreCriticalSection;
    set_impl!(SingleCoreCriticalSection);

    unsafe impl Impl for SingleCoreCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            let was_active = primask::read().is_active();
            interrupt::disable();
            was_active
        }

        unsafe fn release(was_active: RawRestoreState) {
            if was_active {
                unsafe { interrupt::enable() }
            }
        }
    }
}

// ============ Modules ============

pub mod log;
mod lang_items;

pub mod os;
pub mod sync;
pub mod port;
pub mod bsp;
pub mod app;

// ============ Re-exports ============

pub use os::config;
pub use os::critical;
pub use os::error;
pub use os::error::{OsError, OsResult};
pub use os::kernel;
pub use os::kernel::{os_init, os_start, os_yield_from_isr, IsrYield};
pub use os::prio;
pub use os::sched;
pub use os::task;
pub use os::task::{os_task_create, OsTcb};
pub use os::time;
pub use os::types;
pub use os::types::Timeout;

pub use sync::queue::{Queue, SendError};
pub use sync::sem::BinarySemaphore;

#[cfg(feature = "pac")]
pub use stm32_metapac as pac;
