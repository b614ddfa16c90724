//! Compile-time kernel configuration
//!
//! These constants fix the resource limits of the kernel. Application
//! settings live in [`crate::app::config`].

/// Number of priority levels (one bitmap word)
pub const CFG_PRIO_MAX: usize = 32;

/// System tick rate in Hz
pub const CFG_TICK_RATE_HZ: u32 = 1000;

/// Core clock feeding SysTick. The L476 comes out of reset on MSI at 4 MHz.
pub const CFG_CPU_CLOCK_HZ: u32 = 4_000_000;

/// Ticks a task may run before yielding to a peer of equal priority
pub const CFG_TIME_QUANTA_DEFAULT: u32 = 10;

/// Minimum task stack size in words
pub const CFG_STK_SIZE_MIN: usize = 64;

/// Idle task stack size in words
pub const CFG_IDLE_STK_SIZE: usize = 128;

/// Interrupt (MSP) stack size in words once the scheduler runs
pub const CFG_ISR_STK_SIZE: usize = 512;

/// Enable round-robin scheduling for same-priority tasks
pub const CFG_SCHED_ROUND_ROBIN_EN: bool = true;

/// Idle task priority
pub const CFG_PRIO_IDLE: u8 = (CFG_PRIO_MAX - 1) as u8;
