//! Core type definitions

use crate::os::config::CFG_TICK_RATE_HZ;

/// Task priority (0 = highest priority)
pub type OsPrio = u8;

/// Tick counter type
pub type OsTick = u32;

/// Stack element type
pub type OsStkElement = u32;

/// Task state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OsTaskState {
    /// Task is ready to run
    Ready = 0,
    /// Task is sleeping on the tick list
    Delayed = 1,
    /// Task is waiting on a kernel object with no deadline
    Pend = 2,
    /// Task is waiting on a kernel object and on the tick list
    PendTimeout = 3,
}

/// What the task is pending on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OsPendOn {
    Nothing = 0,
    Semaphore = 1,
    QueueSpace = 2,
    QueueData = 3,
}

/// Outcome of the last wait, written by whoever readies the task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OsPendStatus {
    /// Still parked
    Waiting = 0,
    /// Woken by a give/send/receive on the object
    Ok = 1,
    /// Deadline passed first
    Timeout = 2,
}

/// Kernel object type marker, set by `create`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum OsObjType {
    None = 0,
    Queue = 0x51554555, // 'QUEU'
    Sem = 0x53454D41,   // 'SEMA'
}

/// How long a blocking call may wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timeout {
    /// Fail immediately instead of blocking
    NoWait,
    /// Give up after this many ticks
    Ticks(OsTick),
    /// Block until the object is ready
    Forever,
}

impl Timeout {
    /// Timeout expressed in milliseconds, rounded up to whole ticks.
    pub const fn from_ms(ms: u32) -> Self {
        if ms == 0 {
            Timeout::NoWait
        } else {
            Timeout::Ticks(ms_to_ticks(ms))
        }
    }
}

/// Millisecond to tick conversion. Never rounds a non-zero duration to zero.
pub const fn ms_to_ticks(ms: u32) -> OsTick {
    let ticks = (ms as u64 * CFG_TICK_RATE_HZ as u64 + 999) / 1000;
    if ticks > OsTick::MAX as u64 {
        OsTick::MAX
    } else {
        ticks as OsTick
    }
}
