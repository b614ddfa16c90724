//! Kernel error type
//!
//! Uses Rust's Result pattern instead of C-style error pointers.

/// Kernel error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum OsError {
    // ============ ISR errors ============
    /// Cannot create object from ISR
    CreateIsr = 12001,
    /// Cannot pend from ISR
    PendIsr = 25006,
    /// Cannot delay from ISR
    TimeDlyIsr = 29301,
    /// Cannot create task from ISR
    TaskCreateIsr = 29002,

    // ============ Object errors ============
    /// Object already created
    ObjCreated = 24001,
    /// Object used before `create`
    ObjNotCreated = 24005,

    // ============ OS state errors ============
    /// OS is not running
    OsNotRunning = 24201,
    /// OS is already running
    OsRunning = 24202,
    /// OS not initialized
    OsNotInit = 24203,
    /// No application task created
    OsNoAppTask = 24204,

    // ============ Pend errors ============
    /// Back from a wait without the object being signalled
    PendAbort = 25001,
    /// Pend would block (non-blocking mode)
    PendWouldBlock = 25008,
    /// Operation timed out
    Timeout = 29401,

    // ============ Priority / task errors ============
    /// Invalid priority
    PrioInvalid = 25203,
    /// Priority reserved for the idle task
    PrioIdle = 25204,
    /// Stack smaller than the configured minimum
    StkSizeInvalid = 28208,
}

/// Result type alias for kernel operations
pub type OsResult<T> = Result<T, OsError>;

impl OsError {
    /// Numeric code, stable across builds, for logs without defmt
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }
}
