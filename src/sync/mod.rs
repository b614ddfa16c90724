//! Synchronization primitives
//!
//! A binary semaphore for interrupt-to-task signalling and a bounded queue
//! for moving values between tasks and interrupts.

pub mod queue;
pub mod sem;
