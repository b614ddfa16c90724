//! Kernel
//!
//! Fixed-priority preemptive scheduling, task control blocks, ticks and
//! delays. Everything the pipeline tasks block on is built from this.

pub mod config;
pub mod critical;
pub mod cs_cell;
pub mod error;
pub mod kernel;
pub mod prio;
pub mod sched;
pub mod task;
pub mod time;
pub mod types;
