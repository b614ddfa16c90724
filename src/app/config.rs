//! Pipeline configuration

use crate::bsp::led::Color;
use crate::os::types::OsPrio;

/// Delay between acquisition rounds
pub const SAMPLE_PERIOD_MS: u32 = 500;

/// Raw samples between acquisition and processing
pub const SAMPLE_QUEUE_LEN: usize = 1;

/// Reports waiting for the logger
pub const MESSAGE_QUEUE_LEN: usize = 1;

/// Bytes buffered between the USART receive interrupt and the console
pub const RX_QUEUE_LEN: usize = 10;

/// Console gives up waiting for input after this long
pub const CONSOLE_RX_TIMEOUT_MS: u32 = 100;

/// Serial line speed
pub const UART_BAUD: u32 = 9600;

/// Logger drains ahead of everything else so reports go out promptly
pub const PRIO_LOGGER: OsPrio = 2;
pub const PRIO_PIPELINE: OsPrio = 4;

/// Stack words per pipeline task
pub const TASK_STK_SIZE: usize = 256;

/// Lit while the pipeline is sampling
pub const MODE_LED: Color = Color::Red;
