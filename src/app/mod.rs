//! Temperature acquisition pipeline
//!
//! ```text
//!  ADC EOC ISR -> SampleSlot <- Acquisition -> [samples] -> Processing
//!                                                              |
//!  EXTI0 ISR -> (press sem) -> ButtonMode ---------------------+-> [messages] -> Logger -> UART
//!  USART2 ISR -> [rx bytes] -> Console -> LEDs / UART
//! ```

pub mod acquisition;
pub mod button;
pub mod calibration;
pub mod config;
pub mod console;
pub mod logger;
pub mod message;
pub mod mode;
pub mod processing;

pub use acquisition::Acquisition;
pub use button::ButtonMode;
pub use calibration::Calibration;
pub use console::{Console, ConsoleEvent};
pub use logger::Logger;
pub use message::{diag, DirectSink, Message, MessageSink};
pub use mode::{Mode, ModeCell};
pub use processing::Processing;
