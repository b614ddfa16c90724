//! Board support for the Nucleo-L476RG
//!
//! Each driver is written against a small register trait so the same state
//! machine runs on the board and against test doubles. The STM32 backends
//! live in [`stm32l4`] behind the `pac` feature.

pub mod adc;
pub mod button;
pub mod led;
pub mod uart;

#[cfg(feature = "pac")]
pub mod stm32l4;

pub use adc::{AdcRegs, Sample, SampleSlot, Sampler, SamplerState};
pub use button::{on_exti_interrupt, ExtiLines, PressFlag, PressSignal, BUTTON_LINE};
pub use led::{Color, LedPins, Leds};
pub use uart::{on_rx_interrupt, SerialPort, Uart, LINE_END};
