//! Text reports and where they go
//!
//! A [`Message`] is an owned value. Sending it through the message queue
//! moves it to the logger, which drops it after transmission; a send that
//! fails hands it back to the caller, which drops it on the spot.

use core::fmt::{self, Write};

use heapless::String;

use crate::bsp::uart::{SerialPort, Uart, LINE_END};
use crate::os::types::Timeout;
use crate::sync::queue::Queue;

/// Longest formatted report, terminator included
pub const MESSAGE_CAPACITY: usize = 32;

/// Fixed diagnostic lines
pub mod diag {
    pub const SEND_FAILED: &str = "Failed to send data to Queue\n\r";
    pub const RECEIVE_FAILED: &str = "Failed to receive data from Queue\n\r";
    pub const INVALID_INPUT: &str = "Invalid input received.\n\r";
    pub const NO_DATA: &str = "No data received from the queue.\n\r";
    pub const FORMAT_FAILED: &str = "Message formatting failed\n\r";
    pub const CLOCK_BANNER: &str = "System Clock Frequency\n\r";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Text(String<MESSAGE_CAPACITY>),
    Fixed(&'static str),
}

impl Message {
    pub const fn fixed(text: &'static str) -> Message {
        Message::Fixed(text)
    }

    /// Format into an owned buffer; on overflow the formatting-failed
    /// diagnostic takes its place.
    pub fn format(args: fmt::Arguments<'_>) -> Message {
        let mut text = String::new();
        match text.write_fmt(args) {
            Ok(()) => Message::Text(text),
            Err(_) => Message::Fixed(diag::FORMAT_FAILED),
        }
    }

    /// `Temperature: <c> C` report
    pub fn temperature(celsius: i32) -> Message {
        Message::format(format_args!("Temperature: {} C{}", celsius, LINE_END))
    }

    /// `<hz> Hz` line of the clock banner
    pub fn clock_frequency(hz: u32) -> Message {
        Message::format(format_args!("{} Hz{}", hz, LINE_END))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Message::Text(text) => text.as_str(),
            Message::Fixed(text) => text,
        }
    }
}

/// Destination for reports
pub trait MessageSink {
    fn emit(&self, msg: Message);
}

/// Queued delivery: waits for room, since the logger always drains.
impl<const N: usize> MessageSink for Queue<Message, N> {
    fn emit(&self, msg: Message) {
        if let Err(e) = self.send(msg, Timeout::Forever) {
            crate::warn!("message dropped: {}", e.error());
        }
    }
}

/// Synchronous delivery straight to the serial port
pub struct DirectSink<'a, P> {
    uart: &'a Uart<P>,
}

impl<'a, P> DirectSink<'a, P> {
    pub const fn new(uart: &'a Uart<P>) -> Self {
        DirectSink { uart }
    }
}

impl<P: SerialPort> MessageSink for DirectSink<'_, P> {
    fn emit(&self, msg: Message) {
        self.uart.print(msg.as_str());
    }
}

#[cfg(test)]
pub(crate) mod mock {
    extern crate std;

    use core::cell::RefCell;
    use std::vec::Vec;

    use super::*;

    /// Keeps every emitted message for inspection
    #[derive(Default)]
    pub(crate) struct Collect(pub(crate) RefCell<Vec<Message>>);

    impl Collect {
        pub(crate) fn lines(&self) -> Vec<std::string::String> {
            self.0.borrow().iter().map(|m| m.as_str().into()).collect()
        }
    }

    impl MessageSink for Collect {
        fn emit(&self, msg: Message) {
            self.0.borrow_mut().push(msg);
        }
    }
}
