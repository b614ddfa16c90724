//! Serial command task
//!
//! Single-character commands arrive from the USART receive interrupt:
//! `1` toggles the green LED, `2` the red one.

use crate::app::message::diag;
use crate::bsp::led::{Color, LedPins, Leds};
use crate::bsp::uart::{SerialPort, Uart};
use crate::os::error::OsError;
use crate::os::types::Timeout;
use crate::sync::queue::Queue;

/// What one console round did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleEvent {
    Toggled(Color),
    Invalid(u8),
    NoData,
    Failed(OsError),
}

pub struct Console<'a, G, P, const N: usize> {
    rx: &'a Queue<u8, N>,
    leds: &'a Leds<G>,
    uart: &'a Uart<P>,
    timeout: Timeout,
}

impl<'a, G: LedPins, P: SerialPort, const N: usize> Console<'a, G, P, N> {
    pub const fn new(rx: &'a Queue<u8, N>, leds: &'a Leds<G>, uart: &'a Uart<P>, timeout: Timeout) -> Self {
        Console {
            rx,
            leds,
            uart,
            timeout,
        }
    }

    pub fn step(&self) -> ConsoleEvent {
        match self.rx.receive(self.timeout) {
            Ok(b'1') => {
                self.uart.print("Data Received: '1' - Toggling GREEN LED.\n\r");
                self.leds.toggle(Color::Green);
                ConsoleEvent::Toggled(Color::Green)
            }
            Ok(b'2') => {
                self.uart.print("Data Received: '2' - Toggling RED LED.\n\r");
                self.leds.toggle(Color::Red);
                ConsoleEvent::Toggled(Color::Red)
            }
            Ok(byte) => {
                self.uart.print(diag::INVALID_INPUT);
                ConsoleEvent::Invalid(byte)
            }
            Err(OsError::Timeout | OsError::PendWouldBlock) => {
                self.uart.print(diag::NO_DATA);
                ConsoleEvent::NoData
            }
            Err(e) => {
                self.uart.print(diag::RECEIVE_FAILED);
                ConsoleEvent::Failed(e)
            }
        }
    }

    pub fn run(&self) -> ! {
        crate::info!("console task started");
        loop {
            self.step();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::led::mock::MockPins;
    use crate::bsp::uart::mock::MockPort;
    use crate::os::kernel::test_support::fresh_kernel;

    #[test]
    fn commands_toggle_exactly_one_led() {
        let _k = fresh_kernel();
        static RX: Queue<u8, 10> = Queue::new();
        RX.create("rx").unwrap();
        let leds = Leds::new(MockPins::default());
        let uart = Uart::new(MockPort::default());
        let console = Console::new(&RX, &leds, &uart, Timeout::NoWait);

        RX.send(b'1', Timeout::NoWait).unwrap();
        assert_eq!(console.step(), ConsoleEvent::Toggled(Color::Green));
        assert_eq!(leds.pins().toggles(Color::Green), 1);
        assert_eq!(leds.pins().toggles(Color::Red), 0);

        RX.send(b'2', Timeout::NoWait).unwrap();
        assert_eq!(console.step(), ConsoleEvent::Toggled(Color::Red));
        assert_eq!(leds.pins().toggles(Color::Green), 1);
        assert_eq!(leds.pins().toggles(Color::Red), 1);
    }

    #[test]
    fn other_bytes_report_invalid_input_once() {
        let _k = fresh_kernel();
        static RX: Queue<u8, 10> = Queue::new();
        RX.create("rx").unwrap();
        let leds = Leds::new(MockPins::default());
        let uart = Uart::new(MockPort::default());
        let console = Console::new(&RX, &leds, &uart, Timeout::NoWait);

        RX.send(b'x', Timeout::NoWait).unwrap();
        assert_eq!(console.step(), ConsoleEvent::Invalid(b'x'));
        assert_eq!(uart.port().text(), "Invalid input received.\n\r");
        for color in Color::ALL {
            assert_eq!(leds.pins().toggles(color), 0);
        }
    }

    #[test]
    fn empty_queue_reports_no_data() {
        let _k = fresh_kernel();
        static RX: Queue<u8, 10> = Queue::new();
        RX.create("rx").unwrap();
        let leds = Leds::new(MockPins::default());
        let uart = Uart::new(MockPort::default());
        let console = Console::new(&RX, &leds, &uart, Timeout::NoWait);

        assert_eq!(console.step(), ConsoleEvent::NoData);
        assert_eq!(uart.port().text(), "No data received from the queue.\n\r");
    }
}
