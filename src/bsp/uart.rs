//! Serial transport
//!
//! Transmit polls the TXE flag byte by byte. Receive is interrupt driven:
//! the handler moves each byte into a kernel queue without blocking.

use crate::os::kernel::IsrYield;
use crate::sync::queue::Queue;

/// Line terminator used by every text report
pub const LINE_END: &str = "\n\r";

/// Status and data registers of one USART
pub trait SerialPort {
    /// Transmit data register empty
    fn tx_ready(&self) -> bool;
    fn write_byte(&self, byte: u8);
    /// A received byte is waiting
    fn rx_ready(&self) -> bool;
    /// Read the received byte; clears the pending flag
    fn read_byte(&self) -> u8;
}

/// Blocking transmitter over a [`SerialPort`]
pub struct Uart<P> {
    port: P,
}

impl<P: SerialPort> Uart<P> {
    pub const fn new(port: P) -> Self {
        Uart { port }
    }

    /// Push every byte into the transmit register, spinning on TXE.
    ///
    /// This stalls the caller until the last byte is accepted; it is a
    /// register-level wait, not a kernel suspension point.
    pub fn send(&self, bytes: &[u8]) {
        for &byte in bytes {
            while !self.port.tx_ready() {
                core::hint::spin_loop();
            }
            self.port.write_byte(byte);
        }
    }

    #[inline]
    pub fn print(&self, text: &str) {
        self.send(text.as_bytes());
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}

/// Receive interrupt body: move the pending byte into `queue`.
///
/// A full queue drops the byte; it is never retried.
pub fn on_rx_interrupt<P: SerialPort, const N: usize>(port: &P, queue: &Queue<u8, N>) -> IsrYield {
    if !port.rx_ready() {
        return IsrYield::NONE;
    }

    let byte = port.read_byte();
    match queue.send_from_isr(byte) {
        Ok(hint) => hint,
        Err(e) => {
            crate::warn!("uart rx: byte {=u8} dropped ({})", byte, e.error());
            IsrYield::NONE
        }
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockPort;
    use super::*;
    use crate::os::kernel::test_support::fresh_kernel;
    use crate::os::types::Timeout;

    #[test]
    fn send_waits_for_txe() {
        let uart = Uart::new(MockPort::default());
        uart.port().busy_polls.set(3);
        uart.print("Mode: Idle");
        uart.print(LINE_END);
        assert_eq!(uart.port().text(), "Mode: Idle\n\r");
        assert_eq!(uart.port().busy_polls.get(), 0);
    }

    #[test]
    fn rx_interrupt_queues_byte_and_drops_on_full() {
        let _k = fresh_kernel();
        static RX: Queue<u8, 2> = Queue::new();
        RX.create("rx").unwrap();
        let port = MockPort::default();

        // Spurious entry with nothing pending
        assert!(!on_rx_interrupt(&port, &RX).is_required());
        assert!(RX.is_empty());

        for byte in [b'1', b'2', b'3'] {
            port.rx.set(Some(byte));
            let _ = on_rx_interrupt(&port, &RX);
            assert!(!port.rx_ready());
        }

        assert_eq!(RX.receive(Timeout::NoWait), Ok(b'1'));
        assert_eq!(RX.receive(Timeout::NoWait), Ok(b'2'));
        assert!(RX.is_empty());
    }
}
