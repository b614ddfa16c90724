//! Serial logging task

use crate::app::message::Message;
use crate::bsp::uart::{SerialPort, Uart};
use crate::os::types::Timeout;
use crate::sync::queue::Queue;

/// Sole consumer of the message queue. Each message is written out and
/// then dropped, exactly once, at the end of its iteration.
pub struct Logger<'a, P, const N: usize> {
    messages: &'a Queue<Message, N>,
    uart: &'a Uart<P>,
}

impl<'a, P: SerialPort, const N: usize> Logger<'a, P, N> {
    pub const fn new(messages: &'a Queue<Message, N>, uart: &'a Uart<P>) -> Self {
        Logger { messages, uart }
    }

    /// Transmit one message. Returns its length in bytes.
    pub fn step(&self) -> Option<usize> {
        match self.messages.receive(Timeout::Forever) {
            Ok(msg) => {
                self.uart.print(msg.as_str());
                Some(msg.as_str().len())
            }
            Err(e) => {
                crate::error!("logger: receive failed ({})", e);
                None
            }
        }
    }

    pub fn run(&self) -> ! {
        crate::info!("logger task started");
        loop {
            self.step();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::message::{diag, MessageSink};
    use crate::bsp::uart::mock::MockPort;
    use crate::os::kernel::test_support::fresh_kernel;

    #[test]
    fn drains_in_order_to_uart() {
        let _k = fresh_kernel();
        static Q: Queue<Message, 2> = Queue::new();
        Q.create("messages").unwrap();
        let uart = Uart::new(MockPort::default());
        let logger = Logger::new(&Q, &uart);

        Q.emit(Message::temperature(40));
        Q.emit(Message::fixed(diag::SEND_FAILED));

        assert_eq!(logger.step(), Some(19));
        assert_eq!(logger.step(), Some(diag::SEND_FAILED.len()));
        assert!(Q.is_empty());
        assert_eq!(
            uart.port().text(),
            "Temperature: 40 C\n\rFailed to send data to Queue\n\r"
        );
    }
}
