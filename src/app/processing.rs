//! Sample to report conversion task

use crate::app::calibration::Calibration;
use crate::app::message::{diag, Message, MessageSink};
use crate::bsp::adc::Sample;
use crate::os::types::Timeout;
use crate::sync::queue::Queue;

/// Waits for raw samples, converts them to whole degrees and emits a
/// temperature report for each.
pub struct Processing<'a, S: ?Sized, const N: usize> {
    samples: &'a Queue<Sample, N>,
    calibration: Calibration,
    sink: &'a S,
}

impl<'a, S: MessageSink + ?Sized, const N: usize> Processing<'a, S, N> {
    pub const fn new(samples: &'a Queue<Sample, N>, calibration: Calibration, sink: &'a S) -> Self {
        Processing {
            samples,
            calibration,
            sink,
        }
    }

    /// Handle one sample. Returns the temperature that was reported.
    pub fn step(&self) -> Option<i32> {
        match self.samples.receive(Timeout::Forever) {
            Ok(sample) => {
                let celsius = self.calibration.celsius(sample);
                crate::trace!("processing: raw {=u16} -> {=i32} C", sample, celsius);
                self.sink.emit(Message::temperature(celsius));
                Some(celsius)
            }
            Err(e) => {
                crate::warn!("processing: receive failed ({})", e);
                self.sink.emit(Message::fixed(diag::RECEIVE_FAILED));
                None
            }
        }
    }

    pub fn run(&self) -> ! {
        crate::info!("processing task started");
        loop {
            self.step();
        }
    }
}
