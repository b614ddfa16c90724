//! Periodic sampling task

use crate::app::message::{diag, Message, MessageSink};
use crate::app::mode::ModeCell;
use crate::bsp::adc::{AdcRegs, Sample, Sampler};
use crate::os::time::os_time_dly_ms;
use crate::os::types::Timeout;
use crate::sync::queue::Queue;

/// While the mode samples, trigger a conversion each period and forward the
/// latest completed sample. Leaving the sampling modes cancels any
/// conversion still in flight.
pub struct Acquisition<'a, A, S: ?Sized, const N: usize> {
    mode: &'a ModeCell,
    sampler: &'a Sampler<A>,
    samples: &'a Queue<Sample, N>,
    errors: &'a S,
    period_ms: u32,
}

impl<'a, A: AdcRegs, S: MessageSink + ?Sized, const N: usize> Acquisition<'a, A, S, N> {
    pub const fn new(
        mode: &'a ModeCell,
        sampler: &'a Sampler<A>,
        samples: &'a Queue<Sample, N>,
        errors: &'a S,
        period_ms: u32,
    ) -> Self {
        Acquisition {
            mode,
            sampler,
            samples,
            errors,
            period_ms,
        }
    }

    /// One round. Returns the sample handed to processing, if any.
    ///
    /// The send waits for room without limit: with a one-slot queue the
    /// task blocks here until processing has taken the previous sample.
    pub fn step(&self) -> Option<Sample> {
        if !self.mode.get().is_sampling() {
            self.sampler.stop();
            return None;
        }

        self.sampler.start();

        let sample = self.sampler.latest()?;
        match self.samples.send(sample, Timeout::Forever) {
            Ok(()) => Some(sample),
            Err(e) => {
                crate::warn!("acquisition: sample not queued ({})", e.error());
                self.errors.emit(Message::fixed(diag::SEND_FAILED));
                None
            }
        }
    }

    pub fn run(&self) -> ! {
        crate::info!("acquisition task started");
        loop {
            self.step();
            let _ = os_time_dly_ms(self.period_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::message::mock::Collect;
    use crate::app::mode::Mode;
    use crate::bsp::adc::mock::MockAdc;
    use crate::bsp::adc::SamplerState;
    use crate::os::kernel::test_support::fresh_kernel;

    #[test]
    fn idle_mode_neither_samples_nor_sends() {
        let _k = fresh_kernel();
        static Q: Queue<Sample, 1> = Queue::new();
        Q.create("samples").unwrap();
        let mode = ModeCell::new(Mode::Idle);
        let sampler = Sampler::new(MockAdc::default());
        let errors = Collect::default();
        let task = Acquisition::new(&mode, &sampler, &Q, &errors, 500);

        assert_eq!(task.step(), None);
        assert_eq!(sampler.regs().starts.get(), 0);
        assert!(Q.is_empty());
    }

    #[test]
    fn monitor_mode_forwards_latest_sample() {
        let _k = fresh_kernel();
        static Q: Queue<Sample, 1> = Queue::new();
        Q.create("samples").unwrap();
        let mode = ModeCell::new(Mode::Monitor);
        let sampler = Sampler::new(MockAdc::default());
        let errors = Collect::default();
        let task = Acquisition::new(&mode, &sampler, &Q, &errors, 500);

        // Nothing converted yet: trigger only
        assert_eq!(task.step(), None);
        assert_eq!(sampler.state(), SamplerState::Converting);

        sampler.regs().complete(1112);
        sampler.on_end_of_conversion();
        assert_eq!(task.step(), Some(1112));
        assert_eq!(Q.receive(Timeout::NoWait), Ok(1112));
        assert!(errors.lines().is_empty());
    }

    #[test]
    fn leaving_sampling_modes_cancels_conversion() {
        let _k = fresh_kernel();
        static Q: Queue<Sample, 1> = Queue::new();
        Q.create("samples").unwrap();
        let mode = ModeCell::new(Mode::Log);
        let sampler = Sampler::new(MockAdc::default());
        let errors = Collect::default();
        let task = Acquisition::new(&mode, &sampler, &Q, &errors, 500);

        task.step();
        mode.set(Mode::Idle);
        task.step();
        assert_eq!(sampler.state(), SamplerState::Idle);
        assert_eq!(sampler.regs().stops.get(), 1);
    }

    #[test]
    fn failed_send_reports_diagnostic() {
        let _k = fresh_kernel();
        // Never created, so every send is refused
        static Q: Queue<Sample, 1> = Queue::new();
        let mode = ModeCell::new(Mode::Monitor);
        let sampler = Sampler::new(MockAdc::default());
        let errors = Collect::default();
        let task = Acquisition::new(&mode, &sampler, &Q, &errors, 500);

        sampler.start();
        sampler.regs().complete(800);
        sampler.on_end_of_conversion();

        assert_eq!(task.step(), None);
        assert_eq!(errors.lines(), ["Failed to send data to Queue\n\r"]);
    }
}
