//! Interrupt-driven single-channel ADC sampler
//!
//! `start` requests one conversion; the end-of-conversion interrupt stores
//! the result in the shared [`SampleSlot`]. `stop` cancels a conversion in
//! flight and does not return until the ADC is idle with no result
//! pending, so a cancelled conversion can never be mistaken for the next
//! one. The slot only ever holds samples that were asked for and not
//! withdrawn.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Raw conversion result, right aligned, 12 bits
pub type Sample = u16;

/// Control and data registers of one ADC
pub trait AdcRegs {
    /// Set the start-conversion bit
    fn start_conversion(&self);
    /// Stop the running conversion and wait until the ADC is idle. A result
    /// that completed before the stop took effect is cleared and returned.
    fn stop_conversion(&self) -> Option<Sample>;
    /// If an end of conversion is pending, clear it and return the result
    fn take_end_of_conversion(&self) -> Option<Sample>;
}

/// Latest completed sample.
///
/// Single writer (the ADC interrupt), any number of readers. The sample and
/// the completion count are packed in one word so a reader never sees a
/// count that belongs to a different sample.
pub struct SampleSlot {
    word: AtomicU32,
}

impl SampleSlot {
    pub const fn new() -> Self {
        SampleSlot {
            word: AtomicU32::new(0),
        }
    }

    fn store(&self, sample: Sample) {
        // Zero means "never written", so the count skips it on wrap
        let seq = match (self.word.load(Ordering::Relaxed) >> 16).wrapping_add(1) & 0xFFFF {
            0 => 1,
            n => n,
        };
        self.word.store((seq << 16) | sample as u32, Ordering::Release);
    }

    /// Most recent sample, or `None` before the first conversion completes
    pub fn latest(&self) -> Option<Sample> {
        let word = self.word.load(Ordering::Acquire);
        if word >> 16 == 0 {
            None
        } else {
            Some(word as Sample)
        }
    }

    /// Completed conversions so far; wraps from 0xFFFF back to 1
    pub fn completed(&self) -> u16 {
        (self.word.load(Ordering::Acquire) >> 16) as u16
    }
}

impl Default for SampleSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SamplerState {
    Idle,
    Converting,
}

pub struct Sampler<A> {
    adc: A,
    slot: SampleSlot,
    converting: AtomicBool,
    discarded: AtomicU32,
}

impl<A: AdcRegs> Sampler<A> {
    pub const fn new(adc: A) -> Self {
        Sampler {
            adc,
            slot: SampleSlot::new(),
            converting: AtomicBool::new(false),
            discarded: AtomicU32::new(0),
        }
    }

    /// Idle -> Converting. No-op while a conversion is already running.
    pub fn start(&self) {
        if !self.converting.swap(true, Ordering::AcqRel) {
            self.adc.start_conversion();
        }
    }

    /// Converting -> Idle. The in-flight result, if any, is discarded.
    pub fn stop(&self) {
        if !self.converting.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(sample) = self.adc.stop_conversion() {
            self.discard(sample);
        }
    }

    fn discard(&self, sample: Sample) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
        crate::trace!("adc: cancelled conversion {=u16} discarded", sample);
    }

    pub fn state(&self) -> SamplerState {
        if self.converting.load(Ordering::Acquire) {
            SamplerState::Converting
        } else {
            SamplerState::Idle
        }
    }

    /// End-of-conversion interrupt body
    pub fn on_end_of_conversion(&self) {
        let Some(sample) = self.adc.take_end_of_conversion() else {
            return;
        };

        if self.converting.swap(false, Ordering::AcqRel) {
            self.slot.store(sample);
        } else {
            // Completed while `stop` was on its way to the peripheral
            self.discard(sample);
        }
    }

    #[inline]
    pub fn slot(&self) -> &SampleSlot {
        &self.slot
    }

    #[inline]
    pub fn latest(&self) -> Option<Sample> {
        self.slot.latest()
    }

    /// Conversions cancelled by a stop request after they had completed
    pub fn discarded(&self) -> u32 {
        self.discarded.load(Ordering::Relaxed)
    }

    pub fn regs(&self) -> &A {
        &self.adc
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use core::cell::Cell;

    use super::*;

    /// ADC whose next result is set by the test
    #[derive(Default)]
    pub(crate) struct MockAdc {
        pub(crate) starts: Cell<u32>,
        pub(crate) stops: Cell<u32>,
        pub(crate) eoc: Cell<Option<Sample>>,
    }

    impl MockAdc {
        /// Hardware finishes a conversion with `value`
        pub(crate) fn complete(&self, value: Sample) {
            self.eoc.set(Some(value));
        }
    }

    impl AdcRegs for MockAdc {
        fn start_conversion(&self) {
            self.starts.set(self.starts.get() + 1);
        }

        fn stop_conversion(&self) -> Option<Sample> {
            self.stops.set(self.stops.get() + 1);
            self.eoc.take()
        }

        fn take_end_of_conversion(&self) -> Option<Sample> {
            self.eoc.take()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockAdc;
    use super::*;

    #[test]
    fn conversion_lands_in_slot() {
        let sampler = Sampler::new(MockAdc::default());
        assert_eq!(sampler.latest(), None);
        assert_eq!(sampler.state(), SamplerState::Idle);

        sampler.start();
        sampler.start();
        assert_eq!(sampler.regs().starts.get(), 1);
        assert_eq!(sampler.state(), SamplerState::Converting);

        sampler.regs().complete(1112);
        sampler.on_end_of_conversion();
        assert_eq!(sampler.state(), SamplerState::Idle);
        assert_eq!(sampler.latest(), Some(1112));
        assert_eq!(sampler.slot().completed(), 1);
    }

    #[test]
    fn consumer_sees_most_recent_conversion() {
        let sampler = Sampler::new(MockAdc::default());
        for value in [100u16, 2000, 4095, 0] {
            sampler.start();
            sampler.regs().complete(value);
            sampler.on_end_of_conversion();
            assert_eq!(sampler.latest(), Some(value));
        }
        assert_eq!(sampler.slot().completed(), 4);
    }

    #[test]
    fn stop_discards_conversion_in_flight() {
        let sampler = Sampler::new(MockAdc::default());
        sampler.start();
        sampler.regs().complete(500);
        sampler.on_end_of_conversion();

        // Conversion finishes but its interrupt has not been serviced yet
        sampler.start();
        sampler.regs().complete(3000);
        sampler.stop();
        assert_eq!(sampler.regs().stops.get(), 1);
        assert_eq!(sampler.discarded(), 1);

        // The interrupt that was already pending finds nothing
        sampler.on_end_of_conversion();
        assert_eq!(sampler.latest(), Some(500));
        assert_eq!(sampler.discarded(), 1);

        // Stopping an idle sampler touches nothing
        sampler.stop();
        assert_eq!(sampler.regs().stops.get(), 1);
    }

    #[test]
    fn cancelled_conversion_never_lands_after_restart() {
        let sampler = Sampler::new(MockAdc::default());
        sampler.start();
        sampler.regs().complete(3000);
        sampler.stop();
        sampler.start();

        // Late interrupt from the cancelled conversion
        sampler.on_end_of_conversion();
        assert_eq!(sampler.latest(), None);
        assert_eq!(sampler.state(), SamplerState::Converting);

        // The conversion asked for after the restart is the one stored
        sampler.regs().complete(1200);
        sampler.on_end_of_conversion();
        assert_eq!(sampler.latest(), Some(1200));
        assert_eq!(sampler.discarded(), 1);
    }

    #[test]
    fn result_racing_the_stop_is_discarded_by_the_interrupt() {
        let sampler = Sampler::new(MockAdc::default());
        sampler.start();
        sampler.stop();
        sampler.regs().complete(800);
        sampler.on_end_of_conversion();
        assert_eq!(sampler.latest(), None);
        assert_eq!(sampler.discarded(), 1);
    }

    #[test]
    fn spurious_interrupt_is_ignored() {
        let sampler = Sampler::new(MockAdc::default());
        sampler.start();
        sampler.on_end_of_conversion();
        assert_eq!(sampler.state(), SamplerState::Converting);
        assert_eq!(sampler.latest(), None);
    }
}
