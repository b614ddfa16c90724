//! Mode switching task

use crate::app::message::{Message, MessageSink};
use crate::app::mode::{Mode, ModeCell};
use crate::bsp::led::{Color, LedPins, Leds};
use crate::os::types::Timeout;
use crate::sync::sem::BinarySemaphore;

/// Waits for button presses signalled from EXTI0 and steps the mode.
pub struct ButtonMode<'a, G, S: ?Sized> {
    presses: &'a BinarySemaphore,
    mode: &'a ModeCell,
    leds: &'a Leds<G>,
    led: Color,
    sink: &'a S,
}

impl<'a, G: LedPins, S: MessageSink + ?Sized> ButtonMode<'a, G, S> {
    pub const fn new(
        presses: &'a BinarySemaphore,
        mode: &'a ModeCell,
        leds: &'a Leds<G>,
        led: Color,
        sink: &'a S,
    ) -> Self {
        ButtonMode {
            presses,
            mode,
            leds,
            led,
            sink,
        }
    }

    /// Handle one press: advance, update the mode LED, announce.
    pub fn step(&self) -> Option<Mode> {
        if let Err(e) = self.presses.take(Timeout::Forever) {
            crate::error!("button: wait failed ({})", e);
            return None;
        }

        let mode = self.mode.advance();
        if mode.is_sampling() {
            self.leds.on(self.led);
        } else {
            self.leds.off(self.led);
        }
        crate::info!("mode -> {}", mode);
        self.sink.emit(Message::fixed(mode.announcement()));
        Some(mode)
    }

    pub fn run(&self) -> ! {
        crate::info!("button task started");
        loop {
            self.step();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::message::mock::Collect;
    use crate::bsp::led::mock::MockPins;
    use crate::os::kernel::test_support::fresh_kernel;

    #[test]
    fn three_presses_cycle_back_with_announcements() {
        let _k = fresh_kernel();
        static SEM: BinarySemaphore = BinarySemaphore::new();
        SEM.create("button").unwrap();
        let mode = ModeCell::new(Mode::Idle);
        let leds = Leds::new(MockPins::default());
        let sink = Collect::default();
        let task = ButtonMode::new(&SEM, &mode, &leds, Color::Red, &sink);

        SEM.give().unwrap();
        assert_eq!(task.step(), Some(Mode::Monitor));
        assert!(leds.is_on(Color::Red));

        SEM.give().unwrap();
        assert_eq!(task.step(), Some(Mode::Log));
        assert!(leds.is_on(Color::Red));

        SEM.give().unwrap();
        assert_eq!(task.step(), Some(Mode::Idle));
        assert!(!leds.is_on(Color::Red));

        assert_eq!(mode.get(), Mode::Idle);
        assert_eq!(
            sink.lines(),
            ["Mode: Monitor\n\r", "Mode: Log\n\r", "Mode: Idle\n\r"]
        );
    }

    #[test]
    fn failed_wait_leaves_mode_alone() {
        let _k = fresh_kernel();
        // Kernel not started: a blocking take is refused
        static SEM: BinarySemaphore = BinarySemaphore::new();
        SEM.create("button").unwrap();
        let mode = ModeCell::new(Mode::Log);
        let leds = Leds::new(MockPins::default());
        let sink = Collect::default();
        let task = ButtonMode::new(&SEM, &mode, &leds, Color::Red, &sink);

        assert_eq!(task.step(), None);
        assert_eq!(mode.get(), Mode::Log);
        assert!(sink.lines().is_empty());
    }
}
