//! Indicator LEDs
//!
//! Green is the Nucleo user LED on PA5, red sits on PA6 and blue on PB3.

/// Logical LED identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Color {
    Green,
    Red,
    Blue,
}

impl Color {
    /// LED used for identifiers that name no LED
    pub const DEFAULT: Color = Color::Green;

    pub const ALL: [Color; 3] = [Color::Green, Color::Red, Color::Blue];

    /// Map a raw identifier (0 green, 1 red, 2 blue). Anything else is the
    /// default LED, not an error.
    pub const fn from_raw(raw: u8) -> Color {
        match raw {
            0 => Color::Green,
            1 => Color::Red,
            2 => Color::Blue,
            _ => Color::DEFAULT,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Pin-level access behind the LED driver
pub trait LedPins {
    /// Push-pull output, low speed, no pull
    fn configure(&self, color: Color);
    fn write(&self, color: Color, on: bool);
    fn is_set(&self, color: Color) -> bool;

    fn toggle(&self, color: Color) {
        self.write(color, !self.is_set(color));
    }
}

/// The board's LEDs
pub struct Leds<G> {
    pins: G,
}

impl<G: LedPins> Leds<G> {
    pub const fn new(pins: G) -> Self {
        Leds { pins }
    }

    /// Configure one LED pin; call once per colour at start-up
    pub fn configure(&self, color: Color) {
        self.pins.configure(color);
    }

    /// Configure every LED and switch it off
    pub fn configure_all(&self) {
        for color in Color::ALL {
            self.pins.configure(color);
            self.pins.write(color, false);
        }
    }

    #[inline]
    pub fn on(&self, color: Color) {
        self.pins.write(color, true);
    }

    #[inline]
    pub fn off(&self, color: Color) {
        self.pins.write(color, false);
    }

    #[inline]
    pub fn toggle(&self, color: Color) {
        self.pins.toggle(color);
    }

    #[inline]
    pub fn is_on(&self, color: Color) -> bool {
        self.pins.is_set(color)
    }

    pub fn pins(&self) -> &G {
        &self.pins
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use core::cell::Cell;

    use super::*;

    /// Records pin state and toggle counts per colour
    #[derive(Default)]
    pub(crate) struct MockPins {
        level: [Cell<bool>; 3],
        configured: [Cell<bool>; 3],
        toggles: [Cell<u32>; 3],
    }

    impl MockPins {
        pub(crate) fn toggles(&self, color: Color) -> u32 {
            self.toggles[color.index()].get()
        }

        pub(crate) fn configured(&self, color: Color) -> bool {
            self.configured[color.index()].get()
        }
    }

    impl LedPins for MockPins {
        fn configure(&self, color: Color) {
            self.configured[color.index()].set(true);
        }

        fn write(&self, color: Color, on: bool) {
            self.level[color.index()].set(on);
        }

        fn is_set(&self, color: Color) -> bool {
            self.level[color.index()].get()
        }

        fn toggle(&self, color: Color) {
            let i = color.index();
            self.level[i].set(!self.level[i].get());
            self.toggles[i].set(self.toggles[i].get() + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockPins;
    use super::*;

    #[test]
    fn unknown_identifiers_fall_back_to_green() {
        assert_eq!(Color::from_raw(0), Color::Green);
        assert_eq!(Color::from_raw(1), Color::Red);
        assert_eq!(Color::from_raw(2), Color::Blue);
        for raw in [3u8, 7, 42, 255] {
            assert_eq!(Color::from_raw(raw), Color::DEFAULT);
        }
    }

    #[test]
    fn toggle_after_off_on_lands_opposite_to_off() {
        let leds = Leds::new(MockPins::default());
        for color in Color::ALL {
            leds.configure(color);
            leds.off(color);
            leds.on(color);
            leds.toggle(color);
            assert!(!leds.is_on(color));
            assert_eq!(leds.pins().toggles(color), 1);
        }
    }

    #[test]
    fn operations_touch_only_the_addressed_pin() {
        let leds = Leds::new(MockPins::default());
        leds.configure_all();
        assert!(Color::ALL.iter().all(|&c| leds.pins().configured(c)));

        leds.on(Color::Red);
        assert!(leds.is_on(Color::Red));
        assert!(!leds.is_on(Color::Green));
        assert!(!leds.is_on(Color::Blue));

        leds.toggle(Color::Blue);
        assert!(leds.is_on(Color::Red));
        assert!(leds.is_on(Color::Blue));
        assert_eq!(leds.pins().toggles(Color::Green), 0);
    }
}
