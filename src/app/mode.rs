//! Operating mode, advanced by the button

use portable_atomic::{AtomicU8, Ordering};

/// Three-state mode cycle: Idle -> Monitor -> Log -> Idle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    Idle = 0,
    Monitor = 1,
    Log = 2,
}

impl Mode {
    pub const fn next(self) -> Mode {
        match self {
            Mode::Idle => Mode::Monitor,
            Mode::Monitor => Mode::Log,
            Mode::Log => Mode::Idle,
        }
    }

    const fn from_u8(raw: u8) -> Mode {
        match raw % 3 {
            1 => Mode::Monitor,
            2 => Mode::Log,
            _ => Mode::Idle,
        }
    }

    /// Acquisition runs in Monitor and Log
    pub const fn is_sampling(self) -> bool {
        !matches!(self, Mode::Idle)
    }

    /// Line sent over the serial port when the mode is entered
    pub const fn announcement(self) -> &'static str {
        match self {
            Mode::Idle => "Mode: Idle\n\r",
            Mode::Monitor => "Mode: Monitor\n\r",
            Mode::Log => "Mode: Log\n\r",
        }
    }
}

/// Current mode, shared between the button task (sole writer) and readers
pub struct ModeCell(AtomicU8);

impl ModeCell {
    pub const fn new(mode: Mode) -> Self {
        ModeCell(AtomicU8::new(mode as u8))
    }

    #[inline]
    pub fn get(&self) -> Mode {
        Mode::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, mode: Mode) {
        self.0.store(mode as u8, Ordering::Release);
    }

    /// Step to the next mode and return it. Single writer only.
    pub fn advance(&self) -> Mode {
        let next = self.get().next();
        self.set(next);
        next
    }
}

impl Default for ModeCell {
    fn default() -> Self {
        Self::new(Mode::Idle)
    }
}
