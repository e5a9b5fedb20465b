//! GPIO abstractions
//!
//! Pins are addressed by a flat pin number. How that number maps onto a
//! port and bit, and which numbers are legal, is up to the chip HAL.

use core::ops::Not;

/// Logic level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Logic 0
    Low,
    /// Logic 1
    High,
}

impl Level {
    /// Level as the integer the C-style API reports (0 or 1)
    pub const fn as_u8(self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }

    /// Check if this is the high level
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Input pull configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PullMode {
    /// Floating input
    None = 0,
    /// Pull towards VDD
    Up = 1,
    /// Pull towards ground
    Down = 2,
}

impl TryFrom<u8> for PullMode {
    type Error = GpioError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PullMode::None),
            1 => Ok(PullMode::Up),
            2 => Ok(PullMode::Down),
            _ => Err(GpioError::InvalidPullMode),
        }
    }
}

/// Errors from GPIO operations
///
/// Every error is detected before any register is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioError {
    /// Pin number is outside the bonded port/bit space
    InvalidPin,
    /// Pull mode code is not one of none/up/down
    InvalidPullMode,
    /// Resolved port has no controller behind it
    UnsupportedPort,
}

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Flat pin-number GPIO interface
///
/// Every method validates `pin` first and returns
/// [`GpioError::InvalidPin`] without touching hardware if it is illegal.
pub trait GpioHal {
    /// Configure `pin` as an output driven to `level`
    fn init_output(&mut self, pin: u8, level: Level) -> Result<(), GpioError>;

    /// Configure `pin` as an input with the given pull
    fn init_input(&mut self, pin: u8, pull: PullMode) -> Result<(), GpioError>;

    /// Read the current level of `pin`
    ///
    /// Output pins report the driven level, input pins the sensed level.
    fn read(&mut self, pin: u8) -> Result<Level, GpioError>;

    /// Drive `pin` to `level`
    fn write(&mut self, pin: u8, level: Level) -> Result<(), GpioError>;

    /// Invert `pin` and return the level read back afterwards
    ///
    /// This is a read-modify-write sequence. It is not atomic against
    /// another writer of the same pin; callers that need that must hold
    /// their own critical section.
    fn toggle(&mut self, pin: u8) -> Result<Level, GpioError> {
        let current = self.read(pin)?;
        self.write(pin, !current)?;
        self.read(pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_conversions() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from(false), Level::Low);
        assert_eq!(!Level::High, Level::Low);
        assert_eq!(Level::High.as_u8(), 1);
        assert_eq!(Level::Low.as_u8(), 0);
        assert!(bool::from(Level::High));
    }

    #[test]
    fn test_pull_mode_codes() {
        assert_eq!(PullMode::try_from(0), Ok(PullMode::None));
        assert_eq!(PullMode::try_from(1), Ok(PullMode::Up));
        assert_eq!(PullMode::try_from(2), Ok(PullMode::Down));
        assert_eq!(PullMode::try_from(3), Err(GpioError::InvalidPullMode));
        assert_eq!(PullMode::try_from(0xff), Err(GpioError::InvalidPullMode));
    }

    /// Single-pin GPIO that counts register accesses
    struct CountingGpio {
        level: Level,
        reads: u32,
        writes: u32,
    }

    impl GpioHal for CountingGpio {
        fn init_output(&mut self, _pin: u8, level: Level) -> Result<(), GpioError> {
            self.level = level;
            Ok(())
        }

        fn init_input(&mut self, _pin: u8, _pull: PullMode) -> Result<(), GpioError> {
            Ok(())
        }

        fn read(&mut self, pin: u8) -> Result<Level, GpioError> {
            if pin != 0 {
                return Err(GpioError::InvalidPin);
            }
            self.reads += 1;
            Ok(self.level)
        }

        fn write(&mut self, pin: u8, level: Level) -> Result<(), GpioError> {
            if pin != 0 {
                return Err(GpioError::InvalidPin);
            }
            self.writes += 1;
            self.level = level;
            Ok(())
        }
    }

    #[test]
    fn test_default_toggle_is_read_write_read() {
        let mut gpio = CountingGpio {
            level: Level::Low,
            reads: 0,
            writes: 0,
        };

        assert_eq!(gpio.toggle(0), Ok(Level::High));
        assert_eq!(gpio.reads, 2);
        assert_eq!(gpio.writes, 1);

        assert_eq!(gpio.toggle(0), Ok(Level::Low));
    }

    #[test]
    fn test_default_toggle_propagates_invalid_pin() {
        let mut gpio = CountingGpio {
            level: Level::Low,
            reads: 0,
            writes: 0,
        };

        assert_eq!(gpio.toggle(7), Err(GpioError::InvalidPin));
        assert_eq!(gpio.writes, 0);
    }
}
