//! Pin numbering and validation
//!
//! The SAM3X8E exposes 104 GPIO lines on four PIO controllers:
//! PA0-PA29, PB0-PB31, PC0-PC30 and PD0-PD9.
//!
//! They are mapped onto one flat number space with 32 numbers per port:
//!
//! | Pins     | Port |
//! |----------|------|
//! | 0 - 31   | A    |
//! | 32 - 63  | B    |
//! | 64 - 95  | C    |
//! | 96 - 127 | D    |
//!
//! Numbers whose bit is not bonded out on the package are rejected even
//! though they fall inside a port's range.

use polaris_hal::GpioError;

/// Pins per PIO controller
pub const PINS_PER_PORT: u8 = 32;

/// Number of PIO controllers
pub const PORT_COUNT: u8 = 4;

/// Size of the flat pin number space
pub const PIN_SPACE: u16 = PINS_PER_PORT as u16 * PORT_COUNT as u16;

/// PIO controller identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    D,
}

impl Port {
    /// All ports in pin-number order
    pub const ALL: [Port; PORT_COUNT as usize] = [Port::A, Port::B, Port::C, Port::D];

    /// Port for a port index (pin / 32)
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Port::A),
            1 => Some(Port::B),
            2 => Some(Port::C),
            3 => Some(Port::D),
            _ => None,
        }
    }

    /// Index of this port in the flat numbering
    pub const fn index(self) -> u8 {
        match self {
            Port::A => 0,
            Port::B => 1,
            Port::C => 2,
            Port::D => 3,
        }
    }

    /// Bonded-out lines on this port
    pub const fn legality_mask(self) -> u32 {
        match self {
            Port::A => 0x3FFF_FFFF, // PA0-PA29
            Port::B => 0xFFFF_FFFF, // PB0-PB31
            Port::C => 0x7FFF_FFFF, // PC0-PC30
            Port::D => 0x0000_03FF, // PD0-PD9
        }
    }

    /// Port letter as used in pin names ("PB27")
    pub const fn letter(self) -> char {
        match self {
            Port::A => 'A',
            Port::B => 'B',
            Port::C => 'C',
            Port::D => 'D',
        }
    }

    /// Port for a pin-name letter
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Port::A),
            'B' => Some(Port::B),
            'C' => Some(Port::C),
            'D' => Some(Port::D),
            _ => None,
        }
    }
}

/// A validated pin: port plus bit position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId {
    port: Port,
    bit: u8,
}

impl PinId {
    /// Port the pin belongs to
    pub const fn port(&self) -> Port {
        self.port
    }

    /// Bit position within the port
    pub const fn bit(&self) -> u8 {
        self.bit
    }

    /// Single-bit mask for the pin within its port
    pub const fn mask(&self) -> u32 {
        1 << self.bit
    }

    /// Flat pin number
    pub const fn number(&self) -> u8 {
        self.port.index() * PINS_PER_PORT + self.bit
    }
}

/// Split a flat pin number into port and bit, validating both
///
/// Fails with [`GpioError::InvalidPin`] when the port index is past the
/// last controller or the bit is not bonded out on that port.
pub fn resolve(pin: u8) -> Result<PinId, GpioError> {
    let port_index = pin / PINS_PER_PORT;
    let bit = pin % PINS_PER_PORT;

    if port_index >= PORT_COUNT {
        return Err(GpioError::InvalidPin);
    }

    let port = Port::from_index(port_index).ok_or(GpioError::UnsupportedPort)?;

    if port.legality_mask() & (1 << bit) == 0 {
        return Err(GpioError::InvalidPin);
    }

    Ok(PinId { port, bit })
}

/// Parse a pin name from a board file
///
/// Supports formats:
/// - "PA0" -> (0, false)
/// - "PB27" -> (59, false)
/// - "!PC3" -> (67, true) (inverted/active-low)
///
/// Names that do not resolve to a bonded pin return `None`.
pub fn parse_pin_string(s: &str) -> Option<(u8, bool)> {
    let s = s.trim();

    let (s, inverted) = match s.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (s, false),
    };

    let rest = s.strip_prefix('P').or_else(|| s.strip_prefix('p'))?;
    let mut chars = rest.chars();
    let port = Port::from_letter(chars.next()?)?;

    let bit_str = chars.as_str();
    if bit_str.is_empty() || bit_str.len() > 2 {
        return None;
    }
    let bit: u8 = bit_str.parse().ok()?;
    if bit >= PINS_PER_PORT {
        return None;
    }

    let pin = resolve(port.index() * PINS_PER_PORT + bit).ok()?;
    Some((pin.number(), inverted))
}
