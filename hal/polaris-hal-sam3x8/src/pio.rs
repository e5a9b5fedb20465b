//! PIO controller access
//!
//! The SAM3X8 groups its GPIO into four Parallel I/O controllers (PIOA-PIOD).
//! Register-level access is supplied by the vendor peripheral-access layer;
//! this module only describes the calls the HAL makes into it.

/// Line type passed to a PIO configure/get call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PioType {
    /// Input, sensed through the pin data status register
    Input,
    /// Output, initially driven low
    Output0,
    /// Output, initially driven high
    Output1,
}

impl PioType {
    /// Output type that starts at `high`
    pub const fn output(high: bool) -> Self {
        if high {
            PioType::Output1
        } else {
            PioType::Output0
        }
    }

    /// Check if this is one of the output types
    pub const fn is_output(self) -> bool {
        matches!(self, PioType::Output0 | PioType::Output1)
    }
}

/// Pin attribute flags for a PIO configure call
///
/// `DEGLITCH` and `DEBOUNCE` mirror the vendor attribute set; the GPIO
/// dispatcher only ever requests `PULLUP` and `OPENDRAIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PioAttributes(u32);

impl PioAttributes {
    /// No pull-up, push-pull, no filtering
    pub const DEFAULT: Self = Self(0);
    /// Internal pull-up enabled
    pub const PULLUP: Self = Self(1 << 0);
    /// Glitch filter enabled
    pub const DEGLITCH: Self = Self(1 << 1);
    /// Multi-drive (open-drain) enabled
    pub const OPENDRAIN: Self = Self(1 << 2);
    /// Debounce filter enabled
    pub const DEBOUNCE: Self = Self(1 << 3);

    /// Raw flag bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check if every flag in `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Combine two attribute sets
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// One PIO controller as exposed by the peripheral-access layer
///
/// `mask` arguments select pins within the controller, one bit per line.
pub trait PioController {
    /// Configure the lines in `mask` as `ty` with `attributes`
    fn configure(&mut self, ty: PioType, mask: u32, attributes: PioAttributes);

    /// Drive the lines in `mask` high
    fn set(&mut self, mask: u32);

    /// Drive the lines in `mask` low
    fn clear(&mut self, mask: u32);

    /// Read the lines in `mask`
    ///
    /// Output types read the output data register, [`PioType::Input`] reads
    /// the pin data status register. Returns the selected bits.
    fn get(&self, ty: PioType, mask: u32) -> u32;

    /// Output status register: one bit set for every line configured as
    /// an output
    fn output_status(&self) -> u32;
}
