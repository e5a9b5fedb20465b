//! Board configuration
//!
//! Describes how a particular board uses the chip: which serial channel is
//! the console, how it is framed, and which line drives the status LED.

use heapless::String;
use polaris_hal::UartConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pins::parse_pin_string;
use crate::uart::{self, DEFAULT_REFERENCE_CLOCK_HZ, PLAIN_UART_CHANNEL};
use crate::usart;

/// Maximum length of a pin name ("!PB27")
pub const MAX_PIN_NAME_LEN: usize = 8;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pin name does not parse or is not bonded out
    InvalidPin,
    /// Console channel does not exist
    InvalidChannel,
    /// Console framing is rejected by the console's engine
    UnsupportedConsole(polaris_hal::UartError),
}

/// Console serial port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConsoleConfig {
    /// Serial channel (0-2 USART, 3 UART)
    pub channel: u8,
    /// Line settings
    pub uart: UartConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            channel: PLAIN_UART_CHANNEL,
            uart: UartConfig::default(),
        }
    }
}

/// Board-level hardware configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoardConfig {
    /// Peripheral clock feeding the serial engines
    pub reference_clock_hz: u32,
    /// Console port
    pub console: ConsoleConfig,
    /// Status LED pin name, e.g. "PB27" or "!PB27" for active-low
    pub status_led: Option<String<MAX_PIN_NAME_LEN>>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            reference_clock_hz: DEFAULT_REFERENCE_CLOCK_HZ,
            console: ConsoleConfig::default(),
            status_led: None,
        }
    }
}

impl BoardConfig {
    /// Create a config with default clock and console
    pub fn new() -> Self {
        Self::default()
    }

    /// Status LED as (pin number, active-low), if one is configured
    pub fn status_led_pin(&self) -> Result<Option<(u8, bool)>, ConfigError> {
        match &self.status_led {
            Some(name) => parse_pin_string(name)
                .map(Some)
                .ok_or(ConfigError::InvalidPin),
            None => Ok(None),
        }
    }

    /// Check the config against the chip without touching hardware
    ///
    /// Applies the same rules `configure` and the pin resolver apply, so a
    /// config that validates will not be rejected at bring-up.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.status_led_pin()?;

        let kind = uart::channel_kind(self.console.channel)
            .map_err(|_| ConfigError::InvalidChannel)?;

        let options =
            usart::translate(&self.console.uart).map_err(ConfigError::UnsupportedConsole)?;

        if usart::baud_divisor(options.baudrate, self.reference_clock_hz).is_none() {
            return Err(ConfigError::UnsupportedConsole(
                polaris_hal::UartError::InvalidBaudrate,
            ));
        }

        if kind == uart::EngineKind::PlainUart && !options.is_plain_uart_framing() {
            return Err(ConfigError::UnsupportedConsole(
                polaris_hal::UartError::UnsupportedOnPlainUart,
            ));
        }

        Ok(())
    }
}
