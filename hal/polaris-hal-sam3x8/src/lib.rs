//! SAM3X8-specific HAL for the Polaris flight firmware
//!
//! This crate implements the `polaris-hal` traits for the SAM3X8E:
//!
//! - Flat pin numbering over the four PIO controllers, with every pin
//!   checked against the lines bonded out on the package
//! - GPIO dispatch to exactly one PIO controller per operation
//! - A fixed registry of the four serial channels (three USARTs, one UART)
//! - Translation of abstract serial settings into USART mode options, with
//!   the plain UART limited to its fixed 8N1 framing
//! - Board configuration and validation
//!
//! Register access itself is left to the vendor peripheral-access layer,
//! reached through the [`pio::PioController`] and [`usart::SerialEngine`]
//! traits.
//!
//! # Features
//!
//! - `defmt` - Enable logging and debug formatting support
//! - `serde` - Derive serde traits on configuration types

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod gpio;
pub mod pins;
pub mod pio;
pub mod uart;
pub mod usart;

#[cfg(test)]
mod mock;

pub use config::BoardConfig;
pub use gpio::Sam3xGpio;
pub use pins::{resolve, PinId, Port};
pub use uart::{Sam3xUart, SharedUart};

// Re-export the HAL traits so boards only need this crate
pub use polaris_hal::{GpioError, GpioHal, Level, PullMode, UartConfig, UartError, UartHal};
