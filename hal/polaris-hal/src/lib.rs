//! Polaris Hardware Abstraction Layer
//!
//! This crate defines the chip-independent GPIO and serial API that flight
//! software is written against. Chip-specific crates implement the traits
//! on top of their vendor peripheral-access layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (flight software, demos)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  polaris-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  polaris-hal-sam3x8                     │
//! │  (pin resolver, PIO + USART dispatch)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::GpioHal`] - Flat pin-number digital I/O
//! - [`uart::UartHal`] - Serial channel configuration and data flow
//! - [`uart::UartHandler`] - Per-channel TX/RX callbacks
//! - [`uart::UartTx`] - Blocking transmit

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::{GpioError, GpioHal, Level, PullMode};
pub use uart::{FlowControl, Parity, UartConfig, UartError, UartHal, UartHandler, UartTx};
