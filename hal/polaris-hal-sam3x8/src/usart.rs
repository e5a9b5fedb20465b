//! Serial engine access and option translation
//!
//! The SAM3X8 has three USARTs and one plain UART. Their register-level
//! drivers live in the vendor peripheral-access layer; this module defines
//! the option block handed to them and the translation from an abstract
//! [`UartConfig`] into that block.

use polaris_hal::{FlowControl, Parity, UartConfig, UartError};

/// Character length field of the USART mode register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CharLength {
    Bits5,
    Bits6,
    Bits7,
    Bits8,
    /// 9-bit mode (MODE9 bit, CHRL ignored)
    Bits9,
}

impl CharLength {
    /// Map a data bit count onto a character length
    pub const fn from_data_bits(bits: u8) -> Option<Self> {
        match bits {
            5 => Some(CharLength::Bits5),
            6 => Some(CharLength::Bits6),
            7 => Some(CharLength::Bits7),
            8 => Some(CharLength::Bits8),
            9 => Some(CharLength::Bits9),
            _ => None,
        }
    }

    /// Mode register bits (US_MR.CHRL / US_MR.MODE9)
    pub const fn mode_bits(self) -> u32 {
        match self {
            CharLength::Bits5 => 0x0 << 6,
            CharLength::Bits6 => 0x1 << 6,
            CharLength::Bits7 => 0x2 << 6,
            CharLength::Bits8 => 0x3 << 6,
            CharLength::Bits9 => 0x1 << 17,
        }
    }
}

/// Parity field of the USART mode register
///
/// `Space`, `Mark` and `Multidrop` complete the register encoding; the
/// [`Parity`] request type only maps onto `No`, `Odd` and `Even`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParityType {
    Even,
    Odd,
    Space,
    Mark,
    No,
    Multidrop,
}

impl ParityType {
    /// Mode register bits (US_MR.PAR)
    pub const fn mode_bits(self) -> u32 {
        match self {
            ParityType::Even => 0x0 << 9,
            ParityType::Odd => 0x1 << 9,
            ParityType::Space => 0x2 << 9,
            ParityType::Mark => 0x3 << 9,
            ParityType::No => 0x4 << 9,
            ParityType::Multidrop => 0x6 << 9,
        }
    }
}

impl From<Parity> for ParityType {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => ParityType::No,
            Parity::Odd => ParityType::Odd,
            Parity::Even => ParityType::Even,
        }
    }
}

/// Stop bit field of the USART mode register
///
/// `OneAndHalf` completes the register encoding and is never produced by
/// [`translate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBitCount {
    One,
    OneAndHalf,
    Two,
}

impl StopBitCount {
    /// Map a stop bit count onto the register field
    ///
    /// 1.5 stop bits exist in hardware but cannot be requested through the
    /// integer interface.
    pub const fn from_stop_bits(bits: u8) -> Option<Self> {
        match bits {
            1 => Some(StopBitCount::One),
            2 => Some(StopBitCount::Two),
            _ => None,
        }
    }

    /// Mode register bits (US_MR.NBSTOP)
    pub const fn mode_bits(self) -> u32 {
        match self {
            StopBitCount::One => 0x0 << 12,
            StopBitCount::OneAndHalf => 0x1 << 12,
            StopBitCount::Two => 0x2 << 12,
        }
    }
}

/// Channel mode field of the USART mode register
///
/// Configuration always selects `Normal`; the loopback modes complete the
/// register encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelMode {
    #[default]
    Normal,
    Automatic,
    LocalLoopback,
    RemoteLoopback,
}

impl ChannelMode {
    /// Mode register bits (US_MR.CHMODE)
    pub const fn mode_bits(self) -> u32 {
        match self {
            ChannelMode::Normal => 0x0 << 14,
            ChannelMode::Automatic => 0x1 << 14,
            ChannelMode::LocalLoopback => 0x2 << 14,
            ChannelMode::RemoteLoopback => 0x3 << 14,
        }
    }
}

/// Option block for an RS232-mode USART initialisation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsartOptions {
    pub baudrate: u32,
    pub char_length: CharLength,
    pub parity_type: ParityType,
    pub stop_bits: StopBitCount,
    pub channel_mode: ChannelMode,
}

impl UsartOptions {
    /// Options for the fixed 8N1 framing of the plain UART
    pub const fn plain_uart(baudrate: u32) -> Self {
        Self {
            baudrate,
            char_length: CharLength::Bits8,
            parity_type: ParityType::No,
            stop_bits: StopBitCount::One,
            channel_mode: ChannelMode::Normal,
        }
    }

    /// Combined mode register value for these options
    pub const fn mode_register(&self) -> u32 {
        self.char_length.mode_bits()
            | self.parity_type.mode_bits()
            | self.stop_bits.mode_bits()
            | self.channel_mode.mode_bits()
    }

    /// Check if these options match what the plain UART can frame
    pub fn is_plain_uart_framing(&self) -> bool {
        self.char_length == CharLength::Bits8
            && self.parity_type == ParityType::No
            && self.stop_bits == StopBitCount::One
    }
}

/// Serial engine refused an initialisation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineError;

impl From<EngineError> for UartError {
    fn from(_: EngineError) -> Self {
        UartError::Engine
    }
}

/// One serial engine as exposed by the peripheral-access layer
pub trait SerialEngine {
    /// Initialise as an RS232 USART with `options`
    ///
    /// `reference_clock_hz` is the peripheral clock the baud divisor is
    /// derived from.
    fn init_usart(
        &mut self,
        options: &UsartOptions,
        reference_clock_hz: u32,
    ) -> Result<(), EngineError>;

    /// Initialise as a plain UART; only the baud rate is programmable
    fn init_uart(&mut self, baudrate: u32, reference_clock_hz: u32) -> Result<(), EngineError>;

    /// Disable transmitter and receiver
    fn disable(&mut self);

    /// Check if the transmit holding register can take a byte
    fn tx_ready(&self) -> bool;

    /// Load a byte into the transmit holding register
    fn write_byte(&mut self, byte: u8);

    /// Take a received byte, if one is waiting
    fn read_byte(&mut self) -> Option<u8>;
}

/// Maximum value of the 16-bit clock divisor
const MAX_CLOCK_DIVISOR: u32 = 0xFFFF;

/// Clock divisor for `baudrate` in 16x oversampling mode
///
/// Returns `None` when the rate is zero or the rounded divisor falls
/// outside `1..=65535`.
pub const fn baud_divisor(baudrate: u32, reference_clock_hz: u32) -> Option<u16> {
    if baudrate == 0 {
        return None;
    }
    let sample_rate = baudrate as u64 * 16;
    let divisor = (reference_clock_hz as u64 + sample_rate / 2) / sample_rate;
    if divisor == 0 || divisor > MAX_CLOCK_DIVISOR as u64 {
        None
    } else {
        Some(divisor as u16)
    }
}

/// Translate a configuration request into USART options
///
/// Checks run in a fixed order: data bits, parity, stop bits, flow
/// control. The baud rate is not checked here because its limits depend
/// on the reference clock.
pub fn translate(config: &UartConfig) -> Result<UsartOptions, UartError> {
    let char_length =
        CharLength::from_data_bits(config.data_bits).ok_or(UartError::UnsupportedDataBits)?;
    let parity_type = ParityType::from(config.parity);
    let stop_bits =
        StopBitCount::from_stop_bits(config.stop_bits).ok_or(UartError::UnsupportedStopBits)?;

    // Accepted but not wired: RTS/CTS needs pin muxing this layer doesn't own
    match config.flow_control {
        FlowControl::None | FlowControl::RtsCts => {}
    }

    Ok(UsartOptions {
        baudrate: config.baudrate,
        char_length,
        parity_type,
        stop_bits,
        channel_mode: ChannelMode::Normal,
    })
}
