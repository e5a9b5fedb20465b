//! UART serial communication abstractions
//!
//! Serial channels are addressed by a small channel number. A channel is
//! opened by [`UartHal::configure`] and returned to the unconfigured state
//! by [`UartHal::close`]; the channel slots themselves always exist.

/// UART configuration request
///
/// Data bits and stop bits are kept as plain numbers because the set a
/// channel accepts depends on the engine behind it. The chip HAL rejects
/// anything it cannot map onto hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (5-9)
    pub data_bits: u8,
    /// Number of stop bits (1-2)
    pub stop_bits: u8,
    /// Parity mode
    pub parity: Parity,
    /// Hardware handshake
    pub flow_control: FlowControl,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
            flow_control: FlowControl::None,
        }
    }
}

impl UartConfig {
    /// 8N1 at the given baud rate, no flow control
    pub const fn new(baudrate: u32) -> Self {
        Self {
            baudrate,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
            flow_control: FlowControl::None,
        }
    }

    /// Set the number of data bits
    pub const fn data_bits(mut self, data_bits: u8) -> Self {
        self.data_bits = data_bits;
        self
    }

    /// Set the number of stop bits
    pub const fn stop_bits(mut self, stop_bits: u8) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    /// Set the parity mode
    pub const fn parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Set the flow control mode
    pub const fn flow_control(mut self, flow_control: FlowControl) -> Self {
        self.flow_control = flow_control;
        self
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Parity {
    None = 0,
    Odd = 1,
    Even = 2,
}

impl TryFrom<u8> for Parity {
    type Error = UartError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Parity::None),
            1 => Ok(Parity::Odd),
            2 => Ok(Parity::Even),
            _ => Err(UartError::UnsupportedParity),
        }
    }
}

/// Flow control mode
///
/// RTS/CTS is accepted but not wired to hardware by any engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum FlowControl {
    None = 0,
    RtsCts = 1,
}

impl TryFrom<u8> for FlowControl {
    type Error = UartError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FlowControl::None),
            1 => Ok(FlowControl::RtsCts),
            _ => Err(UartError::UnsupportedFlowControl),
        }
    }
}

/// Errors from UART operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartError {
    /// Channel number out of range
    InvalidChannel,
    /// Data bits have no character-length mapping
    UnsupportedDataBits,
    /// Parity has no hardware mapping
    UnsupportedParity,
    /// Stop bits have no hardware mapping
    UnsupportedStopBits,
    /// Flow control mode is not recognised
    UnsupportedFlowControl,
    /// Framing other than 8N1 requested on the plain UART engine
    UnsupportedOnPlainUart,
    /// Baud rate cannot be derived from the reference clock
    InvalidBaudrate,
    /// Channel is being configured by another caller
    ChannelBusy,
    /// Channel has not been configured
    NotOpen,
    /// Serial engine refused the configuration
    Engine,
}

impl embedded_io::Error for UartError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            UartError::InvalidChannel
            | UartError::UnsupportedDataBits
            | UartError::UnsupportedParity
            | UartError::UnsupportedStopBits
            | UartError::UnsupportedFlowControl
            | UartError::InvalidBaudrate => embedded_io::ErrorKind::InvalidInput,
            UartError::UnsupportedOnPlainUart => embedded_io::ErrorKind::Unsupported,
            UartError::NotOpen => embedded_io::ErrorKind::NotConnected,
            UartError::ChannelBusy | UartError::Engine => embedded_io::ErrorKind::Other,
        }
    }
}

/// Callbacks a channel invokes while moving data
///
/// One handler is registered per channel and replaces the separate
/// TX/TX-done/RX function pointers and user argument of a C-style HAL.
pub trait UartHandler: Sync {
    /// Next byte to transmit, or `None` when nothing is queued
    fn tx_char(&self) -> Option<u8>;

    /// Transmission has drained
    fn tx_done(&self) {}

    /// A byte was received
    ///
    /// Return `false` if the byte cannot be accepted right now. The channel
    /// keeps it and offers it again on the next `start_rx`.
    fn rx_char(&self, byte: u8) -> bool;
}

/// Channel-numbered serial interface
pub trait UartHal {
    /// Validate `config`, program the engine behind `channel` and open it
    fn configure(&mut self, channel: u8, config: &UartConfig) -> Result<(), UartError>;

    /// Return `channel` to the unconfigured state
    fn close(&mut self, channel: u8) -> Result<(), UartError>;

    /// Register the callbacks for `channel`
    fn set_handler(
        &mut self,
        channel: u8,
        handler: &'static dyn UartHandler,
    ) -> Result<(), UartError>;

    /// More data is queued; pull it from the handler and transmit
    fn start_tx(&mut self, channel: u8) -> Result<(), UartError>;

    /// The handler can accept data again; deliver what has arrived
    fn start_rx(&mut self, channel: u8) -> Result<(), UartError>;

    /// Transmit one byte, spinning until the engine takes it
    fn blocking_tx(&mut self, channel: u8, byte: u8) -> Result<(), UartError>;
}

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Blocks until all data has been written or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}
