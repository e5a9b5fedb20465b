//! UART channel registry for SAM3X8
//!
//! The board has one UART and three USARTs, exposed as four channels:
//!
//! | Channel | Engine | Kind       |
//! |---------|--------|------------|
//! | 0       | USART0 | USART      |
//! | 1       | USART1 | USART      |
//! | 2       | USART2 | USART      |
//! | 3       | UART   | plain UART |
//!
//! Channel slots exist for the lifetime of the registry. Configuring a
//! channel opens it, closing returns it to the unconfigured state.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Deque;
use polaris_hal::{UartConfig, UartError, UartHal, UartHandler, UartTx};

use crate::usart::{self, SerialEngine, UsartOptions};

/// Number of serial channels
pub const UART_COUNT: usize = 4;

/// Channel backed by the plain UART engine
pub const PLAIN_UART_CHANNEL: u8 = 3;

/// Transmit ring capacity per channel
pub const TX_BUFFER_SIZE: usize = 8;

/// SAM3X8E master clock after the default PLL setup
pub const DEFAULT_REFERENCE_CLOCK_HZ: u32 = 84_000_000;

/// Which kind of engine sits behind a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineKind {
    /// UART: baud rate only, fixed 8N1 framing
    PlainUart,
    /// USART: full character length, parity and stop bit control
    Usart,
}

/// Engine kind of each channel, indexed by channel number
const CHANNEL_KINDS: [EngineKind; UART_COUNT] = [
    EngineKind::Usart,
    EngineKind::Usart,
    EngineKind::Usart,
    EngineKind::PlainUart,
];

/// Engine kind for a channel number
pub const fn channel_kind(channel: u8) -> Result<EngineKind, UartError> {
    if (channel as usize) < UART_COUNT {
        Ok(CHANNEL_KINDS[channel as usize])
    } else {
        Err(UartError::InvalidChannel)
    }
}

/// State of one serial channel
pub struct UartChannel<E> {
    engine: E,
    kind: EngineKind,
    open: bool,
    tx_on: bool,
    rx_pending: Option<u8>,
    tx_buffer: Deque<u8, TX_BUFFER_SIZE>,
    handler: Option<&'static dyn UartHandler>,
    options: Option<UsartOptions>,
}

impl<E: SerialEngine> UartChannel<E> {
    fn new(engine: E, kind: EngineKind) -> Self {
        Self {
            engine,
            kind,
            open: false,
            tx_on: false,
            rx_pending: None,
            tx_buffer: Deque::new(),
            handler: None,
            options: None,
        }
    }

    /// Engine behind this channel
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Engine kind of this channel
    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Check if the channel has been configured
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Check if a transmission is in progress
    pub fn is_transmitting(&self) -> bool {
        self.tx_on
    }

    /// Options applied by the last successful configure
    pub fn options(&self) -> Option<&UsartOptions> {
        self.options.as_ref()
    }

    /// Bytes waiting in the transmit ring
    pub fn tx_pending(&self) -> usize {
        self.tx_buffer.len()
    }

    /// Received byte the handler has not yet accepted
    pub fn rx_pending(&self) -> Option<u8> {
        self.rx_pending
    }

    fn reset(&mut self) {
        self.open = false;
        self.tx_on = false;
        self.rx_pending = None;
        self.tx_buffer.clear();
        self.options = None;
    }

    fn ensure_open(&self) -> Result<(), UartError> {
        if self.open {
            Ok(())
        } else {
            Err(UartError::NotOpen)
        }
    }
}

/// The four SAM3X8 serial channels
pub struct Sam3xUart<E> {
    channels: [UartChannel<E>; UART_COUNT],
    reference_clock_hz: u32,
}

impl<E: SerialEngine> Sam3xUart<E> {
    /// Create the registry from the engines in channel order
    /// (USART0, USART1, USART2, UART)
    pub fn new(engines: [E; UART_COUNT]) -> Self {
        Self::with_reference_clock(engines, DEFAULT_REFERENCE_CLOCK_HZ)
    }

    /// Create the registry with a specific peripheral clock
    pub fn with_reference_clock(engines: [E; UART_COUNT], reference_clock_hz: u32) -> Self {
        let [usart0, usart1, usart2, uart] = engines;
        let [kind0, kind1, kind2, kind3] = CHANNEL_KINDS;
        Self {
            channels: [
                UartChannel::new(usart0, kind0),
                UartChannel::new(usart1, kind1),
                UartChannel::new(usart2, kind2),
                UartChannel::new(uart, kind3),
            ],
            reference_clock_hz,
        }
    }

    /// Peripheral clock used for baud divisors
    pub fn reference_clock_hz(&self) -> u32 {
        self.reference_clock_hz
    }

    /// Channel record, bounds checked
    pub fn channel(&self, channel: u8) -> Result<&UartChannel<E>, UartError> {
        self.channels
            .get(usize::from(channel))
            .ok_or(UartError::InvalidChannel)
    }

    /// Mutable channel record, bounds checked
    pub fn lookup(&mut self, channel: u8) -> Result<&mut UartChannel<E>, UartError> {
        self.channels
            .get_mut(usize::from(channel))
            .ok_or(UartError::InvalidChannel)
    }

    /// Borrow a channel as a byte-stream port
    pub fn port(&mut self, channel: u8) -> Result<UartPort<'_, E>, UartError> {
        self.lookup(channel)?;
        Ok(UartPort {
            uart: self,
            channel,
        })
    }

    fn apply(&mut self, channel: u8, config: &UartConfig) -> Result<UsartOptions, UartError> {
        let reference_clock_hz = self.reference_clock_hz;
        let ch = self.lookup(channel)?;
        let options = usart::translate(config)?;

        if usart::baud_divisor(options.baudrate, reference_clock_hz).is_none() {
            return Err(UartError::InvalidBaudrate);
        }

        let init = match ch.kind {
            EngineKind::Usart => ch.engine.init_usart(&options, reference_clock_hz),
            EngineKind::PlainUart => {
                if !options.is_plain_uart_framing() {
                    return Err(UartError::UnsupportedOnPlainUart);
                }
                ch.engine.init_uart(options.baudrate, reference_clock_hz)
            }
        };
        // A refused init leaves the engine reset, whatever it ran before
        if let Err(e) = init {
            ch.reset();
            return Err(e.into());
        }

        ch.options = Some(options);
        ch.open = true;
        Ok(options)
    }

    fn fill_tx_buffer(ch: &mut UartChannel<E>) {
        let Some(handler) = ch.handler else {
            return;
        };
        while !ch.tx_buffer.is_full() {
            match handler.tx_char() {
                Some(byte) => {
                    // Capacity checked above
                    let _ = ch.tx_buffer.push_back(byte);
                }
                None => break,
            }
        }
    }
}

impl<E: SerialEngine> UartHal for Sam3xUart<E> {
    fn configure(&mut self, channel: u8, config: &UartConfig) -> Result<(), UartError> {
        match self.apply(channel, config) {
            Ok(options) => {
                info!(
                    "uart{}: {} baud, mode {=u32:#x}",
                    channel,
                    options.baudrate,
                    options.mode_register()
                );
                Ok(())
            }
            Err(e) => {
                warn!("uart{}: configuration rejected: {}", channel, e);
                Err(e)
            }
        }
    }

    fn close(&mut self, channel: u8) -> Result<(), UartError> {
        let ch = self.lookup(channel)?;
        if ch.open {
            ch.engine.disable();
        }
        ch.reset();
        debug!("uart{}: closed", channel);
        Ok(())
    }

    fn set_handler(
        &mut self,
        channel: u8,
        handler: &'static dyn UartHandler,
    ) -> Result<(), UartError> {
        self.lookup(channel)?.handler = Some(handler);
        Ok(())
    }

    fn start_tx(&mut self, channel: u8) -> Result<(), UartError> {
        let ch = self.lookup(channel)?;
        ch.ensure_open()?;
        ch.tx_on = true;

        loop {
            if ch.tx_buffer.is_empty() {
                Self::fill_tx_buffer(ch);
            }
            if ch.tx_buffer.is_empty() {
                ch.tx_on = false;
                if let Some(handler) = ch.handler {
                    handler.tx_done();
                }
                break;
            }
            if !ch.engine.tx_ready() {
                // Engine is busy; the rest goes out on the next start_tx
                break;
            }
            if let Some(byte) = ch.tx_buffer.pop_front() {
                ch.engine.write_byte(byte);
            }
        }
        Ok(())
    }

    fn start_rx(&mut self, channel: u8) -> Result<(), UartError> {
        let ch = self.lookup(channel)?;
        ch.ensure_open()?;
        let Some(handler) = ch.handler else {
            return Ok(());
        };

        if let Some(byte) = ch.rx_pending {
            if !handler.rx_char(byte) {
                return Ok(());
            }
            ch.rx_pending = None;
        }

        while let Some(byte) = ch.engine.read_byte() {
            if !handler.rx_char(byte) {
                trace!("uart{}: rx stalled", channel);
                ch.rx_pending = Some(byte);
                break;
            }
        }
        Ok(())
    }

    fn blocking_tx(&mut self, channel: u8, byte: u8) -> Result<(), UartError> {
        let ch = self.lookup(channel)?;
        ch.ensure_open()?;
        while !ch.engine.tx_ready() {
            core::hint::spin_loop();
        }
        ch.engine.write_byte(byte);
        Ok(())
    }
}

/// A single channel borrowed as a blocking byte stream
pub struct UartPort<'a, E> {
    uart: &'a mut Sam3xUart<E>,
    channel: u8,
}

impl<E: SerialEngine> UartPort<'_, E> {
    /// Channel number of this port
    pub fn channel(&self) -> u8 {
        self.channel
    }
}

impl<E: SerialEngine> UartTx for UartPort<'_, E> {
    type Error = UartError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        for &byte in data {
            self.uart.blocking_tx(self.channel, byte)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.uart.channel(self.channel)?.ensure_open()
    }
}

impl<E: SerialEngine> embedded_io::ErrorType for UartPort<'_, E> {
    type Error = UartError;
}

impl<E: SerialEngine> embedded_io::Write for UartPort<'_, E> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.write_blocking(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        UartTx::flush(self)
    }
}

/// Registry shared between thread mode and interrupt handlers
///
/// Each access runs inside the mutex `M`. An access that arrives while
/// another is still in progress (a handler re-entering the registry)
/// fails with [`UartError::ChannelBusy`] instead of aliasing the state.
pub struct SharedUart<M: RawMutex, E> {
    inner: Mutex<M, RefCell<Sam3xUart<E>>>,
}

impl<M: RawMutex, E: SerialEngine> SharedUart<M, E> {
    /// Wrap a registry
    pub const fn new(uart: Sam3xUart<E>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(uart)),
        }
    }

    /// Run `f` with exclusive access to the registry
    pub fn with<R>(
        &self,
        f: impl FnOnce(&mut Sam3xUart<E>) -> Result<R, UartError>,
    ) -> Result<R, UartError> {
        self.inner.lock(|cell| {
            let mut uart = cell.try_borrow_mut().map_err(|_| UartError::ChannelBusy)?;
            f(&mut uart)
        })
    }

    /// Configure a channel
    pub fn configure(&self, channel: u8, config: &UartConfig) -> Result<(), UartError> {
        self.with(|uart| uart.configure(channel, config))
    }

    /// Close a channel
    pub fn close(&self, channel: u8) -> Result<(), UartError> {
        self.with(|uart| uart.close(channel))
    }
}
