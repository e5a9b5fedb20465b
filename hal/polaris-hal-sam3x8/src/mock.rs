//! Simulated peripherals for host tests

use crate::pio::{PioAttributes, PioController, PioType};
use crate::usart::{EngineError, SerialEngine, UsartOptions};

use std::cell::Cell;
use std::vec::Vec;

/// Register-level model of one PIO controller
///
/// Output lines read back what they drive. Input lines read `external`,
/// with the pull-up pulling undriven lines high.
#[derive(Debug, Default)]
pub struct MockPio {
    /// Output status register
    pub osr: u32,
    /// Output data status register
    pub odsr: u32,
    /// Pull-up status
    pub pull_up: u32,
    /// Multi-drive status
    pub multi_drive: u32,
    /// Levels applied to the pins from outside
    pub external: u32,
    /// Lines that something outside is actively driving
    pub driven: u32,
    /// Number of calls that changed controller state
    pub writes: usize,
    /// Number of calls that read controller state
    pub reads: Cell<usize>,
}

impl MockPio {
    /// Total calls of any kind
    pub fn accesses(&self) -> usize {
        self.writes + self.reads.get()
    }

    fn pdsr(&self) -> u32 {
        let undriven = !self.driven & !self.osr;
        (self.odsr & self.osr)
            | (self.external & self.driven & !self.osr)
            | (self.pull_up & undriven)
    }
}

impl PioController for MockPio {
    fn configure(&mut self, ty: PioType, mask: u32, attributes: PioAttributes) {
        self.writes += 1;

        if attributes.contains(PioAttributes::PULLUP) {
            self.pull_up |= mask;
        } else {
            self.pull_up &= !mask;
        }
        if attributes.contains(PioAttributes::OPENDRAIN) {
            self.multi_drive |= mask;
        } else {
            self.multi_drive &= !mask;
        }

        match ty {
            PioType::Input => self.osr &= !mask,
            PioType::Output0 => {
                self.odsr &= !mask;
                self.osr |= mask;
            }
            PioType::Output1 => {
                self.odsr |= mask;
                self.osr |= mask;
            }
        }
    }

    fn set(&mut self, mask: u32) {
        self.writes += 1;
        self.odsr |= mask;
    }

    fn clear(&mut self, mask: u32) {
        self.writes += 1;
        self.odsr &= !mask;
    }

    fn get(&self, ty: PioType, mask: u32) -> u32 {
        self.reads.set(self.reads.get() + 1);
        if ty.is_output() {
            self.odsr & mask
        } else {
            self.pdsr() & mask
        }
    }

    fn output_status(&self) -> u32 {
        self.reads.set(self.reads.get() + 1);
        self.osr
    }
}

/// What a [`MockEngine`] was last initialised with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineInit {
    Usart(UsartOptions, u32),
    Uart(u32, u32),
}

/// Serial engine that records its programming and loops data in memory
#[derive(Debug, Default)]
pub struct MockEngine {
    pub init: Option<EngineInit>,
    pub init_calls: usize,
    pub enabled: bool,
    pub fail_init: bool,
    /// Bytes the engine has transmitted
    pub sent: Vec<u8>,
    /// Bytes waiting to be received, front first
    pub incoming: Vec<u8>,
    /// Transmit holding register slots before the engine reports busy
    pub tx_capacity: Option<usize>,
}

impl MockEngine {
    pub fn failing() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }
}

impl SerialEngine for MockEngine {
    fn init_usart(
        &mut self,
        options: &UsartOptions,
        reference_clock_hz: u32,
    ) -> Result<(), EngineError> {
        self.init_calls += 1;
        if self.fail_init {
            return Err(EngineError);
        }
        self.init = Some(EngineInit::Usart(*options, reference_clock_hz));
        self.enabled = true;
        Ok(())
    }

    fn init_uart(&mut self, baudrate: u32, reference_clock_hz: u32) -> Result<(), EngineError> {
        self.init_calls += 1;
        if self.fail_init {
            return Err(EngineError);
        }
        self.init = Some(EngineInit::Uart(baudrate, reference_clock_hz));
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn tx_ready(&self) -> bool {
        self.tx_capacity.map_or(true, |cap| self.sent.len() < cap)
    }

    fn write_byte(&mut self, byte: u8) {
        self.sent.push(byte);
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.incoming.is_empty() {
            None
        } else {
            Some(self.incoming.remove(0))
        }
    }
}
