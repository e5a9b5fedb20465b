//! GPIO dispatch for SAM3X8
//!
//! Resolves flat pin numbers and forwards each operation to exactly one of
//! the four PIO controllers.

use polaris_hal::{GpioError, GpioHal, Level, PullMode};

use crate::pins::{self, PinId, Port};
use crate::pio::{PioAttributes, PioController, PioType};

/// Attributes used for every output line
const OUTPUT_ATTRIBUTES: PioAttributes = PioAttributes::OPENDRAIN;

/// Attributes for an input line with the given pull
///
/// The PIO block has no pull-down resistor; `Down` selects multi-drive with
/// the pull-up released so an external pull-down can hold the line.
pub const fn pull_attributes(pull: PullMode) -> PioAttributes {
    match pull {
        PullMode::None => PioAttributes::DEFAULT,
        PullMode::Up => PioAttributes::PULLUP,
        PullMode::Down => PioAttributes::OPENDRAIN,
    }
}

/// GPIO front end over the four PIO controllers
pub struct Sam3xGpio<P> {
    pioa: P,
    piob: P,
    pioc: P,
    piod: P,
}

impl<P: PioController> Sam3xGpio<P> {
    /// Create the dispatcher from the four controllers
    pub fn new(pioa: P, piob: P, pioc: P, piod: P) -> Self {
        Self {
            pioa,
            piob,
            pioc,
            piod,
        }
    }

    /// Controller for a port
    pub fn controller(&self, port: Port) -> &P {
        match port {
            Port::A => &self.pioa,
            Port::B => &self.piob,
            Port::C => &self.pioc,
            Port::D => &self.piod,
        }
    }

    fn controller_mut(&mut self, port: Port) -> &mut P {
        match port {
            Port::A => &mut self.pioa,
            Port::B => &mut self.piob,
            Port::C => &mut self.pioc,
            Port::D => &mut self.piod,
        }
    }

    /// Give back the controllers
    pub fn release(self) -> (P, P, P, P) {
        (self.pioa, self.piob, self.pioc, self.piod)
    }

    /// Borrow a single pin as an `embedded-hal` pin
    pub fn pin(&mut self, pin: u8) -> Result<GpioPin<'_, P>, GpioError> {
        let id = pins::resolve(pin)?;
        Ok(GpioPin { gpio: self, id })
    }

    fn read_id(&self, id: PinId) -> Level {
        let pio = self.controller(id.port());
        let mask = id.mask();

        // Outputs report the driven level, inputs the sensed level
        let ty = if pio.output_status() & mask != 0 {
            PioType::Output0
        } else {
            PioType::Input
        };

        Level::from(pio.get(ty, mask) != 0)
    }

    fn write_id(&mut self, id: PinId, level: Level) {
        let mask = id.mask();
        let pio = self.controller_mut(id.port());
        match level {
            Level::High => pio.set(mask),
            Level::Low => pio.clear(mask),
        }
    }
}

impl<P: PioController> GpioHal for Sam3xGpio<P> {
    fn init_output(&mut self, pin: u8, level: Level) -> Result<(), GpioError> {
        let id = pins::resolve(pin)?;
        debug!("gpio: P{}{} output, initial {}", id.port().letter(), id.bit(), level.as_u8());

        self.controller_mut(id.port()).configure(
            PioType::output(level.is_high()),
            id.mask(),
            OUTPUT_ATTRIBUTES,
        );
        Ok(())
    }

    fn init_input(&mut self, pin: u8, pull: PullMode) -> Result<(), GpioError> {
        let id = pins::resolve(pin)?;
        let attributes = pull_attributes(pull);
        debug!("gpio: P{}{} input, pull {}", id.port().letter(), id.bit(), pull as u8);

        self.controller_mut(id.port())
            .configure(PioType::Input, id.mask(), attributes);
        Ok(())
    }

    fn read(&mut self, pin: u8) -> Result<Level, GpioError> {
        let id = pins::resolve(pin)?;
        Ok(self.read_id(id))
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), GpioError> {
        let id = pins::resolve(pin)?;
        self.write_id(id, level);
        Ok(())
    }

    fn toggle(&mut self, pin: u8) -> Result<Level, GpioError> {
        let id = pins::resolve(pin)?;
        let current = self.read_id(id);
        self.write_id(id, !current);
        Ok(self.read_id(id))
    }
}

/// A single validated pin borrowed from [`Sam3xGpio`]
///
/// Implements the `embedded-hal` digital traits so drivers written against
/// them can use PIO lines directly. The pin is validated when the handle is
/// created, so none of the trait methods fail.
pub struct GpioPin<'a, P> {
    gpio: &'a mut Sam3xGpio<P>,
    id: PinId,
}

impl<P: PioController> GpioPin<'_, P> {
    /// The pin this handle refers to
    pub fn id(&self) -> PinId {
        self.id
    }

    /// Configure as output at `level`
    pub fn into_output(&mut self, level: Level) {
        self.gpio.controller_mut(self.id.port()).configure(
            PioType::output(level.is_high()),
            self.id.mask(),
            OUTPUT_ATTRIBUTES,
        );
    }

    /// Configure as input with `pull`
    pub fn into_input(&mut self, pull: PullMode) {
        self.gpio.controller_mut(self.id.port()).configure(
            PioType::Input,
            self.id.mask(),
            pull_attributes(pull),
        );
    }

    /// Current level of the pin
    pub fn level(&self) -> Level {
        self.gpio.read_id(self.id)
    }
}

impl<P: PioController> embedded_hal::digital::ErrorType for GpioPin<'_, P> {
    type Error = GpioError;
}

impl<P: PioController> embedded_hal::digital::OutputPin for GpioPin<'_, P> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.gpio.write_id(self.id, Level::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.gpio.write_id(self.id, Level::High);
        Ok(())
    }
}

impl<P: PioController> embedded_hal::digital::StatefulOutputPin for GpioPin<'_, P> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level().is_high())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level().is_high())
    }
}

impl<P: PioController> embedded_hal::digital::InputPin for GpioPin<'_, P> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level().is_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level().is_high())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPio;
    use crate::pins::PIN_SPACE;
    use embedded_hal::digital::{InputPin, OutputPin, StatefulOutputPin};
    use proptest::prelude::*;

    fn gpio() -> Sam3xGpio<MockPio> {
        Sam3xGpio::new(
            MockPio::default(),
            MockPio::default(),
            MockPio::default(),
            MockPio::default(),
        )
    }

    fn total_accesses(gpio: &Sam3xGpio<MockPio>) -> usize {
        Port::ALL
            .iter()
            .map(|&port| gpio.controller(port).accesses())
            .sum()
    }

    /// Every bonded pin number
    fn valid_pins() -> impl Iterator<Item = u8> {
        (0..PIN_SPACE as u8).filter(|&p| pins::resolve(p).is_ok())
    }

    #[test]
    fn test_init_output_configures_single_port() {
        let mut gpio = gpio();

        // PB27
        gpio.init_output(59, Level::High).unwrap();

        let pb = gpio.controller(Port::B);
        assert_eq!(pb.writes, 1);
        assert_eq!(pb.osr, 1 << 27);
        assert_eq!(pb.odsr, 1 << 27);
        assert_eq!(pb.multi_drive, 1 << 27);

        for port in [Port::A, Port::C, Port::D] {
            assert_eq!(gpio.controller(port).accesses(), 0);
        }
    }

    #[test]
    fn test_init_output_low() {
        let mut gpio = gpio();
        gpio.init_output(3, Level::Low).unwrap();
        assert_eq!(gpio.read(3), Ok(Level::Low));
        assert_eq!(gpio.controller(Port::A).osr, 1 << 3);
    }

    #[test]
    fn test_init_input_pull_modes() {
        let mut gpio = gpio();

        gpio.init_input(64, PullMode::Up).unwrap();
        gpio.init_input(65, PullMode::None).unwrap();
        gpio.init_input(66, PullMode::Down).unwrap();

        let pc = gpio.controller(Port::C);
        assert_eq!(pc.osr, 0);
        assert_eq!(pc.pull_up, 1 << 0);
        assert_eq!(pc.multi_drive, 1 << 2);
        assert_eq!(pc.writes, 3);

        // Pulled-up input with nothing driving it reads high
        assert_eq!(gpio.read(64), Ok(Level::High));
        assert_eq!(gpio.read(65), Ok(Level::Low));
    }

    #[test]
    fn test_input_reads_external_level() {
        let mut gpio = gpio();
        gpio.init_input(100, PullMode::None).unwrap(); // PD4

        let pd = &mut gpio.piod;
        pd.driven = 1 << 4;
        pd.external = 1 << 4;
        assert_eq!(gpio.read(100), Ok(Level::High));

        gpio.piod.external = 0;
        assert_eq!(gpio.read(100), Ok(Level::Low));
    }

    #[test]
    fn test_invalid_pin_touches_nothing() {
        let mut gpio = gpio();

        for pin in [30, 31, 95, 106, 127, 128, 255] {
            assert_eq!(gpio.init_output(pin, Level::High), Err(GpioError::InvalidPin));
            assert_eq!(gpio.init_input(pin, PullMode::Up), Err(GpioError::InvalidPin));
            assert_eq!(gpio.read(pin), Err(GpioError::InvalidPin));
            assert_eq!(gpio.write(pin, Level::High), Err(GpioError::InvalidPin));
            assert_eq!(gpio.toggle(pin), Err(GpioError::InvalidPin));
            assert!(gpio.pin(pin).is_err());
        }

        assert_eq!(total_accesses(&gpio), 0);
    }

    #[test]
    fn test_write_dispatches_once() {
        let mut gpio = gpio();
        gpio.init_output(96, Level::Low).unwrap();

        let before = total_accesses(&gpio);
        gpio.write(96, Level::High).unwrap();
        assert_eq!(total_accesses(&gpio), before + 1);
        assert_eq!(gpio.controller(Port::D).odsr, 1);
    }

    #[test]
    fn test_write_read_every_pin() {
        let mut gpio = gpio();

        for pin in valid_pins() {
            gpio.init_output(pin, Level::Low).unwrap();

            gpio.write(pin, Level::High).unwrap();
            assert_eq!(gpio.read(pin), Ok(Level::High), "pin {}", pin);

            gpio.write(pin, Level::Low).unwrap();
            assert_eq!(gpio.read(pin), Ok(Level::Low), "pin {}", pin);
        }
    }

    #[test]
    fn test_toggle() {
        let mut gpio = gpio();
        gpio.init_output(10, Level::Low).unwrap();

        assert_eq!(gpio.toggle(10), Ok(Level::High));
        assert_eq!(gpio.read(10), Ok(Level::High));

        assert_eq!(gpio.toggle(10), Ok(Level::Low));
        assert_eq!(gpio.read(10), Ok(Level::Low));
    }

    #[test]
    fn test_embedded_hal_pin() {
        let mut gpio = gpio();

        {
            let mut led = gpio.pin(59).unwrap();
            led.into_output(Level::Low);
            assert!(led.is_set_low().unwrap());

            led.set_high().unwrap();
            assert!(led.is_set_high().unwrap());
            assert!(led.is_high().unwrap());

            led.toggle().unwrap();
            assert!(led.is_low().unwrap());
            assert_eq!(led.id().number(), 59);
        }

        assert_eq!(gpio.read(59), Ok(Level::Low));
    }

    proptest! {
        #[test]
        fn prop_write_then_read(pin in 0u8..128, high in any::<bool>()) {
            prop_assume!(pins::resolve(pin).is_ok());
            let mut gpio = gpio();
            let level = Level::from(high);

            gpio.init_output(pin, !level).unwrap();
            gpio.write(pin, level).unwrap();
            prop_assert_eq!(gpio.read(pin), Ok(level));
        }

        #[test]
        fn prop_double_toggle_restores(pin in 0u8..128, high in any::<bool>()) {
            prop_assume!(pins::resolve(pin).is_ok());
            let mut gpio = gpio();
            let level = Level::from(high);
            gpio.init_output(pin, level).unwrap();

            prop_assert_eq!(gpio.toggle(pin), Ok(!level));
            prop_assert_eq!(gpio.read(pin), Ok(!level));
            prop_assert_eq!(gpio.toggle(pin), Ok(level));
            prop_assert_eq!(gpio.read(pin), Ok(level));
        }

        #[test]
        fn prop_invalid_pins_rejected(pin in 0u8..=u8::MAX) {
            prop_assume!(pins::resolve(pin).is_err());
            let mut gpio = gpio();
            prop_assert_eq!(gpio.write(pin, Level::High), Err(GpioError::InvalidPin));
            prop_assert_eq!(total_accesses(&gpio), 0);
        }
    }
}
