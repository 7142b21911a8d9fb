use std::{thread, time::Duration};

pub use rppal::gpio::{Gpio, InputPin, Level, OutputPin, Trigger};

use super::{
    config::{BackendKind, HardwareConfig, PinConfig},
    errors::{self, ActuationError},
    hal::{ActuationBackend, LatchHardware, Peripherals, PinDriver, PulseLine, RfPulseTransmitter, ShiftRegister},
    latch::LatchDriver,
    sensor::FlowCounter,
    station::{StationIndex, SHIFT_REGISTER_LINES},
};
use crate::timer;

pub mod pin {
    /// Shift register **CLOCK** pin
    pub const SHIFT_REGISTER_CLOCK: u8 = 4;
    /// Shift register **OE** (output enable) pin
    pub const SHIFT_REGISTER_OE: u8 = 17;
    /// Shift register **LATCH** pin
    pub const SHIFT_REGISTER_LATCH: u8 = 22;
    /// Shift register **DATA** pin
    pub const SHIFT_REGISTER_DATA: u8 = 27;
    /// RF transmitter pin
    pub const RF_TX: u8 = 15;
    /// Latch booster charge pin
    pub const BOOST: u8 = 20;
    /// Latch booster dump pin
    pub const BOOST_ENABLE: u8 = 21;
    /// Latch COM pin
    pub const LATCH_COM: u8 = 26;
    /// Latch zone pins (stations 1-8)
    pub const LATCH_ZONES: [u8; 8] = [5, 6, 12, 13, 16, 19, 24, 25];
}

/// Open every peripheral named by the hardware config
pub fn detect(hardware: &HardwareConfig) -> errors::Result<Peripherals> {
    let gpio = Gpio::new()?;
    let pins = &hardware.pins;

    let rf_tx = output_pin(&gpio, pins.rf_tx, Level::Low)?;

    let backend = match hardware.backend {
        BackendKind::DirectDrive => ActuationBackend::DirectDrive(Box::new(ShiftRegisterPins::new(&gpio, pins)?)),
        BackendKind::LatchingRelay => ActuationBackend::LatchingRelay(LatchDriver::new(Box::new(LatchPins::new(&gpio, pins)?), hardware.latch)),
    };

    Ok(Peripherals {
        pins: Box::new(GpioPins { gpio }),
        rf: Box::new(RfPulseTransmitter::new(RfLine { pin: rf_tx })),
        backend,
    })
}

fn level(high: bool) -> Level {
    match high {
        true => Level::High,
        false => Level::Low,
    }
}

fn output_pin(gpio: &Gpio, pin: u8, level: Level) -> rppal::gpio::Result<OutputPin> {
    let mut pin = match level {
        Level::Low => gpio.get(pin)?.into_output_low(),
        Level::High => gpio.get(pin)?.into_output_high(),
    };
    pin.set_reset_on_drop(false);
    Ok(pin)
}

/// Arbitrary pins claimed on demand (GPIO stations)
pub struct GpioPins {
    gpio: Gpio,
}

impl PinDriver for GpioPins {
    fn write(&mut self, pin: u8, high: bool) -> Result<(), ActuationError> {
        let mut output = self
            .gpio
            .get(pin)
            .map_err(|error| {
                tracing::error!("GPIO Error (GPIO Station Pin {}): {:?}", pin, error);
                ActuationError::PinUnavailable(pin)
            })?
            .into_output();
        output.set_reset_on_drop(false);
        output.write(level(high));
        Ok(())
    }
}

/// RF transmitter data line
pub struct RfLine {
    pin: OutputPin,
}

impl PulseLine for RfLine {
    fn pulse(&mut self, high_us: u64, low_us: u64) {
        self.pin.set_high();
        timer::delay_us(high_us);
        self.pin.set_low();
        timer::delay_us(low_us);
    }
}

pub struct ShiftRegisterPins {
    clock: OutputPin,
    oe: OutputPin,
    latch: OutputPin,
    data: OutputPin,
}

impl ShiftRegisterPins {
    /// Outputs stay disabled until [ShiftRegister::set_output_enable]
    pub fn new(gpio: &Gpio, pins: &PinConfig) -> rppal::gpio::Result<Self> {
        Ok(Self {
            oe: output_pin(gpio, pins.shift_register_oe, Level::High)?,
            latch: output_pin(gpio, pins.shift_register_latch, Level::High)?,
            clock: output_pin(gpio, pins.shift_register_clock, Level::High)?,
            data: output_pin(gpio, pins.shift_register_data, Level::High)?,
        })
    }
}

impl ShiftRegister for ShiftRegisterPins {
    fn write(&mut self, bits: &[u8]) {
        self.latch.set_low();

        // Shift out all station bit values from the highest bit to the lowest
        for board in bits.iter().rev() {
            for s in (0..SHIFT_REGISTER_LINES).rev() {
                self.clock.set_low();
                self.data.write(level(board & (1 << s) != 0));
                self.clock.set_high();
            }
        }

        self.latch.set_high();
    }

    fn set_output_enable(&mut self, enabled: bool) {
        // OE is active low
        self.oe.write(level(!enabled));
    }
}

pub struct LatchPins {
    boost: OutputPin,
    boost_enable: OutputPin,
    com: OutputPin,
    zones: Vec<OutputPin>,
}

impl LatchPins {
    pub fn new(gpio: &Gpio, pins: &PinConfig) -> rppal::gpio::Result<Self> {
        let zones = pins.latch_zones.iter().map(|&zone| output_pin(gpio, zone, Level::High)).collect::<rppal::gpio::Result<Vec<_>>>()?;

        Ok(Self {
            boost: output_pin(gpio, pins.boost, Level::Low)?,
            boost_enable: output_pin(gpio, pins.boost_enable, Level::Low)?,
            com: output_pin(gpio, pins.latch_com, Level::High)?,
            zones,
        })
    }
}

impl LatchHardware for LatchPins {
    fn set_boost(&mut self, on: bool) {
        self.boost.write(level(on));
    }

    fn set_boost_enable(&mut self, on: bool) {
        self.boost_enable.write(level(on));
    }

    fn set_zone_pin(&mut self, station: StationIndex, high: bool) {
        match self.zones.get_mut(station) {
            Some(zone) => zone.write(level(high)),
            None => tracing::warn!("[Latch] No zone pin for station {}", station),
        }
    }

    fn zone_count(&self) -> usize {
        self.zones.len()
    }

    fn set_all_zone_pins(&mut self, high: bool) {
        self.com.write(level(high));
        for zone in self.zones.iter_mut() {
            zone.write(level(high));
        }
    }

    /// The Pi header has no ADC
    fn read_current(&mut self) -> Option<u16> {
        None
    }

    fn delay(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Flow sensor input, counting falling edges until dropped
pub struct FlowSensorInput {
    _pin: InputPin,
}

impl FlowSensorInput {
    pub fn attach(pin: u8, counter: FlowCounter) -> errors::Result<Self> {
        let mut input = Gpio::new()?.get(pin)?.into_input_pullup();
        input.set_async_interrupt(Trigger::FallingEdge, move |_| counter.pulse())?;
        Ok(Self { _pin: input })
    }
}
