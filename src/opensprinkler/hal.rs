//! Hardware capabilities used by the actuation core.
//!
//! The controller never touches GPIO directly: everything goes through these traits so the same apply engine
//! runs on a Raspberry Pi ([super::gpio]), in demo mode ([super::demo]) and under test.

use std::time::Duration;

use super::{errors::ActuationError, latch::LatchDriver, rf, station::StationIndex};

/// Logic-level writes to arbitrary GPIO pins (GPIO special stations)
pub trait PinDriver {
    fn write(&mut self, pin: u8, high: bool) -> Result<(), ActuationError>;
}

/// The RF transmitter data line
pub trait PulseLine {
    /// Drive the line high for `high_us`, then low for `low_us` (microseconds). Blocks.
    fn pulse(&mut self, high_us: u64, low_us: u64);
}

/// Sends complete RF codes
pub trait RfTransmitter {
    fn transmit(&mut self, code: u32, pulse_length: u32, repeat_count: usize) -> Result<(), ActuationError>;
}

/// [RfTransmitter] that bit-bangs codes on a [PulseLine]
pub struct RfPulseTransmitter<L: PulseLine> {
    line: L,
}

impl<L: PulseLine> RfPulseTransmitter<L> {
    pub fn new(line: L) -> Self {
        Self { line }
    }
}

impl<L: PulseLine> RfTransmitter for RfPulseTransmitter<L> {
    fn transmit(&mut self, code: u32, pulse_length: u32, repeat_count: usize) -> Result<(), ActuationError> {
        rf::transmit(&mut self.line, code, pulse_length, repeat_count);
        Ok(())
    }
}

/// Daisy-chained shift registers driving standard stations directly
pub trait ShiftRegister {
    /// Shift out one byte per board (index 0 = main controller) and latch the outputs
    fn write(&mut self, bits: &[u8]);

    /// Enable or disable the register outputs
    fn set_output_enable(&mut self, enabled: bool);
}

/// Latching relay driver board: booster, boost dump, zone H-bridge pins and current sensing
pub trait LatchHardware {
    /// Charge the boost capacitor
    fn set_boost(&mut self, on: bool);

    /// Dump the boosted voltage into the coil
    fn set_boost_enable(&mut self, on: bool);

    fn set_zone_pin(&mut self, station: StationIndex, high: bool);

    /// Stations with a zone pin, numbered from 0
    fn zone_count(&self) -> usize;

    /// All zone pins, including COM
    fn set_all_zone_pins(&mut self, high: bool);

    /// Current-sense reading, [None] when the board has no sensing circuit
    fn read_current(&mut self) -> Option<u16>;

    fn delay(&mut self, duration: Duration);
}

/// How standard stations are actuated
pub enum ActuationBackend {
    /// Relays on shift registers, all boards written at once
    DirectDrive(Box<dyn ShiftRegister>),
    /// Latching relays switched one at a time through the boost circuit
    LatchingRelay(LatchDriver),
}

impl ActuationBackend {
    pub fn is_latching(&self) -> bool {
        matches!(self, ActuationBackend::LatchingRelay(_))
    }
}

/// Peripherals found at startup
pub struct Peripherals {
    pub pins: Box<dyn PinDriver>,
    pub rf: Box<dyn RfTransmitter>,
    pub backend: ActuationBackend,
}
