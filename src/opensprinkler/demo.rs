//! Simulated peripherals for running without GPIO access
//!
//! Every hardware action is logged instead of performed.

use std::time::Duration;

use super::{
    config::{BackendKind, HardwareConfig},
    errors::ActuationError,
    hal::{ActuationBackend, LatchHardware, Peripherals, PinDriver, RfTransmitter, ShiftRegister},
    latch::LatchDriver,
    station::StationIndex,
};

pub fn peripherals(hardware: &HardwareConfig) -> Peripherals {
    let backend = match hardware.backend {
        BackendKind::DirectDrive => ActuationBackend::DirectDrive(Box::new(DemoShiftRegister)),
        BackendKind::LatchingRelay => ActuationBackend::LatchingRelay(LatchDriver::new(Box::new(DemoLatch { zones: hardware.pins.latch_zones.len() }), hardware.latch)),
    };

    Peripherals {
        pins: Box::new(DemoPins),
        rf: Box::new(DemoRf),
        backend,
    }
}

pub struct DemoPins;

impl PinDriver for DemoPins {
    fn write(&mut self, pin: u8, high: bool) -> Result<(), ActuationError> {
        tracing::info!("[DEMO] GPIO {} -> {}", pin, if high { "HIGH" } else { "LOW" });
        Ok(())
    }
}

pub struct DemoRf;

impl RfTransmitter for DemoRf {
    fn transmit(&mut self, code: u32, pulse_length: u32, repeat_count: usize) -> Result<(), ActuationError> {
        tracing::info!("[DEMO] RF code {:06X} ({}us x{})", code, pulse_length, repeat_count);
        Ok(())
    }
}

pub struct DemoShiftRegister;

impl ShiftRegister for DemoShiftRegister {
    fn write(&mut self, bits: &[u8]) {
        let frame: Vec<String> = bits.iter().map(|board| format!("{:08b}", board)).collect();
        tracing::debug!("[DEMO] Shift register: {}", frame.join(" "));
    }

    fn set_output_enable(&mut self, enabled: bool) {
        tracing::debug!("[DEMO] Shift register outputs {}", if enabled { "enabled" } else { "disabled" });
    }
}

/// Latch board without current sensing
pub struct DemoLatch {
    zones: usize,
}

impl LatchHardware for DemoLatch {
    fn set_boost(&mut self, on: bool) {
        tracing::trace!("[DEMO] Boost {}", on);
    }

    fn set_boost_enable(&mut self, on: bool) {
        tracing::trace!("[DEMO] Boost dump {}", on);
    }

    fn set_zone_pin(&mut self, station: StationIndex, high: bool) {
        tracing::trace!("[DEMO] Zone {} -> {}", station, if high { "HIGH" } else { "LOW" });
    }

    fn zone_count(&self) -> usize {
        self.zones
    }

    fn set_all_zone_pins(&mut self, high: bool) {
        tracing::trace!("[DEMO] All zones -> {}", if high { "HIGH" } else { "LOW" });
    }

    fn read_current(&mut self) -> Option<u16> {
        None
    }

    fn delay(&mut self, duration: Duration) {
        tracing::trace!("[DEMO] Delay {:?}", duration);
    }
}
