use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{errors::ActuationError, hal::LatchHardware, station::StationIndex};

/// Latching relay timing and safety parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatchConfig {
    /// Time to charge the boost capacitor (milliseconds)
    pub boost_time: u64,
    /// Coil pulse length (milliseconds)
    pub pulse_time: u64,
    /// Current-sense reading above the no-load baseline that trips [ActuationError::OvercurrentFault]
    pub overcurrent_margin: u16,
}

impl Default for LatchConfig {
    fn default() -> Self {
        Self {
            boost_time: 250,
            pulse_time: 100,
            overcurrent_margin: 200,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LatchDirection {
    Open,
    Close,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LatchState {
    Idle,
    Boosting,
    Latching(LatchDirection),
}

/// Sequences boost-then-latch transitions for latching relays
///
/// The boost capacitor can only feed one coil at a time, so a transition always runs to completion (or faults)
/// before the next one starts.
pub struct LatchDriver {
    hardware: Box<dyn LatchHardware>,
    config: LatchConfig,
    state: LatchState,
    /// Resting current, sampled once with no load
    baseline_current: Option<u16>,
    /// Completed transitions
    transitions: u64,
}

impl LatchDriver {
    pub fn new(hardware: Box<dyn LatchHardware>, config: LatchConfig) -> Self {
        Self {
            hardware,
            config,
            state: LatchState::Idle,
            baseline_current: None,
            transitions: 0,
        }
    }

    /// Sample the no-load current
    ///
    /// Returns [None] if the board has no current sensing, in which case the overcurrent check is skipped.
    pub fn calibrate(&mut self) -> Option<u16> {
        self.hardware.set_boost(false);
        self.hardware.set_boost_enable(false);
        self.hardware.set_all_zone_pins(true);
        self.baseline_current = self.hardware.read_current();

        match self.baseline_current {
            Some(baseline) => tracing::debug!("[Latch] Baseline current: {}", baseline),
            None => tracing::debug!("[Latch] No current sensing"),
        }

        self.baseline_current
    }

    pub fn state(&self) -> LatchState {
        self.state
    }

    pub fn baseline_current(&self) -> Option<u16> {
        self.baseline_current
    }

    pub fn has_current_sense(&self) -> bool {
        self.baseline_current.is_some()
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Open (`true`) or close (`false`) the valve of a station
    pub fn set_station(&mut self, station: StationIndex, value: bool) -> Result<(), ActuationError> {
        debug_assert_eq!(self.state, LatchState::Idle, "latch transition already in flight");

        if station >= self.hardware.zone_count() {
            return Err(ActuationError::ZoneUnavailable(station));
        }

        if value {
            self.open(station)
        } else {
            self.close(station)
        }
    }

    fn enter(&mut self, state: LatchState) {
        tracing::trace!("[Latch] {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Charge the boost capacitor, watching the current sense
    fn boost(&mut self, station: StationIndex) -> Result<(), ActuationError> {
        self.enter(LatchState::Boosting);
        self.hardware.set_boost(true);
        self.hardware.delay(Duration::from_millis(self.config.boost_time));
        let reading = self.hardware.read_current();
        self.hardware.set_boost(false);

        if let (Some(baseline), Some(reading)) = (self.baseline_current, reading) {
            let threshold = baseline.saturating_add(self.config.overcurrent_margin);
            if reading > threshold {
                self.enter(LatchState::Idle);
                return Err(ActuationError::OvercurrentFault { station, reading, threshold });
            }
        }

        Ok(())
    }

    fn open(&mut self, station: StationIndex) -> Result<(), ActuationError> {
        self.boost(station)?;
        self.enter(LatchState::Latching(LatchDirection::Open));

        // all switches HIGH (including COM), the station LOW
        self.hardware.set_all_zone_pins(true);
        self.hardware.set_zone_pin(station, false);
        // dump boosted voltage
        self.hardware.set_boost_enable(true);
        self.hardware.delay(Duration::from_millis(self.config.pulse_time));
        self.hardware.set_zone_pin(station, true);
        self.hardware.set_boost_enable(false);

        self.finish()
    }

    fn close(&mut self, station: StationIndex) -> Result<(), ActuationError> {
        self.boost(station)?;
        self.enter(LatchState::Latching(LatchDirection::Close));

        // all switches LOW (including COM), the station HIGH
        self.hardware.set_all_zone_pins(false);
        self.hardware.set_zone_pin(station, true);
        // dump boosted voltage
        self.hardware.set_boost_enable(true);
        self.hardware.delay(Duration::from_millis(self.config.pulse_time));
        self.hardware.set_zone_pin(station, false);
        self.hardware.set_boost_enable(false);
        self.hardware.set_all_zone_pins(true);

        self.finish()
    }

    fn finish(&mut self) -> Result<(), ActuationError> {
        self.enter(LatchState::Idle);
        self.transitions += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::opensprinkler::mock::{self, HwEvent};

    #[test]
    fn open_sequence() {
        let (hardware, log, _) = mock::latch(Some(100));
        let mut driver = LatchDriver::new(Box::new(hardware), LatchConfig::default());
        driver.calibrate();
        log.borrow_mut().clear();

        driver.set_station(5, true).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                HwEvent::Boost(true),
                HwEvent::Delay(Duration::from_millis(250)),
                HwEvent::ReadCurrent,
                HwEvent::Boost(false),
                HwEvent::AllZones(true),
                HwEvent::Zone { station: 5, high: false },
                HwEvent::BoostEnable(true),
                HwEvent::Delay(Duration::from_millis(100)),
                HwEvent::Zone { station: 5, high: true },
                HwEvent::BoostEnable(false),
            ]
        );
        assert_eq!(driver.state(), LatchState::Idle);
        assert_eq!(driver.transitions(), 1);
    }

    #[test]
    fn close_sequence() {
        let (hardware, log, _) = mock::latch(None);
        let mut driver = LatchDriver::new(Box::new(hardware), LatchConfig::default());

        driver.set_station(2, false).unwrap();

        let log = log.borrow();
        assert_eq!(log.first(), Some(&HwEvent::Boost(true)));
        assert_eq!(log.last(), Some(&HwEvent::AllZones(true)));
        assert!(log.contains(&HwEvent::AllZones(false)));
        assert!(log.contains(&HwEvent::Zone { station: 2, high: true }));
    }

    #[test]
    fn overcurrent_aborts() {
        let (hardware, log, current) = mock::latch(Some(100));
        let mut driver = LatchDriver::new(Box::new(hardware), LatchConfig::default());
        assert_eq!(driver.calibrate(), Some(100));

        current.set(Some(301));
        log.borrow_mut().clear();

        let result = driver.set_station(4, true);
        assert!(matches!(result, Err(ActuationError::OvercurrentFault { station: 4, reading: 301, threshold: 300 })));
        assert_eq!(driver.state(), LatchState::Idle);
        assert_eq!(driver.transitions(), 0);

        // The coil is never pulsed
        let log = log.borrow();
        assert!(!log.contains(&HwEvent::BoostEnable(true)));
        assert_eq!(log.last(), Some(&HwEvent::Boost(false)));
    }

    #[test]
    fn reading_at_threshold_is_ok() {
        let (hardware, _, current) = mock::latch(Some(100));
        let mut driver = LatchDriver::new(Box::new(hardware), LatchConfig::default());
        driver.calibrate();

        current.set(Some(300));
        assert!(driver.set_station(0, true).is_ok());
    }

    #[test]
    fn no_current_sense() {
        let (hardware, _, current) = mock::latch(None);
        let mut driver = LatchDriver::new(Box::new(hardware), LatchConfig::default());
        assert_eq!(driver.calibrate(), None);
        assert!(!driver.has_current_sense());

        current.set(Some(u16::MAX));
        assert!(driver.set_station(0, true).is_ok(), "Testing no baseline skips the check");
    }

    #[test]
    fn station_without_zone_pin() {
        let (hardware, log, _) = mock::latch(Some(100));
        let mut driver = LatchDriver::new(Box::new(hardware.with_zones(8)), LatchConfig::default());

        assert!(matches!(driver.set_station(12, true), Err(ActuationError::ZoneUnavailable(12))));
        assert!(matches!(driver.set_station(8, false), Err(ActuationError::ZoneUnavailable(8))));
        assert!(log.borrow().is_empty(), "Testing booster never engaged");
        assert_eq!(driver.state(), LatchState::Idle);
        assert_eq!(driver.transitions(), 0);

        assert!(driver.set_station(7, true).is_ok());
    }
}
