//! Recording hardware for tests

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    time::Duration,
};

use super::{
    errors::ActuationError,
    hal::{LatchHardware, PinDriver, RfTransmitter, ShiftRegister},
    http::HttpClient,
    station::{self, StationIndex},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HwEvent {
    Pin { pin: u8, high: bool },
    Rf { code: u32, pulse_length: u32, repeat_count: usize },
    ShiftOut(Vec<u8>),
    OutputEnable(bool),
    Boost(bool),
    BoostEnable(bool),
    Zone { station: StationIndex, high: bool },
    AllZones(bool),
    Delay(Duration),
    ReadCurrent,
    Http(String),
}

/// Shared by every mock of one test, in call order
pub type EventLog = Rc<RefCell<Vec<HwEvent>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub struct MockPins {
    log: EventLog,
    /// Writes to these pins fail
    unavailable: Vec<u8>,
}

impl MockPins {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone(), unavailable: Vec::new() }
    }

    pub fn with_unavailable(log: &EventLog, unavailable: Vec<u8>) -> Self {
        Self { log: log.clone(), unavailable }
    }
}

impl PinDriver for MockPins {
    fn write(&mut self, pin: u8, high: bool) -> Result<(), ActuationError> {
        if self.unavailable.contains(&pin) {
            return Err(ActuationError::PinUnavailable(pin));
        }
        self.log.borrow_mut().push(HwEvent::Pin { pin, high });
        Ok(())
    }
}

pub struct MockRf {
    log: EventLog,
}

impl MockRf {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl RfTransmitter for MockRf {
    fn transmit(&mut self, code: u32, pulse_length: u32, repeat_count: usize) -> Result<(), ActuationError> {
        self.log.borrow_mut().push(HwEvent::Rf { code, pulse_length, repeat_count });
        Ok(())
    }
}

pub struct MockShiftRegister {
    log: EventLog,
}

impl MockShiftRegister {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl ShiftRegister for MockShiftRegister {
    fn write(&mut self, bits: &[u8]) {
        self.log.borrow_mut().push(HwEvent::ShiftOut(bits.to_vec()));
    }

    fn set_output_enable(&mut self, enabled: bool) {
        self.log.borrow_mut().push(HwEvent::OutputEnable(enabled));
    }
}

pub struct MockLatch {
    log: EventLog,
    current: Rc<Cell<Option<u16>>>,
    zones: usize,
}

impl MockLatch {
    /// Only stations below `zones` have a zone pin
    pub fn with_zones(mut self, zones: usize) -> Self {
        self.zones = zones;
        self
    }
}

impl LatchHardware for MockLatch {
    fn set_boost(&mut self, on: bool) {
        self.log.borrow_mut().push(HwEvent::Boost(on));
    }

    fn set_boost_enable(&mut self, on: bool) {
        self.log.borrow_mut().push(HwEvent::BoostEnable(on));
    }

    fn set_zone_pin(&mut self, station: StationIndex, high: bool) {
        self.log.borrow_mut().push(HwEvent::Zone { station, high });
    }

    fn zone_count(&self) -> usize {
        self.zones
    }

    fn set_all_zone_pins(&mut self, high: bool) {
        self.log.borrow_mut().push(HwEvent::AllZones(high));
    }

    fn read_current(&mut self) -> Option<u16> {
        self.log.borrow_mut().push(HwEvent::ReadCurrent);
        self.current.get()
    }

    fn delay(&mut self, duration: Duration) {
        self.log.borrow_mut().push(HwEvent::Delay(duration));
    }
}

/// Latch board with its own log; the returned cell sets what [LatchHardware::read_current] reports
pub fn latch(current: Option<u16>) -> (MockLatch, EventLog, Rc<Cell<Option<u16>>>) {
    let log = event_log();
    let current = Rc::new(Cell::new(current));
    (MockLatch { log: log.clone(), current: current.clone(), zones: station::MAX_NUM_STATIONS }, log, current)
}

/// Latch board writing to an existing log
pub fn latch_with_log(log: &EventLog, current: Option<u16>) -> (MockLatch, Rc<Cell<Option<u16>>>) {
    let current = Rc::new(Cell::new(current));
    (MockLatch { log: log.clone(), current: current.clone(), zones: station::MAX_NUM_STATIONS }, current)
}

pub struct MockHttp {
    log: EventLog,
    /// Requests fail with a network error while set
    offline: Rc<Cell<bool>>,
}

impl MockHttp {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone(), offline: Rc::new(Cell::new(false)) }
    }

    pub fn offline_switch(&self) -> Rc<Cell<bool>> {
        self.offline.clone()
    }
}

impl HttpClient for MockHttp {
    fn get(&self, url: &url::Url) -> Result<u16, ActuationError> {
        self.log.borrow_mut().push(HwEvent::Http(url.to_string()));
        if self.offline.get() {
            return Err(connection_refused());
        }
        Ok(200)
    }
}

/// A real [reqwest::Error] from a closed local port
pub fn connection_refused() -> ActuationError {
    let client = reqwest::blocking::Client::builder().timeout(Duration::from_millis(500)).build().unwrap();
    client.get("http://127.0.0.1:1/").send().map(|_| ()).map_err(ActuationError::from).unwrap_err()
}
