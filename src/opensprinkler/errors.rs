use core::fmt;
use std::error::Error;
use std::sync::Arc;

use super::{config, station::StationIndex};

pub type Result<T> = core::result::Result<T, SetupError>;

/// Errors raised while switching a single station
///
/// None of these are fatal: the station is simply not actuated this cycle.
#[derive(Clone, Debug)]
pub enum ActuationError {
    /// Special station data is too short or malformed for its declared type
    InvalidLayout {
        station_type: u8,
        reason: &'static str,
    },
    /// RF pulse length is zero or exceeds the hardware-safe maximum
    InvalidTiming(u32),
    /// The GPIO pin could not be claimed
    PinUnavailable(u8),
    /// The latch board has no zone pin wired for this station
    ZoneUnavailable(StationIndex),
    /// Current-sense reading exceeded the calibrated baseline while boosting
    OvercurrentFault {
        station: StationIndex,
        reading: u16,
        threshold: u16,
    },
    /// Remote/HTTP request failed or timed out
    Network(Arc<reqwest::Error>),
    /// The request URL could not be built from the station data
    Url(url::ParseError),
}

impl ActuationError {
    /// Best-effort failures: the commanded state is still recorded
    pub fn is_network(&self) -> bool {
        matches!(self, ActuationError::Network(_))
    }
}

impl From<reqwest::Error> for ActuationError {
    fn from(err: reqwest::Error) -> Self {
        ActuationError::Network(Arc::new(err))
    }
}

impl From<url::ParseError> for ActuationError {
    fn from(err: url::ParseError) -> Self {
        ActuationError::Url(err)
    }
}

impl fmt::Display for ActuationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuationError::InvalidLayout { station_type, reason } => write!(f, "Invalid special data layout for type 0x{:02X}: {}", station_type, reason),
            ActuationError::InvalidTiming(length) => write!(f, "Invalid RF pulse length: {}us", length),
            ActuationError::PinUnavailable(pin) => write!(f, "GPIO pin {} unavailable", pin),
            ActuationError::ZoneUnavailable(station) => write!(f, "No latch zone pin for station {}", station),
            ActuationError::OvercurrentFault { station, reading, threshold } => {
                write!(f, "Overcurrent while boosting station {}: {} > {}", station, reading, threshold)
            }
            ActuationError::Network(err) => write!(f, "Network error: {}", err),
            ActuationError::Url(err) => write!(f, "URL error: {}", err),
        }
    }
}

impl Error for ActuationError {}

#[derive(Debug)]
pub enum SetupError {
    ConfigError(config::result::Error),

    GpioError(rppal::gpio::Error),

    HttpClientError(reqwest::Error),
}

impl From<config::result::Error> for SetupError {
    fn from(err: config::result::Error) -> Self {
        SetupError::ConfigError(err)
    }
}

impl From<rppal::gpio::Error> for SetupError {
    fn from(err: rppal::gpio::Error) -> Self {
        SetupError::GpioError(err)
    }
}

impl From<reqwest::Error> for SetupError {
    fn from(err: reqwest::Error) -> Self {
        SetupError::HttpClientError(err)
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::ConfigError(err) => write!(f, "Configuration error: {:?}", err),

            SetupError::GpioError(err) => write!(f, "GPIO error: {:?}", err),

            SetupError::HttpClientError(err) => write!(f, "HTTP client error: {}", err),
        }
    }
}

impl Error for SetupError {}
