use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

use super::errors::ActuationError;
use crate::utils;

/// Stations/Zones per board
pub const SHIFT_REGISTER_LINES: usize = 8;

/// allow more zones for linux-based firmwares
pub const MAX_EXT_BOARDS: usize = 24;

/// maximum number of 8-zone boards including expanders
pub const MAX_NUM_BOARDS: usize = 1 + MAX_EXT_BOARDS;

/// maximum number of stations
pub const MAX_NUM_STATIONS: usize = MAX_NUM_BOARDS * SHIFT_REGISTER_LINES;

/// maximum number of characters in each station name
pub const STATION_NAME_SIZE: usize = 32;

/// Size of the special station data buffer
pub const STATION_SPECIAL_DATA_SIZE: usize = 255 - STATION_NAME_SIZE - 12;

/// Number of master stations
pub const MAX_MASTER_STATIONS: usize = 2;

pub type StationIndex = usize;

pub type Stations = Vec<Station>;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationType {
    /// Standard station
    Standard = 0x00,
    /// RF station
    RadioFrequency = 0x01,
    /// Remote OpenSprinkler station
    Remote = 0x02,
    /// GPIO station
    GPIO = 0x03,
    /// HTTP station
    HTTP = 0x04,
    /// Other station
    Other = 0xFF,
}

impl StationType {
    pub fn is_special(&self) -> bool {
        *self != StationType::Standard
    }
}

/// Unknown tags are treated as [StationType::Other]
impl From<u8> for StationType {
    fn from(tag: u8) -> Self {
        match tag {
            0x00 => StationType::Standard,
            0x01 => StationType::RadioFrequency,
            0x02 => StationType::Remote,
            0x03 => StationType::GPIO,
            0x04 => StationType::HTTP,
            _ => StationType::Other,
        }
    }
}

impl From<StationType> for u8 {
    fn from(station_type: StationType) -> Self {
        station_type as u8
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub attrib: StationAttrib,
    /// Station type
    pub station_type: StationType,
    /// Special station data
    pub sped: Option<SpecialStationData>,
}

impl Station {
    pub fn is_special(&self) -> bool {
        self.station_type.is_special()
    }

    /// Decode the special data blob according to the station type
    ///
    /// A special station without a blob decodes as an empty buffer, which fails for every type that needs data.
    pub fn special(&self) -> Result<SpecialStation, ActuationError> {
        match self.sped {
            Some(ref sped) => SpecialStation::decode(self.station_type.into(), &sped.data),
            None => SpecialStation::decode(self.station_type.into(), &[]),
        }
    }
}

impl Default for Station {
    fn default() -> Self {
        Station {
            name: "".into(),
            attrib: StationAttrib::default(),
            station_type: StationType::Standard,
            sped: None,
        }
    }
}

/// Station Attributes
#[derive(Clone, Serialize, Deserialize)]
pub struct StationAttrib {
    /// Use Master #1 / Master #2
    pub use_master: [bool; MAX_MASTER_STATIONS],
    /// Ignore Sensor #1 / Sensor #2
    pub ignore_sensor: [bool; 2],
    /// Ignore Rain Delay
    pub ignore_rain_delay: bool,
    /// Disabled
    pub is_disabled: bool,
    /// Sequential
    pub is_sequential: bool,
}

impl Default for StationAttrib {
    fn default() -> Self {
        Self {
            use_master: [true, false],
            ignore_sensor: [false, false],
            ignore_rain_delay: false,
            is_disabled: false,
            is_sequential: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterStationConfig {
    /// Index of the master station, [None] if unassigned
    pub station: Option<StationIndex>,
}

/// Raw special station data, as persisted: a type tag and a fixed buffer
///
/// The buffer is reinterpreted according to the tag by [SpecialStation::decode].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecialStationData {
    pub station_type: u8,
    #[serde(with = "BigArray")]
    pub data: [u8; STATION_SPECIAL_DATA_SIZE],
}

impl SpecialStationData {
    pub fn new(station_type: StationType) -> Self {
        Self {
            station_type: station_type.into(),
            data: [0; STATION_SPECIAL_DATA_SIZE],
        }
    }

    /// Binary layout: type byte followed by the data buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + STATION_SPECIAL_DATA_SIZE);
        bytes.push(self.station_type);
        bytes.extend_from_slice(&self.data);
        bytes
    }

    /// Reads the binary layout written by [SpecialStationData::to_bytes]
    ///
    /// A short buffer is zero padded. Decoding the typed view will reject it if it is too short for the type.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&station_type, rest) = bytes.split_first()?;
        let mut data = [0; STATION_SPECIAL_DATA_SIZE];
        let len = rest.len().min(STATION_SPECIAL_DATA_SIZE);
        data[..len].copy_from_slice(&rest[..len]);
        Some(Self { station_type, data })
    }
}

impl From<&RFStationData> for SpecialStationData {
    fn from(rf: &RFStationData) -> Self {
        let mut sped = Self::new(StationType::RadioFrequency);
        sped.data[..6].copy_from_slice(&rf.on);
        sped.data[6..12].copy_from_slice(&rf.off);
        sped.data[12..16].copy_from_slice(&rf.timing);
        sped
    }
}

impl From<&RemoteStationData> for SpecialStationData {
    fn from(remote: &RemoteStationData) -> Self {
        let mut sped = Self::new(StationType::Remote);
        utils::write_hex_field(&mut sped.data[..8], u32::from(remote.ip));
        utils::write_hex_field(&mut sped.data[8..12], remote.port.into());
        utils::write_hex_field(&mut sped.data[12..14], remote.sid.into());
        sped
    }
}

impl From<&GPIOStationData> for SpecialStationData {
    fn from(gpio: &GPIOStationData) -> Self {
        let mut sped = Self::new(StationType::GPIO);
        utils::write_decimal_field(&mut sped.data[..2], gpio.pin.into());
        sped.data[2] = if gpio.active { b'1' } else { b'0' };
        sped
    }
}

impl From<&HTTPStationData> for SpecialStationData {
    fn from(http: &HTTPStationData) -> Self {
        let mut sped = Self::new(StationType::HTTP);
        // Keep the terminating NUL inside the buffer
        let len = http.template.len().min(STATION_SPECIAL_DATA_SIZE - 1);
        sped.data[..len].copy_from_slice(&http.template.as_bytes()[..len]);
        sped
    }
}

/// RF station data (16 bytes)
///
/// `on` and `off` hold 12 tri-state digits each, two per byte (high nibble first). `timing` is the pulse length in microseconds, big-endian.
#[derive(Clone, Debug, PartialEq)]
pub struct RFStationData {
    pub on: [u8; 6],
    pub off: [u8; 6],
    pub timing: [u8; 4],
}

impl RFStationData {
    pub const SIZE: usize = 16;

    fn decode(data: &[u8]) -> Result<Self, ActuationError> {
        if data.len() < Self::SIZE {
            return Err(layout_error(StationType::RadioFrequency, "RF data requires 16 bytes"));
        }

        let mut rf = RFStationData { on: [0; 6], off: [0; 6], timing: [0; 4] };
        rf.on.copy_from_slice(&data[..6]);
        rf.off.copy_from_slice(&data[6..12]);
        rf.timing.copy_from_slice(&data[12..16]);
        Ok(rf)
    }
}

/// Remote station data (14 bytes of ASCII hex)
///
/// @todo: Support for IPv6 and string hostnames
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteStationData {
    pub ip: Ipv4Addr,
    pub port: u16,
    /// Station index on the remote controller
    pub sid: u8,
}

impl RemoteStationData {
    pub const SIZE: usize = 14;

    fn decode(data: &[u8]) -> Result<Self, ActuationError> {
        if data.len() < Self::SIZE {
            return Err(layout_error(StationType::Remote, "Remote data requires 14 bytes"));
        }

        let ip = utils::hex_field(&data[..8]).ok_or_else(|| layout_error(StationType::Remote, "IP address is not hex"))?;
        let port = utils::hex_field(&data[8..12]).ok_or_else(|| layout_error(StationType::Remote, "Port is not hex"))?;
        let sid = utils::hex_field(&data[12..14]).ok_or_else(|| layout_error(StationType::Remote, "Station index is not hex"))?;

        Ok(RemoteStationData {
            ip: Ipv4Addr::from(ip),
            // 4 and 2 hex digits always fit
            port: port as u16,
            sid: sid as u8,
        })
    }
}

/// GPIO station data (3 bytes)
///
/// The pin is two bytes of ascii decimal (not hex).
#[derive(Clone, Debug, PartialEq)]
pub struct GPIOStationData {
    /// GPIO Pin (BCM #)
    pub pin: u8,
    /// Active state
    /// - `true` = High
    /// - `false` = Low
    pub active: bool,
}

impl GPIOStationData {
    pub const SIZE: usize = 3;

    fn decode(data: &[u8]) -> Result<Self, ActuationError> {
        if data.len() < Self::SIZE {
            return Err(layout_error(StationType::GPIO, "GPIO data requires 3 bytes"));
        }

        let pin = utils::decimal_field(&data[..2]).ok_or_else(|| layout_error(StationType::GPIO, "Pin is not decimal"))?;
        let active = match data[2] {
            b'0' | 0 => false,
            b'1' | 1 => true,
            _ => return Err(layout_error(StationType::GPIO, "Active level must be 0 or 1")),
        };

        Ok(GPIOStationData { pin: pin as u8, active })
    }

    /// Logic level to write for the requested state
    pub fn level(&self, turn_on: bool) -> bool {
        if turn_on {
            self.active
        } else {
            !self.active
        }
    }
}

/// HTTP station data: a URL template
#[derive(Clone, Debug, PartialEq)]
pub struct HTTPStationData {
    pub template: String,
}

impl HTTPStationData {
    fn decode(data: &[u8]) -> Result<Self, ActuationError> {
        let template = utils::nul_terminated_str(data).map_err(|_| layout_error(StationType::HTTP, "Template is not UTF-8"))?;

        if template.is_empty() {
            return Err(layout_error(StationType::HTTP, "Template is empty"));
        }

        Ok(HTTPStationData { template: template.to_string() })
    }
}

/// Typed view of a station's special data
#[derive(Clone, Debug, PartialEq)]
pub enum SpecialStation {
    Standard,
    RF(RFStationData),
    Remote(RemoteStationData),
    GPIO(GPIOStationData),
    HTTP(HTTPStationData),
    Other,
}

impl SpecialStation {
    /// Reinterpret a special data buffer according to its type tag
    ///
    /// Unknown tags decode to [SpecialStation::Other].
    pub fn decode(station_type: u8, data: &[u8]) -> Result<Self, ActuationError> {
        let data = &data[..data.len().min(STATION_SPECIAL_DATA_SIZE)];

        Ok(match StationType::from(station_type) {
            StationType::Standard => SpecialStation::Standard,
            StationType::RadioFrequency => SpecialStation::RF(RFStationData::decode(data)?),
            StationType::Remote => SpecialStation::Remote(RemoteStationData::decode(data)?),
            StationType::GPIO => SpecialStation::GPIO(GPIOStationData::decode(data)?),
            StationType::HTTP => SpecialStation::HTTP(HTTPStationData::decode(data)?),
            StationType::Other => SpecialStation::Other,
        })
    }

    pub fn station_type(&self) -> StationType {
        match self {
            SpecialStation::Standard => StationType::Standard,
            SpecialStation::RF(_) => StationType::RadioFrequency,
            SpecialStation::Remote(_) => StationType::Remote,
            SpecialStation::GPIO(_) => StationType::GPIO,
            SpecialStation::HTTP(_) => StationType::HTTP,
            SpecialStation::Other => StationType::Other,
        }
    }
}

fn layout_error(station_type: StationType, reason: &'static str) -> ActuationError {
    ActuationError::InvalidLayout {
        station_type: station_type.into(),
        reason,
    }
}

pub fn default() -> Stations {
    let mut stations = Vec::with_capacity(MAX_NUM_STATIONS);

    for i in 0..MAX_NUM_STATIONS {
        stations.push(Station {
            name: format!("S{:0>3}", i + 1),
            ..Default::default()
        });
    }

    stations
}
