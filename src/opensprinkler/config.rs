pub mod cli;
pub mod result;

use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    net::IpAddr,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

use super::{
    gpio::pin,
    latch::LatchConfig,
    station::{self, MasterStationConfig, Stations},
};

/// How standard stations are wired
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Relays driven by the shift register chain
    DirectDrive,
    /// Latching solenoids pulsed through the boost circuit
    LatchingRelay,
}

/// GPIO pin assignments (BCM #)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinConfig {
    pub shift_register_clock: u8,
    pub shift_register_oe: u8,
    pub shift_register_latch: u8,
    pub shift_register_data: u8,
    pub rf_tx: u8,
    /// Flow sensor input (sensor 1 is BCM 14), [None] if no flow sensor is connected
    pub flow_sensor: Option<u8>,
    /// Booster charge
    pub boost: u8,
    /// Booster dump
    pub boost_enable: u8,
    /// Latch COM line
    pub latch_com: u8,
    /// Latch zone lines, in station order
    pub latch_zones: Vec<u8>,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            shift_register_clock: pin::SHIFT_REGISTER_CLOCK,
            shift_register_oe: pin::SHIFT_REGISTER_OE,
            shift_register_latch: pin::SHIFT_REGISTER_LATCH,
            shift_register_data: pin::SHIFT_REGISTER_DATA,
            rf_tx: pin::RF_TX,
            flow_sensor: None,
            boost: pin::BOOST,
            boost_enable: pin::BOOST_ENABLE,
            latch_com: pin::LATCH_COM,
            latch_zones: pin::LATCH_ZONES.to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HardwareConfig {
    pub backend: BackendKind,
    pub latch: LatchConfig,
    /// Remote and HTTP station request timeout (milliseconds)
    pub network_timeout_ms: u64,
    pub pins: PinConfig,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::DirectDrive,
            latch: LatchConfig::default(),
            network_timeout_ms: 5000,
            pins: PinConfig::default(),
        }
    }
}

/// Non-volatile controller data
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControllerNonVolatile {
    /// Sunrise time (minutes)
    pub sunrise_time: u16,
    /// Sunset time (minutes)
    pub sunset_time: u16,
    /// Rain-delay stop time (seconds since unix epoch)
    pub rain_delay_stop_time: Option<i64>,
    /// External IP
    pub external_ip: Option<IpAddr>,
}

impl Default for ControllerNonVolatile {
    fn default() -> Self {
        Self {
            sunrise_time: 360, // 0600 default sunrise
            sunset_time: 1080, // 1800 default sunset
            rain_delay_stop_time: None,
            external_ip: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    path: PathBuf,

    /// number of 8-station extension board. 0: no extension boards
    pub extension_board_count: usize,
    /// device enable
    pub enable_controller: bool,
    /// special station auto refresh
    pub enable_special_stn_refresh: bool,
    /// Device key AKA password (MD5)
    pub device_key: String,
    pub master_stations: [MasterStationConfig; station::MAX_MASTER_STATIONS],
    pub hardware: HardwareConfig,
    pub nv: ControllerNonVolatile,
    pub stations: Stations,
}

impl Config {
    pub fn new(path: PathBuf) -> Self {
        Self { path, ..Self::default() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Number of eight-zone station boards (including master controller)
    pub fn board_count(&self) -> usize {
        self.extension_board_count.min(station::MAX_EXT_BOARDS) + 1
    }

    pub fn station_count(&self) -> usize {
        self.board_count() * station::SHIFT_REGISTER_LINES
    }

    /// Read the config file at this config's path
    pub fn read(&self) -> result::Result<Config> {
        let reader = io::BufReader::new(File::open(&self.path)?);
        let mut config: Config = bson::from_reader(reader)?;
        config.path = self.path.clone();
        Ok(config)
    }

    pub fn write(&self) -> result::Result<()> {
        tracing::trace!("Writing config: {}", self.path.display());
        write_document(&self.path, self)
    }

    pub fn write_default(&self) -> result::Result<()> {
        write_document(&self.path, &Config::new(self.path.clone()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            extension_board_count: 0,
            enable_controller: true,
            enable_special_stn_refresh: false,
            device_key: format!("{:x}", md5::compute(b"opendoor")),
            master_stations: [MasterStationConfig::default(); station::MAX_MASTER_STATIONS],
            hardware: HardwareConfig::default(),
            nv: ControllerNonVolatile::default(),
            stations: station::default(),
        }
    }
}

fn write_document<T: Serialize>(path: &PathBuf, document: &T) -> result::Result<()> {
    let buf = bson::to_vec(document)?;
    let mut writer = io::BufWriter::new(OpenOptions::new().write(true).create(true).truncate(true).open(path)?);
    writer.write_all(&buf)?;
    Ok(writer.flush()?)
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;
    use crate::opensprinkler::station::{GPIOStationData, SpecialStationData, StationType};

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("opensprinkler-actuator-{}-{}.dat", name, std::process::id()))
    }

    #[test]
    fn default_device_key() {
        assert_eq!(Config::default().device_key, "a6d82bced638de3def1e9bbb4983225c");
    }

    #[test]
    fn write_then_read() {
        let path = temp_path("config");
        let mut config = Config::new(path.clone());
        config.extension_board_count = 2;
        config.hardware.backend = BackendKind::LatchingRelay;
        config.master_stations[0].station = Some(0);
        config.nv.rain_delay_stop_time = Some(1_700_000_000);
        config.stations[3].station_type = StationType::GPIO;
        config.stations[3].sped = Some(SpecialStationData::from(&GPIOStationData { pin: 5, active: true }));

        config.write().expect("Error writing config");
        let read = config.read().expect("Error reading config");
        let _ = std::fs::remove_file(&path);

        assert_eq!(read.path(), &path);
        assert_eq!(read.extension_board_count, 2);
        assert_eq!(read.hardware, config.hardware);
        assert_eq!(read.master_stations[0].station, Some(0));
        assert_eq!(read.nv, config.nv);
        assert_eq!(read.stations.len(), station::MAX_NUM_STATIONS);
        assert_eq!(read.stations[3].sped, config.stations[3].sped);
    }

    #[test]
    fn missing_file() {
        let config = Config::new(temp_path("missing"));
        assert!(!config.exists());
        assert!(matches!(config.read(), Err(result::Error::Io(_))));
    }
}
