pub mod config;
pub mod controller;
pub mod demo;
pub mod dispatch;
pub mod errors;
pub mod gpio;
pub mod hal;
pub mod http;
pub mod latch;
#[cfg(test)]
mod mock;
pub mod rf;
pub mod sensor;
pub mod state;
pub mod station;

use std::{path::PathBuf, time::Duration};

use self::{
    dispatch::{DispatchOptions, Dispatcher},
    hal::{ActuationBackend, Peripherals},
    http::{HttpClient, ReqwestClient},
    sensor::FlowCounter,
    station::StationIndex,
};

pub struct OpenSprinkler {
    pub config: config::Config,
    pub state: state::ControllerState,
    dispatcher: Dispatcher,
    backend: ActuationBackend,
    flow: FlowCounter,
    flow_sensor: Option<gpio::FlowSensorInput>,
}

impl OpenSprinkler {
    /// Build a controller on already opened peripherals
    ///
    /// Outputs are cleared and the latch board calibrated before this returns.
    pub fn new(config: config::Config, peripherals: Peripherals, http: Box<dyn HttpClient>) -> Self {
        let dispatcher = Dispatcher::new(peripherals.pins, peripherals.rf, http, dispatch_options(&config));

        let mut open_sprinkler = Self {
            config,
            state: state::ControllerState::default(),
            dispatcher,
            backend: peripherals.backend,
            flow: FlowCounter::new(),
            flow_sensor: None,
        };
        open_sprinkler.setup_outputs();
        open_sprinkler
    }

    /// Load the config file (defaults if there is none) and open the hardware it describes
    pub fn with_config_path(config_path: PathBuf) -> errors::Result<Self> {
        let config = Self::load_config(config::Config::new(config_path))?;
        let peripherals = Self::peripherals(&config.hardware);
        let http = ReqwestClient::new(Duration::from_millis(config.hardware.network_timeout_ms))?;

        let mut open_sprinkler = Self::new(config, peripherals, Box::new(http));
        open_sprinkler.setup_flow_sensor();
        Ok(open_sprinkler)
    }

    fn load_config(defaults: config::Config) -> errors::Result<config::Config> {
        if !defaults.exists() {
            tracing::debug!("Config file does not exist, writing defaults");
            defaults.write()?;
            return Ok(defaults);
        }

        let config = defaults.read()?;
        tracing::debug!("Config is OK");
        Ok(config)
    }

    #[cfg(feature = "demo")]
    fn peripherals(hardware: &config::HardwareConfig) -> Peripherals {
        tracing::info!("DEMO MODE");
        demo::peripherals(hardware)
    }

    #[cfg(not(feature = "demo"))]
    fn peripherals(hardware: &config::HardwareConfig) -> Peripherals {
        match gpio::detect(hardware) {
            Ok(peripherals) => peripherals,
            Err(ref error) => {
                tracing::error!("Cannot access GPIO peripheral: {}", error);
                tracing::warn!("Falling back to simulated hardware");
                demo::peripherals(hardware)
            }
        }
    }

    /// Clear the shift register before enabling its outputs, or calibrate the latch board
    fn setup_outputs(&mut self) {
        self.state.status.enabled = self.config.enable_controller;
        self.state.status.mas = self.get_master_station_index(0);
        self.state.status.mas2 = self.get_master_station_index(1);

        let board_count = self.get_board_count();
        match self.backend {
            ActuationBackend::DirectDrive(ref mut shift_register) => {
                shift_register.write(&[0; station::MAX_NUM_BOARDS][..board_count]);
                shift_register.set_output_enable(true);
            }
            ActuationBackend::LatchingRelay(ref mut driver) => {
                self.state.status.has_curr_sense = driver.calibrate().is_some();
            }
        }
    }

    #[cfg(not(feature = "demo"))]
    fn setup_flow_sensor(&mut self) {
        if let Some(pin) = self.config.hardware.pins.flow_sensor {
            match gpio::FlowSensorInput::attach(pin, self.flow.clone()) {
                Ok(input) => self.flow_sensor = Some(input),
                Err(ref error) => tracing::error!("GPIO Error (flow sensor {}): {}", pin, error),
            }
        }
    }

    #[cfg(feature = "demo")]
    fn setup_flow_sensor(&mut self) {}

    // region: GETTERS

    /// Number of eight-zone station boards (including master controller)
    pub fn get_board_count(&self) -> usize {
        self.config.board_count()
    }

    pub fn get_station_count(&self) -> usize {
        self.config.station_count()
    }

    pub fn is_station_running(&self, station_index: StationIndex) -> bool {
        self.state.station.is_active(station_index)
    }

    /// Returns the index (0-indexed) of a master station
    pub fn get_master_station_index(&self, i: usize) -> Option<StationIndex> {
        self.config.master_stations[i].station
    }

    pub fn is_master_station(&self, station_index: StationIndex) -> bool {
        self.get_master_station_index(0) == Some(station_index) || self.get_master_station_index(1) == Some(station_index)
    }

    pub fn is_special_station(&self, station_index: StationIndex) -> bool {
        self.config.stations.get(station_index).map_or(false, station::Station::is_special)
    }

    pub fn flow_counter(&self) -> &FlowCounter {
        &self.flow
    }

    pub fn has_flow_sensor(&self) -> bool {
        self.config.hardware.pins.flow_sensor.is_some()
    }

    /// The flow sensor interrupt is running
    pub fn is_flow_sensor_attached(&self) -> bool {
        self.flow_sensor.is_some()
    }

    // endregion GETTERS

    pub fn set_special_station_refresh(&mut self, enabled: bool) {
        self.config.enable_special_stn_refresh = enabled;
        self.dispatcher.set_options(dispatch_options(&self.config));
    }

    pub fn set_device_key(&mut self, device_key: String) {
        self.config.device_key = device_key;
        self.dispatcher.set_options(dispatch_options(&self.config));
    }

    /// Enable controller operation
    pub fn enable(&mut self) -> config::result::Result<()> {
        self.config.enable_controller = true;
        self.state.status.enabled = true;
        self.config.write()
    }

    /// Disable controller operation
    ///
    /// Every station is switched off immediately.
    pub fn disable(&mut self) -> config::result::Result<()> {
        self.config.enable_controller = false;
        self.state.status.enabled = false;
        self.clear_all_station_bits();
        self.config.write()
    }

    /// Start rain delay
    pub fn rain_delay_start(&mut self) {
        self.state.status.rain_delayed = true;
    }

    /// Stop rain delay
    pub fn rain_delay_stop(&mut self) -> config::result::Result<()> {
        self.state.status.rain_delayed = false;
        self.config.nv.rain_delay_stop_time = None;
        self.config.write()
    }

    /// Check rain delay status
    pub fn check_rain_delay_status(&mut self, now_seconds: i64) {
        let stop_time = self.config.nv.rain_delay_stop_time.unwrap_or(0);

        if self.state.status.rain_delayed {
            if now_seconds >= stop_time {
                // rain delay is over
                if let Err(ref error) = self.rain_delay_stop() {
                    tracing::error!("Could not save rain delay: {}", error);
                }
            }
        } else if stop_time > now_seconds {
            // rain delay starts now
            self.rain_delay_start();
        }

        if self.state.rain_delay.active_previous != self.state.status.rain_delayed {
            if self.state.status.rain_delayed {
                // rain delay started, record time
                self.state.rain_delay.timestamp_active_last = Some(now_seconds);
                tracing::info!("Rain delay started (until {})", stop_time);
            } else {
                tracing::info!("Rain delay stopped");
            }
            self.state.rain_delay.active_previous = self.state.status.rain_delayed;
        }
    }

    pub fn start_flow_log_count(&mut self) {
        self.state.flow.count_log_start = self.flow.get();
    }

    /// Pulses since [OpenSprinkler::start_flow_log_count]
    pub fn flow_log_count(&self) -> u64 {
        self.flow.get().saturating_sub(self.state.flow.count_log_start)
    }

    /// Realtime flow count
    pub fn update_realtime_flow_count(&mut self, now_seconds: i64) {
        if self.has_flow_sensor() && now_seconds % sensor::FLOW_COUNT_REALTIME_WINDOW == 0 {
            let count = self.flow.get();
            self.state.flow.count_realtime_now = count.saturating_sub(self.state.flow.count_realtime_start);
            self.state.flow.count_realtime_start = count;
        }
    }
}

fn dispatch_options(config: &config::Config) -> DispatchOptions {
    DispatchOptions {
        device_key: config.device_key.clone(),
        special_station_refresh: config.enable_special_stn_refresh,
    }
}
