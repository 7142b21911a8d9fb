use url::Url;

use super::{
    errors::ActuationError,
    hal::{PinDriver, RfTransmitter},
    http::{request, HttpClient},
    rf,
    station::{GPIOStationData, HTTPStationData, RFStationData, RemoteStationData, SpecialStation, StationIndex, StationType},
};

/// Settings shared by every special station switch
#[derive(Clone, Debug)]
pub struct DispatchOptions {
    /// Device key (MD5), assumed to be the same on remote controllers
    pub device_key: String,
    /// Special station auto-refresh is enabled
    pub special_station_refresh: bool,
}

/// Routes a switch request for a special station to its actuation mechanism
///
/// The dispatcher never touches the station bits: the caller commits them after a successful dispatch.
pub struct Dispatcher {
    pins: Box<dyn PinDriver>,
    rf: Box<dyn RfTransmitter>,
    http: Box<dyn HttpClient>,
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(pins: Box<dyn PinDriver>, rf: Box<dyn RfTransmitter>, http: Box<dyn HttpClient>, options: DispatchOptions) -> Self {
        Self { pins, rf, http, options }
    }

    pub fn set_options(&mut self, options: DispatchOptions) {
        self.options = options;
    }

    /// Decode the special data of a station and switch it
    pub fn switch_station(&mut self, station_index: StationIndex, station_type: u8, data: &[u8], turn_on: bool) -> Result<(), ActuationError> {
        let special = SpecialStation::decode(station_type, data)?;
        self.switch_special_station(station_index, &special, turn_on)
    }

    /// Switch an already decoded special station
    ///
    /// Standard and unsupported station types are a no-op.
    pub fn switch_special_station(&mut self, station_index: StationIndex, special: &SpecialStation, turn_on: bool) -> Result<(), ActuationError> {
        tracing::debug!("Switch station {} ({:?}) {}", station_index, special.station_type(), if turn_on { "on" } else { "off" });

        match special {
            SpecialStation::RF(data) => self.switch_rf_station(data, turn_on),
            SpecialStation::Remote(data) => self.switch_remote_station(data, turn_on),
            SpecialStation::GPIO(data) => self.switch_gpio_station(data, turn_on),
            SpecialStation::HTTP(data) => self.switch_http_station(data, turn_on),
            // Nothing to do for [StationType::Standard] and [StationType::Other]
            SpecialStation::Standard | SpecialStation::Other => Ok(()),
        }
    }

    /// Switch Radio Frequency (RF) station
    ///
    /// This function takes an RF code, parses it into signals and timing, and sends it out through the RF transmitter.
    fn switch_rf_station(&mut self, data: &RFStationData, turn_on: bool) -> Result<(), ActuationError> {
        let code = rf::parse(data)?;
        tracing::trace!("[RF Station] code: {:06X} length: {}us", code.code(turn_on), code.pulse_length);
        self.rf.transmit(code.code(turn_on), code.pulse_length, rf::RF_REPEAT_COUNT)
    }

    /// Switch GPIO station
    fn switch_gpio_station(&mut self, data: &GPIOStationData, turn_on: bool) -> Result<(), ActuationError> {
        tracing::trace!("[GPIO Station] pin: {} state: {}", data.pin, turn_on);
        self.pins.write(data.pin, data.level(turn_on))
    }

    /// Switch Remote Station
    ///
    /// Makes an HTTP GET request to the `/cm` endpoint of the remote controller. The remote controller is assumed to
    /// have the same password as this controller.
    fn switch_remote_station(&mut self, data: &RemoteStationData, turn_on: bool) -> Result<(), ActuationError> {
        let mut url = Url::parse(&format!("http://{}:{}/cm", data.ip, data.port))?;
        let params = request::RemoteStationRequestParametersV2_1_9::new(&self.options.device_key, data.sid, turn_on, request::remote_timer(self.options.special_station_refresh));
        url.set_query(Some(&params.to_query()));

        self.fire("[Remote Station]", &url)
    }

    /// Switch HTTP station
    fn switch_http_station(&mut self, data: &HTTPStationData, turn_on: bool) -> Result<(), ActuationError> {
        let url = http_station_url(&data.template, turn_on)?;
        self.fire("[HTTP Station]", &url)
    }

    /// Best-effort request: failures are logged and returned, never retried here
    fn fire(&self, tag: &str, url: &Url) -> Result<(), ActuationError> {
        match self.http.get(url) {
            Ok(status) if (200..300).contains(&status) => Ok(()),
            Ok(status) => {
                tracing::warn!("{} {} responded with status {}", tag, url.host_str().unwrap_or_default(), status);
                Ok(())
            }
            Err(error) => {
                tracing::error!("{} HTTP request error: {}", tag, error);
                Err(error)
            }
        }
    }
}

/// Expand an HTTP station template into the request URL
///
/// Placeholders: `{state}` becomes `on`/`off`, `{value}` becomes `1`/`0`. A template without placeholders is read in
/// the legacy `host,port,on_command,off_command` layout.
pub fn http_station_url(template: &str, turn_on: bool) -> Result<Url, ActuationError> {
    if template.contains("{state}") || template.contains("{value}") {
        let url = template.replace("{state}", if turn_on { "on" } else { "off" }).replace("{value}", if turn_on { "1" } else { "0" });
        return Ok(Url::parse(&url)?);
    }

    let fields: Vec<&str> = template.split(',').map(str::trim).collect();
    if let [host, port, on_command, off_command] = fields.as_slice() {
        let command = if turn_on { on_command } else { off_command };
        return Ok(Url::parse(&format!("http://{}:{}/{}", host, port, command.trim_start_matches('/')))?);
    }

    Err(ActuationError::InvalidLayout {
        station_type: StationType::HTTP.into(),
        reason: "Template has no on/off placeholder",
    })
}
