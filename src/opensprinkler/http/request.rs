use std::time::Duration;

use reqwest::header;

use crate::opensprinkler::station;

include!(concat!(env!("OUT_DIR"), "/user_agent_header.rs"));

/// Query parameters of the remote controller's `/cm` (change manual) endpoint
#[derive(Debug)]
pub struct RemoteStationRequestParametersV2_1_9 {
    /// Device key (MD5)
    device_key_md5: String,
    /// Station ID/index
    station: u8,
    /// Enable bit
    value: bool,
    /// Timer (seconds)
    timer: i64,
}

impl RemoteStationRequestParametersV2_1_9 {
    pub fn new(device_key_md5: &str, station: u8, value: bool, timer: i64) -> Self {
        RemoteStationRequestParametersV2_1_9 {
            device_key_md5: device_key_md5.to_string(),
            station,
            value,
            timer,
        }
    }

    /// `pw=..&sid=..&en=..&t=..`
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("pw", &self.device_key_md5)
            .append_pair("sid", &self.station.to_string())
            .append_pair("en", if self.value { "1" } else { "0" })
            .append_pair("t", &self.timer.to_string())
            .finish()
    }
}

/// How long a remote station stays on if it never hears from this controller again (seconds)
pub fn remote_timer(special_station_refresh: bool) -> i64 {
    match special_station_refresh {
        true => (station::MAX_NUM_STATIONS * 4) as i64,
        false => 64800, // 18 hours
    }
}

pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::blocking::Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT_STRING));

    reqwest::blocking::Client::builder().default_headers(headers).timeout(timeout).build()
}
