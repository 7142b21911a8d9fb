pub mod request;

use std::time::Duration;

use super::errors::ActuationError;

/// Fire-and-forget HTTP GET used by remote and HTTP stations
pub trait HttpClient {
    /// Returns the response status code. Errors on connection failure or timeout.
    fn get(&self, url: &url::Url) -> Result<u16, ActuationError>;
}

/// Blocking [reqwest] client with a bounded timeout
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: request::build_client(timeout)?,
        })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &url::Url) -> Result<u16, ActuationError> {
        let response = self.client.get(url.as_str()).send()?;
        Ok(response.status().as_u16())
    }
}
