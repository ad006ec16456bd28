use crate::config::DeviceConfig;
use crate::error::{FetchError, Result};
use crate::models::Reading;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of meter readings; one call is one best-effort fetch.
pub trait DeviceReader: Send + Sync {
    fn fetch(&self) -> std::result::Result<Reading, FetchError>;
}

/// Reads the device's JSON endpoint over HTTP.
///
/// Uses the blocking client because the prometheus collector interface is
/// synchronous. Construct and call it off the async runtime.
#[derive(Debug)]
pub struct HttpDeviceReader {
    client: Client,
    url: String,
}

impl HttpDeviceReader {
    pub fn new(config: &DeviceConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl DeviceReader for HttpDeviceReader {
    fn fetch(&self) -> std::result::Result<Reading, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(FetchError::Transport)?;

        // The body is decoded whatever the status; a non-2xx answer that still
        // carries a reading array is exported as-is.
        let status = response.status();
        if !status.is_success() {
            debug!(%status, url = %self.url, "device answered with non-success status");
        }

        let body = response.bytes().map_err(FetchError::Body)?;
        decode(&body)
    }
}

/// Decode a device response body, keeping only the first reading.
///
/// The device normally answers with a single-element array; anything after
/// the first element is dropped without notice.
pub fn decode(body: &[u8]) -> std::result::Result<Reading, FetchError> {
    let readings: Vec<Reading> = serde_json::from_slice(body)?;
    readings.into_iter().next().ok_or(FetchError::Empty)
}

/// Fetch once, logging and replacing any failure with the zero reading.
pub fn fetch_or_default(reader: &dyn DeviceReader) -> Reading {
    match reader.fetch() {
        Ok(reading) => {
            debug!(
                measured_at = ?reading.measured_at(),
                gas_measured_at = ?reading.gas_measured_at(),
                power = reading.power,
                empty = reading.is_empty(),
                "fetched device reading"
            );
            reading
        }
        Err(e) => {
            warn!(error = %e, "device fetch failed; exporting zero reading");
            Reading::default()
        }
    }
}
