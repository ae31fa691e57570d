//! NASA POWER climatology client
//!
//! Requests the annual climatology (`ALLSKY_SFC_SW_DWN`, `T2M`) for a point
//! and extracts the `ANN` entry of each parameter.

use async_trait::async_trait;
use reqwest::Url;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use super::{ClimateObservation, ClimateSource};
use crate::config::NasaConfig;
use crate::models::Coordinates;
use crate::{Result, SolarMapError};

const CLIMATOLOGY_PATH: &str = "temporal/climatology/point";
const IRRADIANCE_PARAMETER: &str = "ALLSKY_SFC_SW_DWN";
const TEMPERATURE_PARAMETER: &str = "T2M";
const ANNUAL_KEY: &str = "ANN";
/// POWER marks missing data with this value
const FILL_VALUE: f64 = -999.0;

/// Climatology response from NASA POWER
#[derive(Debug, Deserialize)]
struct ClimatologyResponse {
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Properties {
    /// Parameter name to month-or-`ANN` key to value
    parameter: HashMap<String, HashMap<String, f64>>,
}

impl ClimatologyResponse {
    fn annual(&self, parameter: &str) -> Result<f64> {
        let value = self
            .properties
            .parameter
            .get(parameter)
            .and_then(|values| values.get(ANNUAL_KEY))
            .copied()
            .ok_or_else(|| {
                SolarMapError::upstream(format!("Missing {ANNUAL_KEY} value for {parameter}"))
            })?;

        if !value.is_finite() || value <= FILL_VALUE {
            return Err(SolarMapError::upstream(format!(
                "No data for {parameter} at this point"
            )));
        }
        Ok(value)
    }

    fn into_observation(self) -> Result<ClimateObservation> {
        Ok(ClimateObservation {
            irradiance: self.annual(IRRADIANCE_PARAMETER)?,
            temperature: self.annual(TEMPERATURE_PARAMETER)?,
        })
    }
}

/// HTTP client for the NASA POWER API
pub struct NasaPowerClient {
    client: ClientWithMiddleware,
    base_url: String,
    community: String,
}

impl NasaPowerClient {
    /// Create a new client from configuration
    pub fn new(config: &NasaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("SolarMap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SolarMapError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            community: config.community.clone(),
        })
    }

    fn climatology_url(&self, coordinates: Coordinates) -> Result<Url> {
        let endpoint = format!("{}/{}", self.base_url, CLIMATOLOGY_PATH);
        let parameters = format!("{IRRADIANCE_PARAMETER},{TEMPERATURE_PARAMETER}");
        Url::parse_with_params(
            &endpoint,
            &[
                ("parameters", parameters),
                ("community", self.community.clone()),
                ("longitude", coordinates.lng.to_string()),
                ("latitude", coordinates.lat.to_string()),
                ("format", "JSON".to_string()),
            ],
        )
        .map_err(|e| SolarMapError::config(format!("Invalid NASA POWER URL {endpoint}: {e}")))
    }
}

#[async_trait]
impl ClimateSource for NasaPowerClient {
    #[instrument(skip(self), fields(lat = coordinates.lat, lng = coordinates.lng))]
    async fn annual_climate(&self, coordinates: Coordinates) -> Result<ClimateObservation> {
        let url = self.climatology_url(coordinates)?;
        debug!("NASA POWER request URL: {}", url);
        let start_time = Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            SolarMapError::upstream(format!("NASA POWER request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("NASA POWER returned {} for {}", status, coordinates.format());
            return Err(SolarMapError::upstream(format!(
                "NASA POWER API error {status}"
            )));
        }

        let body: ClimatologyResponse = response.json().await.map_err(|e| {
            SolarMapError::upstream(format!("Failed to parse NASA POWER response: {e}"))
        })?;
        let observation = body.into_observation()?;

        debug!(
            "Annual climate for {}: {:.2} kWh/m²/day, {:.1}°C in {:.3}s",
            coordinates.format(),
            observation.irradiance,
            observation.temperature,
            start_time.elapsed().as_secs_f64()
        );
        Ok(observation)
    }
}
