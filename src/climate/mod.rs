//! Annual climatology sources
//!
//! The loader only needs one thing from upstream: the annual average
//! irradiance and temperature for a point. `ClimateSource` is that seam;
//! `NasaPowerClient` is the production implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::models::Coordinates;

pub mod nasa_power;

pub use nasa_power::NasaPowerClient;

/// Annual averages for one point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateObservation {
    /// Downward shortwave irradiance in kWh/m²/day
    pub irradiance: f64,
    /// 2 m air temperature in °C
    pub temperature: f64,
}

#[async_trait]
pub trait ClimateSource: Send + Sync {
    /// Fetch the annual climatology for `coordinates`.
    ///
    /// Fails with `SolarMapError::UpstreamUnavailable` on network errors,
    /// non-success statuses and malformed or incomplete bodies.
    async fn annual_climate(&self, coordinates: Coordinates) -> Result<ClimateObservation>;
}
