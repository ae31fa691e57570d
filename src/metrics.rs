//! Solar viability metrics
//!
//! Maps an annual climate observation (irradiance, temperature) for a point
//! into the derived metrics shown for every location: efficiency score,
//! annual production, CO2 reduction, suitability and area type. Payback is a
//! separate step because it needs the location's installation cost.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

use crate::Result;
use crate::climate::{ClimateObservation, ClimateSource};
use crate::models::Coordinates;

/// Panel reference temperature in °C
pub const REFERENCE_TEMPERATURE_C: f64 = 25.0;
/// Score points lost per °C above the reference temperature
pub const TEMPERATURE_LOSS_PER_DEGREE: f64 = 0.5;
pub const BASE_SCORE: f64 = 88.0;
pub const VARIANCE_AMPLITUDE: f64 = 3.0;
pub const MIN_EFFICIENCY_SCORE: u8 = 50;
pub const MAX_EFFICIENCY_SCORE: u8 = 99;
/// Score at which the performance ratio equals the base ratio
pub const REFERENCE_SCORE: f64 = 85.0;
pub const BASE_PERFORMANCE_RATIO: f64 = 0.75;
/// Reference system size in kW
pub const SYSTEM_SIZE_KW: f64 = 5.0;
pub const DAYS_PER_YEAR: f64 = 365.0;
/// 0.45 kg CO2 per kWh, in tons
pub const CO2_TONS_PER_KWH: f64 = 0.000_45;
pub const SUITABLE_MIN_IRRADIANCE: f64 = 3.8;
pub const SUITABLE_MIN_SCORE: u8 = 70;
pub const OPEN_LAND_MIN_IRRADIANCE: f64 = 4.2;
pub const OPEN_LAND_MIN_VARIANCE: f64 = 1.0;
/// Reference electricity price in $/kWh
pub const ELECTRICITY_PRICE_PER_KWH: f64 = 0.20;

/// Installation area classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaType {
    #[serde(rename = "roof")]
    RoofArea,
    #[serde(rename = "openLand")]
    OpenLand,
}

impl AreaType {
    /// Short machine label used in filters and exports
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            AreaType::RoofArea => "roof",
            AreaType::OpenLand => "openLand",
        }
    }

    /// Human-readable name
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            AreaType::RoofArea => "Roof Area",
            AreaType::OpenLand => "Open Land",
        }
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Metrics derived from one climate observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarMetrics {
    /// Annual average irradiance in kWh/m²/day ("sun hours")
    pub solar_irradiance: f64,
    /// Annual average 2 m air temperature in °C
    pub temperature: f64,
    /// Location pseudo-variance, in [-3, 3]
    pub variance: f64,
    /// Synthetic performance rating in [50, 99]
    pub efficiency_score: u8,
    /// kWh/year for the 5 kW reference system
    pub annual_production: u64,
    /// Tons of CO2 avoided per year
    pub co2_reduction: f64,
    pub suitable: bool,
    pub area_type: AreaType,
}

/// Panel performance penalty above the reference temperature
#[must_use]
pub fn temperature_loss(temperature: f64) -> f64 {
    ((temperature - REFERENCE_TEMPERATURE_C) * TEMPERATURE_LOSS_PER_DEGREE).max(0.0)
}

/// Deterministic pseudo-variance keyed by location.
///
/// Same coordinates always give the same value; there is no random source.
#[must_use]
pub fn location_variance(coordinates: Coordinates) -> f64 {
    (coordinates.lat * coordinates.lng).sin() * VARIANCE_AMPLITUDE
}

/// Rounded and clamped efficiency score
#[must_use]
pub fn efficiency_score(temperature_loss: f64, variance: f64) -> u8 {
    let raw = (BASE_SCORE - temperature_loss + variance).round();
    if raw.is_nan() {
        return MIN_EFFICIENCY_SCORE;
    }
    raw.clamp(f64::from(MIN_EFFICIENCY_SCORE), f64::from(MAX_EFFICIENCY_SCORE)) as u8
}

#[must_use]
pub fn is_suitable(irradiance: f64, efficiency_score: u8) -> bool {
    irradiance > SUITABLE_MIN_IRRADIANCE && efficiency_score > SUITABLE_MIN_SCORE
}

#[must_use]
pub fn classify_area(irradiance: f64, variance: f64) -> AreaType {
    if irradiance > OPEN_LAND_MIN_IRRADIANCE || variance > OPEN_LAND_MIN_VARIANCE {
        AreaType::OpenLand
    } else {
        AreaType::RoofArea
    }
}

/// Derive all metrics for a point from its annual climate observation
#[must_use]
pub fn derive_metrics(coordinates: Coordinates, observation: &ClimateObservation) -> SolarMetrics {
    let irradiance = observation.irradiance;
    let loss = temperature_loss(observation.temperature);
    let variance = location_variance(coordinates);
    let score = efficiency_score(loss, variance);

    let performance_ratio = BASE_PERFORMANCE_RATIO * (f64::from(score) / REFERENCE_SCORE);
    let annual_production =
        (irradiance * DAYS_PER_YEAR * SYSTEM_SIZE_KW * performance_ratio).round().max(0.0) as u64;
    let co2_reduction = round_to(annual_production as f64 * CO2_TONS_PER_KWH, 2);

    SolarMetrics {
        solar_irradiance: irradiance,
        temperature: observation.temperature,
        variance,
        efficiency_score: score,
        annual_production,
        co2_reduction,
        suitable: is_suitable(irradiance, score),
        area_type: classify_area(irradiance, variance),
    }
}

/// Years until savings at the reference price cover `base_cost`.
///
/// Returns 0 when there is no production to save against.
#[must_use]
pub fn payback_period(base_cost: u32, annual_production: u64) -> f64 {
    let savings = annual_production as f64 * ELECTRICITY_PRICE_PER_KWH;
    if savings > 0.0 {
        round_to(f64::from(base_cost) / savings, 1)
    } else {
        0.0
    }
}

/// Fetch the annual climate for a point and derive its metrics.
///
/// All-or-nothing: any upstream failure is returned as an error and no
/// partial metrics are produced.
#[instrument(level = "debug", skip(source), fields(lat = coordinates.lat, lng = coordinates.lng))]
pub async fn fetch_solar_metrics<S>(source: &S, coordinates: Coordinates) -> Result<SolarMetrics>
where
    S: ClimateSource + ?Sized,
{
    coordinates.validate()?;
    let observation = source.annual_climate(coordinates).await?;
    let metrics = derive_metrics(coordinates, &observation);
    debug!(
        "Derived score {} and {} kWh/year for {}",
        metrics.efficiency_score,
        metrics.annual_production,
        coordinates.format()
    );
    Ok(metrics)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let multiplier = 10_f64.powi(decimals);
    (value * multiplier).round() / multiplier
}
