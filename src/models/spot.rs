//! Locations paired with their load status and derived metrics

use serde::{Deserialize, Serialize};
use std::fmt;

use super::location::{Location, LocationId};
use crate::metrics::{AreaType, SolarMetrics, payback_period};

/// Metrics of a successfully loaded spot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotMetrics {
    pub metrics: SolarMetrics,
    /// Years until savings cover the location's base cost
    pub payback_period_years: f64,
}

/// Load state of a spot within its collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LoadStatus {
    /// Never attempted in this collection
    #[default]
    Pending,
    Loaded(SpotMetrics),
    /// The attempt failed upstream
    Failed,
}

/// A location as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarSpot {
    pub location: Location,
    status: LoadStatus,
}

impl SolarSpot {
    #[must_use]
    pub fn new(location: Location) -> Self {
        Self {
            location,
            status: LoadStatus::Pending,
        }
    }

    #[must_use]
    pub fn id(&self) -> LocationId {
        self.location.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.location.name
    }

    #[must_use]
    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, LoadStatus::Loaded(_))
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.status, LoadStatus::Pending)
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.status, LoadStatus::Failed)
    }

    /// Derived metrics, present only once loaded
    #[must_use]
    pub fn metrics(&self) -> Option<&SolarMetrics> {
        match &self.status {
            LoadStatus::Loaded(loaded) => Some(&loaded.metrics),
            _ => None,
        }
    }

    /// Store freshly derived metrics and compute the payback period
    pub fn enrich(&mut self, metrics: SolarMetrics) {
        let payback_period_years = payback_period(self.location.base_cost, metrics.annual_production);
        self.status = LoadStatus::Loaded(SpotMetrics {
            metrics,
            payback_period_years,
        });
    }

    pub fn mark_failed(&mut self) {
        self.status = LoadStatus::Failed;
    }

    /// Annual average irradiance, 0 when not loaded
    #[must_use]
    pub fn sun_hours(&self) -> f64 {
        self.metrics().map_or(0.0, |m| m.solar_irradiance)
    }

    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.metrics().map_or(0.0, |m| m.temperature)
    }

    #[must_use]
    pub fn efficiency_score(&self) -> u8 {
        self.metrics().map_or(0, |m| m.efficiency_score)
    }

    #[must_use]
    pub fn annual_production(&self) -> u64 {
        self.metrics().map_or(0, |m| m.annual_production)
    }

    #[must_use]
    pub fn co2_reduction(&self) -> f64 {
        self.metrics().map_or(0.0, |m| m.co2_reduction)
    }

    #[must_use]
    pub fn suitable(&self) -> bool {
        self.metrics().is_some_and(|m| m.suitable)
    }

    #[must_use]
    pub fn area_type(&self) -> Option<AreaType> {
        self.metrics().map(|m| m.area_type)
    }

    #[must_use]
    pub fn payback_period_years(&self) -> f64 {
        match &self.status {
            LoadStatus::Loaded(loaded) => loaded.payback_period_years,
            _ => 0.0,
        }
    }
}

/// Detail card for the selected location
impl fmt::Display for SolarSpot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name(), self.location.coordinates.format())?;
        match &self.status {
            LoadStatus::Pending => write!(f, "  loading..."),
            LoadStatus::Failed => write!(f, "  NASA POWER data unavailable"),
            LoadStatus::Loaded(loaded) => {
                let m = &loaded.metrics;
                let suitability = if m.suitable { "Suitable" } else { "Not Suitable" };
                writeln!(f, "  {suitability}, {}", m.area_type)?;
                writeln!(f, "  Sun hours:      {:.2} h/day (NASA)", m.solar_irradiance)?;
                writeln!(f, "  Temperature:    {:.1} C", m.temperature)?;
                writeln!(f, "  Efficiency:     {}%", m.efficiency_score)?;
                writeln!(f, "  Production:     {} kWh/year", m.annual_production)?;
                writeln!(f, "  Installation:   ${}", self.location.base_cost)?;
                writeln!(f, "  Payback:        {:.1} years", loaded.payback_period_years)?;
                write!(f, "  CO2 reduction:  {} tons/year", m.co2_reduction)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;

    fn ankara() -> SolarSpot {
        SolarSpot::new(Location::city(
            6,
            "Ankara",
            Coordinates::new(39.9, 32.8),
            140_000,
        ))
    }

    fn sample_metrics() -> SolarMetrics {
        SolarMetrics {
            solar_irradiance: 4.1,
            temperature: 12.0,
            variance: 0.4,
            efficiency_score: 78,
            annual_production: 6500,
            co2_reduction: 2.93,
            suitable: true,
            area_type: AreaType::RoofArea,
        }
    }

    #[test]
    fn test_pending_spot_exposes_placeholders() {
        let spot = ankara();
        assert!(spot.is_pending());
        assert!(!spot.is_loaded());
        assert!(spot.metrics().is_none());
        assert_eq!(spot.sun_hours(), 0.0);
        assert_eq!(spot.efficiency_score(), 0);
        assert_eq!(spot.annual_production(), 0);
        assert!(!spot.suitable());
        assert!(spot.area_type().is_none());
        assert_eq!(spot.payback_period_years(), 0.0);
    }

    #[test]
    fn test_enrich_computes_payback() {
        let mut spot = ankara();
        spot.enrich(sample_metrics());
        assert!(spot.is_loaded());
        assert_eq!(spot.efficiency_score(), 78);
        assert_eq!(spot.area_type(), Some(AreaType::RoofArea));
        assert_eq!(spot.payback_period_years(), 107.7);
    }

    #[test]
    fn test_failed_spot_drops_metrics() {
        let mut spot = ankara();
        spot.enrich(sample_metrics());
        spot.mark_failed();
        assert!(spot.is_failed());
        assert!(spot.metrics().is_none());
        assert_eq!(spot.co2_reduction(), 0.0);
    }

    #[test]
    fn test_detail_card() {
        let mut spot = ankara();
        assert!(spot.to_string().contains("loading"));
        spot.enrich(sample_metrics());
        let card = spot.to_string();
        assert!(card.starts_with("Ankara (39.9000, 32.8000)"));
        assert!(card.contains("Suitable, Roof Area"));
        assert!(card.contains("4.10 h/day"));
        assert!(card.contains("107.7 years"));
    }
}
