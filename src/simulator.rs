//! 20-year return-on-investment simulator
//!
//! Projects cumulative savings of a rooftop system, starting from the
//! installation cost as debt, with electricity prices rising by a fixed
//! inflation rate each year.

use serde::{Deserialize, Serialize};

use crate::config::SimulatorConfig;
use crate::metrics::{CO2_TONS_PER_KWH, DAYS_PER_YEAR, round_to};
use crate::{Result, SolarMapError};

pub const PROJECTION_YEARS: u32 = 20;
/// Used when no loaded location provides sun hours
pub const DEFAULT_SUN_HOURS: f64 = 4.5;
pub const PERFORMANCE_RATIO: f64 = 0.75;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub monthly_bill: u32,
    pub system_size_kw: u32,
    pub electricity_price: f64,
    pub inflation_rate_percent: u32,
    pub cost_per_kw: u32,
}

impl From<&SimulatorConfig> for SimulationParameters {
    fn from(config: &SimulatorConfig) -> Self {
        Self {
            monthly_bill: config.monthly_bill,
            system_size_kw: config.system_size_kw,
            electricity_price: config.electricity_price,
            inflation_rate_percent: config.inflation_rate_percent,
            cost_per_kw: config.cost_per_kw,
        }
    }
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self::from(&SimulatorConfig::default())
    }
}

impl SimulationParameters {
    pub fn validate(&self) -> Result<()> {
        if !(500..=10_000).contains(&self.monthly_bill) {
            return Err(SolarMapError::validation(
                "Monthly bill must be between 500 and 10000",
            ));
        }
        if !(3..=25).contains(&self.system_size_kw) {
            return Err(SolarMapError::validation(
                "System size must be between 3 and 25 kW",
            ));
        }
        if self.inflation_rate_percent > 100 {
            return Err(SolarMapError::validation(
                "Inflation rate must be between 0 and 100%",
            ));
        }
        if !(self.electricity_price.is_finite() && self.electricity_price > 0.0) {
            return Err(SolarMapError::validation("Electricity price must be positive"));
        }
        if self.cost_per_kw == 0 {
            return Err(SolarMapError::validation("Cost per kW must be positive"));
        }
        Ok(())
    }

    #[must_use]
    pub fn system_cost(&self) -> u64 {
        u64::from(self.system_size_kw) * u64::from(self.cost_per_kw)
    }
}

/// One projected year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearProjection {
    pub year: u32,
    /// Cumulative savings net of the installation cost, rounded
    pub cumulative_savings: i64,
    /// kWh produced this year, rounded
    pub production: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub parameters: SimulationParameters,
    pub sun_hours: f64,
    pub system_cost: u64,
    /// kWh per year
    pub annual_production: f64,
    pub projections: Vec<YearProjection>,
    /// First year with non-negative cumulative savings
    pub payback_year: Option<u32>,
    /// Final cumulative savings
    pub net_profit: f64,
    /// Savings before subtracting the installation cost
    pub total_savings: f64,
    pub co2_saved_tons: f64,
}

impl SimulationResult {
    /// Payback year, or "> 20" when it falls outside the projection
    #[must_use]
    pub fn payback_label(&self) -> String {
        match self.payback_year {
            Some(year) => year.to_string(),
            None => format!("> {PROJECTION_YEARS}"),
        }
    }
}

/// Run the projection.
///
/// `sun_hours` comes from the selected location; missing or non-positive
/// values fall back to [`DEFAULT_SUN_HOURS`].
pub fn simulate(sun_hours: Option<f64>, parameters: &SimulationParameters) -> Result<SimulationResult> {
    parameters.validate()?;

    let sun_hours = sun_hours
        .filter(|hours| hours.is_finite() && *hours > 0.0)
        .unwrap_or(DEFAULT_SUN_HOURS);
    let system_cost = parameters.system_cost();
    let annual_production =
        f64::from(parameters.system_size_kw) * sun_hours * DAYS_PER_YEAR * PERFORMANCE_RATIO;
    let inflation = 1.0 + f64::from(parameters.inflation_rate_percent) / 100.0;

    let mut cumulative = -(system_cost as f64);
    let mut payback_year = None;
    let mut projections = Vec::with_capacity(PROJECTION_YEARS as usize);

    for year in 1..=PROJECTION_YEARS {
        let price = parameters.electricity_price * inflation.powi(year as i32 - 1);
        cumulative += annual_production * price;

        if payback_year.is_none() && cumulative >= 0.0 {
            payback_year = Some(year);
        }

        projections.push(YearProjection {
            year,
            cumulative_savings: cumulative.round() as i64,
            production: annual_production.round() as u64,
        });
    }

    Ok(SimulationResult {
        parameters: parameters.clone(),
        sun_hours,
        system_cost,
        annual_production,
        projections,
        payback_year,
        net_profit: cumulative,
        total_savings: cumulative + system_cost as f64,
        co2_saved_tons: round_to(
            annual_production * f64::from(PROJECTION_YEARS) * CO2_TONS_PER_KWH,
            1,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parameters(size: u32, price: f64, inflation: u32) -> SimulationParameters {
        SimulationParameters {
            monthly_bill: 1500,
            system_size_kw: size,
            electricity_price: price,
            inflation_rate_percent: inflation,
            cost_per_kw: 35_000,
        }
    }

    #[test]
    fn test_flat_price_projection() {
        let result = simulate(Some(4.0), &parameters(4, 2.0, 0)).unwrap();

        assert_eq!(result.system_cost, 140_000);
        assert_eq!(result.annual_production, 4380.0);
        assert_eq!(result.projections.len(), 20);
        assert_eq!(result.projections[0].cumulative_savings, -131_240);
        assert_eq!(result.projections[0].production, 4380);
        assert_eq!(result.payback_year, Some(16));
        assert_eq!(result.projections[14].cumulative_savings, -8600);
        assert_eq!(result.projections[15].cumulative_savings, 160);
        assert_eq!(result.net_profit, 35_200.0);
        assert_eq!(result.total_savings, 175_200.0);
        assert_eq!(result.co2_saved_tons, 39.4);
        assert_eq!(result.payback_label(), "16");
    }

    #[test]
    fn test_inflation_shortens_payback() {
        let result = simulate(Some(4.0), &parameters(3, 1.0, 100)).unwrap();
        assert_eq!(result.annual_production, 3285.0);
        assert_eq!(result.payback_year, Some(6));
        assert_eq!(result.projections[4].cumulative_savings, -3165);
    }

    #[test]
    fn test_no_payback_within_horizon() {
        let result = simulate(Some(4.0), &parameters(5, 0.01, 0)).unwrap();
        assert_eq!(result.payback_year, None);
        assert_eq!(result.payback_label(), "> 20");
        assert!(result.net_profit < 0.0);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(0.0))]
    #[case(Some(f64::NAN))]
    fn test_default_sun_hours(#[case] sun_hours: Option<f64>) {
        let result = simulate(sun_hours, &SimulationParameters::default()).unwrap();
        assert_eq!(result.sun_hours, DEFAULT_SUN_HOURS);
        assert_eq!(result.annual_production, 5.0 * 4.5 * 365.0 * 0.75);
    }

    #[rstest]
    #[case(parameters(2, 2.8, 10))]
    #[case(parameters(26, 2.8, 10))]
    #[case(parameters(5, 0.0, 10))]
    #[case(parameters(5, 2.8, 101))]
    fn test_rejects_out_of_range_parameters(#[case] parameters: SimulationParameters) {
        let err = simulate(None, &parameters).unwrap_err();
        assert!(matches!(err, SolarMapError::Validation { .. }));
    }

    #[test]
    fn test_defaults_come_from_config() {
        let parameters = SimulationParameters::default();
        assert_eq!(parameters.monthly_bill, 1500);
        assert_eq!(parameters.system_size_kw, 5);
        assert_eq!(parameters.electricity_price, 2.8);
        assert_eq!(parameters.inflation_rate_percent, 10);
        assert_eq!(parameters.system_cost(), 175_000);
    }
}
