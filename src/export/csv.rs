//! CSV analysis report

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use super::{NO_DATA_MESSAGE, write_report};
use crate::models::SolarSpot;
use crate::{Result, SolarMapError};

pub const CSV_HEADER: &str = "City,Latitude,Longitude,Area Type,Suitability,Avg Sun Hours/Day (NASA),Avg Efficiency (%),Annual Production (kWh),Installation Cost ($),Payback Period (Years),CO2 Reduction (Tons/Year)";

/// One CSV body row
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub area_type: String,
    pub suitable: bool,
    pub sun_hours: f64,
    pub efficiency: u8,
    pub annual_production: u64,
    pub cost: u32,
    pub payback_period: f64,
    pub co2_reduction: f64,
}

impl ReportRow {
    /// Row for a loaded spot; `None` while it has no metrics
    #[must_use]
    pub fn from_spot(spot: &SolarSpot) -> Option<Self> {
        let metrics = spot.metrics()?;
        Some(Self {
            name: spot.name().to_string(),
            lat: spot.location.coordinates.lat,
            lng: spot.location.coordinates.lng,
            area_type: metrics.area_type.label().to_string(),
            suitable: metrics.suitable,
            sun_hours: metrics.solar_irradiance,
            efficiency: metrics.efficiency_score,
            annual_production: metrics.annual_production,
            cost: spot.location.base_cost,
            payback_period: spot.payback_period_years(),
            co2_reduction: metrics.co2_reduction,
        })
    }

    #[must_use]
    pub fn to_csv(&self) -> String {
        let suitability = if self.suitable { "Suitable" } else { "Not Suitable" };
        format!(
            "{},{},{},{},{},\"{:.2}\",{},{},{},{},{}",
            quote(&self.name),
            self.lat,
            self.lng,
            quote(&self.area_type),
            quote(suitability),
            self.sun_hours,
            self.efficiency,
            self.annual_production,
            self.cost,
            self.payback_period,
            self.co2_reduction
        )
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Build the CSV document from rows in display order
pub fn rows_to_csv(rows: &[ReportRow]) -> Result<String> {
    if rows.is_empty() {
        return Err(SolarMapError::export(NO_DATA_MESSAGE));
    }
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(CSV_HEADER.to_string());
    lines.extend(rows.iter().map(ReportRow::to_csv));
    Ok(lines.join("\n"))
}

/// CSV for the loaded spots among `spots`, keeping their order
pub fn csv_report<'a, I>(spots: I) -> Result<String>
where
    I: IntoIterator<Item = &'a SolarSpot>,
{
    let rows: Vec<ReportRow> = spots.into_iter().filter_map(ReportRow::from_spot).collect();
    rows_to_csv(&rows)
}

#[must_use]
pub fn csv_file_name(date: NaiveDate) -> String {
    format!("solar_analysis_report_{}.csv", date.format("%Y-%m-%d"))
}

/// Write the CSV report into `dir`, returning the file path
pub fn write_csv_report<'a, I>(dir: &Path, spots: I, date: NaiveDate) -> Result<PathBuf>
where
    I: IntoIterator<Item = &'a SolarSpot>,
{
    let contents = csv_report(spots)?;
    write_report(dir, &csv_file_name(date), contents.as_bytes())
}
