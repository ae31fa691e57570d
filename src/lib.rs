//! `SolarMap` - solar installation viability for cities and districts
//!
//! This library derives solar metrics from NASA POWER climatology, loads
//! them progressively for a drill-down view of cities and districts, and
//! produces CSV/PDF reports and a 20-year ROI simulation.

pub mod climate;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod reference;
pub mod simulator;
pub mod view;

// Re-export core types for public API
pub use climate::{ClimateObservation, ClimateSource, NasaPowerClient};
pub use config::SolarMapConfig;
pub use dashboard::Dashboard;
pub use error::SolarMapError;
pub use export::{InvestmentReport, csv_report, write_csv_report};
pub use loader::{
    Generation, LoadHandle, LoadSnapshot, LoadSummary, ProgressiveLoader, RetryPolicy,
};
pub use metrics::{AreaType, SolarMetrics, derive_metrics, fetch_solar_metrics};
pub use models::{Coordinates, LoadStatus, Location, LocationId, SolarSpot};
pub use reference::ReferenceData;
pub use simulator::{SimulationParameters, SimulationResult, simulate};
pub use view::{FilterBy, SortBy, Transition, ViewMode, ViewState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SolarMapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
