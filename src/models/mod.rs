//! Data models for the `SolarMap` dashboard
//!
//! - Location: cities, districts and their coordinates
//! - Spot: a location with its load status and derived metrics

pub mod location;
pub mod spot;

// Re-export all public types for convenient access
pub use location::{Coordinates, Location, LocationId};
pub use spot::{LoadStatus, SolarSpot, SpotMetrics};
