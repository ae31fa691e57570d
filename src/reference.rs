//! Static city and district reference data
//!
//! The built-in lists are embedded at compile time. A directory holding
//! `cities.json` and `districts.json` in the same format can replace them
//! through `reference.data_dir`.

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::config::ReferenceConfig;
use crate::models::{Location, LocationId};
use crate::{Result, SolarMapError};

const BUILTIN_CITIES: &str = include_str!("../data/cities.json");
const BUILTIN_DISTRICTS: &str = include_str!("../data/districts.json");

#[derive(Debug, Deserialize)]
struct CitiesFile {
    cities: Vec<Location>,
}

#[derive(Debug, Deserialize)]
struct DistrictsFile {
    districts: Vec<Location>,
}

/// Validated city and district lists
#[derive(Debug, Clone)]
pub struct ReferenceData {
    cities: Vec<Location>,
    districts: Vec<Location>,
}

impl ReferenceData {
    /// The embedded Turkish city and district lists
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CITIES, BUILTIN_DISTRICTS)
    }

    /// Parse and validate both reference documents
    pub fn from_json(cities_json: &str, districts_json: &str) -> Result<Self> {
        let cities: CitiesFile = serde_json::from_str(cities_json)
            .map_err(|e| SolarMapError::reference_data(format!("Invalid cities data: {e}")))?;
        let districts: DistrictsFile = serde_json::from_str(districts_json)
            .map_err(|e| SolarMapError::reference_data(format!("Invalid districts data: {e}")))?;

        Self::new(cities.cities, districts.districts)
    }

    /// Build from already parsed lists
    pub fn new(cities: Vec<Location>, districts: Vec<Location>) -> Result<Self> {
        let data = Self { cities, districts };
        data.validate()?;
        Ok(data)
    }

    /// Load from the configured directory, or fall back to the built-in data
    pub fn load(config: &ReferenceConfig) -> anyhow::Result<Self> {
        let Some(dir) = &config.data_dir else {
            debug!("Using built-in reference data");
            return Ok(Self::builtin()?);
        };

        let dir = Path::new(dir);
        let cities_path = dir.join("cities.json");
        let districts_path = dir.join("districts.json");
        let cities = std::fs::read_to_string(&cities_path)
            .with_context(|| format!("Failed to read {}", cities_path.display()))?;
        let districts = std::fs::read_to_string(&districts_path)
            .with_context(|| format!("Failed to read {}", districts_path.display()))?;

        let data = Self::from_json(&cities, &districts)
            .with_context(|| format!("Failed to load reference data from {}", dir.display()))?;
        info!(
            "Loaded {} cities and {} districts from {}",
            data.cities.len(),
            data.districts.len(),
            dir.display()
        );
        Ok(data)
    }

    fn validate(&self) -> Result<()> {
        if self.cities.is_empty() {
            return Err(SolarMapError::reference_data("No cities defined"));
        }

        let mut city_ids = HashSet::new();
        for city in &self.cities {
            if !city_ids.insert(city.id) {
                return Err(SolarMapError::reference_data(format!(
                    "Duplicate city id {}",
                    city.id
                )));
            }
            if city.parent_city_id.is_some() {
                return Err(SolarMapError::reference_data(format!(
                    "City {} must not have a parent city",
                    city.name
                )));
            }
            check_coordinates(city)?;
        }

        let mut district_ids = HashSet::new();
        for district in &self.districts {
            if !district_ids.insert(district.id) {
                return Err(SolarMapError::reference_data(format!(
                    "Duplicate district id {}",
                    district.id
                )));
            }
            match district.parent_city_id {
                Some(parent) if city_ids.contains(&parent) => {}
                Some(parent) => {
                    return Err(SolarMapError::reference_data(format!(
                        "District {} references unknown city {parent}",
                        district.name
                    )));
                }
                None => {
                    return Err(SolarMapError::reference_data(format!(
                        "District {} has no parent city",
                        district.name
                    )));
                }
            }
            check_coordinates(district)?;
        }

        Ok(())
    }

    /// All cities in reference order
    #[must_use]
    pub fn cities(&self) -> &[Location] {
        &self.cities
    }

    #[must_use]
    pub fn city(&self, id: LocationId) -> Option<&Location> {
        self.cities.iter().find(|city| city.id == id)
    }

    /// Districts of `city_id` in reference order; empty when it has none
    #[must_use]
    pub fn districts_of(&self, city_id: LocationId) -> Vec<Location> {
        self.districts
            .iter()
            .filter(|district| district.parent_city_id == Some(city_id))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn has_districts(&self, city_id: LocationId) -> bool {
        self.districts
            .iter()
            .any(|district| district.parent_city_id == Some(city_id))
    }
}

fn check_coordinates(location: &Location) -> Result<()> {
    if location.coordinates.is_valid() {
        Ok(())
    } else {
        Err(SolarMapError::reference_data(format!(
            "{} has invalid coordinates {}",
            location.name,
            location.coordinates.format()
        )))
    }
}
