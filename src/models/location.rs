//! Location model for cities, districts and their coordinates

use serde::{Deserialize, Serialize};

use crate::{Result, SolarMapError};

/// Identifier of a city or district, unique within its collection
pub type LocationId = u32;

/// Geographic point in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees (-90..=90)
    pub lat: f64,
    /// Longitude in decimal degrees (-180..=180)
    pub lng: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and inside their valid ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Reject coordinates outside the valid ranges
    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SolarMapError::validation(format!(
                "Coordinates out of range: lat={}, lng={}",
                self.lat, self.lng
            )))
        }
    }

    /// Format as a coordinates string
    #[must_use]
    pub fn format(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// A city, or a district belonging to a city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    /// Display name
    #[serde(alias = "city")]
    pub name: String,
    pub coordinates: Coordinates,
    /// Installation cost estimate in currency units
    pub base_cost: u32,
    /// Owning city, present only for districts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_city_id: Option<LocationId>,
}

impl Location {
    /// Create a city-level location
    #[must_use]
    pub fn city(id: LocationId, name: &str, coordinates: Coordinates, base_cost: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            coordinates,
            base_cost,
            parent_city_id: None,
        }
    }

    /// Create a district of `parent_city_id`
    #[must_use]
    pub fn district(
        id: LocationId,
        name: &str,
        coordinates: Coordinates,
        base_cost: u32,
        parent_city_id: LocationId,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            coordinates,
            base_cost,
            parent_city_id: Some(parent_city_id),
        }
    }

    #[must_use]
    pub fn is_district(&self) -> bool {
        self.parent_city_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(41.0, 29.0).is_valid());
        assert!(Coordinates::new(-90.0, 180.0).is_valid());
        assert!(!Coordinates::new(90.5, 29.0).is_valid());
        assert!(!Coordinates::new(41.0, -180.1).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());

        let err = Coordinates::new(120.0, 0.0).validate().unwrap_err();
        assert!(matches!(err, SolarMapError::Validation { .. }));
    }

    #[test]
    fn test_location_deserializes_reference_format() {
        let json = r#"{"id": 6, "city": "Ankara", "coordinates": {"lat": 39.93, "lng": 32.86}, "baseCost": 140000}"#;
        let location: Location = serde_json::from_str(json).unwrap();
        assert_eq!(location.name, "Ankara");
        assert_eq!(location.base_cost, 140_000);
        assert!(!location.is_district());

        let json = r#"{"id": 601, "name": "Cankaya", "coordinates": {"lat": 39.9, "lng": 32.86}, "baseCost": 150000, "parentCityId": 6}"#;
        let district: Location = serde_json::from_str(json).unwrap();
        assert_eq!(district.parent_city_id, Some(6));
        assert!(district.is_district());
    }

    #[test]
    fn test_format_coordinates() {
        let coordinates = Coordinates::new(41.008_2, 28.978_4);
        assert_eq!(coordinates.format(), "41.0082, 28.9784");
    }
}
