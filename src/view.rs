//! Drill-down view state
//!
//! Two modes: the country view lists every city, the city view lists one
//! city's districts. Entering a mode replaces the spot collection wholesale
//! and starts a new generation, so snapshots produced for an earlier
//! collection are recognised and dropped.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::loader::{Generation, LoadSnapshot, MAX_CONCURRENT_REQUESTS};
use crate::metrics::AreaType;
use crate::models::{Coordinates, Location, LocationId, SolarSpot};
use crate::reference::ReferenceData;
use crate::{Result, SolarMapError};

pub const COUNTRY_CENTER: Coordinates = Coordinates {
    lat: 39.0,
    lng: 35.0,
};
pub const COUNTRY_ZOOM: u8 = 6;
pub const CITY_ZOOM: u8 = 11;

/// Fewer loaded spots than this counts as still loading
pub const LOADING_THRESHOLD: usize = MAX_CONCURRENT_REQUESTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ViewMode {
    Country,
    #[serde(rename_all = "camelCase")]
    City { city_id: LocationId },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: Coordinates,
    pub zoom: u8,
}

impl Viewport {
    #[must_use]
    pub fn country() -> Self {
        Self {
            center: COUNTRY_CENTER,
            zoom: COUNTRY_ZOOM,
        }
    }

    #[must_use]
    pub fn city(center: Coordinates) -> Self {
        Self {
            center,
            zoom: CITY_ZOOM,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::country()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterBy {
    #[default]
    All,
    Suitable,
    Roof,
    OpenLand,
}

impl FilterBy {
    #[must_use]
    pub fn matches(&self, spot: &SolarSpot) -> bool {
        match self {
            FilterBy::All => true,
            FilterBy::Suitable => spot.suitable(),
            FilterBy::Roof => spot.area_type() == Some(AreaType::RoofArea),
            FilterBy::OpenLand => spot.area_type() == Some(AreaType::OpenLand),
        }
    }
}

/// List ordering; numeric keys sort descending
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    City,
    Efficiency,
    SunHours,
    Production,
}

impl SortBy {
    #[must_use]
    pub fn compare(&self, a: &SolarSpot, b: &SolarSpot) -> Ordering {
        match self {
            SortBy::City => collation_key(a.name()).cmp(&collation_key(b.name())),
            SortBy::Efficiency => b.efficiency_score().cmp(&a.efficiency_score()),
            SortBy::SunHours => b.sun_hours().total_cmp(&a.sun_hours()),
            SortBy::Production => b.annual_production().cmp(&a.annual_production()),
        }
    }
}

/// Result of a select or back action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    DrilledDown { city_id: LocationId },
    Selected { id: LocationId },
    ReturnedToCountry,
    Unchanged,
}

impl Transition {
    /// Whether the spot collection was replaced and needs loading
    #[must_use]
    pub fn replaces_collection(&self) -> bool {
        matches!(
            self,
            Transition::DrilledDown { .. } | Transition::ReturnedToCountry
        )
    }
}

#[derive(Debug, Clone)]
pub struct ViewState {
    mode: ViewMode,
    spots: Vec<SolarSpot>,
    generation: Generation,
    selected: Option<LocationId>,
    viewport: Viewport,
    filter: FilterBy,
    sort: SortBy,
}

impl ViewState {
    /// Initial country view with every city pending
    #[must_use]
    pub fn country(reference: &ReferenceData) -> Self {
        Self {
            mode: ViewMode::Country,
            spots: pending_spots(reference.cities().to_vec()),
            generation: Generation::initial(),
            selected: None,
            viewport: Viewport::country(),
            filter: FilterBy::default(),
            sort: SortBy::default(),
        }
    }

    /// Select a spot of the active collection.
    ///
    /// In the country view, a city with districts drills down into the city
    /// view; any other selection only marks the spot selected.
    pub fn select(&mut self, reference: &ReferenceData, id: LocationId) -> Result<Transition> {
        let Some(spot) = self.spots.iter().find(|spot| spot.id() == id) else {
            return Err(SolarMapError::validation(format!(
                "Location {id} is not in the current view"
            )));
        };

        if self.mode == ViewMode::Country && reference.has_districts(id) {
            let center = spot.location.coordinates;
            self.replace_collection(
                ViewMode::City { city_id: id },
                reference.districts_of(id),
                Viewport::city(center),
            );
            debug!("Drilled down into city {} ({})", id, self.generation);
            return Ok(Transition::DrilledDown { city_id: id });
        }

        self.selected = Some(id);
        Ok(Transition::Selected { id })
    }

    /// Leave the city view; a no-op in the country view
    pub fn back(&mut self, reference: &ReferenceData) -> Transition {
        match self.mode {
            ViewMode::Country => Transition::Unchanged,
            ViewMode::City { .. } => {
                self.replace_collection(
                    ViewMode::Country,
                    reference.cities().to_vec(),
                    Viewport::country(),
                );
                debug!("Returned to country view ({})", self.generation);
                Transition::ReturnedToCountry
            }
        }
    }

    fn replace_collection(&mut self, mode: ViewMode, locations: Vec<Location>, viewport: Viewport) {
        self.mode = mode;
        self.spots = pending_spots(locations);
        self.generation = self.generation.next();
        self.selected = None;
        self.viewport = viewport;
    }

    /// Adopt a loader snapshot; snapshots of other generations are ignored
    pub fn apply_snapshot(&mut self, snapshot: LoadSnapshot) -> bool {
        if snapshot.generation != self.generation {
            debug!(
                "Ignoring snapshot of generation {} (active {})",
                snapshot.generation, self.generation
            );
            return false;
        }
        self.spots = snapshot.spots;
        true
    }

    #[must_use]
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    #[must_use]
    pub fn spots(&self) -> &[SolarSpot] {
        &self.spots
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn filter(&self) -> FilterBy {
        self.filter
    }

    #[must_use]
    pub fn sort(&self) -> SortBy {
        self.sort
    }

    pub fn set_filter(&mut self, filter: FilterBy) {
        self.filter = filter;
    }

    pub fn set_sort(&mut self, sort: SortBy) {
        self.sort = sort;
    }

    #[must_use]
    pub fn selected_spot(&self) -> Option<&SolarSpot> {
        let id = self.selected?;
        self.spots.iter().find(|spot| spot.id() == id)
    }

    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.spots.iter().filter(|spot| spot.is_loaded()).count()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loaded_count() < LOADING_THRESHOLD
    }

    /// Loaded spots passing the filter, in sort order
    #[must_use]
    pub fn visible_spots(&self) -> Vec<&SolarSpot> {
        let mut visible: Vec<&SolarSpot> = self
            .spots
            .iter()
            .filter(|spot| spot.is_loaded() && self.filter.matches(spot))
            .collect();
        visible.sort_by(|a, b| self.sort.compare(a, b));
        visible
    }
}

fn pending_spots(locations: Vec<Location>) -> Vec<SolarSpot> {
    locations.into_iter().map(SolarSpot::new).collect()
}

const TURKISH_ALPHABET: &str = "abcçdefgğhıijklmnoöprsştuüvyz";
const LETTER_BASE: u32 = 0x1_0000;

/// Sort key following Turkish alphabetical order, case-insensitive
fn collation_key(name: &str) -> Vec<u32> {
    name.chars()
        .map(|c| {
            let lower = match c {
                'I' => 'ı',
                'İ' => 'i',
                other => other.to_lowercase().next().unwrap_or(other),
            };
            match TURKISH_ALPHABET.chars().position(|letter| letter == lower) {
                Some(position) => LETTER_BASE + position as u32,
                None if lower.is_alphabetic() => LETTER_BASE + 64 + u32::from(lower),
                None => u32::from(lower),
            }
        })
        .collect()
}
