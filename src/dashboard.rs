//! Dashboard state container
//!
//! Owns the reference data, the view state and the loader. Transitions only
//! swap the collection and announce the new generation; loading runs on its
//! own task and its snapshots are applied back through [`Dashboard::apply_snapshot`],
//! so the view stays free to change while a load is in flight.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::Result;
use crate::climate::ClimateSource;
use crate::config::SolarMapConfig;
use crate::loader::{Generation, LoadHandle, LoadSnapshot, LoadSummary, ProgressiveLoader};
use crate::models::{LocationId, SolarSpot};
use crate::reference::ReferenceData;
use crate::view::{FilterBy, SortBy, Transition, ViewState};

pub struct Dashboard {
    reference: ReferenceData,
    view: ViewState,
    loader: ProgressiveLoader,
    active_generation: watch::Sender<Generation>,
}

impl Dashboard {
    #[must_use]
    pub fn new(
        reference: ReferenceData,
        source: Arc<dyn ClimateSource>,
        config: &SolarMapConfig,
    ) -> Self {
        let view = ViewState::country(&reference);
        let (active_generation, _) = watch::channel(view.generation());
        Self {
            loader: ProgressiveLoader::new(source, &config.loader),
            reference,
            view,
            active_generation,
        }
    }

    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[must_use]
    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Watch the active generation
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Generation> {
        self.active_generation.subscribe()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&SolarSpot> {
        self.view.selected_spot()
    }

    pub fn set_filter(&mut self, filter: FilterBy) {
        self.view.set_filter(filter);
    }

    pub fn set_sort(&mut self, sort: SortBy) {
        self.view.set_sort(sort);
    }

    /// Select a spot. Drilling down replaces the collection and supersedes
    /// any load still running for the previous one.
    pub fn select(&mut self, id: LocationId) -> Result<Transition> {
        let transition = self.view.select(&self.reference, id)?;
        self.after_transition(&transition);
        Ok(transition)
    }

    /// Return to the country view with a fresh collection
    pub fn back(&mut self) -> Transition {
        let transition = self.view.back(&self.reference);
        self.after_transition(&transition);
        transition
    }

    fn after_transition(&self, transition: &Transition) {
        if transition.replaces_collection() {
            let generation = self.view.generation();
            let previous = self.active_generation.send_replace(generation);
            debug!("Active generation {} replaces {}", generation, previous);
        }
    }

    /// Start loading whatever the active collection still needs
    #[must_use]
    pub fn start_load(&self) -> LoadHandle {
        self.loader.spawn(
            self.view.generation(),
            self.view.spots().to_vec(),
            self.active_generation.subscribe(),
        )
    }

    /// Apply a snapshot from a running load; stale generations are ignored
    pub fn apply_snapshot(&mut self, snapshot: LoadSnapshot) -> bool {
        self.view.apply_snapshot(snapshot)
    }

    /// Load the active collection to completion
    pub async fn refresh(&mut self) -> LoadSummary {
        self.refresh_with_progress(|_| {}).await
    }

    /// Load the active collection, calling `progress` after every applied snapshot
    #[instrument(skip(self, progress), fields(generation = self.view.generation().value()))]
    pub async fn refresh_with_progress<F>(&mut self, progress: F) -> LoadSummary
    where
        F: FnMut(&ViewState),
    {
        let load = self.start_load();
        self.drain(load, progress).await
    }

    /// Apply every snapshot of `load` as it arrives and return its summary
    pub async fn drain<F>(&mut self, mut load: LoadHandle, mut progress: F) -> LoadSummary
    where
        F: FnMut(&ViewState),
    {
        while let Some(snapshot) = load.next_snapshot().await {
            if self.apply_snapshot(snapshot) {
                progress(&self.view);
            }
        }
        let summary = load.finish().await;

        info!(
            "{} of {} locations loaded",
            self.view.loaded_count(),
            self.view.spots().len()
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::ClimateObservation;
    use crate::models::{Coordinates, Location};
    use crate::view::ViewMode;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ClimateSource for CountingSource {
        async fn annual_climate(&self, _coordinates: Coordinates) -> Result<ClimateObservation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ClimateObservation {
                irradiance: 4.4,
                temperature: 18.0,
            })
        }
    }

    fn reference() -> ReferenceData {
        let cities = (1..=7)
            .map(|id| {
                Location::city(
                    id,
                    &format!("City {id}"),
                    Coordinates::new(36.0 + f64::from(id) * 0.5, 30.0),
                    120_000,
                )
            })
            .collect();
        let districts = vec![
            Location::district(101, "North", Coordinates::new(36.6, 30.1), 125_000, 1),
            Location::district(102, "South", Coordinates::new(36.4, 30.0), 118_000, 1),
        ];
        ReferenceData::new(cities, districts).unwrap()
    }

    fn dashboard(source: Arc<CountingSource>) -> Dashboard {
        Dashboard::new(reference(), source, &SolarMapConfig::default())
    }

    #[tokio::test]
    async fn test_refresh_reports_progress() {
        let source = Arc::new(CountingSource::default());
        let mut dashboard = dashboard(source.clone());

        let mut progress = Vec::new();
        let summary = dashboard
            .refresh_with_progress(|view| progress.push(view.loaded_count()))
            .await;

        assert_eq!(progress, vec![5, 7]);
        assert_eq!(summary.snapshots, 2);
        assert!(!dashboard.view().is_loading());
        assert_eq!(source.calls.load(Ordering::SeqCst), 7);

        // Nothing left to fetch
        let summary = dashboard.refresh().await;
        assert_eq!(summary.fetched, 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_drill_down_and_back_reload() {
        let source = Arc::new(CountingSource::default());
        let mut dashboard = dashboard(source.clone());
        dashboard.refresh().await;

        let transition = dashboard.select(1).unwrap();
        assert_eq!(transition, Transition::DrilledDown { city_id: 1 });
        assert_eq!(dashboard.view().mode(), ViewMode::City { city_id: 1 });
        assert_eq!(*dashboard.subscribe().borrow(), dashboard.view().generation());
        // The transition itself fetches nothing
        assert_eq!(dashboard.view().loaded_count(), 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 7);

        dashboard.refresh().await;
        assert_eq!(dashboard.view().loaded_count(), 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 9);

        let transition = dashboard.back();
        assert_eq!(transition, Transition::ReturnedToCountry);
        dashboard.refresh().await;
        assert_eq!(dashboard.view().loaded_count(), 7);
        assert_eq!(source.calls.load(Ordering::SeqCst), 16);
    }

    #[tokio::test]
    async fn test_select_without_districts_does_not_load() {
        let source = Arc::new(CountingSource::default());
        let mut dashboard = dashboard(source.clone());
        dashboard.refresh().await;

        dashboard.select(3).unwrap();
        assert_eq!(dashboard.selected().unwrap().name(), "City 3");
        assert!(dashboard.selected().unwrap().is_loaded());
        assert_eq!(source.calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_select_unknown_is_error() {
        let mut dashboard = dashboard(Arc::new(CountingSource::default()));
        assert!(dashboard.select(101).is_err());
    }

    #[tokio::test]
    async fn test_stale_load_is_not_applied() {
        let source = Arc::new(CountingSource::default());
        let mut dashboard = dashboard(source.clone());
        dashboard.refresh().await;

        dashboard.select(1).unwrap();
        let districts = dashboard.start_load();
        dashboard.back();
        assert_ne!(districts.generation(), dashboard.view().generation());

        let summary = dashboard.drain(districts, |_| panic!("stale snapshot applied")).await;
        assert!(summary.superseded);
        assert_eq!(dashboard.view().mode(), ViewMode::Country);
        assert_eq!(dashboard.view().loaded_count(), 0);
    }
}
