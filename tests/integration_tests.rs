//! Integration tests for the SolarMap dashboard

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use solarmap::config::NasaConfig;
use solarmap::{
    ClimateObservation, ClimateSource, Coordinates, Dashboard, FilterBy, InvestmentReport,
    NasaPowerClient, ReferenceData, SimulationParameters, SolarMapConfig, SolarMapError, SortBy,
    Transition, ViewMode, csv_report, simulate, write_csv_report,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Deterministic source: irradiance grows with latitude, one latitude fails
struct SyntheticSource {
    calls: AtomicUsize,
    failing_lat: Option<f64>,
}

impl SyntheticSource {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing_lat: None,
        }
    }

    fn failing_at(lat: f64) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing_lat: Some(lat),
        }
    }
}

#[async_trait]
impl ClimateSource for SyntheticSource {
    async fn annual_climate(&self, coordinates: Coordinates) -> solarmap::Result<ClimateObservation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.failing_lat == Some(coordinates.lat) {
            return Err(SolarMapError::upstream("503 Service Unavailable"));
        }
        Ok(ClimateObservation {
            irradiance: 3.0 + (coordinates.lat - 36.0) * 0.3,
            temperature: 16.0,
        })
    }
}

/// Source whose calls wait until the gate is opened
struct GatedSource {
    calls: AtomicUsize,
    open: watch::Sender<bool>,
}

impl GatedSource {
    fn new() -> Self {
        let (open, _) = watch::channel(true);
        Self {
            calls: AtomicUsize::new(0),
            open,
        }
    }

    fn set_open(&self, open: bool) {
        self.open.send_replace(open);
    }
}

#[async_trait]
impl ClimateSource for GatedSource {
    async fn annual_climate(&self, coordinates: Coordinates) -> solarmap::Result<ClimateObservation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut open = self.open.subscribe();
        if open.wait_for(|open| *open).await.is_err() {
            return Err(SolarMapError::upstream("gate dropped"));
        }
        Ok(ClimateObservation {
            irradiance: 3.0 + (coordinates.lat - 36.0) * 0.3,
            temperature: 16.0,
        })
    }
}

fn builtin_dashboard(source: Arc<SyntheticSource>) -> Dashboard {
    let reference = ReferenceData::builtin().unwrap();
    Dashboard::new(reference, source, &SolarMapConfig::default())
}

#[tokio::test]
async fn test_country_view_loads_all_cities() {
    let source = Arc::new(SyntheticSource::new());
    let mut dashboard = builtin_dashboard(source.clone());
    let cities = dashboard.reference().cities().len();

    let mut progress = Vec::new();
    let summary = dashboard
        .refresh_with_progress(|view| progress.push(view.loaded_count()))
        .await;

    assert_eq!(summary.loaded, cities);
    assert_eq!(summary.snapshots, cities.div_ceil(5));
    assert_eq!(progress.last().copied(), Some(cities));
    assert!(progress.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(dashboard.view().visible_spots().len(), cities);
    assert_eq!(source.calls.load(Ordering::SeqCst), cities);
}

#[tokio::test]
async fn test_drill_down_round_trip_discards_enrichment() {
    let source = Arc::new(SyntheticSource::new());
    let mut dashboard = builtin_dashboard(source.clone());
    dashboard.refresh().await;
    let cities = dashboard.view().spots().len();

    // Ankara has districts in the built-in data
    let transition = dashboard.select(6).unwrap();
    assert_eq!(transition, Transition::DrilledDown { city_id: 6 });
    assert_eq!(dashboard.view().mode(), ViewMode::City { city_id: 6 });
    dashboard.refresh().await;
    let districts = dashboard.reference().districts_of(6).len();
    assert_eq!(dashboard.view().loaded_count(), districts);

    let district_id = dashboard.view().spots()[0].id();
    let transition = dashboard.select(district_id).unwrap();
    assert_eq!(transition, Transition::Selected { id: district_id });
    assert!(dashboard.selected().unwrap().is_loaded());

    let transition = dashboard.back();
    assert_eq!(transition, Transition::ReturnedToCountry);
    assert!(dashboard.selected().is_none());
    assert_eq!(dashboard.view().loaded_count(), 0);
    dashboard.refresh().await;
    assert_eq!(dashboard.view().loaded_count(), cities);
    assert_eq!(
        source.calls.load(Ordering::SeqCst),
        cities + districts + cities
    );
}

#[tokio::test]
async fn test_back_during_district_load_discards_districts() {
    let source = Arc::new(GatedSource::new());
    let reference = ReferenceData::builtin().unwrap();
    let mut dashboard = Dashboard::new(reference, source.clone(), &SolarMapConfig::default());
    dashboard.refresh().await;
    let cities = dashboard.view().spots().len();
    let city_ids: Vec<_> = dashboard.view().spots().iter().map(|spot| spot.id()).collect();

    // Istanbul has seven districts; hold their first batch in flight
    source.set_open(false);
    let transition = dashboard.select(34).unwrap();
    assert_eq!(transition, Transition::DrilledDown { city_id: 34 });
    let mut districts = dashboard.start_load();
    tokio::time::timeout(Duration::from_secs(5), async {
        while source.calls.load(Ordering::SeqCst) < cities + 5 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert_eq!(dashboard.view().loaded_count(), 0);

    let transition = dashboard.back();
    assert_eq!(transition, Transition::ReturnedToCountry);
    source.set_open(true);

    let mut applied = 0;
    while let Some(snapshot) = districts.next_snapshot().await {
        if dashboard.apply_snapshot(snapshot) {
            applied += 1;
        }
    }
    let summary = districts.finish().await;
    assert_eq!(applied, 0);
    assert!(summary.superseded);
    assert_eq!(summary.fetched, 5);
    assert_eq!(summary.snapshots, 0);
    assert_eq!(source.calls.load(Ordering::SeqCst), cities + 5);

    assert_eq!(dashboard.view().mode(), ViewMode::Country);
    assert!(
        dashboard
            .view()
            .spots()
            .iter()
            .all(|spot| city_ids.contains(&spot.id()) && spot.is_pending())
    );

    let summary = dashboard.refresh().await;
    assert!(!summary.superseded);
    assert_eq!(dashboard.view().loaded_count(), cities);
}

#[tokio::test]
async fn test_failed_location_is_hidden_and_not_retried() {
    // Konya's latitude in the built-in data
    let source = Arc::new(SyntheticSource::failing_at(37.8746));
    let mut dashboard = builtin_dashboard(source.clone());

    let summary = dashboard.refresh().await;
    assert_eq!(summary.failed, 1);
    let konya = dashboard
        .view()
        .spots()
        .iter()
        .find(|spot| spot.id() == 42)
        .unwrap();
    assert!(konya.is_failed());
    assert!(
        dashboard
            .view()
            .visible_spots()
            .iter()
            .all(|spot| spot.id() != 42)
    );

    let calls = source.calls.load(Ordering::SeqCst);
    let summary = dashboard.refresh().await;
    assert_eq!(summary.fetched, 0);
    assert_eq!(source.calls.load(Ordering::SeqCst), calls);
}

#[tokio::test]
async fn test_csv_export_follows_view_order() {
    let mut dashboard = builtin_dashboard(Arc::new(SyntheticSource::new()));
    dashboard.refresh().await;
    dashboard.set_filter(FilterBy::Suitable);
    dashboard.set_sort(SortBy::SunHours);

    let visible = dashboard.view().visible_spots();
    assert!(!visible.is_empty());
    let csv = csv_report(visible.iter().copied()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), visible.len() + 1);
    for (line, spot) in lines[1..].iter().zip(&visible) {
        assert!(line.starts_with(&format!("\"{}\",", spot.name())));
        assert!(line.contains("\"Suitable\""));
    }

    let dir = tempfile::tempdir().unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 6, 21).unwrap();
    let path = write_csv_report(dir.path(), visible.iter().copied(), date).unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), csv);
}

#[tokio::test]
async fn test_export_refused_before_loading() {
    let dashboard = builtin_dashboard(Arc::new(SyntheticSource::new()));
    let err = csv_report(dashboard.view().visible_spots().iter().copied()).unwrap_err();
    assert!(matches!(err, SolarMapError::Export { .. }));
    assert!(err.user_message().contains("No data available"));
}

#[tokio::test]
async fn test_investment_report_for_selected_city() {
    let mut dashboard = builtin_dashboard(Arc::new(SyntheticSource::new()));
    dashboard.refresh().await;

    // Konya has districts, Trabzon does not
    dashboard.select(61).unwrap();
    let spot = dashboard.selected().unwrap();
    assert_eq!(spot.name(), "Trabzon");

    let simulation = simulate(Some(spot.sun_hours()), &SimulationParameters::default()).unwrap();
    let generated_at = Utc.with_ymd_and_hms(2025, 6, 21, 9, 30, 0).unwrap();
    let report = InvestmentReport::build(spot, &simulation, generated_at).unwrap();

    assert_eq!(report.sections.len(), 3);
    assert!(report.file_name().starts_with("Solar_Report_Trabzon_"));
    assert!(report.render().unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_nasa_client_against_mock_server() {
    let server = httpmock::MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/api/temporal/climatology/point")
                .query_param("latitude", "39.9334");
            then.status(200).json_body(serde_json::json!({
                "properties": {"parameter": {
                    "ALLSKY_SFC_SW_DWN": {"ANN": 4.52},
                    "T2M": {"ANN": 12.1}
                }}
            }));
        })
        .await;

    let config = NasaConfig {
        base_url: server.url("/api"),
        ..NasaConfig::default()
    };
    let client = NasaPowerClient::new(&config).unwrap();
    let metrics = solarmap::fetch_solar_metrics(&client, Coordinates::new(39.9334, 32.8597))
        .await
        .unwrap();

    assert_eq!(metrics.solar_irradiance, 4.52);
    assert!(metrics.suitable);
    assert!((50..=99).contains(&metrics.efficiency_score));
}
