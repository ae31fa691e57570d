use anyhow::{Context, Result};
use chrono::Utc;
use solarmap::{
    ClimateSource, Dashboard, InvestmentReport, NasaPowerClient, ReferenceData,
    SimulationParameters, SolarMapConfig, SolarSpot, SortBy, VERSION, logging, simulate,
    write_csv_report,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = SolarMapConfig::load_from_path(config_path)
        .context("Failed to load configuration")?;
    let _telemetry = logging::init(&config.logging)?;
    info!("SolarMap {} starting", VERSION);

    let reference = ReferenceData::load(&config.reference)?;
    let source: Arc<dyn ClimateSource> = Arc::new(NasaPowerClient::new(&config.nasa)?);
    let mut dashboard = Dashboard::new(reference, source, &config);

    let summary = dashboard
        .refresh_with_progress(|view| {
            info!(
                "{} of {} locations loaded",
                view.loaded_count(),
                view.spots().len()
            );
        })
        .await;
    if summary.failed > 0 {
        warn!("{} locations could not be loaded", summary.failed);
    }

    dashboard.set_sort(SortBy::Efficiency);
    let visible = dashboard.view().visible_spots();
    print_locations(&visible);

    let output_dir = PathBuf::from(&config.export.output_dir);
    let now = Utc::now();
    match write_csv_report(&output_dir, visible.iter().copied(), now.date_naive()) {
        Ok(path) => println!("\nCSV report: {}", path.display()),
        Err(e) => eprintln!("\n{}", e.user_message()),
    }

    let Some(best) = visible.first() else {
        eprintln!("No location data available, skipping investment report");
        return Ok(());
    };
    println!("\nBest location\n{best}");

    write_investment_report(best, &config, &output_dir)?;
    Ok(())
}

fn print_locations(spots: &[&SolarSpot]) {
    println!(
        "{:<4}{:<16}{:>10}{:>12}{:>14}{:>10}  {}",
        "#", "Location", "Sun h/day", "Efficiency", "kWh/year", "Payback", "Area"
    );
    for (rank, spot) in spots.iter().enumerate() {
        let area = spot.area_type().map_or("-", |area| area.display_name());
        println!(
            "{:<4}{:<16}{:>10.2}{:>11}%{:>14}{:>10.1}  {}",
            rank + 1,
            spot.name(),
            spot.sun_hours(),
            spot.efficiency_score(),
            spot.annual_production(),
            spot.payback_period_years(),
            area
        );
    }
}

fn write_investment_report(spot: &SolarSpot, config: &SolarMapConfig, output_dir: &Path) -> Result<()> {
    let parameters = SimulationParameters::from(&config.simulator);
    let simulation = simulate(Some(spot.sun_hours()), &parameters)?;
    println!(
        "\n{} kW system: payback in {} years, net profit {:.0} over 20 years",
        parameters.system_size_kw,
        simulation.payback_label(),
        simulation.net_profit
    );

    let report = InvestmentReport::build(spot, &simulation, Utc::now())?;
    let path = report
        .write_to(output_dir)
        .with_context(|| format!("Failed to write report for {}", spot.name()))?;
    println!("PDF report: {}", path.display());
    Ok(())
}
