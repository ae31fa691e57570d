//! PDF investment report
//!
//! The report is assembled as plain tables first so its content can be
//! checked without parsing PDF, then laid out on a single A4 page with the
//! built-in Helvetica fonts.

use chrono::{DateTime, Utc};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use super::{NO_DATA_MESSAGE, write_report};
use crate::models::SolarSpot;
use crate::simulator::{PROJECTION_YEARS, SimulationResult};
use crate::{Result, SolarMapError};

pub const REPORT_TITLE: &str = "Solar Energy Investment Report";
const FOOTER_LEFT: &str = "Green Energy Inventory - Automated Analysis Report";
const FOOTER_RIGHT: &str = "Verified by NASA POWER Data";

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const ROW_HEIGHT_MM: f32 = 7.0;
const SECTION_GAP_MM: f32 = 12.0;
const HEADER_HEIGHT_MM: f32 = 40.0;
const HEADER_BLUE: (u8, u8, u8) = (41, 128, 185);

/// A titled table of text cells
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub title: String,
    pub head: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    fn new(title: &str, head: Option<&[&str]>, rows: Vec<Vec<String>>) -> Self {
        Self {
            title: title.to_string(),
            head: head.map(|cells| cells.iter().map(ToString::to_string).collect()),
            rows,
        }
    }

    /// Value of the row whose first cell is `label`
    #[must_use]
    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.first().is_some_and(|cell| cell == label))
            .and_then(|row| row.get(1))
            .map(String::as_str)
    }
}

/// Content of the investment report for one location
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentReport {
    pub city: String,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<ReportTable>,
}

impl InvestmentReport {
    /// Assemble the report; the spot must be loaded
    pub fn build(
        spot: &SolarSpot,
        simulation: &SimulationResult,
        generated_at: DateTime<Utc>,
    ) -> Result<Self> {
        let metrics = spot
            .metrics()
            .ok_or_else(|| SolarMapError::export(NO_DATA_MESSAGE))?;
        let coordinates = spot.location.coordinates;

        let overview = ReportTable::new(
            "1. Location Overview",
            Some(&["Metric", "Value", "Source"][..]),
            vec![
                row(&["Location", spot.name(), "System"]),
                row(&[
                    "Coordinates",
                    &format!("{}, {}", coordinates.lat, coordinates.lng),
                    "System",
                ]),
                row(&["Area Type", &metrics.area_type.label().to_uppercase(), "System"]),
                row(&[
                    "Annual Sun Hours",
                    &format!("{:.2} hours/day", metrics.solar_irradiance),
                    "NASA POWER API",
                ]),
                row(&[
                    "Panel Efficiency",
                    &format!("{}% (Temp Adjusted)", metrics.efficiency_score),
                    "NASA POWER API",
                ]),
            ],
        );

        let parameters = &simulation.parameters;
        let configuration = ReportTable::new(
            "2. Simulation Parameters",
            Some(&["Parameter", "Configured Value"][..]),
            vec![
                row(&["Monthly Bill", &format!("${}", parameters.monthly_bill)]),
                row(&["System Size", &format!("{} kW", parameters.system_size_kw)]),
                row(&[
                    "Electricity Price",
                    &format!("${}/kWh", parameters.electricity_price),
                ]),
                row(&[
                    "Installation Cost",
                    &format!("${}", format_thousands(simulation.system_cost as i64)),
                ]),
            ],
        );

        let projections = ReportTable::new(
            &format!("3. Financial Projections ({PROJECTION_YEARS} Years)"),
            None,
            vec![
                row(&[
                    "Payback Period",
                    &format!("{} Years", simulation.payback_label()),
                ]),
                row(&[
                    &format!("Total Savings ({PROJECTION_YEARS}y)"),
                    &format!("${}", format_thousands(simulation.total_savings.round() as i64)),
                ]),
                row(&[
                    &format!("Net Profit ({PROJECTION_YEARS}y)"),
                    &format!("${}", format_thousands(simulation.net_profit.round() as i64)),
                ]),
                row(&[
                    "CO2 Reduction",
                    &format!("{:.1} Tons", simulation.co2_saved_tons),
                ]),
            ],
        );

        Ok(Self {
            city: spot.name().to_string(),
            generated_at,
            sections: vec![overview, configuration, projections],
        })
    }

    #[must_use]
    pub fn section(&self, title_prefix: &str) -> Option<&ReportTable> {
        self.sections
            .iter()
            .find(|section| section.title.starts_with(title_prefix))
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "Solar_Report_{}_{}.pdf",
            self.city,
            self.generated_at.timestamp_millis()
        )
    }

    /// Lay the report out and serialize it
    #[instrument(skip(self), fields(city = %self.city))]
    pub fn render(&self) -> Result<Vec<u8>> {
        let (doc, page, layer) = PdfDocument::new(
            REPORT_TITLE,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Report",
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| SolarMapError::export(format!("Failed to load font: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| SolarMapError::export(format!("Failed to load font: {e}")))?;
        let canvas = Canvas {
            layer: doc.get_page(page).get_layer(layer),
            regular,
            bold,
        };

        let (r, g, b) = HEADER_BLUE;
        canvas.set_color(r, g, b);
        canvas.band(0.0, HEADER_HEIGHT_MM);
        canvas.set_color(255, 255, 255);
        canvas.text(REPORT_TITLE, 22.0, MARGIN_MM, 20.0, true);
        canvas.text(&format!("Analysis for: {}", self.city), 12.0, MARGIN_MM, 30.0, false);
        canvas.text(
            &format!("Date: {}", self.generated_at.format("%Y-%m-%d")),
            12.0,
            150.0,
            30.0,
            false,
        );

        let mut y = 50.0;
        for section in &self.sections {
            canvas.set_color(0, 0, 0);
            canvas.text(&section.title, 16.0, MARGIN_MM, y, true);
            y += ROW_HEIGHT_MM + 2.0;

            let columns = section
                .head
                .as_ref()
                .map_or_else(|| section.rows.first().map_or(0, Vec::len), Vec::len);
            let column_width = (PAGE_WIDTH_MM - 2.0 * MARGIN_MM) / columns.max(1) as f32;

            if let Some(head) = &section.head {
                canvas.set_color(39, 174, 96);
                canvas.row(head, 11.0, y, column_width, true);
                y += ROW_HEIGHT_MM;
                canvas.set_color(0, 0, 0);
            }
            for cells in &section.rows {
                canvas.row(cells, 11.0, y, column_width, section.head.is_none());
                y += ROW_HEIGHT_MM;
            }
            y += SECTION_GAP_MM;
        }

        canvas.set_color(150, 150, 150);
        canvas.text(FOOTER_LEFT, 10.0, MARGIN_MM, 280.0, false);
        canvas.text(FOOTER_RIGHT, 10.0, 150.0, 280.0, false);

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| SolarMapError::export(format!("Failed to render PDF: {e}")))?;
        debug!("Rendered {} byte report", bytes.len());
        Ok(bytes)
    }

    /// Render and write the report into `dir`, returning the file path
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let bytes = self.render()?;
        write_report(dir, &self.file_name(), &bytes)
    }
}

/// Text drawing with top-left page coordinates
struct Canvas {
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Canvas {
    fn set_color(&self, r: u8, g: u8, b: u8) {
        self.layer.set_fill_color(Color::Rgb(Rgb::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            None,
        )));
    }

    /// Full-width filled rectangle in the current fill color
    fn band(&self, y_from_top: f32, height: f32) {
        let rect = Rect::new(
            Mm(0.0),
            Mm(PAGE_HEIGHT_MM - y_from_top - height),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM - y_from_top),
        )
        .with_mode(PaintMode::Fill);
        self.layer.add_rect(rect);
    }

    fn text(&self, text: &str, size: f32, x: f32, y_from_top: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(
            ascii_text(text),
            size,
            Mm(x),
            Mm(PAGE_HEIGHT_MM - y_from_top),
            font,
        );
    }

    fn row(&self, cells: &[String], size: f32, y_from_top: f32, column_width: f32, bold: bool) {
        for (index, cell) in cells.iter().enumerate() {
            let x = MARGIN_MM + index as f32 * column_width;
            self.text(cell, size, x, y_from_top, bold);
        }
    }
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(ToString::to_string).collect()
}

/// Group digits by thousands: 1234567 -> "1,234,567"
#[must_use]
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// The built-in fonts only cover Latin-1; fold Turkish letters to ASCII
fn ascii_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'ç' => 'c',
            'Ç' => 'C',
            'ğ' => 'g',
            'Ğ' => 'G',
            'ı' => 'i',
            'İ' => 'I',
            'ö' => 'o',
            'Ö' => 'O',
            'ş' => 's',
            'Ş' => 'S',
            'ü' => 'u',
            'Ü' => 'U',
            c if c.is_ascii() => c,
            _ => '?',
        })
        .collect()
}
