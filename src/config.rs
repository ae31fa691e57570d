//! Configuration management for `SolarMap`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::SolarMapError;
use crate::loader::{MAX_CONCURRENT_REQUESTS, RetryPolicy};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolarMapConfig {
    /// NASA POWER API settings
    #[serde(default)]
    pub nasa: NasaConfig,
    /// Progressive loader settings
    #[serde(default)]
    pub loader: LoaderConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Report output settings
    #[serde(default)]
    pub export: ExportConfig,
    /// ROI simulator defaults
    #[serde(default)]
    pub simulator: SimulatorConfig,
    /// Static city/district data
    #[serde(default)]
    pub reference: ReferenceConfig,
}

/// NASA POWER API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NasaConfig {
    /// Base URL of the POWER API
    #[serde(default = "default_nasa_base_url")]
    pub base_url: String,
    /// POWER user community (RE = renewable energy)
    #[serde(default = "default_nasa_community")]
    pub community: String,
    /// Request timeout in seconds
    #[serde(default = "default_nasa_timeout")]
    pub timeout_seconds: u32,
    /// Transport-level retries for transient failures
    #[serde(default)]
    pub max_retries: u32,
}

/// Progressive loader configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Locations fetched concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Whether failed locations are fetched again on a later run
    #[serde(default)]
    pub retry_failed: RetryPolicy,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP collector endpoint; tracing export is off when unset
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

/// Report output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory CSV and PDF reports are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

/// Default ROI simulator parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_monthly_bill")]
    pub monthly_bill: u32,
    #[serde(default = "default_system_size_kw")]
    pub system_size_kw: u32,
    /// Price per kWh in local currency
    #[serde(default = "default_electricity_price")]
    pub electricity_price: f64,
    /// Annual electricity price increase in percent
    #[serde(default = "default_inflation_rate")]
    pub inflation_rate_percent: u32,
    /// Installed cost per kW in local currency
    #[serde(default = "default_cost_per_kw")]
    pub cost_per_kw: u32,
}

/// Static reference data location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Directory with `cities.json` and `districts.json`; built-in data when unset
    #[serde(default)]
    pub data_dir: Option<String>,
}

// Default value functions
fn default_nasa_base_url() -> String {
    "https://power.larc.nasa.gov/api".to_string()
}

fn default_nasa_community() -> String {
    "RE".to_string()
}

fn default_nasa_timeout() -> u32 {
    30
}

fn default_batch_size() -> usize {
    MAX_CONCURRENT_REQUESTS
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_output_dir() -> String {
    "reports".to_string()
}

fn default_monthly_bill() -> u32 {
    1500
}

fn default_system_size_kw() -> u32 {
    5
}

fn default_electricity_price() -> f64 {
    2.8
}

fn default_inflation_rate() -> u32 {
    10
}

fn default_cost_per_kw() -> u32 {
    35_000
}

impl Default for NasaConfig {
    fn default() -> Self {
        Self {
            base_url: default_nasa_base_url(),
            community: default_nasa_community(),
            timeout_seconds: default_nasa_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            retry_failed: RetryPolicy::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            monthly_bill: default_monthly_bill(),
            system_size_kw: default_system_size_kw(),
            electricity_price: default_electricity_price(),
            inflation_rate_percent: default_inflation_rate(),
            cost_per_kw: default_cost_per_kw(),
        }
    }
}

impl SolarMapConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // SOLARMAP_NASA__BASE_URL overrides nasa.base_url
        builder = builder.add_source(
            Environment::with_prefix("SOLARMAP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: SolarMapConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("solarmap").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.nasa.base_url.is_empty() {
            self.nasa.base_url = default_nasa_base_url();
        }
        if self.nasa.community.is_empty() {
            self.nasa.community = default_nasa_community();
        }
        if self.nasa.timeout_seconds == 0 {
            self.nasa.timeout_seconds = default_nasa_timeout();
        }
        if self.loader.batch_size == 0 {
            self.loader.batch_size = default_batch_size();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.export.output_dir.is_empty() {
            self.export.output_dir = default_output_dir();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.nasa.timeout_seconds > 300 {
            return Err(SolarMapError::config("NASA POWER timeout cannot exceed 300 seconds").into());
        }

        if self.nasa.max_retries > 10 {
            return Err(SolarMapError::config("NASA POWER max retries cannot exceed 10").into());
        }

        if self.loader.batch_size == 0 || self.loader.batch_size > MAX_CONCURRENT_REQUESTS {
            return Err(SolarMapError::config(format!(
                "Loader batch size must be between 1 and {MAX_CONCURRENT_REQUESTS}"
            ))
            .into());
        }

        let simulator = &self.simulator;
        if !(500..=10_000).contains(&simulator.monthly_bill) {
            return Err(SolarMapError::config("Monthly bill must be between 500 and 10000").into());
        }

        if !(3..=25).contains(&simulator.system_size_kw) {
            return Err(SolarMapError::config("System size must be between 3 and 25 kW").into());
        }

        if simulator.inflation_rate_percent > 100 {
            return Err(SolarMapError::config("Inflation rate cannot exceed 100%").into());
        }

        if !(simulator.electricity_price.is_finite() && simulator.electricity_price > 0.0) {
            return Err(SolarMapError::config("Electricity price must be positive").into());
        }

        if simulator.cost_per_kw == 0 {
            return Err(SolarMapError::config("Cost per kW must be positive").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SolarMapError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SolarMapError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !is_http_url(&self.nasa.base_url) {
            return Err(SolarMapError::config(
                "NASA POWER base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if let Some(endpoint) = &self.logging.otlp_endpoint {
            if !is_http_url(endpoint) {
                return Err(SolarMapError::config(
                    "OTLP endpoint must be a valid HTTP or HTTPS URL",
                )
                .into());
            }
        }

        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}
