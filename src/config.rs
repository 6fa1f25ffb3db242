//! Configuration management for the `CitySense` service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::CitySenseError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `CitySense` service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CitySenseConfig {
    /// Forecast API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Geocoding API configuration
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Language model configuration
    #[serde(default)]
    pub narrative: NarrativeConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Report store configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// City suggestion configuration
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Forecast API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the Open-Meteo API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Number of forecast days to request
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Geocoding API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL for the Nominatim API
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// User agent Nominatim requires on every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_geocoding_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Language model configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeConfig {
    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_narrative_base_url")]
    pub base_url: String,
    /// Model name
    #[serde(default = "default_narrative_model")]
    pub model: String,
    /// API key (required to run analyses)
    pub api_key: Option<String>,
    /// Sampling temperature
    #[serde(default = "default_narrative_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_narrative_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
    /// Forecast TTL in seconds
    #[serde(default = "default_weather_ttl")]
    pub weather_ttl_seconds: u64,
    /// City suggestion TTL in seconds
    #[serde(default = "default_suggestions_ttl")]
    pub suggestions_ttl_seconds: u64,
}

/// Report store configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Report database directory
    #[serde(default = "default_storage_location")]
    pub location: String,
}

/// City suggestion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsConfig {
    /// GeoNames cities table (tab separated)
    #[serde(default = "default_cities_file")]
    pub cities_file: String,
    /// Maximum number of suggestions
    #[serde(default = "default_suggestion_limit")]
    pub limit: usize,
    /// Suggestions must score strictly above this (0-100)
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    /// Shorter queries return nothing
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (compact or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP server configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_forecast_days() -> u8 {
    14
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    "CitySense-App".to_string()
}

fn default_geocoding_timeout() -> u32 {
    15
}

fn default_narrative_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_narrative_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_narrative_temperature() -> f32 {
    0.3
}

fn default_narrative_timeout() -> u32 {
    60
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("citysense").to_string_lossy().into_owned())
        .unwrap_or_else(|| ".cache/citysense".to_string())
}

fn default_weather_ttl() -> u64 {
    3600
}

fn default_suggestions_ttl() -> u64 {
    86400
}

fn default_storage_location() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("citysense").join("reports").to_string_lossy().into_owned())
        .unwrap_or_else(|| ".data/citysense/reports".to_string())
}

fn default_cities_file() -> String {
    "data/cities15000.txt".to_string()
}

fn default_suggestion_limit() -> usize {
    10
}

fn default_min_score() -> f64 {
    65.0
}

fn default_min_query_chars() -> usize {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u32 {
    120
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            forecast_days: default_forecast_days(),
            timeout_seconds: default_weather_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_geocoding_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            base_url: default_narrative_base_url(),
            model: default_narrative_model(),
            api_key: None,
            temperature: default_narrative_temperature(),
            timeout_seconds: default_narrative_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
            weather_ttl_seconds: default_weather_ttl(),
            suggestions_ttl_seconds: default_suggestions_ttl(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            location: default_storage_location(),
        }
    }
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            cities_file: default_cities_file(),
            limit: default_suggestion_limit(),
            min_score: default_min_score(),
            min_query_chars: default_min_query_chars(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl CitySenseConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // CITYSENSE_NARRATIVE__API_KEY -> narrative.api_key
        builder = builder.add_source(
            Environment::with_prefix("CITYSENSE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CitySenseConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("citysense").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.forecast_days == 0 {
            self.weather.forecast_days = default_forecast_days();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.user_agent.is_empty() {
            self.geocoding.user_agent = default_user_agent();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_geocoding_timeout();
        }
        if self.narrative.base_url.is_empty() {
            self.narrative.base_url = default_narrative_base_url();
        }
        if self.narrative.model.is_empty() {
            self.narrative.model = default_narrative_model();
        }
        if self.narrative.timeout_seconds == 0 {
            self.narrative.timeout_seconds = default_narrative_timeout();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.cache.weather_ttl_seconds == 0 {
            self.cache.weather_ttl_seconds = default_weather_ttl();
        }
        if self.cache.suggestions_ttl_seconds == 0 {
            self.cache.suggestions_ttl_seconds = default_suggestions_ttl();
        }
        if self.storage.location.is_empty() {
            self.storage.location = default_storage_location();
        }
        if self.suggestions.limit == 0 {
            self.suggestions.limit = default_suggestion_limit();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        // The key is optional at load time; analyses fail without it
        if let Some(api_key) = &self.narrative.api_key {
            if api_key.trim().is_empty() {
                return Err(CitySenseError::config(
                    "Narrative API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() > 200 {
                return Err(CitySenseError::config(
                    "Narrative API key appears to be invalid (too long). Please check your API key.",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.forecast_days > 16 {
            return Err(CitySenseError::config("Forecast days cannot exceed 16").into());
        }

        for (name, timeout) in [
            ("Weather", self.weather.timeout_seconds),
            ("Geocoding", self.geocoding.timeout_seconds),
            ("Narrative", self.narrative.timeout_seconds),
        ] {
            if timeout > 300 {
                return Err(CitySenseError::config(format!(
                    "{name} API timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        for (name, retries) in [
            ("Weather", self.weather.max_retries),
            ("Geocoding", self.geocoding.max_retries),
            ("Narrative", self.narrative.max_retries),
        ] {
            if retries > 10 {
                return Err(
                    CitySenseError::config(format!("{name} API max retries cannot exceed 10"))
                        .into(),
                );
            }
        }

        if !(0.0..=2.0).contains(&self.narrative.temperature) {
            return Err(
                CitySenseError::config("Narrative temperature must be between 0 and 2").into(),
            );
        }

        if self.cache.weather_ttl_seconds > 7 * 86400 {
            return Err(CitySenseError::config("Weather cache TTL cannot exceed 1 week").into());
        }

        if self.suggestions.limit > 100 {
            return Err(CitySenseError::config("Suggestion limit cannot exceed 100").into());
        }

        if !(0.0..=100.0).contains(&self.suggestions.min_score) {
            return Err(
                CitySenseError::config("Suggestion score cut-off must be between 0 and 100")
                    .into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CitySenseError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["compact", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CitySenseError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Weather", &self.weather.base_url),
            ("Geocoding", &self.geocoding.base_url),
            ("Narrative", &self.narrative.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CitySenseError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Address the HTTP server binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
