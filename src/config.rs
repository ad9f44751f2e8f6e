use crate::error::ConfigError;
use crate::models::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Environment variable holding the catalog API key.
pub const API_KEY_VAR: &str = "TICKETMASTER_API_KEY";

pub const DEFAULT_CATALOG_URL: &str = "https://app.ticketmaster.com/discovery/v2/events.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub location: LocationConfig,
    pub catalog: CatalogConfig,
    pub ui: UiConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ip,     // IP geolocation through ip-api.com
    Manual, // Fixed manual_lat / manual_lon
    None,   // Behave as if no geolocation is available
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LocationConfig {
    pub provider: ProviderKind,
    pub lookup_ip: String, // Empty asks the service about our own address
    pub manual_lat: f64,
    pub manual_lon: f64,
    pub fallback_lat: f64, // Used whenever acquisition fails
    pub fallback_lon: f64,
    pub timeout_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub radius: u32,
    pub unit: String,
    pub classification: String,
    pub request_timeout_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub zoom: u8,
    pub tick_rate_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Ip,
            lookup_ip: String::new(),
            manual_lat: 51.5074,
            manual_lon: -0.1278,
            fallback_lat: 51.5074,
            fallback_lon: -0.1278,
            timeout_ms: 10_000,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            radius: 20,
            unit: "km".to_string(),
            classification: "Music".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            zoom: 10,
            tick_rate_ms: 150,
        }
    }
}

impl Config {
    /// Loads config.toml from the root directory.
    /// If it doesn't exist, creates a default one.
    pub fn load() -> Self {
        Self::load_from("config.toml")
    }

    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if let Ok(content) = fs::read_to_string(path) {
            return match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            };
        }

        // Save default config to disk for the user to edit later
        let default_config = Self::default();
        match toml::to_string_pretty(&default_config) {
            Ok(toml_string) => {
                if fs::write(path, toml_string).is_err() {
                    warn!("Could not write default {} to disk.", path.display());
                }
            }
            Err(e) => warn!("Could not serialize default config: {}", e),
        }

        info!("Loaded default configuration.");
        default_config
    }

    pub fn fallback_position(&self) -> Position {
        Position::new(self.location.fallback_lat, self.location.fallback_lon)
    }

    pub fn manual_position(&self) -> Position {
        Position::new(self.location.manual_lat, self.location.manual_lon)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fallback_position().is_valid() {
            return Err(ConfigError::Invalid(format!(
                "fallback position {} is outside the valid coordinate range",
                self.fallback_position()
            )));
        }
        if self.location.provider == ProviderKind::Manual && !self.manual_position().is_valid() {
            return Err(ConfigError::Invalid(format!(
                "manual position {} is outside the valid coordinate range",
                self.manual_position()
            )));
        }
        if self.catalog.radius == 0 {
            return Err(ConfigError::Invalid("catalog radius must be positive".into()));
        }
        if self.catalog.classification.trim().is_empty() {
            return Err(ConfigError::Invalid("catalog classification is empty".into()));
        }
        if self.ui.tick_rate_ms == 0 {
            return Err(ConfigError::Invalid("ui tick_rate_ms must be positive".into()));
        }
        Ok(())
    }
}

/// Catalog credential. Never printed.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Reads the key from the process environment, honouring a local `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        match lookup(API_KEY_VAR) {
            Some(key) if !key.trim().is_empty() => Ok(Self(key.trim().to_string())),
            _ => Err(ConfigError::MissingCredential(API_KEY_VAR)),
        }
    }

    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
