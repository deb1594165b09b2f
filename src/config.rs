use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::{MatchConfig, SampleSpec};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// Where the event and property catalogs are read from
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_events_path")]
    pub events_path: PathBuf,
    #[serde(default)]
    pub property_paths: Vec<PathBuf>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            events_path: default_events_path(),
            property_paths: Vec::new(),
        }
    }
}

fn default_events_path() -> PathBuf { PathBuf::from("data/hail_events.csv") }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_min_hail_size")]
    pub min_hail_size_in: f64,
    #[serde(default = "default_base_radius")]
    pub base_radius_mi: f64,
    #[serde(default = "default_radius_per_inch")]
    pub radius_per_inch_mi: f64,
    #[serde(default = "default_max_radius")]
    pub max_radius_mi: f64,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_sample_seed")]
    pub sample_seed: u64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            min_hail_size_in: default_min_hail_size(),
            base_radius_mi: default_base_radius(),
            radius_per_inch_mi: default_radius_per_inch(),
            max_radius_mi: default_max_radius(),
            sample_size: default_sample_size(),
            sample_seed: default_sample_seed(),
        }
    }
}

fn default_min_hail_size() -> f64 { 1.0 }
fn default_base_radius() -> f64 { 1.0 }
fn default_radius_per_inch() -> f64 { 1.0 }
fn default_max_radius() -> f64 { 5.0 }
fn default_sample_size() -> usize { 1000 }
fn default_sample_seed() -> u64 { 42 }

impl MatchingSettings {
    /// Default matching parameters for runs that do not supply their own
    pub fn to_match_config(&self) -> MatchConfig {
        MatchConfig {
            min_hail_size_in: self.min_hail_size_in,
            base_radius_mi: self.base_radius_mi,
            radius_per_inch_mi: self.radius_per_inch_mi,
            max_radius_mi: self.max_radius_mi,
        }
    }

    pub fn sample_spec(&self) -> SampleSpec {
        SampleSpec {
            size: self.sample_size,
            seed: self.sample_seed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_max_runs")]
    pub max_runs: u64,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_runs: default_max_runs(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_max_runs() -> u64 { 16 }
fn default_ttl_secs() -> u64 { 3600 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with HAIL_MATCH__)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., HAIL_MATCH__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("HAIL_MATCH")
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("catalog.property_paths")
        .try_parsing(true)
}
