use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};

pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const DATABASE_ENV: &str = "WEATHER_ETL_DATABASE";

const DEFAULT_CITIES: &[&str] = &[
    "Casablanca", "Marrakech", "Rabat", "Agadir", "Safi", "Laayoune", "Guelmim", "Tanger",
    "Nador", "Meknes", "Kenitra", "Oujda", "Fes",
];

/// Credentials for the OpenWeather API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// region = "MA"
/// cities = ["Rabat", "Fes"]
/// database_path = "/var/lib/weather/warehouse.db"
///
/// [openweather]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Country qualifier appended to every geocoding query.
    pub region: String,
    pub cities: Vec<String>,
    pub database_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub openweather: Option<ProviderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: "MA".to_string(),
            cities: DEFAULT_CITIES.iter().map(|c| c.to_string()).collect(),
            database_path: None,
            request_timeout_secs: 10,
            openweather: None,
        }
    }
}

impl Config {
    /// Load config from the platform config directory, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-warehouse", "weather-etl")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Override file values with `OPENWEATHER_API_KEY` / `WEATHER_ETL_DATABASE`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.is_empty()) {
            self.set_openweather_api_key(key);
        }
        if let Some(db) = lookup(DATABASE_ENV).filter(|p| !p.is_empty()) {
            self.database_path = Some(PathBuf::from(db));
        }
    }

    /// Database location, falling back to the platform data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("warehouse.db")),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn set_openweather_api_key(&mut self, api_key: String) {
        self.openweather = Some(ProviderConfig { api_key });
    }

    pub fn openweather_api_key(&self) -> Option<&str> {
        self.openweather.as_ref().map(|cfg| cfg.api_key.as_str())
    }
}
