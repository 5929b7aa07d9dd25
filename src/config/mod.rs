use crate::errors::{AppError, AppResult};
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

pub mod migrate; // use submodule at src/config/migrate.rs

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    #[serde(default)]
    pub stops: StopConfig,
    #[serde(default)]
    pub suggestions: SuggestionConfig,
    #[serde(default)]
    pub locations: LocationConfig,
}

/// Thresholds for the trip state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Fixes reporting a worse accuracy than this are dropped before anything else.
    pub max_accuracy_m: f64,
    /// Fixes worse than this still count, but lower the trip confidence.
    pub low_accuracy_m: f64,
    /// Implied speeds above this are GPS glitches.
    pub max_speed_kmh: f64,
    pub vehicle_speed_kmh: f64,
    pub stationary_speed_kmh: f64,
    pub stationary_close_seconds: i64,
    pub gap_seconds: i64,
    pub distance_correction_factor: f64,
    pub min_trip_km: f64,
    pub min_trip_points: usize,
    pub discard_mocked: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: 200.0,
            low_accuracy_m: 50.0,
            max_speed_kmh: 200.0,
            vehicle_speed_kmh: 15.0,
            stationary_speed_kmh: 5.0,
            stationary_close_seconds: 180,
            gap_seconds: 900,
            distance_correction_factor: 1.3,
            min_trip_km: 0.5,
            min_trip_points: 2,
            discard_mocked: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StopConfig {
    pub min_duration_seconds: i64,
    /// Signal gaps shorter than this inside a stop are not counted as missing.
    pub gap_grace_seconds: i64,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            min_duration_seconds: 180,
            gap_grace_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    pub neighborhood_m: f64,
    pub min_occurrences: usize,
    pub window_days: i64,
    pub clock_accuracy_max_m: f64,
    pub ignore_radius_m: f64,
    pub max_address_samples: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            neighborhood_m: 30.0,
            min_occurrences: 2,
            window_days: 90,
            clock_accuracy_max_m: 50.0,
            ignore_radius_m: 150.0,
            max_address_samples: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub min_radius_m: f64,
    pub max_radius_m: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            min_radius_m: 10.0,
            max_radius_m: 1000.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let db_path = Self::database_file();
        Self {
            database: db_path.to_string_lossy().to_string(),
            segmentation: SegmentationConfig::default(),
            stops: StopConfig::default(),
            suggestions: SuggestionConfig::default(),
            locations: LocationConfig::default(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rtriplogger")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".rtriplogger")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rtriplogger.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rtriplogger.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|_| AppError::ConfigLoad)?;
        let mut cfg: Config = serde_yaml::from_str(&content)?;
        cfg.database = expand_tilde(&cfg.database).to_string_lossy().to_string();
        Ok(cfg)
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_name: Option<String>, is_test: bool) -> AppResult<PathBuf> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_name {
            let p = expand_tilde(&name);
            if p.is_absolute() { p } else { dir.join(p) }
        } else {
            dir.join("rtriplogger.sqlite")
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Config::default()
        };

        // Write config file
        if !is_test {
            config.save()?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        // Create empty DB file if not exists
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        println!("✅ Database:    {:?}", db_path);

        Ok(db_path)
    }

    pub fn save(&self) -> AppResult<()> {
        let yaml = serde_yaml::to_string(self).map_err(|_| AppError::ConfigSave)?;
        let mut file = fs::File::create(Self::config_file())?;
        file.write_all(yaml.as_bytes())
            .map_err(|e: io::Error| AppError::Config(e.to_string()))?;
        Ok(())
    }
}
