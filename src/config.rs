//! Configuration management for the outlier analysis pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Environment variable that overrides the default configuration path
pub const CONFIG_PATH_ENV: &str = "FRAUD_OUTLIER_CONFIG";

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Outlier detection strategy
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Ensemble of random isolation trees (partition-based)
    IsolationForest,
    /// Neighborhood density ratio (density-based)
    LocalOutlierFactor,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dataset input and sampling
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Path to the delimited transaction file
    pub path: String,
    /// Name of the binary label column (0 = valid, 1 = fraud)
    pub label_column: String,
    /// Fraction of rows kept by the subsample, in (0, 1]
    pub sample_fraction: f64,
    /// Seed for the subsample
    pub seed: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: "data/creditcard.csv".to_string(),
            label_column: "Class".to_string(),
            sample_fraction: 0.1,
            seed: 1,
        }
    }
}

/// Detection strategies and their parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Strategies to run, in order
    pub strategies: Vec<DetectorKind>,
    pub isolation_forest: IsolationForestConfig,
    pub local_outlier_factor: LocalOutlierFactorConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            strategies: vec![DetectorKind::IsolationForest, DetectorKind::LocalOutlierFactor],
            isolation_forest: IsolationForestConfig::default(),
            local_outlier_factor: LocalOutlierFactorConfig::default(),
        }
    }
}

/// Isolation Forest parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IsolationForestConfig {
    /// Number of trees in the ensemble
    pub n_estimators: usize,
    /// Rows drawn per tree; unset means the full dataset
    pub max_samples: Option<usize>,
    /// Seed for row sampling and split selection
    pub seed: u64,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: None,
            seed: 1,
        }
    }
}

/// Local Outlier Factor parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalOutlierFactorConfig {
    /// Size of the local neighborhood
    pub n_neighbors: usize,
}

impl Default for LocalOutlierFactorConfig {
    fn default() -> Self {
        Self { n_neighbors: 20 }
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// One JSON document holding every strategy report
    Json,
}

/// Report rendering configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ReportFormat,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `FRAUD_OUTLIER_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
