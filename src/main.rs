//! Fraud Outlier Pipeline - Main Entry Point
//!
//! Loads the transaction dataset, runs every configured outlier detection
//! strategy, and reports how well each one recovers the fraud labels.

use anyhow::{Context, Result};
use fraud_outlier_pipeline::config::{AppConfig, LoggingConfig, ReportFormat};
use fraud_outlier_pipeline::metrics::print_summary;
use fraud_outlier_pipeline::run_pipeline;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!("fraud_outlier_pipeline={}", logging.level))
    })?;

    if logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging)?;

    info!("Starting Fraud Outlier Pipeline");
    info!(
        dataset = %config.dataset.path,
        label_column = %config.dataset.label_column,
        sample_fraction = config.dataset.sample_fraction,
        seed = config.dataset.seed,
        strategies = ?config.detection.strategies,
        "Configuration loaded"
    );

    let start = Instant::now();
    let reports = run_pipeline(&config).context("Outlier analysis failed")?;

    match config.report.format {
        ReportFormat::Table => {
            for report in &reports {
                println!("{}", report);
            }
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    print_summary(&reports);
    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Analysis complete"
    );

    Ok(())
}
