//! Dataset loader: delimited file → transaction table, plus seeded subsampling

use crate::config::DatasetConfig;
use crate::error::{AnalysisError, Result};
use crate::types::transaction::TransactionTable;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Loads the transaction file and draws the deterministic subsample
pub struct DatasetLoader {
    label_column: String,
    sample_fraction: f64,
    seed: u64,
}

impl DatasetLoader {
    /// Create a loader from the dataset configuration
    pub fn new(config: &DatasetConfig) -> Result<Self> {
        Self::with_sampling(&config.label_column, config.sample_fraction, config.seed)
    }

    /// Create a loader with explicit sampling parameters
    pub fn with_sampling(label_column: &str, sample_fraction: f64, seed: u64) -> Result<Self> {
        if !(sample_fraction > 0.0 && sample_fraction <= 1.0) {
            return Err(AnalysisError::load(format!(
                "sample fraction {} must be in (0, 1]",
                sample_fraction
            )));
        }
        Ok(Self {
            label_column: label_column.to_string(),
            sample_fraction,
            seed,
        })
    }

    /// Read the whole file into a table
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<TransactionTable> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading transaction dataset");

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| AnalysisError::load(format!("{}: {}", path.display(), e)))?;

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if columns.is_empty() || columns.iter().all(String::is_empty) {
            return Err(AnalysisError::load(format!(
                "{}: missing header row",
                path.display()
            )));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(AnalysisError::load(format!("duplicate column '{}'", dup)));
        }

        if !columns.iter().any(|c| c == &self.label_column) {
            return Err(AnalysisError::load(format!(
                "label column '{}' not found in {}",
                self.label_column,
                path.display()
            )));
        }

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            // csv rejects records whose width differs from the header
            let record = record?;
            let mut row = Vec::with_capacity(columns.len());
            for (field, column) in record.iter().zip(&columns) {
                let value: f64 = field.parse().map_err(|_| {
                    AnalysisError::load(format!(
                        "row {}: column '{}' holds non-numeric value '{}'",
                        line + 1,
                        column,
                        field
                    ))
                })?;
                row.push(value);
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(AnalysisError::load(format!(
                "{}: no data rows",
                path.display()
            )));
        }

        let table = TransactionTable::new(columns, rows)
            .map_err(|row| AnalysisError::load(format!("row {} does not match the header", row + 1)))?;

        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            "Dataset loaded"
        );

        Ok(table)
    }

    /// Keep `round(fraction * rows)` rows chosen uniformly without replacement.
    ///
    /// Rows come back in sampling order; the same seed always yields the same rows.
    pub fn sample(&self, table: &TransactionTable) -> TransactionTable {
        let total = table.row_count();
        let amount = ((self.sample_fraction * total as f64).round() as usize).min(total);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let indices = rand::seq::index::sample(&mut rng, total, amount).into_vec();

        debug!(
            total = total,
            sampled = amount,
            seed = self.seed,
            "Subsampled transaction table"
        );

        table.select_rows(&indices)
    }

    /// Load and subsample in one step; an empty sample is a load error.
    pub fn load_sampled<P: AsRef<Path>>(&self, path: P) -> Result<TransactionTable> {
        let table = self.load(path)?;
        let sampled = self.sample(&table);
        if sampled.row_count() == 0 {
            return Err(AnalysisError::load(format!(
                "sample of {} rows at fraction {} is empty",
                table.row_count(),
                self.sample_fraction
            )));
        }
        info!(
            rows = sampled.row_count(),
            columns = sampled.column_count(),
            fraction = self.sample_fraction,
            "Sampled dataset"
        );
        Ok(sampled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn numbered_csv(rows: usize) -> NamedTempFile {
        let mut contents = String::from("Time,V1,Amount,Class\n");
        for i in 0..rows {
            let class = if i % 50 == 0 { 1 } else { 0 };
            contents.push_str(&format!("{},{:.3},{:.2},{}\n", i, i as f64 * 0.01, i as f64 * 1.5, class));
        }
        write_csv(&contents)
    }

    #[test]
    fn test_load_parses_header_and_rows() {
        let file = write_csv("Time,V1,Amount,Class\n0,-1.35,149.62,0\n1,1.19,2.69,\"1\"\n");
        let loader = DatasetLoader::with_sampling("Class", 1.0, 1).unwrap();

        let table = loader.load(file.path()).unwrap();

        assert_eq!(table.columns(), ["Time", "V1", "Amount", "Class"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1], vec![1.0, 1.19, 2.69, 1.0]);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let loader = DatasetLoader::with_sampling("Class", 0.1, 1).unwrap();
        let err = loader.load("no/such/creditcard.csv").unwrap_err();
        assert!(matches!(err, AnalysisError::Load(_)));
    }

    #[test]
    fn test_missing_label_column_is_load_error() {
        let file = write_csv("Time,V1,Amount\n0,1.0,2.0\n");
        let loader = DatasetLoader::with_sampling("Class", 1.0, 1).unwrap();
        let err = loader.load(file.path()).unwrap_err();
        assert!(matches!(err, AnalysisError::Load(_)));
    }

    #[test]
    fn test_non_numeric_cell_is_load_error() {
        let file = write_csv("V1,Class\nabc,0\n");
        let loader = DatasetLoader::with_sampling("Class", 1.0, 1).unwrap();
        let err = loader.load(file.path()).unwrap_err();
        assert!(err.to_string().contains("non-numeric"));
    }

    #[test]
    fn test_ragged_record_is_load_error() {
        let file = write_csv("V1,V2,Class\n1.0,2.0,0\n3.0,0\n");
        let loader = DatasetLoader::with_sampling("Class", 1.0, 1).unwrap();
        assert!(matches!(loader.load(file.path()), Err(AnalysisError::Load(_))));
    }

    #[test]
    fn test_header_only_is_load_error() {
        let file = write_csv("V1,Class\n");
        let loader = DatasetLoader::with_sampling("Class", 1.0, 1).unwrap();
        assert!(matches!(loader.load(file.path()), Err(AnalysisError::Load(_))));
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        assert!(DatasetLoader::with_sampling("Class", 0.0, 1).is_err());
        assert!(DatasetLoader::with_sampling("Class", 1.5, 1).is_err());
    }

    #[test]
    fn test_sample_size_and_schema() {
        let file = numbered_csv(1000);
        let loader = DatasetLoader::with_sampling("Class", 0.1, 1).unwrap();

        let sampled = loader.load_sampled(file.path()).unwrap();

        assert_eq!(sampled.row_count(), 100);
        assert_eq!(sampled.columns(), ["Time", "V1", "Amount", "Class"]);
    }

    #[test]
    fn test_empty_sample_is_load_error() {
        let file = numbered_csv(4);
        let loader = DatasetLoader::with_sampling("Class", 0.1, 1).unwrap();

        let err = loader.load_sampled(file.path()).unwrap_err();

        assert!(matches!(err, AnalysisError::Load(_)));
        assert!(err.to_string().contains("sample of 4 rows at fraction 0.1 is empty"));
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let file = numbered_csv(500);
        let loader = DatasetLoader::with_sampling("Class", 0.2, 7).unwrap();

        let first = loader.load_sampled(file.path()).unwrap();
        let second = loader.load_sampled(file.path()).unwrap();

        assert_eq!(first, second);

        let other_seed = DatasetLoader::with_sampling("Class", 0.2, 8).unwrap();
        let third = other_seed.load_sampled(file.path()).unwrap();
        assert_ne!(first, third);
    }

    #[test]
    fn test_sample_draws_distinct_rows() {
        let file = numbered_csv(200);
        let loader = DatasetLoader::with_sampling("Class", 0.5, 3).unwrap();

        let sampled = loader.load_sampled(file.path()).unwrap();
        let mut times: Vec<u64> = sampled.rows().iter().map(|r| r[0] as u64).collect();
        times.sort_unstable();
        times.dedup();

        assert_eq!(times.len(), 100);
    }
}
