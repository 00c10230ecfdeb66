//! Evaluation report structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of rows whose true label is this class
    pub support: usize,
    /// Set when a metric had a zero denominator and was reported as 0.0
    pub zero_division: bool,
}

/// Per-class metrics keyed by label, plus averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: BTreeMap<u8, ClassMetrics>,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub accuracy: f64,
    pub total: usize,
}

impl ClassificationReport {
    pub fn class(&self, label: u8) -> Option<&ClassMetrics> {
        self.classes.get(&label)
    }

    fn any_zero_division(&self) -> bool {
        self.classes.values().any(|m| m.zero_division)
    }
}

fn write_metrics_row(f: &mut fmt::Formatter<'_>, label: &str, m: &ClassMetrics) -> fmt::Result {
    let mark = if m.zero_division { "*" } else { " " };
    writeln!(
        f,
        "{:>12}  {:>9.2}{} {:>8.2}{} {:>8.2}{} {:>9}",
        label, m.precision, mark, m.recall, mark, m.f1, mark, m.support
    )
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12}  {:>10} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (label, metrics) in &self.classes {
            write_metrics_row(f, &label.to_string(), metrics)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12}  {:>10} {:>9} {:>8.2}  {:>9}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        write_metrics_row(f, "macro avg", &self.macro_avg)?;
        write_metrics_row(f, "weighted avg", &self.weighted_avg)?;
        if self.any_zero_division() {
            writeln!(f)?;
            writeln!(
                f,
                "* ill-defined: a class had no predicted or no true samples; reported as 0.00"
            )?;
        }
        Ok(())
    }
}

/// Outcome of running one detection strategy over the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyReport {
    /// Strategy name
    pub strategy: String,
    /// Rows whose predicted label differs from the true label
    pub mismatches: usize,
    /// Fraction of rows predicted correctly
    pub accuracy: f64,
    /// Rows flagged as fraud
    pub outliers_flagged: usize,
    pub classification: ClassificationReport,
    /// Wall time spent scoring and evaluating, in milliseconds
    pub elapsed_ms: u64,
    pub generated_at: DateTime<Utc>,
}

impl fmt::Display for StrategyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.strategy, self.mismatches)?;
        writeln!(f, "{}", self.accuracy)?;
        write!(f, "{}", self.classification)
    }
}
